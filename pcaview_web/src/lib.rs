use leptos::*;
use pcaview::{ChartDescription, PcaError, SectionId, Session, StatCard, Surface, ViewerConfig};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FileList, HtmlInputElement};

#[cfg(feature = "chart_plotly")]
use serde::Serialize;
#[cfg(feature = "chart_plotly")]
use wasm_bindgen::JsCast;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_COMMIT: &str = env!("PCAVIEW_COMMIT");

fn slot(section: SectionId) -> usize {
    match section {
        SectionId::Pca => 0,
        SectionId::Contribution => 1,
        SectionId::Cumulative => 2,
    }
}

#[cfg(feature = "chart_plotly")]
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    // Plain objects rather than ES Maps, which Plotly does not read.
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

#[cfg(feature = "chart_plotly")]
fn plot_chart(div_id: &str, chart: &ChartDescription) {
    let Some(div) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(div_id))
    else {
        return;
    };
    let plotly = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("Plotly"))
        .unwrap_or(JsValue::UNDEFINED);
    let Ok(func) = js_sys::Reflect::get(&plotly, &JsValue::from_str("react"))
        .or_else(|_| js_sys::Reflect::get(&plotly, &JsValue::from_str("newPlot")))
        .and_then(|v| v.dyn_into::<js_sys::Function>())
    else {
        return;
    };
    let (Ok(traces), Ok(layout), Ok(config)) = (
        to_js(&chart.traces),
        to_js(&chart.layout),
        to_js(&chart.config),
    ) else {
        return;
    };
    let args = js_sys::Array::of4(&JsValue::from(div), &traces, &layout, &config);
    let _ = func.apply(&JsValue::NULL, &args);
}

#[cfg(not(feature = "chart_plotly"))]
fn plot_chart(_div_id: &str, _chart: &ChartDescription) {}

async fn read_file_text(file: &File) -> Result<String, PcaError> {
    let value = JsFuture::from(file.text())
        .await
        .map_err(|e| PcaError::ReadFailed(format!("{e:?}")))?;
    value
        .as_string()
        .ok_or_else(|| PcaError::ReadFailed("file contents were not text".to_string()))
}

/// Session output routed into reactive signals and Plotly calls.
#[derive(Clone, Copy)]
struct WebSurface {
    set_loading: WriteSignal<bool>,
    set_results: WriteSignal<bool>,
    set_file_name: WriteSignal<String>,
    set_stats: WriteSignal<Vec<StatCard>>,
    set_visible: WriteSignal<[bool; 3]>,
}

impl Surface for WebSurface {
    fn alert(&mut self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn set_loading(&mut self, loading: bool) {
        self.set_loading.set(loading);
    }

    fn set_results_visible(&mut self, visible: bool) {
        self.set_results.set(visible);
    }

    fn set_file_name(&mut self, name: &str) {
        self.set_file_name.set(name.to_string());
    }

    fn set_stats(&mut self, cards: &[StatCard]) {
        self.set_stats.set(cards.to_vec());
    }

    fn set_section_visible(&mut self, section: SectionId, visible: bool) {
        self.set_visible.update(|v| v[slot(section)] = visible);
    }

    fn plot(&mut self, section: SectionId, chart: &ChartDescription) {
        plot_chart(section.plot_id(), chart);
    }
}

#[component]
pub fn App(#[prop(optional)] config: Option<ViewerConfig>) -> impl IntoView {
    let session = store_value(Session::new(config.unwrap_or_default()));
    let initial_visible = session.with_value(|s| SectionId::ALL.map(|id| s.sections().is_active(id)));

    let (loading, set_loading) = create_signal(false);
    let (results, set_results) = create_signal(false);
    let (file_name, set_file_name) = create_signal(String::new());
    let (stats, set_stats) = create_signal(Vec::<StatCard>::new());
    let (visible, set_visible) = create_signal(initial_visible);
    let (dragging, set_dragging) = create_signal(false);

    let surface = WebSurface {
        set_loading,
        set_results,
        set_file_name,
        set_stats,
        set_visible,
    };

    let start_upload = move |list: FileList| {
        let files: Vec<File> = (0..list.length()).filter_map(|i| list.item(i)).collect();
        let names: Vec<String> = files.iter().map(|f| f.name()).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut surface = surface;
        let ticket = session.try_update_value(|s| s.begin_upload(&name_refs, &mut surface));
        let (Some(Ok(ticket)), Some(file)) = (ticket, files.into_iter().next()) else {
            return;
        };
        spawn_local(async move {
            let text = read_file_text(&file).await;
            let mut surface = surface;
            session.update_value(|s| {
                let _ = s.finish_upload(ticket, text, &mut surface);
            });
        });
    };

    let on_files = move |ev: leptos::ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        if let Some(list) = input.files() {
            start_upload(list);
        }
        input.set_value("");
    };

    let on_toggle = move |section: SectionId| {
        let mut surface = surface;
        session.update_value(|s| {
            s.toggle_section(section, &mut surface);
        });
        if session.with_value(|s| s.sections().is_awaiting_layout(section)) {
            // Draw once the browser has laid out the newly shown container.
            request_animation_frame(move || {
                let mut surface = surface;
                session.update_value(|s| {
                    s.layout_ready(section, &mut surface);
                });
            });
        }
    };

    let stat_cards = move || {
        stats
            .get()
            .into_iter()
            .map(|card| {
                view! {
                    <div class="stat-card"><h3>{card.value}</h3><p>{card.label}</p></div>
                }
            })
            .collect_view()
    };

    let toggles = SectionId::ALL
        .into_iter()
        .map(|section| {
            view! {
                <button
                    class="section-toggle"
                    class:active=move || visible.get()[slot(section)]
                    on:click=move |_| on_toggle(section)
                >
                    {section.title()}
                </button>
            }
        })
        .collect_view();

    let sections = SectionId::ALL
        .into_iter()
        .map(|section| {
            view! {
                <section
                    id=section.container_id()
                    style:display=move || if visible.get()[slot(section)] { "block" } else { "none" }
                >
                    <h2>{section.title()}</h2>
                    <div id=section.plot_id() class="plot"></div>
                </section>
            }
        })
        .collect_view();

    view! {
        <main class="pcaview">
            <header>
                <h1>"PCA Results Viewer"</h1>
                <p class="subtitle">"Upload the JSON written by your PCA run to explore projections and explained variance."</p>
                <p class="note">{"Web version "}{APP_VERSION}{" ("}{APP_COMMIT}{")"}</p>
            </header>
            <label
                id="uploadArea"
                class="dropzone"
                class:dragging=move || dragging.get()
                on:dragenter=move |ev: web_sys::DragEvent| { ev.prevent_default(); set_dragging.set(true); }
                on:dragover=move |ev: web_sys::DragEvent| { ev.prevent_default(); set_dragging.set(true); }
                on:dragleave=move |ev: web_sys::DragEvent| { ev.prevent_default(); set_dragging.set(false); }
                on:drop=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    set_dragging.set(false);
                    if let Some(list) = ev.data_transfer().and_then(|dt| dt.files()) {
                        start_upload(list);
                    }
                }
            >
                <span>"Drag & drop a .json result file or click to browse"</span>
                <input id="fileInput" type="file" accept=".json" on:change=on_files />
            </label>
            <div id="fileList" class="file-name">{move || file_name.get()}</div>
            <div id="loading" style:display=move || if loading.get() { "block" } else { "none" }>
                "Processing file…"
            </div>
            <div id="results" style:display=move || if results.get() { "block" } else { "none" }>
                <div id="statsGrid" class="stats">{stat_cards}</div>
                <nav class="toggles">{toggles}</nav>
                {sections}
            </div>
            <p class="note">"Nothing leaves your device. All processing happens locally in your browser."</p>
        </main>
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(|| view! { <App/> });
}
