//! Standalone HTML report: a [`Surface`] that records what the session shows,
//! then serialises it into one page driven by Plotly from a CDN.
//!
//! Every section's chart is embedded so toggling a hidden section on in the
//! page draws it from the loaded document. Only initially visible sections are
//! drawn at load.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pcaview::{chart_for_section, ChartDescription, SectionId, Session, StatCard, Surface};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

#[derive(Debug, Default)]
pub struct HtmlSurface {
    pub file_name: Option<String>,
    pub alerts: Vec<String>,
    pub stats: Vec<StatCard>,
    pub results_visible: bool,
    pub visible_sections: BTreeMap<SectionId, bool>,
    pub charts: BTreeMap<SectionId, ChartDescription>,
}

impl Surface for HtmlSurface {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    // Nothing to animate in a static report.
    fn set_loading(&mut self, _loading: bool) {}

    fn set_results_visible(&mut self, visible: bool) {
        self.results_visible = visible;
    }

    fn set_file_name(&mut self, name: &str) {
        self.file_name = Some(name.to_string());
    }

    fn set_stats(&mut self, cards: &[StatCard]) {
        self.stats = cards.to_vec();
    }

    fn set_section_visible(&mut self, section: SectionId, visible: bool) {
        self.visible_sections.insert(section, visible);
    }

    fn plot(&mut self, section: SectionId, chart: &ChartDescription) {
        self.charts.insert(section, chart.clone());
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// JSON safe to inline inside a `<script>` element.
fn script_json(chart: &ChartDescription) -> String {
    serde_json::to_string(chart)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

fn section_chart(session: &Session, section: SectionId) -> Option<ChartDescription> {
    let doc = session.document()?;
    let encoding = session.color_encoding()?;
    Some(chart_for_section(section, doc, encoding, session.config()))
}

pub fn render_html(surface: &HtmlSurface, session: &Session, generated_at: &DateTime<Utc>) -> String {
    let file_name = escape_html(surface.file_name.as_deref().unwrap_or("(no file)"));

    let cards: String = surface
        .stats
        .iter()
        .map(|card| {
            format!(
                r#"<div class="stat-card"><h3>{}</h3><p>{}</p></div>"#,
                escape_html(&card.value),
                card.label
            )
        })
        .collect();

    let mut toggles = String::new();
    let mut sections = String::new();
    let mut scripts = String::new();
    let mut initial = Vec::new();
    for section in SectionId::ALL {
        let visible = surface
            .visible_sections
            .get(&section)
            .copied()
            .unwrap_or(false);
        toggles.push_str(&format!(
            r#"<button class="section-toggle{active}" data-section="{id}">{title}</button>"#,
            active = if visible { " active" } else { "" },
            id = section.as_str(),
            title = section.title(),
        ));
        sections.push_str(&format!(
            r#"<section id="{container}" style="display:{display}"><h2>{title}</h2><div id="{plot}" class="plot"></div></section>"#,
            container = section.container_id(),
            display = if visible { "block" } else { "none" },
            title = section.title(),
            plot = section.plot_id(),
        ));
        if let Some(chart) = section_chart(session, section) {
            scripts.push_str(&format!(
                "charts[\"{id}\"] = {json};\n",
                id = section.as_str(),
                json = script_json(&chart)
            ));
            if visible {
                initial.push(section.as_str());
            }
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>PCA Results - {file_name}</title>
<script src="{cdn}"></script>
<style>{css}</style>
</head>
<body>
<header><h1>PCA Results</h1><p class="file">{file_name}</p></header>
<div class="stats">{cards}</div>
<nav>{toggles}</nav>
{sections}
<footer>Generated {generated}</footer>
<script>
const charts = {{}};
const plotIds = {{ pca: "pcaPlot", contribution: "contributionPlot", cumulative: "cumulativePlot" }};
{scripts}
function draw(name) {{
  const chart = charts[name];
  if (!chart) return;
  Plotly.react(plotIds[name], chart.traces, chart.layout, chart.config);
}}
document.querySelectorAll(".section-toggle").forEach((button) => {{
  button.addEventListener("click", () => {{
    const name = button.dataset.section;
    const section = document.getElementById(name + "-section");
    const active = button.classList.toggle("active");
    section.style.display = active ? "block" : "none";
    if (active) requestAnimationFrame(() => draw(name));
  }});
}});
{initial}.forEach(draw);
</script>
</body>
</html>
"#,
        file_name = file_name,
        cdn = PLOTLY_CDN,
        css = CSS,
        cards = cards,
        toggles = toggles,
        sections = sections,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        scripts = scripts,
        initial = serde_json::to_string(&initial).unwrap_or_else(|_| "[]".to_string()),
    )
}

const CSS: &str = "body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:1100px;color:#1f2937}\
.stats{display:grid;grid-template-columns:repeat(4,1fr);gap:1rem;margin:1rem 0}\
.stat-card{background:#fff;border-radius:.5rem;box-shadow:0 1px 3px rgba(0,0,0,.15);padding:1rem;text-align:center}\
.stat-card h3{color:#2563eb;font-size:1.5rem;margin:0}\
nav{display:flex;gap:.5rem;margin:1rem 0}\
.section-toggle{border:0;border-radius:.5rem;padding:.5rem 1rem;background:#e5e7eb;color:#374151;cursor:pointer}\
.section-toggle.active{background:#2563eb;color:#fff}\
.plot{height:480px}\
footer{color:#6b7280;font-size:.8rem;margin-top:2rem}";
