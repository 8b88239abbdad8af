//! Declarative Plotly chart descriptions for the three result sections.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::{ColorEncoding, ResultDocument, SectionId, ViewerConfig};

const BAR_COLOR: &str = "#3b82f6";
const LINE_COLOR: &str = "#16a34a";

/// One chart, handed to the renderer verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartDescription {
    pub traces: Vec<JsonValue>,
    pub layout: JsonValue,
    pub config: JsonValue,
}

impl ChartDescription {
    fn new(traces: Vec<JsonValue>, layout: JsonValue) -> Self {
        Self {
            traces,
            layout,
            config: json!({ "responsive": true }),
        }
    }
}

fn component_labels(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("PC{i}")).collect()
}

fn pct2(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

pub fn projection_chart(
    doc: &ResultDocument,
    encoding: &ColorEncoding,
    config: &ViewerConfig,
) -> ChartDescription {
    let xs: Vec<f64> = doc.points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = doc.points.iter().map(|p| p.y).collect();
    let labels: Vec<&str> = doc.points.iter().map(|p| p.label.as_str()).collect();
    let ratios = &doc.explained_variance_ratio_all;

    let trace = json!({
        "type": "scatter",
        "mode": "markers",
        "x": xs,
        "y": ys,
        "text": labels,
        "marker": {
            "size": config.marker_size,
            "color": encoding.values,
            "colorscale": config.colorscale,
            "colorbar": { "title": { "text": encoding.title.as_str(), "font": { "size": 14 } } },
            "showscale": true,
            "opacity": 0.8
        },
        "hovertemplate": "<b>%{text}</b><br>PC1: %{x:.3f}<br>PC2: %{y:.3f}<extra></extra>"
    });

    let axis_title = |idx: usize| match ratios.get(idx) {
        Some(r) => format!("PC{} ({})", idx + 1, pct2(*r)),
        None => format!("PC{}", idx + 1),
    };
    let layout = json!({
        "xaxis": { "title": { "text": axis_title(0) } },
        "yaxis": { "title": { "text": axis_title(1) } },
        "hovermode": "closest",
        "margin": { "t": 50, "b": 50, "l": 60, "r": 40 }
    });
    ChartDescription::new(vec![trace], layout)
}

pub fn contribution_chart(doc: &ResultDocument) -> ChartDescription {
    let ratios = &doc.explained_variance_ratio_all;
    let text: Vec<String> = ratios.iter().map(|r| pct2(*r)).collect();
    let trace = json!({
        "type": "bar",
        "x": component_labels(ratios.len()),
        "y": ratios,
        "text": text,
        "textposition": "auto",
        "marker": { "color": BAR_COLOR }
    });
    let layout = json!({
        "xaxis": { "title": { "text": "Principal Component" } },
        "yaxis": { "title": { "text": "Explained Variance Ratio" } },
        "margin": { "t": 20, "b": 50, "l": 60, "r": 40 }
    });
    ChartDescription::new(vec![trace], layout)
}

pub fn cumulative_chart(doc: &ResultDocument, config: &ViewerConfig) -> ChartDescription {
    let cumulative = &doc.cumulative_variance_ratio_all;
    let trace = json!({
        "type": "scatter",
        "mode": "lines+markers",
        "x": component_labels(cumulative.len()),
        "y": cumulative,
        "marker": { "color": LINE_COLOR, "size": 8 },
        "line": { "color": LINE_COLOR, "width": 3 }
    });
    let layout = json!({
        "xaxis": { "title": { "text": "Principal Component" } },
        "yaxis": {
            "title": { "text": "Cumulative Variance Ratio" },
            "range": [0.0, config.cumulative_range_max]
        },
        "margin": { "t": 20, "b": 50, "l": 60, "r": 40 }
    });
    ChartDescription::new(vec![trace], layout)
}

pub fn chart_for_section(
    section: SectionId,
    doc: &ResultDocument,
    encoding: &ColorEncoding,
    config: &ViewerConfig,
) -> ChartDescription {
    match section {
        SectionId::Pca => projection_chart(doc, encoding, config),
        SectionId::Contribution => contribution_chart(doc),
        SectionId::Cumulative => cumulative_chart(doc, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract_color_encoding, Point};

    fn sample() -> ResultDocument {
        ResultDocument {
            points: vec![
                Point { x: 1.0, y: 2.0, label: "frame_500fs".into() },
                Point { x: 3.0, y: 4.0, label: "B".into() },
            ],
            explained_variance_ratio_all: vec![0.4567, 0.3, 0.1],
            cumulative_variance_ratio_all: vec![0.4567, 0.7567, 0.8567],
        }
    }

    #[test]
    fn projection_uses_points_and_colour_encoding() {
        let doc = sample();
        let enc = extract_color_encoding(&doc.points);
        let chart = projection_chart(&doc, &enc, &ViewerConfig::default());
        let trace = &chart.traces[0];
        assert_eq!(trace["type"], "scatter");
        assert_eq!(trace["x"], json!([1.0, 3.0]));
        assert_eq!(trace["y"], json!([2.0, 4.0]));
        assert_eq!(trace["text"], json!(["frame_500fs", "B"]));
        assert_eq!(trace["marker"]["color"], json!([0.5, 1.0]));
        assert_eq!(trace["marker"]["colorbar"]["title"]["text"], "Time (ps)");
        assert_eq!(trace["marker"]["size"], 12.0);
        assert_eq!(chart.layout["xaxis"]["title"]["text"], "PC1 (45.67%)");
        assert_eq!(chart.layout["yaxis"]["title"]["text"], "PC2 (30.00%)");
        assert_eq!(chart.config["responsive"], true);
    }

    #[test]
    fn contribution_has_one_bar_per_component() {
        let chart = contribution_chart(&sample());
        let trace = &chart.traces[0];
        assert_eq!(trace["type"], "bar");
        assert_eq!(trace["x"], json!(["PC1", "PC2", "PC3"]));
        assert_eq!(trace["text"], json!(["45.67%", "30.00%", "10.00%"]));
    }

    #[test]
    fn cumulative_has_fixed_headroom() {
        let chart = cumulative_chart(&sample(), &ViewerConfig::default());
        assert_eq!(chart.traces[0]["mode"], "lines+markers");
        assert_eq!(chart.layout["yaxis"]["range"], json!([0.0, 1.1]));
    }

    #[test]
    fn section_dispatch() {
        let doc = sample();
        let enc = extract_color_encoding(&doc.points);
        let config = ViewerConfig::default();
        let bar = chart_for_section(SectionId::Contribution, &doc, &enc, &config);
        assert_eq!(bar, contribution_chart(&doc));
    }
}
