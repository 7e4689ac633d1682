//! Conversion of chart specifications into [plotly.js](https://plotly.com/javascript/)
//! figures.

use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::{ChartKind, ChartSpec, Map, Series, XValue};

/// Plotly's default qualitative color sequence, assigned to distinct series
/// names in order of appearance.
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Build a plotly.js figure (`{"data": [...], "layout": {...}}`) for the
/// given chart.
pub fn figure(chart: &ChartSpec) -> JsonValue {
    let mut colors: Map<&str, &str> = Map::new();
    let mut next_color = 0;
    let data = chart
        .series
        .iter()
        .map(|series| {
            // Series sharing a name (one country across several activities)
            // share a color.
            let color = *colors.entry(series.name.as_str()).or_insert_with(|| {
                let color = PALETTE[next_color % PALETTE.len()];
                next_color += 1;
                color
            });
            trace(chart, series, color)
        })
        .collect::<Vec<JsonValue>>();
    json!({
        "data": data,
        "layout": layout(chart),
    })
}

fn trace(chart: &ChartSpec, series: &Series, color: &str) -> JsonValue {
    let x = series
        .points
        .iter()
        .map(|p| match &p.x {
            XValue::Year(year) => json!(year),
            XValue::Label(label) => json!(label),
        })
        .collect::<Vec<JsonValue>>();
    let y = series.points.iter().map(|p| json!(p.y)).collect::<Vec<JsonValue>>();
    let name = match &series.group {
        Some(group) => format!("{}, {}", series.name, group),
        None => series.name.clone(),
    };
    let mut trace = JsonMap::new();
    trace.insert("name".to_string(), json!(name));
    trace.insert("legendgroup".to_string(), json!(series.name));
    trace.insert("x".to_string(), JsonValue::Array(x));
    trace.insert("y".to_string(), JsonValue::Array(y));
    match chart.kind {
        ChartKind::Line => {
            trace.insert("type".to_string(), json!("scatter"));
            let mode = if chart.markers { "lines+markers" } else { "lines" };
            trace.insert("mode".to_string(), json!(mode));
            let mut line = JsonMap::new();
            line.insert(
                "color".to_string(),
                json!(series.style.line_color.as_deref().unwrap_or(color)),
            );
            if let Some(width) = series.style.line_width {
                line.insert("width".to_string(), json!(width));
            }
            trace.insert("line".to_string(), JsonValue::Object(line));
            if let Some(marker) = series.style.marker {
                trace.insert("marker".to_string(), json!({ "symbol": marker.as_str() }));
            }
        }
        ChartKind::Bar => {
            trace.insert("type".to_string(), json!("bar"));
            trace.insert("marker".to_string(), json!({ "color": color }));
            if chart.value_labels {
                let text = series
                    .points
                    .iter()
                    .map(|p| p.y.map(format_value).unwrap_or_default())
                    .collect::<Vec<String>>();
                trace.insert("text".to_string(), json!(text));
                trace.insert("textposition".to_string(), json!("auto"));
            }
        }
    }
    JsonValue::Object(trace)
}

fn layout(chart: &ChartSpec) -> JsonValue {
    let mut layout = json!({
        "title": { "text": chart.title },
        "xaxis": { "title": { "text": chart.x_title } },
        "yaxis": { "title": { "text": chart.y_title } },
        "showlegend": chart.show_legend,
        "font": { "color": chart.font_color },
    });
    if let Some(legend_title) = &chart.legend_title {
        layout["legend"] = json!({ "title": { "text": legend_title } });
    }
    layout
}

// Whole numbers are printed without a fractional part.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.4}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
