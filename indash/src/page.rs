//! Rendering of dashboards as standalone HTML pages.

use eyre::{Result, WrapErr};
use handlebars::{handlebars_helper, Handlebars};
use log::debug;
use serde_json::{json, Value as JsonValue};

use crate::{fs::read_to_string, plotly, Dashboard, Error, Panel, Record, Rendered};

/// The name under which the page template is registered.
pub const PAGE_TEMPLATE_NAME: &str = "page";

/// The built-in page template, in [Handlebars](https://handlebarsjs.com/)
/// format.
pub const DEFAULT_PAGE_TEMPLATE: &str = include_str!("../templates/page.hbs");

/// Columns of the raw data table, in display order.
const DATA_COLUMNS: &[&str] = &[
    "country",
    "year",
    "Sector",
    "activityName",
    "Dimension",
    "variableName",
    "value",
    "valueUSD",
    "unidadMedida",
];

// Serializes its parameter as JSON that can be embedded in a <script> block.
handlebars_helper!(json: |value: Json| script_safe_json(value));

fn script_safe_json(value: &JsonValue) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

/// Renders [`Rendered`] dashboards into HTML documents.
pub struct Page<'reg> {
    hb: Handlebars<'reg>,
}

impl<'reg> Page<'reg> {
    /// Constructor using the built-in page template.
    pub fn new() -> Result<Self, Error> {
        Self::with_template(DEFAULT_PAGE_TEMPLATE)
    }

    /// Constructor using a custom page template.
    pub fn with_template<T: AsRef<str>>(template: T) -> Result<Self, Error> {
        let mut hb = Handlebars::new();
        hb.register_helper("json", Box::new(json));
        hb.register_template_string(PAGE_TEMPLATE_NAME, template.as_ref())
            .map_err(|e| Error::TemplateCompile(PAGE_TEMPLATE_NAME.to_string(), Box::new(e)))?;
        Ok(Self { hb })
    }

    /// Render a full HTML page for the given rendered selection.
    ///
    /// Fails if the configured stylesheet cannot be read.
    pub fn render(&self, dashboard: &Dashboard, rendered: &Rendered<'_>) -> Result<String> {
        let opts = dashboard.config().options();
        let stylesheet = match &opts.stylesheet {
            Some(path) => {
                debug!("Inlining stylesheet {}", path.display());
                Some(read_to_string(path).wrap_err("failed to load stylesheet")?)
            }
            None => None,
        };
        let selection = &rendered.selection;
        let countries = selection
            .countries()
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join(", ");
        let panels = rendered
            .panels
            .iter()
            .enumerate()
            .map(|(i, panel)| match panel {
                Panel::Chart(chart) => json!({
                    "chart": {
                        "id": format!("chart-{}", i),
                        "figure": plotly::figure(chart),
                    }
                }),
                Panel::Notice(notice) => json!({ "notice": notice.message }),
            })
            .collect::<Vec<JsonValue>>();
        let rows = rendered
            .data
            .iter()
            .map(table_row)
            .collect::<Vec<Vec<String>>>();
        let data = json!({
            "page_title": opts.page_title,
            "page_icon": opts.page_icon,
            "header": opts.header,
            "layout": opts.layout.as_str(),
            "base_url": opts.server.base_url_path,
            "text_color": opts.theme.text_color,
            "stylesheet": stylesheet,
            "selection": {
                "countries": countries,
                "years": selection.years().to_string(),
                "sector": selection.sector(),
                "activities": selection.activities().join(", "),
                "dimensions": selection.dimensions().join(", "),
                "variables": selection.variables().join(", "),
            },
            "has_charts": rendered.charts().next().is_some(),
            "panels": panels,
            "columns": DATA_COLUMNS,
            "rows": rows,
        });
        let html = self
            .hb
            .render(PAGE_TEMPLATE_NAME, &data)
            .map_err(|e| Error::TemplateRender(PAGE_TEMPLATE_NAME.to_string(), e))?;
        debug!(
            "Rendered page with {} panel(s) and {} data row(s)",
            rendered.panels.len(),
            rendered.data.len()
        );
        Ok(html)
    }
}

fn table_row(record: &Record) -> Vec<String> {
    let number = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    vec![
        record.country.clone(),
        record.year.to_string(),
        record.sector.clone(),
        record.activity.clone(),
        record.dimension.clone(),
        record.variable.clone(),
        number(record.value),
        number(record.value_usd),
        record.unit.clone(),
    ]
}
