//! Chart specifications derived from filtered indicator data.
//!
//! Charts are described rather than drawn: a [`ChartSpec`] says what to plot
//! and how to style it, and it is up to a presentation layer (see
//! [`crate::plotly`] and [`crate::Page`]) to turn it into pixels.

use std::{collections::HashMap, str::FromStr};

use log::debug;
use serde::Serialize;

use crate::{Config, Error, FilteredView, Map, Record, Selection, ValueField};

/// Marker glyphs assigned to indicator charts, by chart slot.
pub const MARKER_CYCLE: [MarkerSymbol; 4] = [
    MarkerSymbol::Circle,
    MarkerSymbol::Square,
    MarkerSymbol::TriangleUp,
    MarkerSymbol::Cross,
];

/// Line width of the highlighted series in indicator charts.
pub const HIGHLIGHT_LINE_WIDTH: f64 = 4.0;

/// Line width of every other series in indicator charts.
pub const NORMAL_LINE_WIDTH: f64 = 1.5;

/// Message shown in place of all charts when a selection matches nothing.
pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters.";

/// Which set of charts to produce for a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// A time series and a latest-year bar chart per selected variable.
    Overview,
    /// One line chart per selected variable, side by side.
    Indicators,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Overview
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overview" => Ok(Self::Overview),
            "indicators" => Ok(Self::Indicators),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerSymbol {
    Circle,
    Square,
    TriangleUp,
    Cross,
}

impl MarkerSymbol {
    /// The marker used by the chart in the given slot.
    pub fn for_slot(slot: usize) -> Self {
        MARKER_CYCLE[slot % MARKER_CYCLE.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
            Self::TriangleUp => "triangle-up",
            Self::Cross => "cross",
        }
    }
}

/// A value on a chart's x axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum XValue {
    Year(i32),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: XValue,
    /// Missing values are kept so that every record maps to a point.
    pub y: Option<f64>,
}

/// Per-series overrides of the default chart styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerSymbol>,
}

/// One line, or one colored group of bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// The value of the chart's color field shared by this series.
    pub name: String,
    /// The value of the chart's line group field, if it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub points: Vec<Point>,
    pub style: SeriesStyle,
}

/// A description of a single chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    /// The indicator variable this chart plots.
    pub variable: String,
    pub x_field: String,
    pub y_field: String,
    pub color_field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_group_field: Option<String>,
    pub x_title: String,
    pub y_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    pub show_legend: bool,
    /// Whether line charts show a marker at each point.
    pub markers: bool,
    /// Whether bars are labeled with their values.
    pub value_labels: bool,
    pub font_color: String,
    pub series: Vec<Series>,
}

/// A "no data" message displayed instead of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// The indicator whose chart slot this notice fills, or `None` if the
    /// selection as a whole matched no records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    pub message: String,
}

impl Notice {
    pub fn no_data() -> Self {
        Self {
            variable: None,
            message: NO_DATA_MESSAGE.to_string(),
        }
    }

    pub fn no_data_for(variable: &str) -> Self {
        Self {
            variable: Some(variable.to_string()),
            message: format!("No data available for {}", variable),
        }
    }
}

/// One slot of rendered output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Panel {
    Chart(ChartSpec),
    Notice(Notice),
}

impl Panel {
    pub fn as_chart(&self) -> Option<&ChartSpec> {
        match self {
            Self::Chart(chart) => Some(chart),
            Self::Notice(_) => None,
        }
    }

    pub fn as_notice(&self) -> Option<&Notice> {
        match self {
            Self::Notice(notice) => Some(notice),
            Self::Chart(_) => None,
        }
    }
}

/// Styling parameters shared by every chart of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub value_field: ValueField,
    pub font_color: String,
    /// Series name (country) to emphasize in indicator charts.
    pub highlight: Option<String>,
    pub highlight_color: String,
    /// Display names for variables.
    pub labels: Map<String, String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RenderOptions {
    pub fn from_config(config: &Config) -> Self {
        let opts = config.options();
        Self {
            value_field: opts.value_field,
            font_color: opts.theme.text_color.clone(),
            highlight: opts.highlight.clone(),
            highlight_color: opts.highlight_color.clone(),
            labels: opts.indicator_labels.clone(),
        }
    }

    pub fn with_highlight<S: Into<String>>(mut self, highlight: S) -> Self {
        self.highlight = Some(highlight.into());
        self
    }

    pub fn with_value_field(mut self, value_field: ValueField) -> Self {
        self.value_field = value_field;
        self
    }

    fn label<'a>(&'a self, variable: &'a str) -> &'a str {
        self.labels
            .get(variable)
            .map(String::as_str)
            .unwrap_or(variable)
    }
}

/// Produce the panels for the given view.
///
/// An empty view yields a single [`Notice`] and no charts. Otherwise each
/// selected variable gets its charts in selection order; a variable without
/// records gets a notice in its slot while the others still render.
pub fn render(
    view: &FilteredView<'_>,
    selection: &Selection,
    mode: Mode,
    options: &RenderOptions,
) -> Vec<Panel> {
    if view.is_empty() {
        debug!("Selection matched no records");
        return vec![Panel::Notice(Notice::no_data())];
    }
    let mut panels = Vec::new();
    for (slot, variable) in selection.variables().iter().enumerate() {
        let subset = view.for_variable(variable);
        if subset.is_empty() {
            debug!("No records for variable \"{}\"", variable);
            panels.push(Panel::Notice(Notice::no_data_for(variable)));
            continue;
        }
        match mode {
            Mode::Overview => {
                panels.push(Panel::Chart(time_series(&subset, variable, options)));
                panels.push(Panel::Chart(latest_bar(&subset, variable, options)));
            }
            Mode::Indicators => {
                panels.push(Panel::Chart(indicator_chart(
                    &subset, variable, slot, options,
                )));
            }
        }
    }
    debug!("Rendered {} panel(s) in {:?} mode", panels.len(), mode);
    panels
}

/// A line chart of the variable's values over time, with one line per
/// (country, activity) pair, colored by country.
pub fn time_series(view: &FilteredView<'_>, variable: &str, options: &RenderOptions) -> ChartSpec {
    let series = group_series(view, |r| (r.country.clone(), Some(r.activity.clone())), options)
        .into_iter()
        .map(|(name, group, points)| Series {
            name,
            group,
            points,
            style: SeriesStyle::default(),
        })
        .collect();
    ChartSpec {
        kind: ChartKind::Line,
        title: format!("{} Over Time by Activity and Country", variable),
        variable: variable.to_string(),
        x_field: "year".to_string(),
        y_field: options.value_field.column().to_string(),
        color_field: "country".to_string(),
        line_group_field: Some("activityName".to_string()),
        x_title: "Year".to_string(),
        y_title: view.unit_for(variable).unwrap_or("Value").to_string(),
        legend_title: Some("Country / Activity".to_string()),
        show_legend: true,
        markers: true,
        value_labels: false,
        font_color: options.font_color.clone(),
        series,
    }
}

/// A bar chart with one bar per country, showing the value from the country's
/// latest year.
pub fn latest_bar(view: &FilteredView<'_>, variable: &str, options: &RenderOptions) -> ChartSpec {
    let series = view
        .latest_per_country()
        .into_iter()
        .map(|record| Series {
            name: record.country.clone(),
            group: None,
            points: vec![Point {
                x: XValue::Label(format!("{} ({})", record.country, record.year)),
                y: record.get(options.value_field),
            }],
            style: SeriesStyle::default(),
        })
        .collect();
    ChartSpec {
        kind: ChartKind::Bar,
        title: format!("Latest {} Data by Country", variable),
        variable: variable.to_string(),
        x_field: "country_label".to_string(),
        y_field: options.value_field.column().to_string(),
        color_field: "country".to_string(),
        line_group_field: None,
        x_title: "Country (Latest Year)".to_string(),
        y_title: view.unit_for(variable).unwrap_or("Value").to_string(),
        legend_title: None,
        show_legend: false,
        markers: false,
        value_labels: true,
        font_color: options.font_color.clone(),
        series,
    }
}

/// A line chart of one indicator with one line per country. The highlighted
/// country is drawn thicker and in the highlight color, and every series uses
/// the marker belonging to the chart's slot.
pub fn indicator_chart(
    view: &FilteredView<'_>,
    variable: &str,
    slot: usize,
    options: &RenderOptions,
) -> ChartSpec {
    let marker = MarkerSymbol::for_slot(slot);
    let series = group_series(view, |r| (r.country.clone(), None), options)
        .into_iter()
        .map(|(name, group, points)| {
            let highlighted = options.highlight.as_deref() == Some(name.as_str());
            Series {
                style: SeriesStyle {
                    line_width: Some(if highlighted {
                        HIGHLIGHT_LINE_WIDTH
                    } else {
                        NORMAL_LINE_WIDTH
                    }),
                    line_color: highlighted.then(|| options.highlight_color.clone()),
                    marker: Some(marker),
                },
                name,
                group,
                points,
            }
        })
        .collect();
    ChartSpec {
        kind: ChartKind::Line,
        title: options.label(variable).to_string(),
        variable: variable.to_string(),
        x_field: "year".to_string(),
        y_field: options.value_field.column().to_string(),
        color_field: "country".to_string(),
        line_group_field: None,
        x_title: "Year".to_string(),
        y_title: view.unit_for(variable).unwrap_or("Unknown").to_string(),
        legend_title: Some("Country / Activity".to_string()),
        show_legend: true,
        markers: true,
        value_labels: false,
        font_color: options.font_color.clone(),
        series,
    }
}

type SeriesKey = (String, Option<String>);

// Groups the view's records into series in order of first appearance, with
// each series' points sorted by year.
fn group_series<F>(
    view: &FilteredView<'_>,
    key: F,
    options: &RenderOptions,
) -> Vec<(String, Option<String>, Vec<Point>)>
where
    F: Fn(&Record) -> SeriesKey,
{
    let mut index: HashMap<SeriesKey, usize> = HashMap::new();
    let mut groups: Vec<(SeriesKey, Vec<&Record>)> = Vec::new();
    for record in view.iter() {
        let k = key(record);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![record]));
            }
        }
    }
    groups
        .into_iter()
        .map(|((name, group), mut records)| {
            records.sort_by_key(|r| r.year);
            let points = records
                .into_iter()
                .map(|r| Point {
                    x: XValue::Year(r.year),
                    y: r.get(options.value_field),
                })
                .collect();
            (name, group, points)
        })
        .collect()
}
