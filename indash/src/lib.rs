//! indash loads a dataset of country and sector economic indicators, filters
//! it by a user's selection and describes the charts to draw for the result.
//!
//! The pipeline is: [`Config`] -> [`Dataset`] -> [`Selection`] ->
//! [`FilteredView`] -> [`Panel`]s. A [`Dashboard`] ties these steps together
//! and a [`Page`] renders the outcome as a standalone HTML document.
//!
//! For indash's command line interface, see the `indash-cli` crate.

mod chart;
mod config;
mod dashboard;
mod dataset;
mod error;
mod filter;
mod format;
mod fs;
mod page;
pub mod plotly;
mod record;
mod selection;

use std::collections::BTreeMap;

pub use chart::{
    indicator_chart, latest_bar, render, time_series, ChartKind, ChartSpec, MarkerSymbol, Mode,
    Notice, Panel, Point, RenderOptions, Series, SeriesStyle, XValue, HIGHLIGHT_LINE_WIDTH,
    MARKER_CYCLE, NORMAL_LINE_WIDTH, NO_DATA_MESSAGE,
};
pub use config::{Config, Layout, Options, Server, Theme};
pub use dashboard::{Dashboard, FilterOptions, Rendered};
pub use dataset::Dataset;
pub use error::Error;
pub use filter::FilteredView;
pub use format::SupportedFormat;
pub use page::{Page, DEFAULT_PAGE_TEMPLATE, PAGE_TEMPLATE_NAME};
pub use record::{Record, ValueField};
pub use selection::{Selection, YearRange, MAX_SELECTED};

/// We use [`std::collections::BTreeMap`] as our default map structure.
pub type Map<K, V> = BTreeMap<K, V>;
