use std::path::Path;

use eyre::Result;
use log::{debug, info};
use serde::Serialize;

use crate::{
    chart::{self, Panel, RenderOptions},
    Config, Dataset, FilteredView, Map, Mode, Selection, YearRange,
};

/// A dashboard brings together a configuration and the dataset it points to.
///
/// Both are loaded once and never change afterwards, so a single dashboard
/// can serve any number of renders.
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: Config,
    dataset: Dataset,
}

impl Dashboard {
    /// Load the configuration from the given file, followed by the dataset it
    /// refers to. Failure to load either is fatal.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config = Config::load(config_path)?;
        let opts = config.options();
        let dataset = Dataset::load(&opts.data_path, &opts.sheet)?;
        info!(
            "Loaded {} records covering {} countries from {}",
            dataset.len(),
            dataset.countries().len(),
            opts.data_path.display()
        );
        Ok(Self::new(config, dataset))
    }

    /// Constructor.
    pub fn new(config: Config, dataset: Dataset) -> Self {
        Self { config, dataset }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// See [`Selection::defaults`].
    pub fn default_selection(&self, mode: Mode) -> Selection {
        Selection::defaults(&self.dataset, &self.config, mode)
    }

    /// Chart styling derived from the configuration.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::from_config(&self.config)
    }

    /// Filter the dataset by the given selection and render its charts using
    /// the configured styling.
    pub fn render(&self, selection: &Selection, mode: Mode) -> Rendered<'_> {
        self.render_with(selection, mode, &self.render_options())
    }

    /// Filter the dataset by the given selection and render its charts.
    pub fn render_with(
        &self,
        selection: &Selection,
        mode: Mode,
        options: &RenderOptions,
    ) -> Rendered<'_> {
        let view = FilteredView::new(&self.dataset, selection);
        debug!(
            "Selection matched {} of {} records",
            view.len(),
            self.dataset.len()
        );
        let panels = chart::render(&view, selection, mode, options);
        Rendered {
            mode,
            selection: selection.clone(),
            panels,
            data: view,
        }
    }

    /// Everything that can be chosen in a selection, as offered by this
    /// dashboard's dataset and configuration.
    pub fn filter_options(&self) -> FilterOptions<'_> {
        let sectors = self
            .config
            .options()
            .sectors
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>();
        let activities = sectors
            .iter()
            .map(|sector| (*sector, self.dataset.activities_for_sector(sector)))
            .collect();
        let dimensions = self.dataset.dimensions();
        let variables = dimensions
            .iter()
            .map(|dimension| (*dimension, self.dataset.variables_for_dimensions(&[dimension])))
            .collect();
        FilterOptions {
            countries: self.dataset.countries(),
            years: self.dataset.year_bounds(),
            sectors,
            activities,
            dimensions,
            variables,
        }
    }
}

/// The outcome of rendering one selection.
#[derive(Debug, Clone, Serialize)]
pub struct Rendered<'a> {
    pub mode: Mode,
    pub selection: Selection,
    /// Charts and notices, in display order.
    pub panels: Vec<Panel>,
    /// The records matched by the selection.
    pub data: FilteredView<'a>,
}

impl<'a> Rendered<'a> {
    pub fn charts(&self) -> impl Iterator<Item = &chart::ChartSpec> {
        self.panels.iter().filter_map(Panel::as_chart)
    }

    pub fn notices(&self) -> impl Iterator<Item = &chart::Notice> {
        self.panels.iter().filter_map(Panel::as_notice)
    }
}

/// The choices available for each field of a [`Selection`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions<'a> {
    pub countries: Vec<&'a str>,
    pub years: YearRange,
    pub sectors: Vec<&'a str>,
    /// Activities per sector.
    pub activities: Map<&'a str, Vec<&'a str>>,
    pub dimensions: Vec<&'a str>,
    /// Indicator variables per dimension.
    pub variables: Map<&'a str, Vec<&'a str>>,
}
