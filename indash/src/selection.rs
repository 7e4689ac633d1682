//! The user's current filter state.

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::Serialize;

use crate::{Config, Dataset, Error, Mode, Record};

/// Maximum number of dimensions and indicator variables that can be selected
/// at once.
pub const MAX_SELECTED: usize = 4;

/// An inclusive range of years, where `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct YearRange {
    min: i32,
    max: i32,
}

impl YearRange {
    /// Constructor. Fails if `min` is greater than `max`.
    pub fn new(min: i32, max: i32) -> Result<Self, Error> {
        if min > max {
            return Err(Error::InvalidYearRange(min, max));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }

    /// Restrict this range to lie within `bounds`. A range entirely outside
    /// the bounds collapses onto the nearest bound.
    pub fn clamp_to(&self, bounds: YearRange) -> Self {
        let min = self.min.clamp(bounds.min, bounds.max);
        let max = self.max.clamp(bounds.min, bounds.max);
        Self { min, max }
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// The set of filter values chosen by the user.
///
/// Dimensions and variables are capped at [`MAX_SELECTED`] entries: anything
/// beyond that is dropped when the list is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    countries: BTreeSet<String>,
    years: YearRange,
    sector: String,
    activities: Vec<String>,
    dimensions: Vec<String>,
    variables: Vec<String>,
}

impl Selection {
    /// Constructor for a selection over the given years, with everything else
    /// left empty.
    pub fn new(years: YearRange) -> Self {
        Self {
            countries: BTreeSet::new(),
            years,
            sector: String::new(),
            activities: Vec::new(),
            dimensions: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// The selection a user starts with before touching any control.
    ///
    /// All countries and the full year range are selected. The sector comes
    /// from the configuration and its first activity is chosen, along with
    /// the configured default dimensions that exist in the dataset. Variables
    /// are then chosen by [`Selection::with_default_variables`].
    pub fn defaults(dataset: &Dataset, config: &Config, mode: Mode) -> Self {
        let sector = config.default_sector().to_string();
        let activities = dataset
            .activities_for_sector(&sector)
            .into_iter()
            .take(1)
            .map(String::from)
            .collect::<Vec<String>>();
        let available_dimensions = dataset.dimensions();
        let dimensions = config
            .options()
            .default_dimensions
            .iter()
            .filter(|d| available_dimensions.contains(&d.as_str()))
            .cloned()
            .collect::<Vec<String>>();
        let selection = Self::new(dataset.year_bounds())
            .with_countries(dataset.countries())
            .with_sector(sector)
            .with_activities(activities)
            .with_dimensions(dimensions)
            .with_default_variables(dataset, config, mode);
        debug!("Default selection: {:?}", selection);
        selection
    }

    /// Replace the selected variables with the defaults for this selection's
    /// sector and dimensions.
    ///
    /// In [`Mode::Overview`] this is the first indicator variable of the
    /// dataset. In [`Mode::Indicators`] it is the sector's configured
    /// indicators that belong to one of the selected dimensions, which is
    /// nothing when no dimension is selected.
    pub fn with_default_variables(self, dataset: &Dataset, config: &Config, mode: Mode) -> Self {
        let variables: Vec<String> = match mode {
            Mode::Overview => dataset
                .variables()
                .into_iter()
                .take(1)
                .map(String::from)
                .collect(),
            Mode::Indicators => {
                let available = dataset.variables_for_dimensions(&self.dimensions);
                config
                    .options()
                    .sector_indicators
                    .get(&self.sector)
                    .map(|defaults| {
                        defaults
                            .iter()
                            .filter(|v| available.contains(&v.as_str()))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default()
            }
        };
        self.with_variables(variables)
    }

    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = countries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn with_sector<S: Into<String>>(mut self, sector: S) -> Self {
        self.sector = sector.into();
        self
    }

    pub fn with_activities<I, S>(mut self, activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activities = dedup(activities);
        self
    }

    /// Set the selected dimensions, keeping at most [`MAX_SELECTED`].
    pub fn with_dimensions<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions = capped("dimensions", dedup(dimensions));
        self
    }

    /// Set the selected indicator variables, keeping at most
    /// [`MAX_SELECTED`].
    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = capped("variables", dedup(variables));
        self
    }

    /// Clamp the year range into the dataset's observed bounds.
    pub fn clamped_to(mut self, dataset: &Dataset) -> Self {
        let clamped = self.years.clamp_to(dataset.year_bounds());
        if clamped != self.years {
            warn!(
                "Year range {} lies outside the dataset's years {}, using {}",
                self.years,
                dataset.year_bounds(),
                clamped
            );
        }
        self.years = clamped;
        self
    }

    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }

    pub fn activities(&self) -> &[String] {
        &self.activities
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Whether the given record satisfies every clause of this selection:
    /// country membership, year bounds, activity membership and variable
    /// membership.
    pub fn matches(&self, record: &Record) -> bool {
        self.countries.contains(&record.country)
            && self.years.contains(record.year)
            && self.activities.iter().any(|a| *a == record.activity)
            && self.variables.iter().any(|v| *v == record.variable)
    }
}

fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.into();
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn capped(what: &str, mut items: Vec<String>) -> Vec<String> {
    if items.len() > MAX_SELECTED {
        warn!(
            "At most {} {} can be selected, ignoring: {}",
            MAX_SELECTED,
            what,
            items[MAX_SELECTED..].join(", ")
        );
        items.truncate(MAX_SELECTED);
    }
    items
}
