//! Selection of the records that match a user's filters.

use serde::{ser::SerializeSeq, Serialize};

use crate::{Dataset, Map, Record, Selection};

/// The records of a [`Dataset`] that satisfy a [`Selection`], in dataset
/// order.
///
/// A view borrows from its dataset and is cheap to recompute, so a new one is
/// produced for every selection rather than being updated in place. An empty
/// view is a perfectly valid result.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    /// Apply the given selection to the whole dataset.
    pub fn new(dataset: &'a Dataset, selection: &Selection) -> Self {
        Self {
            records: dataset.iter().filter(|r| selection.matches(r)).collect(),
        }
    }

    /// Apply the given selection to the records of this view.
    pub fn refine(&self, selection: &Selection) -> Self {
        self.retain(|r| selection.matches(r))
    }

    /// The sub-view holding only the records of the given indicator variable.
    pub fn for_variable(&self, variable: &str) -> Self {
        self.retain(|r| r.variable == variable)
    }

    fn retain<F: Fn(&Record) -> bool>(&self, predicate: F) -> Self {
        Self {
            records: self
                .records
                .iter()
                .copied()
                .filter(|r| predicate(r))
                .collect(),
        }
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The unit label of the given variable: the unit of the first record of
    /// that variable within this view.
    pub fn unit_for(&self, variable: &str) -> Option<&'a str> {
        self.iter()
            .find(|r| r.variable == variable)
            .map(|r| r.unit.as_str())
    }

    /// Maps every variable present in this view to its unit label, as
    /// resolved by [`FilteredView::unit_for`].
    pub fn units(&self) -> Map<&'a str, &'a str> {
        let mut units = Map::new();
        for record in self.iter() {
            units
                .entry(record.variable.as_str())
                .or_insert_with(|| record.unit.as_str());
        }
        units
    }

    /// For each distinct country, the record with the latest year. Where a
    /// country has several records for its latest year, the first one
    /// encountered wins. Results are ordered by country name.
    pub fn latest_per_country(&self) -> Vec<&'a Record> {
        let mut latest: Map<&'a str, &'a Record> = Map::new();
        for record in self.iter() {
            latest
                .entry(record.country.as_str())
                .and_modify(|current| {
                    if record.year > current.year {
                        *current = record;
                    }
                })
                .or_insert(record);
        }
        latest.into_values().collect()
    }
}

impl<'a> Serialize for FilteredView<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in &self.records {
            seq.serialize_element(record)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::YearRange;

    fn record(country: &str, year: i32, activity: &str, variable: &str, value: f64) -> Record {
        Record {
            country: country.to_string(),
            year,
            sector: "Mining".to_string(),
            activity: activity.to_string(),
            dimension: "Output".to_string(),
            variable: variable.to_string(),
            value: Some(value),
            value_usd: None,
            unit: "USD".to_string(),
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            record("Chile", 2019, "X", "A", 100.0),
            record("Chile", 2020, "X", "A", 120.0),
            record("Peru", 2020, "X", "A", 80.0),
            record("Peru", 2021, "Y", "A", 90.0),
            record("Bolivia", 2018, "X", "B", 10.0),
            record("Chile", 2017, "X", "A", 70.0),
        ])
        .unwrap()
    }

    fn selection() -> Selection {
        Selection::new(YearRange::new(2019, 2020).unwrap())
            .with_countries(vec!["Chile", "Peru"])
            .with_activities(vec!["X"])
            .with_variables(vec!["A"])
    }

    #[test]
    fn reference_example_keeps_all_three_records() {
        let dataset = dataset();
        let view = FilteredView::new(&dataset, &selection());
        let keys = view
            .iter()
            .map(|r| (r.country.as_str(), r.year))
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![("Chile", 2019), ("Chile", 2020), ("Peru", 2020)]);
    }

    #[test]
    fn every_record_satisfies_the_selection() {
        let dataset = dataset();
        let wide = Selection::new(YearRange::new(2000, 2030).unwrap())
            .with_countries(vec!["Chile", "Peru", "Bolivia"])
            .with_activities(vec!["X", "Y"])
            .with_variables(vec!["A"]);
        for sel in [selection(), wide] {
            let view = FilteredView::new(&dataset, &sel);
            assert!(view.iter().all(|r| sel.matches(r)));
            assert!(view
                .iter()
                .all(|r| dataset.iter().any(|d| std::ptr::eq(d, r))));
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let dataset = dataset();
        let sel = selection();
        let once = FilteredView::new(&dataset, &sel);
        assert_eq!(once.refine(&sel), once);
    }

    #[test]
    fn empty_countries_or_variables_yield_an_empty_view() {
        let dataset = dataset();
        let no_variables = selection().with_variables(Vec::<String>::new());
        assert!(FilteredView::new(&dataset, &no_variables).is_empty());
        let no_countries = selection().with_countries(Vec::<String>::new());
        assert!(FilteredView::new(&dataset, &no_countries).is_empty());
    }

    #[test]
    fn latest_per_country_picks_max_year() {
        let dataset = dataset();
        let view = FilteredView::new(&dataset, &selection());
        let latest = view
            .latest_per_country()
            .into_iter()
            .map(|r| (r.country.as_str(), r.year, r.value))
            .collect::<Vec<_>>();
        assert_eq!(
            latest,
            vec![("Chile", 2020, Some(120.0)), ("Peru", 2020, Some(80.0))]
        );
    }

    #[test]
    fn latest_per_country_keeps_first_on_ties() {
        let dataset = Dataset::new(vec![
            record("Chile", 2020, "X", "A", 1.0),
            record("Chile", 2020, "Y", "A", 2.0),
        ])
        .unwrap();
        let sel = selection().with_activities(vec!["X", "Y"]);
        let view = FilteredView::new(&dataset, &sel);
        let latest = view.latest_per_country();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].value, Some(1.0));
    }

    #[test]
    fn units_resolve_to_first_record() {
        let mut second = record("Peru", 2020, "X", "A", 1.0);
        second.unit = "EUR".to_string();
        let dataset = Dataset::new(vec![record("Chile", 2020, "X", "A", 1.0), second]).unwrap();
        let view = FilteredView::new(&dataset, &selection());
        assert_eq!(view.unit_for("A"), Some("USD"));
        assert_eq!(view.unit_for("B"), None);
        assert_eq!(view.units().get("A"), Some(&"USD"));
    }

    #[test]
    fn for_variable_narrows_the_view() {
        let dataset = dataset();
        let sel = selection().with_variables(vec!["A", "B"]).with_countries(vec![
            "Chile", "Peru", "Bolivia",
        ]);
        let view = FilteredView::new(
            &dataset,
            &sel.with_years(YearRange::new(2010, 2030).unwrap()),
        );
        assert_eq!(view.for_variable("B").len(), 1);
        assert!(view.for_variable("C").is_empty());
    }
}
