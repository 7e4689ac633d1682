//! Loading of indicator datasets into memory.
//!
//! A dataset is read once from a workbook sheet, a CSV file or a JSON array of
//! records and is never modified afterwards.

use std::{collections::HashSet, io::Read, path::Path};

use calamine::{open_workbook_auto, Data, Reader};
use eyre::{Result, WrapErr};
use log::debug;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{fs::read_to_string, Error, Record, SupportedFormat, YearRange};

const COUNTRY: &str = "country";
const YEAR: &str = "year";
const SECTOR: &str = "Sector";
const ACTIVITY: &str = "activityName";
const DIMENSION: &str = "Dimension";
const VARIABLE: &str = "variableName";
const VALUE: &str = "value";
const VALUE_USD: &str = "valueUSD";
const UNIT: &str = "unidadMedida";

/// An immutable, ordered collection of [`Record`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    years: YearRange,
}

impl Dataset {
    /// Constructor. Fails if there are no records, since an empty dataset has
    /// no year bounds to select from.
    pub fn new(records: Vec<Record>) -> Result<Self, Error> {
        let min = records.iter().map(|r| r.year).min();
        let max = records.iter().map(|r| r.year).max();
        match (min, max) {
            (Some(min), Some(max)) => Ok(Self {
                records,
                years: YearRange::new(min, max)?,
            }),
            _ => Err(Error::EmptyDataset),
        }
    }

    /// Load a dataset from the given file, detecting its format from the file
    /// extension. `sheet` names the sheet to read if the file is a workbook.
    pub fn load<P: AsRef<Path>>(path: P, sheet: &str) -> Result<Self> {
        let path = path.as_ref();
        debug!("Attempting to load dataset from: {}", path.display());
        let dataset = Self::load_inner(path, sheet)
            .wrap_err_with(|| Error::FailedToLoadDataset(path.to_path_buf()))?;
        debug!(
            "Loaded {} records from {} (years {}..={})",
            dataset.len(),
            path.display(),
            dataset.years.min(),
            dataset.years.max(),
        );
        Ok(dataset)
    }

    fn load_inner(path: &Path, sheet: &str) -> Result<Self, Error> {
        match SupportedFormat::detect(path)? {
            SupportedFormat::Workbook => Self::from_workbook(path, sheet),
            SupportedFormat::Csv => {
                let file = std::fs::File::open(path).map_err(|e| {
                    Error::Io(format!("while trying to open {}", path.display()), e)
                })?;
                Self::from_csv_reader(file)
            }
            SupportedFormat::Json => Self::from_json_str(&read_to_string(path)?),
            fmt => Err(Error::UnsupportedFileType(format!("{:?}", fmt))),
        }
    }

    fn from_workbook(path: &Path, sheet: &str) -> Result<Self, Error> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet_names = workbook.sheet_names();
        if !sheet_names.iter().any(|name| name == sheet) {
            return Err(Error::MissingSheet(sheet.to_string(), sheet_names.join(", ")));
        }
        let range = workbook.worksheet_range(sheet)?;
        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default();
        let rows: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(Cell::from).collect()).collect();
        Self::from_table(Table { headers, rows })
    }

    /// Read a dataset from CSV data with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(Cell::from_text).collect());
        }
        Self::from_table(Table { headers, rows })
    }

    /// Read a dataset from a JSON array of records keyed by column name.
    ///
    /// Objects are checked for the same columns as any other table: keys
    /// missing from an object are treated as blank cells.
    pub fn from_json_str(content: &str) -> Result<Self, Error> {
        let objects = serde_json::from_str::<Vec<JsonMap<String, JsonValue>>>(content)?;
        let mut headers: Vec<String> = Vec::new();
        for key in objects.iter().flat_map(|object| object.keys()) {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        let rows: Vec<Vec<Cell>> = objects
            .iter()
            .map(|object| {
                headers
                    .iter()
                    .map(|h| object.get(h).map(Cell::from).unwrap_or(Cell::Empty))
                    .collect()
            })
            .collect();
        Self::from_table(Table { headers, rows })
    }

    fn from_table(table: Table) -> Result<Self, Error> {
        let columns = Columns::locate(&table.headers)?;
        let records = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().all(Cell::is_empty))
            // Row numbers are 1-based and account for the header row.
            .map(|(i, row)| columns.record(i + 2, row))
            .collect::<Result<Vec<Record>, Error>>()?;
        Self::new(records)
    }

    /// All records, in their original order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The smallest and largest years observed in the dataset.
    pub fn year_bounds(&self) -> YearRange {
        self.years
    }

    /// Distinct countries, in order of first appearance.
    pub fn countries(&self) -> Vec<&str> {
        unique(self.records.iter().map(|r| r.country.as_str()))
    }

    /// Distinct activities belonging to the given sector, in order of first
    /// appearance.
    pub fn activities_for_sector(&self, sector: &str) -> Vec<&str> {
        unique(
            self.records
                .iter()
                .filter(|r| r.sector == sector)
                .map(|r| r.activity.as_str()),
        )
    }

    /// Distinct indicator dimensions.
    pub fn dimensions(&self) -> Vec<&str> {
        unique(self.records.iter().map(|r| r.dimension.as_str()))
    }

    /// Distinct indicator variables.
    pub fn variables(&self) -> Vec<&str> {
        unique(self.records.iter().map(|r| r.variable.as_str()))
    }

    /// Distinct indicator variables belonging to any of the given dimensions.
    pub fn variables_for_dimensions<S: AsRef<str>>(&self, dimensions: &[S]) -> Vec<&str> {
        unique(
            self.records
                .iter()
                .filter(|r| dimensions.iter().any(|d| d.as_ref() == r.dimension))
                .map(|r| r.variable.as_str()),
        )
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn unique<'a, I: Iterator<Item = &'a str>>(iter: I) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    iter.filter(|s| seen.insert(*s)).collect()
}

/// Raw tabular data as read from a sheet or CSV file, before typing.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// A single untyped cell.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::Bool(b) => Self::Bool(*b),
            Data::Int(i) => Self::Int(*i),
            Data::Float(f) => Self::Float(*f),
            Data::String(s) => Self::from_text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&JsonValue> for Cell {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Empty,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Empty),
            },
            JsonValue::String(s) => Self::from_text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

impl Cell {
    fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    fn number(&self) -> Result<Option<f64>, String> {
        match self {
            Self::Empty => Ok(None),
            Self::Int(i) => Ok(Some(*i as f64)),
            Self::Float(f) => Ok(Some(*f)),
            Self::Text(s) => s
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("expected a number, but got \"{}\"", s)),
            Self::Bool(b) => Err(format!("expected a number, but got {}", b)),
        }
    }

    fn year(&self) -> Result<Option<i32>, String> {
        match self.number()? {
            None => Ok(None),
            Some(f) if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 => {
                Ok(Some(f as i32))
            }
            Some(f) => Err(format!("expected a whole year, but got {}", f)),
        }
    }
}

/// Positions of the dataset's columns within a table's header row.
struct Columns {
    country: usize,
    year: usize,
    sector: usize,
    activity: usize,
    dimension: usize,
    variable: usize,
    unit: usize,
    value: Option<usize>,
    value_usd: Option<usize>,
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self, Error> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| Error::MissingColumn(name.to_string()))
        };
        let country = required(COUNTRY)?;
        let year = required(YEAR)?;
        let sector = required(SECTOR)?;
        let activity = required(ACTIVITY)?;
        let dimension = required(DIMENSION)?;
        let variable = required(VARIABLE)?;
        let unit = required(UNIT)?;
        let value = find(VALUE);
        let value_usd = find(VALUE_USD);
        if value.is_none() && value_usd.is_none() {
            return Err(Error::MissingValueColumn);
        }
        Ok(Self {
            country,
            year,
            sector,
            activity,
            dimension,
            variable,
            unit,
            value,
            value_usd,
        })
    }

    fn record(&self, row_number: usize, row: &[Cell]) -> Result<Record, Error> {
        let cell = |idx: usize| row.get(idx).unwrap_or(&Cell::Empty);
        let invalid = |column: &str, reason: String| Error::InvalidCell {
            row: row_number,
            column: column.to_string(),
            reason,
        };
        let key = |idx: usize, column: &str| {
            cell(idx)
                .text()
                .ok_or_else(|| invalid(column, "value is missing".to_string()))
        };
        let number = |idx: Option<usize>, column: &str| match idx {
            Some(idx) => cell(idx).number().map_err(|reason| invalid(column, reason)),
            None => Ok(None),
        };
        Ok(Record {
            country: key(self.country, COUNTRY)?,
            year: cell(self.year)
                .year()
                .map_err(|reason| invalid(YEAR, reason))?
                .ok_or_else(|| invalid(YEAR, "value is missing".to_string()))?,
            sector: key(self.sector, SECTOR)?,
            activity: key(self.activity, ACTIVITY)?,
            dimension: key(self.dimension, DIMENSION)?,
            variable: key(self.variable, VARIABLE)?,
            value: number(self.value, VALUE)?,
            value_usd: number(self.value_usd, VALUE_USD)?,
            unit: cell(self.unit).text().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CSV: &str = "\
country,year,Sector,activityName,Dimension,variableName,value,valueUSD,unidadMedida
Chile,2019,Mining,Copper,Output,Index of industrial production,100,,Index
Chile,2020,Mining,Copper,Output,Index of industrial production,120,,Index
Peru,2020,Mining,Gold,Exports,Exports per employee,,80.5,USD
Peru,2018,Manufacturing,Textiles,Output,Index of industrial production,95,,Index
";

    #[test]
    fn loads_csv_with_typed_columns() {
        let dataset = Dataset::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 4);
        let peru = &dataset.records()[2];
        assert_eq!(peru.country, "Peru");
        assert_eq!(peru.year, 2020);
        assert_eq!(peru.value, None);
        assert_eq!(peru.value_usd, Some(80.5));
        assert_eq!(peru.unit, "USD");
        assert_eq!(dataset.year_bounds(), YearRange::new(2018, 2020).unwrap());
    }

    #[test]
    fn option_lookups_preserve_first_appearance() {
        let dataset = Dataset::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(dataset.countries(), vec!["Chile", "Peru"]);
        assert_eq!(
            dataset.activities_for_sector("Mining"),
            vec!["Copper", "Gold"]
        );
        assert_eq!(dataset.activities_for_sector("Energy"), Vec::<&str>::new());
        assert_eq!(dataset.dimensions(), vec!["Output", "Exports"]);
        assert_eq!(
            dataset.variables_for_dimensions(&["Exports"]),
            vec!["Exports per employee"]
        );
        assert_eq!(dataset.variables().len(), 2);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv = "country,year,Sector,activityName,variableName,value,unidadMedida\n";
        assert!(matches!(
            Dataset::from_csv_reader(csv.as_bytes()),
            Err(Error::MissingColumn(c)) if c == "Dimension"
        ));
    }

    #[test]
    fn at_least_one_value_column_is_required() {
        let csv = "country,year,Sector,activityName,Dimension,variableName,unidadMedida\n";
        assert!(matches!(
            Dataset::from_csv_reader(csv.as_bytes()),
            Err(Error::MissingValueColumn)
        ));
    }

    #[test]
    fn blank_key_cells_report_their_position() {
        let csv = "\
country,year,Sector,activityName,Dimension,variableName,value,unidadMedida
Chile,2019,Mining,Copper,Output,Index,1,Index
,2019,Mining,Copper,Output,Index,1,Index
";
        match Dataset::from_csv_reader(csv.as_bytes()) {
            Err(Error::InvalidCell { row, column, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "country");
            }
            other => panic!("expected an invalid cell error, but got {:?}", other),
        }
    }

    #[test]
    fn fractional_years_are_rejected() {
        let csv = "\
country,year,Sector,activityName,Dimension,variableName,value,unidadMedida
Chile,2019.5,Mining,Copper,Output,Index,1,Index
";
        assert!(matches!(
            Dataset::from_csv_reader(csv.as_bytes()),
            Err(Error::InvalidCell { .. })
        ));
    }

    #[test]
    fn header_only_file_is_an_empty_dataset() {
        let csv = "country,year,Sector,activityName,Dimension,variableName,value,unidadMedida\n";
        assert!(matches!(
            Dataset::from_csv_reader(csv.as_bytes()),
            Err(Error::EmptyDataset)
        ));
    }

    #[test]
    fn workbook_cells_convert_to_typed_values() {
        assert_eq!(Cell::from(&Data::Float(2019.0)).year().unwrap(), Some(2019));
        assert_eq!(Cell::from(&Data::Int(7)).number().unwrap(), Some(7.0));
        assert_eq!(Cell::from(&Data::String("  ".to_string())), Cell::Empty);
        assert_eq!(Cell::from(&Data::Empty).text(), None);
        assert_eq!(Cell::Float(3.0).text().as_deref(), Some("3"));
    }

    #[test]
    fn loads_json_records() {
        let dataset = Dataset::from_json_str(
            r#"[{"country": "Chile", "year": 2020, "Sector": "Mining",
                 "activityName": "Copper", "Dimension": "Output",
                 "variableName": "A", "value": 1.5, "unidadMedida": "USD"}]"#,
        )
        .unwrap();
        assert_eq!(dataset.records()[0].value, Some(1.5));
    }

    #[test]
    fn json_records_need_the_same_columns_as_tables() {
        let no_unit = r#"[{"country": "Chile", "year": 2020, "Sector": "Mining",
                           "activityName": "Copper", "Dimension": "Output",
                           "variableName": "A", "value": 1.5}]"#;
        assert!(matches!(
            Dataset::from_json_str(no_unit),
            Err(Error::MissingColumn(c)) if c == "unidadMedida"
        ));
        let no_value = r#"[{"country": "Chile", "year": 2020, "Sector": "Mining",
                            "activityName": "Copper", "Dimension": "Output",
                            "variableName": "A", "unidadMedida": "USD"}]"#;
        assert!(matches!(
            Dataset::from_json_str(no_value),
            Err(Error::MissingValueColumn)
        ));
    }

    #[test]
    fn json_keys_missing_from_one_object_are_blank_cells() {
        let dataset = Dataset::from_json_str(
            r#"[{"country": "Chile", "year": "2019", "Sector": "Mining",
                 "activityName": "Copper", "Dimension": "Output",
                 "variableName": "A", "value": 1, "unidadMedida": "USD"},
                {"country": "Peru", "year": 2020, "Sector": "Mining",
                 "activityName": "Copper", "Dimension": "Output",
                 "variableName": "A", "valueUSD": 2.5, "unidadMedida": null}]"#,
        )
        .unwrap();
        let records = dataset.records();
        assert_eq!(records[0].year, 2019);
        assert_eq!(records[0].value_usd, None);
        assert_eq!(records[1].value, None);
        assert_eq!(records[1].value_usd, Some(2.5));
        assert_eq!(records[1].unit, "");
        assert!(matches!(
            Dataset::from_json_str(r#"[{"country": "Chile"}, {"year": 2020}]"#),
            Err(Error::MissingColumn(_))
        ));
    }

    fn workbook_fixture() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/indicators.xlsx")
    }

    #[test]
    fn loads_workbook_sheet() {
        let dataset = Dataset::load(workbook_fixture(), "Indicators").unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.countries(), vec!["Chile", "Peru"]);
        assert_eq!(dataset.year_bounds(), YearRange::new(2019, 2020).unwrap());
        let chile = &dataset.records()[1];
        assert_eq!(chile.variable, "Index of industrial production");
        assert_eq!(chile.value, Some(120.5));
        assert_eq!(chile.value_usd, None);
        let peru = &dataset.records()[2];
        assert_eq!(peru.value, None);
        assert_eq!(peru.value_usd, Some(80000.0));
        assert_eq!(peru.unit, "USD");
    }

    #[test]
    fn missing_sheet_is_fatal() {
        let err = Dataset::from_workbook(&workbook_fixture(), "Sheet1").unwrap_err();
        assert!(matches!(
            &err,
            Error::MissingSheet(sheet, available) if sheet == "Sheet1" && available == "Indicators"
        ));
        let err = Dataset::load(workbook_fixture(), "Sheet1").unwrap_err();
        assert!(err.to_string().contains("failed to load dataset"));
    }

    #[test]
    fn missing_file_is_fatal() {
        let path = std::env::temp_dir().join("indash-does-not-exist/data.csv");
        let err = Dataset::load(&path, "Sheet1").unwrap_err();
        assert!(err.to_string().contains("failed to load dataset"));
    }
}
