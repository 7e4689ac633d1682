use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// One row of an indicator dataset: the measurement of a single indicator
/// variable for one country, year and economic activity.
///
/// Serializes using the dataset's own column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub country: String,
    pub year: i32,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "activityName")]
    pub activity: String,
    #[serde(rename = "Dimension")]
    pub dimension: String,
    #[serde(rename = "variableName")]
    pub variable: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(rename = "valueUSD", default)]
    pub value_usd: Option<f64>,
    /// Unit of measure label.
    #[serde(rename = "unidadMedida", default)]
    pub unit: String,
}

impl Record {
    /// The numeric value held in the given field, if any.
    pub fn get(&self, field: ValueField) -> Option<f64> {
        match field {
            ValueField::Value => self.value,
            ValueField::ValueUsd => self.value_usd,
        }
    }
}

/// Which numeric column a chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueField {
    #[serde(rename = "value")]
    Value,
    #[serde(rename = "valueUSD")]
    ValueUsd,
}

impl Default for ValueField {
    fn default() -> Self {
        Self::Value
    }
}

impl ValueField {
    /// The dataset column backing this field.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::ValueUsd => "valueUSD",
        }
    }
}

impl FromStr for ValueField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(Self::Value),
            "valueUSD" | "valueUsd" | "value_usd" => Ok(Self::ValueUsd),
            _ => Err(Error::UnknownValueField(s.to_string())),
        }
    }
}

impl std::fmt::Display for ValueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}
