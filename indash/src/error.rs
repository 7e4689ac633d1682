use std::path::PathBuf;

use thiserror::Error;

/// The primary error type that can be produced by indash.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error {0}: {1}")]
    Io(String, std::io::Error),
    #[error("failed to load configuration from {0}")]
    FailedToLoadConfig(PathBuf),
    #[error("failed to load dataset from {0}")]
    FailedToLoadDataset(PathBuf),
    #[error("cannot determine file type of file: {0}")]
    CannotDetermineFileType(PathBuf),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("no sheet named \"{0}\" (available sheets: {1})")]
    MissingSheet(String, String),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("missing value column: expected at least one of \"value\" or \"valueUSD\"")]
    MissingValueColumn,
    #[error("invalid cell in row {row}, column \"{column}\": {reason}")]
    InvalidCell {
        row: usize,
        column: String,
        reason: String,
    },
    #[error("dataset contains no records")]
    EmptyDataset,
    #[error("invalid year range: {0} is greater than {1}")]
    InvalidYearRange(i32, i32),
    #[error("unknown render mode: {0}")]
    UnknownMode(String),
    #[error("unknown value field: {0}")]
    UnknownValueField(String),
    #[error("failed to compile template \"{0}\": {1}")]
    TemplateCompile(String, Box<handlebars::TemplateError>),
    #[error("failed to render template \"{0}\": {1}")]
    TemplateRender(String, handlebars::RenderError),
}
