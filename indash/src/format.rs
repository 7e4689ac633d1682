//! File format detection for configuration and dataset files.

use std::{ffi::OsStr, path::Path, str::FromStr};

use crate::Error;

/// The supported file formats from which configuration and data can be
/// loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SupportedFormat {
    Json,
    Yaml,
    Toml,
    Csv,
    /// Any workbook format understood by `calamine` (xlsx, xlsm, xlsb, xls,
    /// ods).
    Workbook,
}

impl FromStr for SupportedFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Ok(match lower.as_ref() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            "csv" => Self::Csv,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::Workbook,
            _ => return Err(Error::UnsupportedFileType(s.to_string())),
        })
    }
}

impl SupportedFormat {
    /// Detects the format of the given file from its extension.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .ok_or_else(|| Error::CannotDetermineFileType(path.to_path_buf()))?;
        Self::from_str(ext)
    }

    /// Whether documents of this format can hold configuration.
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Json | Self::Yaml | Self::Toml)
    }
}
