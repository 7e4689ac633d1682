//! Configuration-related functionality for indash.
//!
//! A configuration file is a TOML, YAML or JSON document. Every recognized
//! option has its own default, so an empty document is a valid configuration.
//! Unrecognized keys are kept and remain reachable through [`Config::get`].

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{
    fs::{read_to_string, resolve_relative_to},
    Error, Map, SupportedFormat, ValueField,
};

/// Page layout of the rendered dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Wide,
    Centered,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wide => "wide",
            Self::Centered => "centered",
        }
    }
}

/// Colors applied to rendered charts and pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    #[serde(rename = "textColor")]
    pub text_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text_color: "#31333F".to_string(),
        }
    }
}

/// Settings for where the rendered page is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    #[serde(rename = "baseUrlPath")]
    pub base_url_path: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            base_url_path: "/".to_string(),
        }
    }
}

/// All recognized configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Title of the rendered page.
    pub page_title: String,
    /// Icon (usually an emoji) shown next to the page title.
    pub page_icon: String,
    pub layout: Layout,
    /// Heading displayed at the top of the page.
    pub header: String,
    /// Dataset location. Relative paths are resolved against the directory
    /// of the configuration file.
    pub data_path: PathBuf,
    /// Sheet to read when the dataset is a workbook.
    pub sheet: String,
    /// Sectors offered for selection.
    pub sectors: Vec<String>,
    /// Sector selected by default. Falls back to the first entry of
    /// `sectors`.
    pub default_sector: Option<String>,
    /// Numeric column that charts plot.
    pub value_field: ValueField,
    /// Country whose series is emphasized in indicator charts.
    pub highlight: Option<String>,
    pub highlight_color: String,
    /// Dimensions selected by default.
    pub default_dimensions: Vec<String>,
    /// Indicators selected by default, per sector.
    pub sector_indicators: Map<String, Vec<String>>,
    /// Display names for indicators in chart titles.
    pub indicator_labels: Map<String, String>,
    /// CSS file inlined into the rendered page.
    pub stylesheet: Option<PathBuf>,
    pub theme: Theme,
    pub server: Server,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            page_title: "Dashboard".to_string(),
            page_icon: "🌍".to_string(),
            layout: Layout::Wide,
            header: "INDICATORS: trends and predictions".to_string(),
            data_path: PathBuf::from("data_filt.xlsx"),
            sheet: "Sheet1".to_string(),
            sectors: strings(&["Mining", "Manufacturing"]),
            default_sector: None,
            value_field: ValueField::Value,
            highlight: None,
            highlight_color: "green".to_string(),
            default_dimensions: strings(&["Strategic", "Output", "Exports", "Investment"]),
            sector_indicators: Map::from([
                (
                    "Manufacturing".to_string(),
                    strings(&[
                        "Manufacturing value added (MVA) per capita",
                        "MVA annual growth rate",
                        "Manufactured exports per employee",
                        "Total investment as a percentage of GDP",
                    ]),
                ),
                (
                    "Mining".to_string(),
                    strings(&[
                        "Total investment as a percentage of GDP",
                        "Index of industrial production",
                    ]),
                ),
            ]),
            indicator_labels: Map::from_iter(
                [
                    (
                        "MVA (Manufacturing Value Added), constant 2015 USD",
                        "Manufacturing value added(MVA), constant 2015 USD",
                    ),
                    ("MVA Growth Rate", "MVA annual growth rate (%)"),
                    (
                        "Manufactured Exports per Employee",
                        "Exports per employee",
                    ),
                ]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
            ),
            stylesheet: None,
            theme: Theme::default(),
            server: Server::default(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Dashboard configuration: the raw settings document together with the
/// options parsed from it.
#[derive(Debug, Clone)]
pub struct Config {
    raw: JsonValue,
    options: Options,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw: JsonValue::Object(JsonMap::new()),
            options: Options::default(),
        }
    }
}

impl Config {
    /// Load the configuration from the given file.
    ///
    /// A missing, unreadable, malformed or invalid file is an error: no
    /// partial configuration is ever returned. Relative `data_path` and
    /// `stylesheet` values are resolved against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Attempting to load config file: {}", path.display());
        let mut config = Self::load_inner(path)
            .wrap_err_with(|| Error::FailedToLoadConfig(path.to_path_buf()))?;
        config.options.data_path = resolve_relative_to(path, &config.options.data_path);
        config.options.stylesheet = config
            .options
            .stylesheet
            .as_ref()
            .map(|p| resolve_relative_to(path, p));
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn load_inner(path: &Path) -> Result<Self, Error> {
        let fmt = SupportedFormat::detect(path)?;
        if !fmt.is_document() {
            return Err(Error::UnsupportedFileType(path.display().to_string()));
        }
        let content = read_to_string(path)?;
        Self::parse(fmt, &content)
    }

    /// Parse a configuration document of the given format.
    pub fn parse(fmt: SupportedFormat, content: &str) -> Result<Self, Error> {
        let raw = match fmt {
            SupportedFormat::Json => serde_json::from_str::<JsonValue>(content)?,
            SupportedFormat::Yaml => serde_yaml::from_str::<JsonValue>(content)?,
            SupportedFormat::Toml => toml::from_str::<JsonValue>(content)?,
            _ => return Err(Error::UnsupportedFileType(format!("{:?}", fmt))),
        };
        Self::from_raw(raw)
    }

    fn from_raw(raw: JsonValue) -> Result<Self, Error> {
        let raw = match raw {
            // An empty YAML document parses as null.
            JsonValue::Null => JsonValue::Object(JsonMap::new()),
            JsonValue::Object(_) => raw,
            _ => {
                return Err(Error::InvalidConfig(
                    "top level of the configuration must be a table".to_string(),
                ))
            }
        };
        let options = serde_json::from_value::<Options>(raw.clone())?;
        validate(&options)?;
        Ok(Self { raw, options })
    }

    /// Convenience method for constructing a configuration object. The key
    /// may be a dotted path (e.g. `theme.textColor`).
    pub fn with<K, V>(mut self, key: K, value: V) -> Result<Self, Error>
    where
        K: AsRef<str>,
        V: Serialize,
    {
        let value = serde_json::to_value(value)?;
        let mut parts = key.as_ref().split('.').peekable();
        let mut node = &mut self.raw;
        while let Some(part) = parts.next() {
            if !node.is_object() {
                *node = JsonValue::Object(JsonMap::new());
            }
            // SAFETY: we just ensured that the node is an object.
            let obj = node.as_object_mut().unwrap();
            if parts.peek().is_none() {
                obj.insert(part.to_string(), value);
                break;
            }
            node = obj
                .entry(part.to_string())
                .or_insert_with(|| JsonValue::Object(JsonMap::new()));
        }
        Self::from_raw(self.raw)
    }

    /// Look up the value at the given dotted key path, deserializing it into
    /// the caller's type. Returns `default` if the key is absent or its value
    /// has a different shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let mut node = &self.raw;
        for part in key.split('.') {
            match node.get(part) {
                Some(next) => node = next,
                None => return default,
            }
        }
        serde_json::from_value(node.clone()).unwrap_or(default)
    }

    /// The parsed configuration options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The sector selected when the user has not chosen one.
    pub fn default_sector(&self) -> &str {
        self.options
            .default_sector
            .as_deref()
            // Validation guarantees at least one sector.
            .unwrap_or_else(|| self.options.sectors[0].as_str())
    }
}

fn validate(options: &Options) -> Result<(), Error> {
    if options.sectors.is_empty() {
        return Err(Error::InvalidConfig(
            "\"sectors\" must list at least one sector".to_string(),
        ));
    }
    if options.data_path.as_os_str().is_empty() {
        return Err(Error::InvalidConfig("\"data_path\" must not be empty".to_string()));
    }
    if options.sheet.is_empty() {
        return Err(Error::InvalidConfig("\"sheet\" must not be empty".to_string()));
    }
    if let Some(sector) = &options.default_sector {
        if !options.sectors.contains(sector) {
            return Err(Error::InvalidConfig(format!(
                "default sector \"{}\" is not one of the configured sectors",
                sector
            )));
        }
    }
    Ok(())
}
