//! TOML-based configuration for semforge.
//!
//! Example configuration:
//! ```toml
//! [model]
//! name = "Sales"
//! culture = "en-US"
//! fact_table = "opportunity"
//! storage_mode = "direct_query"
//! utc_offset_hours = -5.0
//!
//! [connection]
//! type = "dataverse"
//! dataverse_url = "${DATAVERSE_URL}"
//!
//! [date]
//! start_year = 2020
//! end_year = 2030
//! utc_offset_hours = -5.0
//! table = "opportunity"
//! field = "createdon"
//!
//! [generation]
//! validate_sql = true
//! include_unchanged = false
//!
//! [generation.corrections]
//! new_customeryominame = "new_customername"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::AnalysisConfig;
use crate::model::{ConnectionType, DateTableConfig, StorageMode};
use crate::tmdl::{ColumnCorrections, GenerateOptions};

pub const CONFIG_FILE_NAME: &str = "semforge.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub model: ModelSettings,
    pub connection: ConnectionSettings,
    /// Calendar table; omitted when absent.
    pub date: Option<DateTableConfig>,
    pub generation: GenerationSettings,
}

/// Model-level settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub culture: String,
    /// Logical name of the fact table.
    pub fact_table: Option<String>,
    pub storage_mode: StorageMode,
    /// Local-calendar offset applied to view filters.
    pub utc_offset_hours: Option<f64>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "Semantic Model".to_string(),
            culture: "en-US".to_string(),
            fact_table: None,
            storage_mode: StorageMode::default(),
            utc_offset_hours: None,
        }
    }
}

/// Row-source connection. URL and endpoint values support `${VAR}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionSettings {
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub dataverse_url: String,
    pub fabric_endpoint: String,
    pub fabric_lakehouse: String,
}

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub validate_sql: bool,
    pub include_unchanged: bool,
    /// Extra advertised → queryable column corrections.
    pub corrections: BTreeMap<String, String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            validate_sql: true,
            include_unchanged: false,
            corrections: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        if let Some(date) = &settings.date {
            date.validate()
                .map_err(|e| SettingsError::InvalidConfig(e.to_string()))?;
        }
        if let Some(offset) = settings.model.utc_offset_hours {
            if !(-14.0..=14.0).contains(&offset) {
                return Err(SettingsError::InvalidConfig(format!(
                    "model.utc_offset_hours {} is outside -14..=14",
                    offset
                )));
            }
        }
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. `./semforge.toml`
    /// 2. `<user config dir>/semforge/semforge.toml`
    ///
    /// Falls back to defaults when neither exists.
    pub fn discover() -> Result<Self, SettingsError> {
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("semforge").join(CONFIG_FILE_NAME);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Generator options with connection values expanded.
    pub fn generate_options(&self) -> Result<GenerateOptions, SettingsError> {
        let mut corrections = ColumnCorrections::default();
        for (advertised, actual) in &self.generation.corrections {
            corrections.insert(advertised.clone(), actual.clone());
        }
        Ok(GenerateOptions {
            connection_type: self.connection.connection_type,
            storage_mode: self.model.storage_mode,
            dataverse_url: expand_env_vars(&self.connection.dataverse_url)?,
            fabric_sql_endpoint: expand_env_vars(&self.connection.fabric_endpoint)?,
            fabric_lakehouse: expand_env_vars(&self.connection.fabric_lakehouse)?,
            culture: self.model.culture.clone(),
            corrections,
            validate_sql: self.generation.validate_sql,
            utc_offset_hours: self.model.utc_offset_hours,
        })
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            storage_mode: self.model.storage_mode,
            fact_table: self.model.fact_table.clone(),
            include_unchanged: self.generation.include_unchanged,
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }
        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
