use crate::domain::error::DocError;
use crate::domain::model::ModelConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub database_path: Option<String>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub query_cache: QueryCacheConfig,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Level for the driver's own log target; falls back to `level`
    pub driver_level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QueryCacheConfig {
    #[serde(default = "default_enable")]
    pub enabled: bool,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: default_log_level(),
            driver_level: None,
        }
    }
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            theme: default_theme(),
            logging: Logging::default(),
            query_cache: QueryCacheConfig::default(),
            models: Vec::new(),
        }
    }
}

// Defaults
fn default_theme() -> String {
    "temp".to_string()
}
fn default_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "WARN".to_string()
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("docmap").join("config.toml"))
}

/// Database path from config, or ~/.config/docmap/docmap.db (Linux)
pub fn get_database_path(config: &Config) -> PathBuf {
    if let Some(path) = config.database_path.as_deref() {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docmap")
        .join("docmap.db")
}

pub fn parse_config(content: &str) -> Result<Config, DocError> {
    Ok(toml::from_str::<Config>(content)?)
}

/// Load a config file, falling back to defaults when it is missing or broken
pub fn load_config_from(path: &Path) -> Result<Config, DocError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    match parse_config(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to parse config file: {}. Using defaults.",
                e
            );
            Ok(Config::default())
        }
    }
}

pub fn load_config() -> Result<Config, DocError> {
    match get_config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

pub fn sample_config() -> Config {
    use crate::domain::model::FieldType;

    let person = ModelConfig::new("Person")
        .field("name", FieldType::String)
        .field("age", FieldType::Integer)
        .field("region", FieldType::String)
        .field_with_default("active", FieldType::Boolean, serde_json::Value::Bool(true))
        .shard_key(&["region"]);

    Config {
        models: vec![person],
        ..Config::default()
    }
}

pub fn generate_config_sample() -> Result<(), DocError> {
    let config_path = get_config_path();

    if let Some(path) = config_path {
        if path.exists() {
            eprintln!("Config file already exists at: {}", path.display());
            return Ok(());
        }

        // Create directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(&sample_config())
            .map_err(|e| DocError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, toml_content)
            .map_err(|e| DocError::Config(format!("Failed to write config file: {}", e)))?;
        println!("Generated config file at: {}", path.display());
    } else {
        return Err(DocError::Config(
            "Cannot determine config directory".to_string(),
        ));
    }

    Ok(())
}
