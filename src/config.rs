use serde::Deserialize;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{EtlError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "fleximart.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub etl: EtlConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub products_file: PathBuf,
    pub query_category: String,
    /// Exclusive upper bound for the category query
    pub max_price: f64,
    pub min_rating: f64,
    pub review_product_id: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            products_file: PathBuf::from("data/products_catalog.json"),
            query_category: "Electronics".to_string(),
            max_price: 50000.0,
            min_rating: 4.0,
            review_product_id: "ELEC001".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Read `path` as TOML, falling back to defaults when the file is absent,
    /// then apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                return Err(EtlError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                )))
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// `FLEXIMART_DATA_DIR`, `FLEXIMART_OUTPUT_DIR` and `FLEXIMART_LOG_DIR`
    /// take precedence over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("FLEXIMART_DATA_DIR") {
            self.etl.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("FLEXIMART_OUTPUT_DIR") {
            self.etl.output_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("FLEXIMART_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let paths = [
            ("etl.data_dir", &self.etl.data_dir),
            ("etl.output_dir", &self.etl.output_dir),
            ("catalog.products_file", &self.catalog.products_file),
            ("logging.log_dir", &self.logging.log_dir),
        ];
        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(EtlError::Config(format!("{} must not be empty", key)));
            }
        }
        if self.catalog.max_price.is_nan() || self.catalog.max_price <= 0.0 {
            return Err(EtlError::Config(format!(
                "catalog.max_price must be positive, got {}",
                self.catalog.max_price
            )));
        }
        if !(0.0..=5.0).contains(&self.catalog.min_rating) {
            return Err(EtlError::Config(format!(
                "catalog.min_rating must be between 0 and 5, got {}",
                self.catalog.min_rating
            )));
        }
        if self.catalog.query_category.trim().is_empty() || self.catalog.review_product_id.trim().is_empty() {
            return Err(EtlError::Config(
                "catalog.query_category and catalog.review_product_id must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
