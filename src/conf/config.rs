use config::Config as CConfig;
use serde::{Deserialize, Serialize};

use crate::conf::{ServerConfig, StoreConfig};
use crate::core::TabulaError::{self, ConfigParsingError};

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, TabulaError> {
        let config = CConfig::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Config, TabulaError> {
        let toml_str = std::fs::read_to_string(path)
            .map_err(|e| ConfigParsingError(format!("reading {path}: {e}")))?;
        Config::from_str(&toml_str)
    }
}
