use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Root of the CSV-backed store: one subdirectory per schema, one
    /// `<TABLE>.csv` file per table.
    #[serde(default = "StoreConfig::default_data_dir")]
    pub data_dir: PathBuf,
}

impl StoreConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("./data")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
        }
    }
}
