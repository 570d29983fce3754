use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "lcia";
const ENV_PREFIX: &str = "LCIA";

/// Paths and knobs shared by every subcommand.
///
/// Layered as: built-in defaults, then `lcia.toml` if present, then `LCIA_*`
/// environment variables (e.g. `LCIA_JSON_DIR=other/json`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub json_dir: PathBuf,
    pub output_file: PathBuf,
    pub compressed_dir: PathBuf,
    pub list_file: PathBuf,
    pub order_file: PathBuf,
    /// Extraction worker threads; 0 lets rayon decide.
    pub threads: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .set_default("json_dir", "data/json")?
            .set_default("output_file", "data/flow_factors.json")?
            .set_default("compressed_dir", "data/json_compressed")?
            .set_default("list_file", "data/list.json")?
            .set_default("order_file", "data/list_order.txt")?
            .set_default("threads", 0)?
            .build()
            .context("Failed to assemble settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    /// Path of the gzip copy written next to the merged output.
    pub fn compressed_output_file(&self) -> PathBuf {
        let mut name = self.output_file.clone().into_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }
}
