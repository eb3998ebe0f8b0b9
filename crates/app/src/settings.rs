//! Settings for the `fueleu` binary.
//!
//! Values are read from an optional `settings.toml` and can be overridden with
//! `FUELEU_`-prefixed environment variables, nested keys separated by `__`
//! (e.g. `FUELEU_COMPLIANCE__TARGET_INTENSITY=89.34`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("fueleu.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Compliance {
    /// gCO2e/MJ.
    pub target_intensity: f64,
    /// Energy basis used when a computation does not name one.
    pub energy_mj: f64,
    pub store_timeout_ms: u64,
}

impl Default for Compliance {
    fn default() -> Self {
        Self {
            target_intensity: engine::REGULATORY_TARGET_2025,
            energy_mj: engine::DEFAULT_ENERGY_MJ,
            store_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub compliance: Compliance,
}

impl Settings {
    /// Load `path` (without extension, optional) and the environment.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("FUELEU")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        builder.build()?.try_deserialize()
    }
}
