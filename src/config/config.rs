use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::api::ApiConfig;
use super::logging::LoggingConfig;
use super::preferences::PreferencesConfig;
use super::routes::RoutesConfig;
use super::storage::StorageConfig;

/// Environment prefix; `__` separates nested keys (`LEDGERGUARD_API__BASE_URL`).
pub const ENV_PREFIX: &str = "LEDGERGUARD_";
/// Overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "LEDGERGUARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, Default)]
#[serde(default)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub routes: RoutesConfig,
    pub preferences: PreferencesConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn into_current(self) -> ConfigV1 {
        // handle configuration migration between versions here when necessary
        match self {
            Config::ConfigV1(c) => c,
        }
    }
}

fn extract(figment: Figment) -> Result<ConfigV1, figment::Error> {
    figment
        .join(("version", "1.0.0"))
        .extract::<Config>()
        .map(Config::into_current)
}

/// Load config from a YAML file, overlaid with `LEDGERGUARD_*` environment
/// variables. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigV1, figment::Error> {
    let env = Env::prefixed(ENV_PREFIX)
        .ignore(&["CONFIG"])
        .split("__");
    extract(Figment::new().merge(Yaml::file(path.as_ref())).merge(env))
}

/// Parse config from an in-memory YAML document, without environment overlay.
pub fn config_from_yaml(yaml: &str) -> Result<ConfigV1, figment::Error> {
    extract(Figment::new().merge(Yaml::string(yaml)))
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
