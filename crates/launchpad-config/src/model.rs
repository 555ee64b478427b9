use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level launchpad configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment name, e.g. `development` or `production`.
    pub environment: String,
    pub migrations: MigrationsConfig,
    pub deploy: DeployConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            migrations: MigrationsConfig::default(),
            deploy: DeployConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory holding `.sql` and `.wasm` descriptors.
    pub source_dir: PathBuf,
    /// Newline-delimited record of executed descriptors.
    pub ledger_path: PathBuf,
    /// Name of the variable holding the data-store connection target.
    pub connection_env: String,
    /// Fuel budget for a single procedural `up` call.
    pub procedural_fuel: u64,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("migrations"),
            ledger_path: PathBuf::from(".migrations"),
            connection_env: "DATABASE_URL".to_string(),
            procedural_fuel: 10_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Variables every deployment needs.
    pub required_env: Vec<String>,
    /// Extra variables checked when the environment is `production`.
    pub production_env: Vec<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            required_env: ["APP_ENV", "PORT", "DATABASE_URL", "API_SECRET"]
                .into_iter()
                .map(String::from)
                .collect(),
            production_env: ["JWT_SECRET", "DATABASE_URL"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
