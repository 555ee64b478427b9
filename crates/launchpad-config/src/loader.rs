use std::path::{Path, PathBuf};

use launchpad_common::{Error, Result};
use tracing::{debug, info};

use crate::env::EnvSource;
use crate::model::AppConfig;

/// Candidate file names tried in the working directory, in order.
const DEFAULT_FILES: &[&str] = &["launchpad.yml", "launchpad.yaml", "launchpad.toml"];

/// Loads `AppConfig` from a YAML or TOML file and overlays environment
/// overrides on top.
pub struct ConfigLoader<'a> {
    env: &'a dyn EnvSource,
    base_dir: PathBuf,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(env: &'a dyn EnvSource) -> Self {
        Self {
            env,
            base_dir: PathBuf::from("."),
        }
    }

    /// Directory searched for the default config file names.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Load from `path` if given, else from the first default file that
    /// exists, else start from defaults. Environment overrides always apply.
    pub fn load(&self, path: Option<&Path>) -> Result<AppConfig> {
        let mut config = match path {
            Some(p) => parse_file(p)?,
            None => match self.find_default() {
                Some(p) => parse_file(&p)?,
                None => {
                    debug!("no config file found, using defaults");
                    AppConfig::default()
                }
            },
        };
        self.apply_env(&mut config);
        Ok(config)
    }

    fn find_default(&self) -> Option<PathBuf> {
        DEFAULT_FILES
            .iter()
            .map(|name| self.base_dir.join(name))
            .find(|p| p.is_file())
    }

    fn apply_env(&self, config: &mut AppConfig) {
        // APP_ENV is also a required deploy variable, so it decides production too.
        if let Some(environment) = self
            .env
            .var("LAUNCHPAD_ENV")
            .or_else(|| self.env.var("APP_ENV"))
        {
            config.environment = environment;
        }
        if let Some(dir) = self.env.var("LAUNCHPAD_MIGRATIONS_DIR") {
            config.migrations.source_dir = PathBuf::from(dir);
        }
        if let Some(ledger) = self.env.var("LAUNCHPAD_LEDGER") {
            config.migrations.ledger_path = PathBuf::from(ledger);
        }
    }
}

fn parse_file(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config: AppConfig = match ext {
        "yml" | "yaml" => serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("YAML parse error in {}: {e}", path.display())))?,
        "toml" => toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("TOML parse error in {}: {e}", path.display())))?,
        other => {
            return Err(Error::Config(format!(
                "unsupported config extension: {other}"
            )));
        }
    };

    info!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn falls_back_to_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let env = no_env();
        let config = ConfigLoader::new(&env)
            .with_base_dir(dir.path())
            .load(None)
            .unwrap();
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn picks_up_default_toml_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("launchpad.toml"),
            "environment = \"staging\"\n[migrations]\nledger_path = \"state/ledger\"\n",
        )
        .unwrap();

        let env = no_env();
        let config = ConfigLoader::new(&env)
            .with_base_dir(dir.path())
            .load(None)
            .unwrap();
        assert_eq!(config.environment, "staging");
        assert_eq!(config.migrations.ledger_path, PathBuf::from("state/ledger"));
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(&path, "environment: staging\n").unwrap();

        let env: HashMap<String, String> = [
            ("LAUNCHPAD_ENV".to_string(), "production".to_string()),
            ("LAUNCHPAD_MIGRATIONS_DIR".to_string(), "db".to_string()),
        ]
        .into_iter()
        .collect();
        let config = ConfigLoader::new(&env).load(Some(path.as_path())).unwrap();
        assert!(config.is_production());
        assert_eq!(config.migrations.source_dir, PathBuf::from("db"));
    }

    #[test]
    fn app_env_sets_environment_when_launchpad_env_is_absent() {
        let dir = TempDir::new().unwrap();
        let env: HashMap<String, String> = [("APP_ENV".to_string(), "production".to_string())]
            .into_iter()
            .collect();
        let config = ConfigLoader::new(&env)
            .with_base_dir(dir.path())
            .load(None)
            .unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn launchpad_env_wins_over_app_env() {
        let dir = TempDir::new().unwrap();
        let env: HashMap<String, String> = [
            ("APP_ENV".to_string(), "production".to_string()),
            ("LAUNCHPAD_ENV".to_string(), "staging".to_string()),
        ]
        .into_iter()
        .collect();
        let config = ConfigLoader::new(&env)
            .with_base_dir(dir.path())
            .load(None)
            .unwrap();
        assert_eq!(config.environment, "staging");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("launchpad.ini");
        std::fs::write(&path, "environment=x").unwrap();

        let env = no_env();
        let err = ConfigLoader::new(&env).load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("unsupported config extension: ini"));
    }

    #[test]
    fn reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("launchpad.yml");
        std::fs::write(&path, "migrations: [not, a, map]\n").unwrap();

        let env = no_env();
        let err = ConfigLoader::new(&env).load(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("YAML parse error"));
    }
}
