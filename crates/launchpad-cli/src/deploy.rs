use launchpad_common::{Error, Result};
use launchpad_config::{AppConfig, EnvSource};
use launchpad_migrate::{MigrationEngine, RunReport};
use tracing::{error, info};

/// Deployment orchestration: environment preflight followed by exactly one
/// migration run. Any failure is fatal.
pub struct Deployment<'a> {
    config: &'a AppConfig,
    env: &'a dyn EnvSource,
}

impl<'a> Deployment<'a> {
    pub fn new(config: &'a AppConfig, env: &'a dyn EnvSource) -> Self {
        Self { config, env }
    }

    pub fn run(&self, engine: &MigrationEngine) -> Result<RunReport> {
        info!(
            "starting deployment for environment: {}",
            self.config.environment
        );

        self.preflight()?;

        info!("running database migrations...");
        let report = engine.run().inspect_err(|e| {
            error!("deployment aborted: {e}");
            if let Some(id) = e.migration_id() {
                error!(
                    "migrations applied before {id} stay in place; rolling them back is an operator action"
                );
            }
        })?;

        info!(
            "deployment completed successfully ({} migrations applied)",
            report.applied.len()
        );
        Ok(report)
    }

    fn preflight(&self) -> Result<()> {
        info!("validating environment variables...");

        let missing = self.env.missing(&self.config.deploy.required_env);
        if !missing.is_empty() {
            return Err(Error::Configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        if self.config.is_production() {
            let missing = self.env.missing(&self.config.deploy.production_env);
            if !missing.is_empty() {
                return Err(Error::Configuration(format!(
                    "missing production environment variables: {}",
                    missing.join(", ")
                )));
            }
        }

        info!("pre-deployment checks passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_config::ConfigLoader;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        vars(&[
            ("APP_ENV", "staging"),
            ("PORT", "3000"),
            ("DATABASE_URL", "postgres://db/app"),
            ("API_SECRET", "s3cret"),
        ])
    }

    fn config_in(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.migrations.source_dir = dir.path().join("migrations");
        config.migrations.ledger_path = dir.path().join(".migrations");
        config
    }

    #[test]
    fn preflight_lists_every_missing_variable() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let env = vars(&[("PORT", "3000"), ("DATABASE_URL", "postgres://db/app")]);
        let engine = MigrationEngine::new(&config, Box::new(env.clone())).unwrap();

        let err = Deployment::new(&config, &env).run(&engine).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: missing required environment variables: APP_ENV, API_SECRET"
        );
        assert!(!config.migrations.source_dir.exists());
    }

    #[test]
    fn production_requires_jwt_secret() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.environment = "production".to_string();
        let env = full_env();
        let engine = MigrationEngine::new(&config, Box::new(env.clone())).unwrap();

        let err = Deployment::new(&config, &env).run(&engine).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn app_env_production_alone_requires_jwt_secret() {
        let dir = TempDir::new().unwrap();
        let env = vars(&[
            ("APP_ENV", "production"),
            ("PORT", "3000"),
            ("DATABASE_URL", "postgres://db/app"),
            ("API_SECRET", "s3cret"),
        ]);
        let mut config = ConfigLoader::new(&env)
            .with_base_dir(dir.path())
            .load(None)
            .unwrap();
        config.migrations.source_dir = dir.path().join("migrations");
        config.migrations.ledger_path = dir.path().join(".migrations");
        assert!(config.is_production());

        let engine = MigrationEngine::new(&config, Box::new(env.clone())).unwrap();
        let err = Deployment::new(&config, &env).run(&engine).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: missing production environment variables: JWT_SECRET"
        );
        assert!(!config.migrations.ledger_path.exists());
        assert!(!config.migrations.source_dir.exists());
    }

    #[test]
    fn successful_deploy_runs_migrations_once() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let env = full_env();
        let engine = MigrationEngine::new(&config, Box::new(env.clone())).unwrap();

        let report = Deployment::new(&config, &env).run(&engine).unwrap();
        assert_eq!(report.applied.len(), 2);

        let again = Deployment::new(&config, &env).run(&engine).unwrap();
        assert!(again.is_empty());
    }
}
