pub mod env;
pub mod loader;
pub mod model;

pub use env::{EnvSource, ProcessEnv};
pub use loader::ConfigLoader;
pub use model::{AppConfig, DeployConfig, MigrationsConfig};
