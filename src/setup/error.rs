use crate::config::ConfigError;
use crate::registry::RegistryError;
use thiserror::Error;

pub type SetupResult<T> = Result<T, SetupError>;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Logging initialization failed: {0}")]
    Logging(String),
    #[error("Config manager initialization failed: {0}")]
    Config(#[from] ConfigError),
    #[error("Ribbon registration failed: {0}")]
    Registration(#[from] RegistryError),
}
