use libidentity::KeyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid configuration file: {0}")]
    InvalidConfig(#[from] serde_yml::Error),
    #[error("Stored key '{name}' is invalid: {source}")]
    InvalidKey { name: String, source: KeyError },
}
