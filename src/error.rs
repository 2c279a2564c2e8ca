use crate::config::ConfigError;
use crate::spot::catalog::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("state lock poisoned")]
    StateLock,
}
