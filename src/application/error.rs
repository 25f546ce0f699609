use crate::domain::error::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("catalog I/O error: {0}")]
    CatalogIo(#[source] std::io::Error),

    #[error("catalog format error: {0}")]
    CatalogFormat(#[source] serde_json::Error),
}
