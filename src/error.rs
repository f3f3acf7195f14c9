use thiserror::Error;

/// Errors surfaced by the local ordering core.
///
/// Remote failures never show up here: the sync bridge maps them to
/// [`crate::sync::SyncOutcome::Failed`].
#[derive(Debug, Error)]
pub enum PosError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Lock,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PosError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn order_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Order",
            id: id.into(),
        }
    }

    pub fn product_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Product",
            id: id.into(),
        }
    }

    pub fn category_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Category",
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type PosResult<T> = Result<T, PosError>;
