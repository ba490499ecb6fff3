use thiserror::Error;

/// Failure reported by a [`CartStore`](super::store::CartStore) or
/// [`ProductCatalog`](super::store::ProductCatalog) backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Orm(#[from] sea_orm::DbErr),

    #[error("store rejected the operation: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("{0}")]
    Validation(String),

    #[error("cart line not found")]
    NotFound,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type CartResult<T> = Result<T, CartError>;
