use thiserror::Error;

use crate::order::OrderStatus;
use crate::payment::PaymentError;
use crate::store::StoreError;
use crate::validate::ValidationError;

/// Everything a gallery operation can refuse or fail with.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("basket is empty")]
    EmptyBasket,

    #[error("basket mixes currencies: {0}")]
    MixedCurrencies(String),

    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Store(StoreError),
}

impl GalleryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        GalleryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for GalleryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => GalleryError::NotFound {
                entity,
                id: id.to_string(),
            },
            StoreError::Conflict(msg) => GalleryError::Conflict(msg),
            other => GalleryError::Store(other),
        }
    }
}

pub type GalleryResult<T> = Result<T, GalleryError>;
