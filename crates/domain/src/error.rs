//! Domain error types.

use thiserror::Error;

use crate::order::OrderError;
use crate::ports::RepositoryError;

/// Errors that can occur during order use cases.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A lifecycle rule rejected the operation.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The requested order does not exist.
    #[error("{entity} not found with {field}: {value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// The store rejected a duplicate order number.
    #[error("Duplicate order number: {order_number}")]
    DuplicateIdentifier { order_number: String },

    /// The store failed.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl DomainError {
    pub(crate) fn order_not_found(field: &'static str, value: impl ToString) -> Self {
        DomainError::NotFound {
            entity: "Order",
            field,
            value: value.to_string(),
        }
    }
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateOrderNumber(order_number) => {
                DomainError::DuplicateIdentifier { order_number }
            }
            other => DomainError::Repository(other),
        }
    }
}
