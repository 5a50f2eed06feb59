use domain::{OrderError, RepositoryError};
use thiserror::Error;

/// Name of the unique constraint guarding order numbers.
pub(crate) const ORDER_NUMBER_CONSTRAINT: &str = "unique_order_number";

/// Errors that can occur inside the PostgreSQL order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another order already uses this order number.
    #[error("Order number already exists: {0}")]
    DuplicateOrderNumber(String),

    /// An update targeted an order row that no longer exists.
    #[error("Order row missing: {0}")]
    MissingRow(i64),

    /// A stored column could not be mapped back into the domain.
    #[error("Invalid value in column {column}: {value}")]
    InvalidColumn { column: &'static str, value: String },

    /// Stored lines add up to a total outside the money range.
    #[error("Stored order is inconsistent: {0}")]
    InvalidOrder(#[from] OrderError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Classifies a failed write, surfacing order number collisions.
    pub(crate) fn from_write(err: sqlx::Error, order_number: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.constraint() == Some(ORDER_NUMBER_CONSTRAINT)
        {
            return StoreError::DuplicateOrderNumber(order_number.to_string());
        }
        StoreError::Database(err)
    }
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateOrderNumber(number) => RepositoryError::DuplicateOrderNumber(number),
            other => RepositoryError::backend(other),
        }
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
