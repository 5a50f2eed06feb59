//! Shared types for the order services.

pub mod types;

pub use types::{CustomerId, LineId, OrderId, ProductId};
