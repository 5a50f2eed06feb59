//! PostgreSQL adapter for the order repository port.
//!
//! Orders live in the `orders` table and their lines in `order_items`,
//! kept in insertion order through a `position` column.

pub mod error;
pub mod postgres;

pub use error::{Result, StoreError};
pub use postgres::PostgresOrderRepository;
