//! Ports the order core depends on, with in-memory implementations.

pub mod repository;
pub mod users;

pub use repository::{InMemoryOrderRepository, OrderRepository, RepositoryError};
pub use users::{InMemoryUserDirectory, UserEnrichmentClient, UserSummary};
