//! Domain layer for the order service.
//!
//! This crate provides the order lifecycle core:
//! - Order aggregate keeping its total consistent with its lines
//! - Status state machine driven by an explicit transition table
//! - Repository and user-lookup ports with in-memory implementations
//! - OrderService orchestrating the create/read/update/cancel/delete use cases

pub mod error;
pub mod order;
pub mod ports;

pub use common::{CustomerId, LineId, OrderId, ProductId};
pub use error::DomainError;
pub use order::{
    DateStampedGenerator, LineRecord, Money, NewOrder, Order, OrderError, OrderLine, OrderNumber,
    OrderNumberGenerator, OrderRecord, OrderService, OrderStatus, OrderView, ParseStatusError,
    ProductSnapshot, TRANSITIONS,
};
pub use ports::{
    InMemoryOrderRepository, InMemoryUserDirectory, OrderRepository, RepositoryError,
    UserEnrichmentClient, UserSummary,
};
