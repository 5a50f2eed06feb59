//! Order aggregate and related types.

mod aggregate;
mod lifecycle;
mod number;
mod service;
mod status;
mod value_objects;

pub use aggregate::{Order, OrderRecord};
pub use number::{DateStampedGenerator, OrderNumber, OrderNumberGenerator};
pub use service::{NewOrder, OrderService, OrderView};
pub use status::{OrderStatus, ParseStatusError, TRANSITIONS};
pub use value_objects::{LineRecord, Money, OrderLine, ProductSnapshot};

use thiserror::Error;

/// Business-rule violations raised by the order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The transition table does not allow this status change.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order is past the point where a customer may cancel it.
    #[error("Order cannot be cancelled. Current status: {status}")]
    NotCancellable { status: OrderStatus },

    /// A line or order total does not fit in the money range.
    #[error("Order amount exceeds the supported range")]
    AmountOverflow,
}
