//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use serde::Serialize;

use super::{LineRecord, Money, OrderError, OrderLine, OrderNumber, OrderStatus};

/// Order aggregate root.
///
/// All changes to the line list go through this type so that the order total
/// always equals the sum of its line totals. Serialize-only: orders are rebuilt
/// through [`Order::from_record`], which recomputes the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Store-assigned identifier, absent until the order is first saved.
    id: Option<OrderId>,

    /// Unique external reference.
    order_number: Option<OrderNumber>,

    /// User who placed the order. Not checked against the user service.
    customer_id: CustomerId,

    status: OrderStatus,

    /// Derived from `lines`; never set directly.
    total_amount: Money,

    shipping_address: Option<String>,

    notes: Option<String>,

    lines: Vec<OrderLine>,

    created_at: Option<DateTime<Utc>>,

    updated_at: Option<DateTime<Utc>>,
}

/// Storage representation of an order.
///
/// The total is deliberately absent: [`Order::from_record`] derives it from the lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: Option<OrderId>,
    pub order_number: Option<OrderNumber>,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<LineRecord>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Starts a new, unsaved order in `Pending` status with no lines.
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            id: None,
            order_number: None,
            customer_id,
            status: OrderStatus::Pending,
            total_amount: Money::zero(),
            shipping_address: None,
            notes: None,
            lines: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_shipping_address(mut self, address: Option<String>) -> Self {
        self.shipping_address = address;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Rebuilds an order from storage, recomputing the total from its lines.
    pub fn from_record(record: OrderRecord) -> Result<Self, OrderError> {
        let lines: Vec<OrderLine> = record.lines.into_iter().map(OrderLine::from_record).collect();
        Ok(Self {
            id: record.id,
            order_number: record.order_number,
            customer_id: record.customer_id,
            status: record.status,
            total_amount: total_of(&lines)?,
            shipping_address: record.shipping_address,
            notes: record.notes,
            lines,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Converts the order into its storage representation.
    pub fn into_record(self) -> OrderRecord {
        OrderRecord {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            status: self.status,
            shipping_address: self.shipping_address,
            notes: self.notes,
            lines: self.lines.into_iter().map(OrderLine::into_record).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub(crate) fn assign_order_number(&mut self, number: OrderNumber) {
        self.order_number = Some(number);
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn order_number(&self) -> Option<&OrderNumber> {
        self.order_number.as_ref()
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn shipping_address(&self) -> Option<&str> {
        self.shipping_address.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(OrderLine::quantity).sum()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns true if the customer may still cancel the order.
    pub fn can_be_cancelled(&self) -> bool {
        self.status.is_cancellable()
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Line mutations
//
// Each mutation computes the new total first and leaves the order untouched
// when it does not fit.
impl Order {
    /// Appends a line and recomputes the total.
    pub fn add_line(&mut self, line: OrderLine) -> Result<(), OrderError> {
        let total = total_of(self.lines.iter().chain(std::iter::once(&line)))?;
        self.lines.push(line);
        self.total_amount = total;
        Ok(())
    }

    /// Removes the first line equal to `line` and recomputes the total.
    ///
    /// Returns false if no such line was present.
    pub fn remove_line(&mut self, line: &OrderLine) -> Result<bool, OrderError> {
        let Some(index) = self.lines.iter().position(|l| l == line) else {
            return Ok(false);
        };
        let remaining = self
            .lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, l)| l);
        let total = total_of(remaining)?;
        self.lines.remove(index);
        self.total_amount = total;
        Ok(true)
    }

    /// Replaces every line and recomputes the total.
    pub fn replace_lines(&mut self, lines: Vec<OrderLine>) -> Result<(), OrderError> {
        self.total_amount = total_of(&lines)?;
        self.lines = lines;
        Ok(())
    }
}

/// Lines without a total count as zero.
fn total_of<'a>(lines: impl IntoIterator<Item = &'a OrderLine>) -> Result<Money, OrderError> {
    Money::checked_sum(
        lines
            .into_iter()
            .map(|line| line.total_price().unwrap_or_default()),
    )
    .ok_or(OrderError::AmountOverflow)
}
