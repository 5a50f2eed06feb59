//! Value objects for the order domain.

use common::{LineId, ProductId};
use serde::{Deserialize, Serialize};

use super::OrderError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiplies by a quantity, or `None` if the result does not fit in cents.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    /// Sums amounts, or `None` if the total does not fit in cents.
    ///
    /// Partial sums are widened so that only the final total has to fit.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        let total: i128 = amounts.into_iter().map(|m| i128::from(m.cents)).sum();
        i64::try_from(total).ok().map(Money::from_cents)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

/// Catalog data frozen into an order line when the order is placed.
///
/// The name and SKU are copied, never looked up again, so historical orders
/// keep showing what the customer actually bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
}

impl ProductSnapshot {
    /// Captures the catalog fields for a product.
    pub fn new(product_id: ProductId, name: impl Into<String>, sku: impl Into<String>) -> Self {
        Self {
            product_id,
            name: name.into(),
            sku: sku.into(),
        }
    }
}

/// Storage representation of an order line.
///
/// Used by repositories to rebuild lines; `total_price` may be missing for
/// rows written by older schema versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub id: Option<LineId>,
    pub product: ProductSnapshot,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Option<Money>,
}

/// A single product line in an order.
///
/// Serialize-only: a line is only built through [`OrderLine::new`] or
/// [`OrderLine::from_record`], never from untrusted JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    id: Option<LineId>,
    product: ProductSnapshot,
    quantity: u32,
    unit_price: Money,
    total_price: Option<Money>,
}

impl OrderLine {
    /// Creates a new line; the total is derived from quantity and unit price.
    pub fn new(
        product: ProductSnapshot,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        Ok(Self {
            id: None,
            product,
            quantity,
            unit_price,
            total_price: Some(line_total(unit_price, quantity)?),
        })
    }

    /// Rebuilds a line from storage without recomputing its stored total.
    pub fn from_record(record: LineRecord) -> Self {
        Self {
            id: record.id,
            product: record.product,
            quantity: record.quantity,
            unit_price: record.unit_price,
            total_price: record.total_price,
        }
    }

    /// Converts the line into its storage representation.
    pub fn into_record(self) -> LineRecord {
        LineRecord {
            id: self.id,
            product: self.product,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
        }
    }

    pub fn id(&self) -> Option<LineId> {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product.name
    }

    pub fn product_sku(&self) -> &str {
        &self.product.sku
    }

    pub fn product(&self) -> &ProductSnapshot {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns the line total, or `None` for a stored line without one.
    pub fn total_price(&self) -> Option<Money> {
        self.total_price
    }

    /// Changes the quantity and recomputes the line total.
    ///
    /// On overflow the line is left unchanged.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        self.total_price = Some(line_total(self.unit_price, quantity)?);
        self.quantity = quantity;
        Ok(())
    }

    /// Changes the unit price and recomputes the line total.
    ///
    /// On overflow the line is left unchanged.
    pub fn set_unit_price(&mut self, unit_price: Money) -> Result<(), OrderError> {
        self.total_price = Some(line_total(unit_price, self.quantity)?);
        self.unit_price = unit_price;
        Ok(())
    }
}

fn line_total(unit_price: Money, quantity: u32) -> Result<Money, OrderError> {
    unit_price
        .checked_mul(quantity)
        .ok_or(OrderError::AmountOverflow)
}
