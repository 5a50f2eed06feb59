//! Human-readable order numbers.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PREFIX: &str = "ORD";
const SUFFIX_LEN: usize = 5;

/// Externally visible order reference, e.g. `ORD-20240115-A1B2C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Wraps an existing order number.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Returns the order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Source of fresh order numbers.
pub trait OrderNumberGenerator: Send + Sync {
    fn next_number(&self) -> OrderNumber;
}

/// Generates `ORD-YYYYMMDD-XXXXX` numbers from the current UTC date and five
/// random hex characters.
///
/// Uniqueness is probabilistic; the store's unique constraint on the order
/// number is what actually rejects a collision.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateStampedGenerator;

impl DateStampedGenerator {
    /// Builds an order number for a specific date.
    pub fn number_for(date: NaiveDate) -> OrderNumber {
        let random = Uuid::new_v4().simple().to_string();
        let suffix = random[..SUFFIX_LEN].to_uppercase();
        OrderNumber(format!("{PREFIX}-{}-{suffix}", date.format("%Y%m%d")))
    }
}

impl OrderNumberGenerator for DateStampedGenerator {
    fn next_number(&self) -> OrderNumber {
        Self::number_for(Utc::now().date_naive())
    }
}
