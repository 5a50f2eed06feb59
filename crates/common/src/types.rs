use serde::{Deserialize, Serialize};

/// Declares a store-assigned numeric identifier.
///
/// Each identifier wraps an `i64` so that order ids, user ids and product ids
/// cannot be mixed up even though the relational store keys them all the same way.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from its raw value.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id! {
    /// Identifier of a persisted order, assigned by the order store.
    OrderId
}

numeric_id! {
    /// Identifier of a line inside an order, assigned by the order store.
    LineId
}

numeric_id! {
    /// Identifier of a user owned by the user service.
    CustomerId
}

numeric_id! {
    /// Identifier of a product owned by the product service.
    ProductId
}
