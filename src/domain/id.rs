//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "` from a string.")]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// Trading venue identifier (e.g. `binance`).
    ///
    /// The inner String is private to ensure all construction goes through
    /// the defined constructors.
    VenueId
);

string_id!(
    /// Traded instrument symbol (e.g. `BTC/USDT`).
    Symbol
);

string_id!(
    /// Venue-assigned order identifier.
    OrderId
);

/// Unique identifier for a detected opportunity.
///
/// Generated as UUID v4 for new opportunities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpportunityId(String);

impl OpportunityId {
    /// Create a new `OpportunityId` with a generated UUID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the opportunity ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OpportunityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OpportunityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Sequential trade identifier assigned by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(u64);

impl TradeId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trade-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_id_from_str_and_display() {
        let venue = VenueId::from("binance");
        assert_eq!(venue.as_str(), "binance");
        assert_eq!(venue.to_string(), "binance");
    }

    #[test]
    fn symbol_ordering_is_lexical() {
        assert!(Symbol::from("BTC/USDT") < Symbol::from("ETH/USDT"));
    }

    #[test]
    fn opportunity_ids_are_unique() {
        assert_ne!(OpportunityId::new(), OpportunityId::new());
    }

    #[test]
    fn trade_id_display() {
        assert_eq!(TradeId::new(7).to_string(), "trade-7");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&VenueId::from("kraken")).unwrap();
        assert_eq!(json, "\"kraken\"");
    }
}
