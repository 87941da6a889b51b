//! Position types for venue-level inventory held by the ledger.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{Symbol, VenueId};
use super::money::{Price, Volume};

/// Direction of an order or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The side that unwinds this one.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Position side this order opens or increases.
    #[must_use]
    pub const fn opens(&self) -> Side {
        match self {
            Self::Buy => Side::Long,
            Self::Sell => Side::Short,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Side of a held position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    /// Order side that closes a position of this side.
    #[must_use]
    pub const fn closing_order(&self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Sell,
            Self::Short => OrderSide::Buy,
        }
    }

    /// `+1` for long, `-1` for short.
    #[must_use]
    pub fn sign(&self) -> Decimal {
        match self {
            Self::Long => Decimal::ONE,
            Self::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Ledger key of a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PositionKey {
    pub symbol: Symbol,
    pub venue: VenueId,
    pub side: Side,
}

impl PositionKey {
    pub fn new(symbol: Symbol, venue: VenueId, side: Side) -> Self {
        Self {
            symbol,
            venue,
            side,
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.symbol, self.venue, self.side)
    }
}

/// An open position on one venue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: Symbol,
    pub venue: VenueId,
    pub side: Side,
    /// Base-asset amount, never negative.
    pub amount: Volume,
    /// Volume-weighted entry price.
    pub entry_price: Price,
    pub current_price: Price,
    /// Fees accumulated while opening and growing the position.
    pub fees_paid: Decimal,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Create a position marked at its entry price.
    pub fn new(
        symbol: impl Into<Symbol>,
        venue: impl Into<VenueId>,
        side: Side,
        amount: Volume,
        entry_price: Price,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            venue: venue.into(),
            side,
            amount,
            entry_price,
            current_price: entry_price,
            fees_paid: Decimal::ZERO,
            opened_at: Utc::now(),
        }
    }

    /// Set the fees already paid.
    #[must_use]
    pub fn with_fees(mut self, fees: Decimal) -> Self {
        self.fees_paid = fees;
        self
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::new(self.symbol.clone(), self.venue.clone(), self.side)
    }

    /// Signed market value: positive for long, negative for short.
    pub fn market_value(&self) -> Decimal {
        self.side.sign() * self.amount * self.current_price
    }

    /// Unsigned notional at the current price.
    pub fn notional(&self) -> Decimal {
        self.amount * self.current_price
    }

    /// Price PnL of `amount` units exited at `exit_price`, before fees.
    pub fn price_pnl(&self, amount: Volume, exit_price: Price) -> Decimal {
        self.side.sign() * (exit_price - self.entry_price) * amount
    }

    /// Mark-to-market PnL of the whole position, before fees.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.price_pnl(self.amount, self.current_price)
    }

    /// Fold another position with the same key into this one.
    ///
    /// The entry price becomes the volume-weighted average and fees
    /// accumulate. The newer mark price wins.
    pub fn merge(&mut self, other: &Position) {
        let total = self.amount + other.amount;
        if total > Decimal::ZERO {
            self.entry_price =
                (self.entry_price * self.amount + other.entry_price * other.amount) / total;
        }
        self.amount = total;
        self.fees_paid += other.fees_paid;
        self.current_price = other.current_price;
    }
}
