//! Fill records appended by the ledger.
//!
//! Every balance-changing event in the ledger leaves a [`Trade`] behind.
//! Opening fills carry zero realized PnL; closing fills carry the PnL they
//! realized, net of the fees attributable to the closed amount.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{OpportunityId, Symbol, TradeId, VenueId};
use super::money::{Price, Volume};
use super::position::OrderSide;

/// Whether a trade opened (or grew) a position or closed (or reduced) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Open,
    Close,
}

/// A booked fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub id: TradeId,
    pub opportunity_id: Option<OpportunityId>,
    pub symbol: Symbol,
    pub venue: VenueId,
    pub side: OrderSide,
    pub amount: Volume,
    pub price: Price,
    pub fees: Decimal,
    pub timestamp: DateTime<Utc>,
    pub realized_pnl: Decimal,
    pub kind: TradeKind,
}

impl Trade {
    /// Returns true if this trade closed exposure.
    #[must_use]
    pub fn is_close(&self) -> bool {
        self.kind == TradeKind::Close
    }

    /// Unsigned notional of the fill.
    pub fn notional(&self) -> Decimal {
        self.amount * self.price
    }
}
