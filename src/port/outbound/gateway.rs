//! Order gateway port for order placement on a venue.
//!
//! The execution coordinator talks to venues only through [`OrderGateway`].
//! A paper implementation ships in `adapter::paper`; live venue connectivity
//! plugs in here.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{OrderId, OrderSide, Price, Symbol, VenueId, Volume};
use crate::error::ExecutionError;

/// Order pricing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

/// Request to place a single order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub venue: VenueId,
    pub side: OrderSide,
    pub amount: Volume,
    pub order_type: OrderType,
    /// Required for limit orders, ignored for market orders.
    pub limit_price: Option<Price>,
}

impl OrderRequest {
    /// Create a market order.
    pub fn market(symbol: Symbol, venue: VenueId, side: OrderSide, amount: Volume) -> Self {
        Self {
            symbol,
            venue,
            side,
            amount,
            order_type: OrderType::Market,
            limit_price: None,
        }
    }

    /// Create a limit order.
    pub fn limit(
        symbol: Symbol,
        venue: VenueId,
        side: OrderSide,
        amount: Volume,
        price: Price,
    ) -> Self {
        Self {
            symbol,
            venue,
            side,
            amount,
            order_type: OrderType::Limit,
            limit_price: Some(price),
        }
    }
}

/// Terminal status reported for a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    Filled,
    PartiallyFilled,
    Rejected,
}

/// Outcome of a placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub venue: VenueId,
    pub side: OrderSide,
    pub status: FillStatus,
    pub requested_amount: Volume,
    pub filled_amount: Volume,
    pub avg_price: Price,
    pub fees: Decimal,
}

impl Fill {
    /// Returns true if the whole requested amount was filled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == FillStatus::Filled && self.filled_amount >= self.requested_amount
    }

    /// Returns true if anything was filled.
    #[must_use]
    pub fn has_fill(&self) -> bool {
        self.filled_amount > Decimal::ZERO
    }

    /// Unsigned notional of the filled amount.
    pub fn notional(&self) -> Decimal {
        self.filled_amount * self.avg_price
    }
}

/// Places and cancels orders on one or more venues.
///
/// Implementations must be thread-safe; both legs of an opportunity are
/// placed concurrently through the same gateway.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Gateway name for logging.
    fn name(&self) -> &str;

    /// Place an order and wait for its terminal status.
    ///
    /// A rejection may be reported either as `Err(OrderRejected)` or as a
    /// fill with [`FillStatus::Rejected`].
    async fn place(&self, request: &OrderRequest) -> Result<Fill, ExecutionError>;

    /// Cancel a pending order. Returns false if the order is unknown or
    /// already terminal.
    async fn cancel(&self, order_id: &OrderId) -> Result<bool, ExecutionError>;
}
