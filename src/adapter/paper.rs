//! Paper order gateway.
//!
//! Fills market orders against the latest simulated quote after a fixed
//! latency, with adverse slippage and a proportional fee. Orders are held in
//! a registry only while pending so `cancel` can pull them before they fill.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{OrderId, OrderSide, VenueId};
use crate::error::ExecutionError;
use crate::port::{Fill, FillStatus, OrderGateway, OrderRequest, OrderType};

use super::market::MemorySnapshotStore;

/// Configuration for the paper gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    /// Simulated placement latency in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Adverse price move applied to every fill, as a fraction.
    #[serde(default = "default_slippage")]
    pub slippage: Decimal,

    /// Fee charged on fill notional, as a fraction.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,

    /// Probability that an order is rejected outright.
    #[serde(default)]
    pub fail_rate: f64,
}

const fn default_latency_ms() -> u64 {
    50
}

fn default_slippage() -> Decimal {
    Decimal::new(5, 4) // 0.05%
}

fn default_fee_rate() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            slippage: default_slippage(),
            fee_rate: default_fee_rate(),
            fail_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderState {
    Pending,
    Cancelled,
}

/// Simulated venue gateway.
pub struct PaperGateway {
    config: PaperConfig,
    venues: HashSet<VenueId>,
    quotes: Arc<MemorySnapshotStore>,
    orders: DashMap<OrderId, OrderState>,
    next_id: AtomicU64,
}

impl PaperGateway {
    #[must_use]
    pub fn new(
        config: PaperConfig,
        venues: impl IntoIterator<Item = VenueId>,
        quotes: Arc<MemorySnapshotStore>,
    ) -> Self {
        Self {
            config,
            venues: venues.into_iter().collect(),
            quotes,
            orders: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &PaperConfig {
        &self.config
    }

    /// Orders still waiting out their latency.
    #[must_use]
    pub fn pending_orders(&self) -> usize {
        self.orders.len()
    }

    fn next_order_id(&self) -> OrderId {
        OrderId::from(format!("paper-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn simulated_rejection(&self) -> bool {
        let rate = self.config.fail_rate.clamp(0.0, 1.0);
        rate > 0.0 && rand::thread_rng().gen_bool(rate)
    }

    fn rejected(order_id: OrderId, request: &OrderRequest) -> Fill {
        Fill {
            order_id,
            symbol: request.symbol.clone(),
            venue: request.venue.clone(),
            side: request.side,
            status: FillStatus::Rejected,
            requested_amount: request.amount,
            filled_amount: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            fees: Decimal::ZERO,
        }
    }

    /// Fill price for `request` against the current quote, or `None` if
    /// there is no quote or a limit is not reached.
    fn fill_price(&self, request: &OrderRequest) -> Option<Decimal> {
        let quote = self.quotes.get(&request.venue, &request.symbol)?;
        let price = match request.side {
            OrderSide::Buy => quote.ask()? * (Decimal::ONE + self.config.slippage),
            OrderSide::Sell => quote.bid()? * (Decimal::ONE - self.config.slippage),
        };
        let within_limit = match (request.order_type, request.limit_price) {
            (OrderType::Limit, Some(limit)) => match request.side {
                OrderSide::Buy => price <= limit,
                OrderSide::Sell => price >= limit,
            },
            _ => true,
        };
        within_limit.then(|| price.round_dp(8))
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    fn name(&self) -> &str {
        "paper"
    }

    async fn place(&self, request: &OrderRequest) -> Result<Fill, ExecutionError> {
        if !self.venues.contains(&request.venue) {
            return Err(ExecutionError::UnknownVenue(request.venue.to_string()));
        }
        if request.amount <= Decimal::ZERO {
            return Err(ExecutionError::InvalidAmount(request.amount));
        }
        if self.simulated_rejection() {
            return Err(ExecutionError::OrderRejected("simulated rejection".into()));
        }

        let order_id = self.next_order_id();
        self.orders.insert(order_id.clone(), OrderState::Pending);
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let cancelled = self
            .orders
            .remove(&order_id)
            .is_some_and(|(_, state)| state == OrderState::Cancelled);
        if cancelled {
            debug!(order_id = %order_id, "Paper order cancelled before fill");
            return Ok(Self::rejected(order_id, request));
        }

        let Some(price) = self.fill_price(request) else {
            debug!(order_id = %order_id, venue = %request.venue, "No fill price");
            return Ok(Self::rejected(order_id, request));
        };
        let fees = (request.amount * price * self.config.fee_rate).round_dp(8);

        info!(
            order_id = %order_id,
            venue = %request.venue,
            symbol = %request.symbol,
            side = %request.side,
            amount = %request.amount,
            price = %price,
            "Paper order filled"
        );
        Ok(Fill {
            order_id,
            symbol: request.symbol.clone(),
            venue: request.venue.clone(),
            side: request.side,
            status: FillStatus::Filled,
            requested_amount: request.amount,
            filled_amount: request.amount,
            avg_price: price,
            fees,
        })
    }

    async fn cancel(&self, order_id: &OrderId) -> Result<bool, ExecutionError> {
        match self.orders.get_mut(order_id) {
            Some(mut state) if *state == OrderState::Pending => {
                *state = OrderState::Cancelled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
