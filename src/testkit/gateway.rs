//! Scripted [`OrderGateway`] for execution tests.
//!
//! Each venue has a queue of [`Script`] steps. Every placement on that venue
//! pops the next step; an empty queue fills completely. Fills happen at the
//! venue's configured price with a proportional fee.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{OrderId, VenueId};
use crate::error::ExecutionError;
use crate::port::{Fill, FillStatus, OrderGateway, OrderRequest};

/// One scripted response.
#[derive(Debug, Clone)]
pub enum Script {
    /// Fill the full amount.
    Fill,
    /// Fill this fraction of the amount.
    Partial(Decimal),
    /// Return a `Rejected` fill.
    Reject,
    /// Return a submission error.
    Error,
    /// Sleep this long, then fill.
    Delay(Duration),
    /// Never answer within any reasonable timeout.
    Hang,
}

/// Gateway with scripted per-venue behavior.
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<VenueId, VecDeque<Script>>>,
    prices: HashMap<VenueId, Decimal>,
    fee_rate: Decimal,
    placed: Mutex<Vec<OrderRequest>>,
    next_id: AtomicU64,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    /// Every venue fills at 100 with a 0.1% fee.
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            prices: HashMap::new(),
            fee_rate: dec!(0.001),
            placed: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_price(mut self, venue: &str, price: Decimal) -> Self {
        self.prices.insert(VenueId::from(venue), price);
        self
    }

    pub fn with_fee_rate(mut self, fee_rate: Decimal) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    /// Queue responses for `venue`, in order.
    pub fn with_script(self, venue: &str, steps: impl IntoIterator<Item = Script>) -> Self {
        self.scripts
            .lock()
            .entry(VenueId::from(venue))
            .or_default()
            .extend(steps);
        self
    }

    /// Every request placed so far, in placement order.
    pub fn placed(&self) -> Vec<OrderRequest> {
        self.placed.lock().clone()
    }

    fn price(&self, venue: &VenueId) -> Decimal {
        self.prices.get(venue).copied().unwrap_or(dec!(100))
    }

    fn fill(&self, request: &OrderRequest, amount: Decimal) -> Fill {
        let order_id = OrderId::from(format!(
            "scripted-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ));
        let price = self.price(&request.venue);
        let status = if amount.is_zero() {
            FillStatus::Rejected
        } else if amount < request.amount {
            FillStatus::PartiallyFilled
        } else {
            FillStatus::Filled
        };
        Fill {
            order_id,
            symbol: request.symbol.clone(),
            venue: request.venue.clone(),
            side: request.side,
            status,
            requested_amount: request.amount,
            filled_amount: amount,
            avg_price: if amount.is_zero() { Decimal::ZERO } else { price },
            fees: amount * price * self.fee_rate,
        }
    }
}

#[async_trait]
impl OrderGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn place(&self, request: &OrderRequest) -> Result<Fill, ExecutionError> {
        self.placed.lock().push(request.clone());
        let step = self
            .scripts
            .lock()
            .get_mut(&request.venue)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Script::Fill);

        match step {
            Script::Fill => Ok(self.fill(request, request.amount)),
            Script::Partial(fraction) => Ok(self.fill(request, request.amount * fraction)),
            Script::Reject => Ok(self.fill(request, Decimal::ZERO)),
            Script::Error => Err(ExecutionError::SubmissionFailed("scripted error".into())),
            Script::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.fill(request, request.amount))
            }
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(self.fill(request, request.amount))
            }
        }
    }

    async fn cancel(&self, _order_id: &OrderId) -> Result<bool, ExecutionError> {
        Ok(false)
    }
}
