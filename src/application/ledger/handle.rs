//! Shared access to the ledger.
//!
//! [`LedgerHandle`] is the single write path: every mutation takes the write
//! lock, and the ledger re-values before the lock is released, so readers of
//! [`LedgerHandle::snapshot`] never observe a half-applied update.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{OpportunityId, Position, SnapshotMap, Symbol, Trade};
use crate::error::LedgerError;
use crate::port::Fill;

use super::ledger::{Ledger, ReservationId};
use super::metrics::PortfolioMetrics;

/// Immutable view of the ledger at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSnapshot {
    pub taken_at: DateTime<Utc>,
    pub balances: BTreeMap<String, Decimal>,
    pub positions: Vec<Position>,
    pub reservations_by_symbol: BTreeMap<Symbol, Decimal>,
    pub daily_returns: Vec<f64>,
    pub metrics: PortfolioMetrics,
}

impl PortfolioSnapshot {
    pub fn total_value(&self) -> Decimal {
        self.metrics.total_value
    }

    pub fn available_balance(&self) -> Decimal {
        self.metrics.available_balance
    }

    pub fn daily_pnl(&self) -> Decimal {
        self.metrics.daily_pnl
    }

    /// Open position notional plus reservations for `symbol`.
    pub fn symbol_exposure(&self, symbol: &Symbol) -> Decimal {
        let held: Decimal = self
            .positions
            .iter()
            .filter(|p| &p.symbol == symbol)
            .map(Position::notional)
            .sum();
        held + self
            .reservations_by_symbol
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl From<&Ledger> for PortfolioSnapshot {
    fn from(ledger: &Ledger) -> Self {
        Self {
            taken_at: Utc::now(),
            balances: ledger.balances().clone(),
            positions: ledger.positions().cloned().collect(),
            reservations_by_symbol: ledger.reservations_by_symbol(),
            daily_returns: ledger.daily_returns().to_vec(),
            metrics: ledger.metrics(),
        }
    }
}

/// Cloneable handle to the shared ledger.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    inner: Arc<RwLock<Ledger>>,
}

impl LedgerHandle {
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Consistent read-only view.
    #[must_use]
    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot::from(&*self.inner.read())
    }

    pub fn total_value(&self) -> Decimal {
        self.inner.read().total_value()
    }

    /// Run a read-only closure against the ledger.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run a mutation under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Reserve notional for an in-flight execution.
    ///
    /// # Errors
    ///
    /// See [`Ledger::reserve`].
    pub fn reserve(&self, symbol: &Symbol, notional: Decimal) -> Result<ReservationId, LedgerError> {
        self.update(|l| l.reserve(symbol, notional))
    }

    /// Release a reservation.
    ///
    /// # Errors
    ///
    /// See [`Ledger::release`].
    pub fn release(&self, id: ReservationId) -> Result<Decimal, LedgerError> {
        self.update(|l| l.release(id))
    }

    /// Release the reservation and book all fills in one mutation.
    pub fn settle(
        &self,
        reservation: ReservationId,
        fills: &[Fill],
        opportunity_id: Option<&OpportunityId>,
    ) -> (Result<Decimal, LedgerError>, Vec<Trade>) {
        self.update(|l| {
            let released = l.release(reservation);
            let trades = l.apply_fills(fills, opportunity_id);
            (released, trades)
        })
    }

    /// Release the reservation and book a completed pair in one mutation.
    ///
    /// See [`Ledger::apply_pair`].
    pub fn settle_pair(
        &self,
        reservation: ReservationId,
        buy: &Fill,
        sell: &Fill,
        opportunity_id: Option<&OpportunityId>,
    ) -> (Result<Decimal, LedgerError>, Vec<Trade>) {
        self.update(|l| {
            let released = l.release(reservation);
            let trades = l.apply_pair(buy, sell, opportunity_id);
            (released, trades)
        })
    }

    pub fn mark_prices(&self, snapshots: &SnapshotMap, now: DateTime<Utc>, max_age: Duration) {
        self.update(|l| l.mark_prices(snapshots, now, max_age));
    }

    /// See [`Ledger::update_value`].
    pub fn update_value(&self, now: DateTime<Utc>) -> bool {
        self.update(|l| l.update_value(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ledger::LedgerConfig;
    use crate::domain::{OrderId, OrderSide, VenueId};
    use crate::port::FillStatus;
    use rust_decimal_macros::dec;

    fn handle() -> LedgerHandle {
        LedgerHandle::new(Ledger::new(&LedgerConfig::default()))
    }

    #[test]
    fn snapshot_reflects_reservations() {
        let ledger = handle();
        let symbol = Symbol::from("ETH/USDT");
        ledger.reserve(&symbol, dec!(250)).unwrap();

        let snap = ledger.snapshot();

        assert_eq!(snap.symbol_exposure(&symbol), dec!(250));
        assert_eq!(snap.available_balance(), dec!(9750));
        assert_eq!(snap.total_value(), dec!(10000));
    }

    #[test]
    fn settle_releases_and_books_together() {
        let ledger = handle();
        let symbol = Symbol::from("ETH/USDT");
        let id = ledger.reserve(&symbol, dec!(100)).unwrap();

        let fill = Fill {
            order_id: OrderId::from("o-1"),
            symbol: symbol.clone(),
            venue: VenueId::from("a"),
            side: OrderSide::Buy,
            status: FillStatus::Filled,
            requested_amount: dec!(1),
            filled_amount: dec!(1),
            avg_price: dec!(100),
            fees: dec!(0.1),
        };
        let (released, trades) = ledger.settle(id, &[fill], None);

        assert_eq!(released, Ok(dec!(100)));
        assert_eq!(trades.len(), 1);
        let snap = ledger.snapshot();
        assert_eq!(snap.positions.len(), 1);
        assert_eq!(snap.symbol_exposure(&symbol), dec!(100));
    }

    #[test]
    fn settled_pair_frees_the_symbol_budget() {
        let ledger = handle();
        let symbol = Symbol::from("ETH/USDT");
        let id = ledger.reserve(&symbol, dec!(100)).unwrap();

        let leg = |venue: &str, side: OrderSide, price: Decimal| Fill {
            order_id: OrderId::from(venue),
            symbol: symbol.clone(),
            venue: VenueId::from(venue),
            side,
            status: FillStatus::Filled,
            requested_amount: dec!(1),
            filled_amount: dec!(1),
            avg_price: price,
            fees: Decimal::ZERO,
        };
        let (released, trades) = ledger.settle_pair(
            id,
            &leg("a", OrderSide::Buy, dec!(100)),
            &leg("b", OrderSide::Sell, dec!(102)),
            None,
        );

        assert_eq!(released, Ok(dec!(100)));
        assert_eq!(trades.len(), 3);
        let snap = ledger.snapshot();
        assert!(snap.positions.is_empty());
        assert_eq!(snap.symbol_exposure(&symbol), Decimal::ZERO);
        assert_eq!(snap.metrics.realized_pnl, dec!(2));
        assert_eq!(snap.metrics.win_rate, 1.0);
    }

    #[test]
    fn clones_share_state() {
        let a = handle();
        let b = a.clone();
        a.update(|l| l.deposit("USDT", dec!(5)));

        assert_eq!(b.total_value(), dec!(10005));
    }
}
