//! Authoritative account state: balances, positions, trades, reservations.
//!
//! Every mutating method re-values the portfolio before returning, so
//! `Σ balances + Σ signed market value == total_value` holds between calls.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::money::to_f64;
use crate::domain::time::utc_day;
use crate::domain::{
    OpportunityId, OrderSide, Position, PositionKey, Side, SnapshotKey, SnapshotMap, Symbol,
    Trade, TradeId, TradeKind, VenueId,
};
use crate::error::LedgerError;
use crate::port::Fill;

use super::metrics::{self, PortfolioMetrics};
use super::LedgerConfig;

/// Handle returned by [`Ledger::reserve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReservationId(u64);

impl ReservationId {
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Reservation {
    symbol: Symbol,
    notional: Decimal,
}

/// The portfolio ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    quote_currency: String,
    margin_fraction: Decimal,
    balances: BTreeMap<String, Decimal>,
    positions: BTreeMap<PositionKey, Position>,
    trades: Vec<Trade>,
    reservations: HashMap<ReservationId, Reservation>,
    next_reservation: u64,
    next_trade: u64,
    initial_value: Decimal,
    total_value: Decimal,
    peak_value: Decimal,
    max_drawdown: f64,
    day: NaiveDate,
    day_open_value: Decimal,
    daily_returns: Vec<f64>,
}

impl Ledger {
    /// Create a ledger funded with the configured quote balance.
    #[must_use]
    pub fn new(config: &LedgerConfig) -> Self {
        Self::starting_at(config, Utc::now())
    }

    /// Create a ledger whose first trading day is the UTC day of `now`.
    #[must_use]
    pub fn starting_at(config: &LedgerConfig, now: DateTime<Utc>) -> Self {
        let initial = config.initial_balance;
        let mut balances = BTreeMap::new();
        balances.insert(config.quote_currency.clone(), initial);

        Self {
            quote_currency: config.quote_currency.clone(),
            margin_fraction: config.position_margin_fraction,
            balances,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            reservations: HashMap::new(),
            next_reservation: 1,
            next_trade: 1,
            initial_value: initial,
            total_value: initial,
            peak_value: initial,
            max_drawdown: 0.0,
            day: utc_day(now),
            day_open_value: initial,
            daily_returns: Vec::new(),
        }
    }

    // ---- reads ----

    pub fn quote_currency(&self) -> &str {
        &self.quote_currency
    }

    pub fn balance(&self, currency: &str) -> Decimal {
        self.balances.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn quote_balance(&self) -> Decimal {
        self.balance(&self.quote_currency)
    }

    pub fn balances(&self) -> &BTreeMap<String, Decimal> {
        &self.balances
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn daily_returns(&self) -> &[f64] {
        &self.daily_returns
    }

    pub fn initial_value(&self) -> Decimal {
        self.initial_value
    }

    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// Drawdown from the running peak at the current value.
    pub fn current_drawdown(&self) -> f64 {
        if self.peak_value <= Decimal::ZERO {
            return 0.0;
        }
        to_f64((self.peak_value - self.total_value) / self.peak_value).max(0.0)
    }

    /// Value change since the UTC-day open.
    pub fn daily_pnl(&self) -> Decimal {
        self.total_value - self.day_open_value
    }

    pub fn reserved(&self) -> Decimal {
        self.reservations.values().map(|r| r.notional).sum()
    }

    /// Reserved notional per symbol.
    pub fn reservations_by_symbol(&self) -> BTreeMap<Symbol, Decimal> {
        let mut out = BTreeMap::new();
        for r in self.reservations.values() {
            *out.entry(r.symbol.clone()).or_insert(Decimal::ZERO) += r.notional;
        }
        out
    }

    /// Unsigned notional of all open positions.
    pub fn position_notional(&self) -> Decimal {
        self.positions.values().map(Position::notional).sum()
    }

    /// Quote balance less reservations and the margin held on positions.
    pub fn available_balance(&self) -> Decimal {
        self.quote_balance() - self.reserved() - self.margin_fraction * self.position_notional()
    }

    /// Open position notional plus in-flight reservations for `symbol`.
    pub fn symbol_exposure(&self, symbol: &Symbol) -> Decimal {
        let held: Decimal = self
            .positions
            .values()
            .filter(|p| &p.symbol == symbol)
            .map(Position::notional)
            .sum();
        let reserved: Decimal = self
            .reservations
            .values()
            .filter(|r| &r.symbol == symbol)
            .map(|r| r.notional)
            .sum();
        held + reserved
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.trades.iter().map(|t| t.realized_pnl).sum()
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.positions.values().map(Position::unrealized_pnl).sum()
    }

    /// Derived performance and risk metrics.
    pub fn metrics(&self) -> PortfolioMetrics {
        metrics::compute(self)
    }

    // ---- mutations ----

    /// Add a position, merging with an existing one of the same key.
    pub fn add_position(&mut self, position: Position) {
        let key = position.key();
        match self.positions.get_mut(&key) {
            Some(existing) => existing.merge(&position),
            None => {
                self.positions.insert(key, position);
            }
        }
        self.revalue();
    }

    /// Close a whole position at `exit_price`.
    ///
    /// Realized PnL is the price PnL minus the fees accumulated on the
    /// position. A long close credits `amount × exit` to the quote balance,
    /// a short close debits it.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::PositionNotFound` if no such position is open.
    pub fn close_position(
        &mut self,
        symbol: &Symbol,
        venue: &VenueId,
        side: Side,
        exit_price: Decimal,
    ) -> Result<Trade, LedgerError> {
        let key = PositionKey::new(symbol.clone(), venue.clone(), side);
        let position = self
            .positions
            .remove(&key)
            .ok_or_else(|| LedgerError::PositionNotFound {
                symbol: symbol.to_string(),
                venue: venue.to_string(),
                side: side.to_string(),
            })?;

        let pnl = position.price_pnl(position.amount, exit_price) - position.fees_paid;
        let proceeds = position.amount * exit_price;
        let quote = self.quote_currency.clone();
        self.credit(&quote, side.sign() * proceeds);

        let trade = self.push_trade(
            None,
            symbol.clone(),
            venue.clone(),
            side.closing_order(),
            position.amount,
            exit_price,
            Decimal::ZERO,
            pnl,
            TradeKind::Close,
        );
        info!(
            symbol = %symbol,
            venue = %venue,
            side = %side,
            pnl = %pnl,
            "Position closed"
        );
        self.revalue();
        Ok(trade)
    }

    /// Book an executed fill.
    ///
    /// The quote balance moves by the fill notional and fees. A fill against
    /// an existing opposite position on the same (symbol, venue) reduces it
    /// first, realizing proportional PnL; any remainder opens or grows a
    /// position on the fill side. Returns the trades appended.
    pub fn apply_fill(&mut self, fill: &Fill, opportunity_id: Option<&OpportunityId>) -> Vec<Trade> {
        let mut booked = Vec::new();
        if !fill.has_fill() {
            return booked;
        }

        let amount = fill.filled_amount;
        let price = fill.avg_price;
        let quote = self.quote_currency.clone();
        let direction = match fill.side {
            OrderSide::Buy => Decimal::NEGATIVE_ONE,
            OrderSide::Sell => Decimal::ONE,
        };
        self.credit(&quote, direction * amount * price - fill.fees);

        let opens = fill.side.opens();
        let opposite = PositionKey::new(fill.symbol.clone(), fill.venue.clone(), opens.opposite());
        let mut remaining = amount;

        if let Some(existing) = self.positions.get_mut(&opposite) {
            let reduce = remaining.min(existing.amount);
            let fee_share = fill.fees * reduce / amount;
            let carried_fees = existing.fees_paid * reduce / existing.amount;
            let pnl = existing.price_pnl(reduce, price) - carried_fees - fee_share;

            existing.amount -= reduce;
            existing.fees_paid -= carried_fees;
            existing.current_price = price;
            if existing.amount.is_zero() {
                self.positions.remove(&opposite);
            }
            remaining -= reduce;

            booked.push(self.push_trade(
                opportunity_id.cloned(),
                fill.symbol.clone(),
                fill.venue.clone(),
                fill.side,
                reduce,
                price,
                fee_share,
                pnl,
                TradeKind::Close,
            ));
        }

        if remaining > Decimal::ZERO {
            let fee_share = fill.fees * remaining / amount;
            let position = Position::new(fill.symbol.clone(), fill.venue.clone(), opens, remaining, price)
                .with_fees(fee_share);
            let key = position.key();
            match self.positions.get_mut(&key) {
                Some(existing) => existing.merge(&position),
                None => {
                    self.positions.insert(key, position);
                }
            }

            booked.push(self.push_trade(
                opportunity_id.cloned(),
                fill.symbol.clone(),
                fill.venue.clone(),
                fill.side,
                remaining,
                price,
                fee_share,
                Decimal::ZERO,
                TradeKind::Open,
            ));
        }

        debug!(
            order_id = %fill.order_id,
            symbol = %fill.symbol,
            venue = %fill.venue,
            side = %fill.side,
            amount = %amount,
            price = %price,
            "Fill booked"
        );
        self.revalue();
        booked
    }

    /// Book several fills as one mutation.
    pub fn apply_fills(&mut self, fills: &[Fill], opportunity_id: Option<&OpportunityId>) -> Vec<Trade> {
        fills
            .iter()
            .flat_map(|fill| self.apply_fill(fill, opportunity_id))
            .collect()
    }

    /// Book both legs of a completed cross-venue pair.
    ///
    /// The long bought on the buy venue covers the short sold on the sell
    /// venue, so the matched amount closes as one round trip that realizes
    /// the spread net of both legs' fees. Returns the trades appended.
    pub fn apply_pair(
        &mut self,
        buy: &Fill,
        sell: &Fill,
        opportunity_id: Option<&OpportunityId>,
    ) -> Vec<Trade> {
        let mut booked = self.apply_fill(buy, opportunity_id);
        booked.extend(self.apply_fill(sell, opportunity_id));
        if let Some(trade) = self.net_hedged(&buy.symbol, &buy.venue, &sell.venue, opportunity_id) {
            booked.push(trade);
        }
        self.revalue();
        booked
    }

    fn net_hedged(
        &mut self,
        symbol: &Symbol,
        long_venue: &VenueId,
        short_venue: &VenueId,
        opportunity_id: Option<&OpportunityId>,
    ) -> Option<Trade> {
        let long_key = PositionKey::new(symbol.clone(), long_venue.clone(), Side::Long);
        let short_key = PositionKey::new(symbol.clone(), short_venue.clone(), Side::Short);
        let long = self.positions.get(&long_key)?.clone();
        let short = self.positions.get(&short_key)?.clone();

        let amount = long.amount.min(short.amount);
        if amount <= Decimal::ZERO {
            return None;
        }
        let long_fees = long.fees_paid * amount / long.amount;
        let short_fees = short.fees_paid * amount / short.amount;
        let pnl = (short.entry_price - long.entry_price) * amount - long_fees - short_fees;

        self.shrink(&long_key, amount, long_fees);
        self.shrink(&short_key, amount, short_fees);

        info!(
            symbol = %symbol,
            long_venue = %long_venue,
            short_venue = %short_venue,
            amount = %amount,
            pnl = %pnl,
            "Hedged pair closed"
        );
        Some(self.push_trade(
            opportunity_id.cloned(),
            symbol.clone(),
            short_venue.clone(),
            OrderSide::Buy,
            amount,
            long.entry_price,
            Decimal::ZERO,
            pnl,
            TradeKind::Close,
        ))
    }

    fn shrink(&mut self, key: &PositionKey, amount: Decimal, fees: Decimal) {
        if let Some(position) = self.positions.get_mut(key) {
            position.amount -= amount;
            position.fees_paid -= fees;
            if position.amount <= Decimal::ZERO {
                self.positions.remove(key);
            }
        }
    }

    /// Refresh position marks from fresh snapshots.
    pub fn mark_prices(&mut self, snapshots: &SnapshotMap, now: DateTime<Utc>, max_age: Duration) {
        for position in self.positions.values_mut() {
            let key = SnapshotKey::new(position.venue.clone(), position.symbol.clone());
            if let Some(price) = snapshots
                .get(&key)
                .filter(|s| s.is_fresh(now, max_age))
                .and_then(|s| s.reference_price())
            {
                position.current_price = price;
            }
        }
        self.revalue();
    }

    /// Re-value and roll the trading day if `now` is on a later UTC day.
    ///
    /// Returns true if a day boundary was crossed.
    pub fn update_value(&mut self, now: DateTime<Utc>) -> bool {
        self.revalue();
        let today = utc_day(now);
        if today <= self.day {
            return false;
        }

        if self.day_open_value > Decimal::ZERO {
            let ret = to_f64(self.total_value / self.day_open_value) - 1.0;
            self.daily_returns.push(ret);
        }
        info!(
            day = %today,
            value = %self.total_value,
            returns = self.daily_returns.len(),
            "Trading day rolled"
        );
        self.day = today;
        self.day_open_value = self.total_value;
        true
    }

    /// Reserve quote notional for an in-flight execution.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount` for a zero or negative notional and
    /// `InsufficientBalance` if the available balance cannot cover it.
    pub fn reserve(&mut self, symbol: &Symbol, notional: Decimal) -> Result<ReservationId, LedgerError> {
        if notional <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(notional));
        }
        let available = self.available_balance();
        if notional > available {
            return Err(LedgerError::InsufficientBalance {
                requested: notional,
                available,
            });
        }

        let id = ReservationId(self.next_reservation);
        self.next_reservation += 1;
        self.reservations.insert(
            id,
            Reservation {
                symbol: symbol.clone(),
                notional,
            },
        );
        self.revalue();
        Ok(id)
    }

    /// Release a reservation.
    ///
    /// # Errors
    ///
    /// Returns `UnknownReservation` if the id was never issued or already
    /// released.
    pub fn release(&mut self, id: ReservationId) -> Result<Decimal, LedgerError> {
        let reservation = self
            .reservations
            .remove(&id)
            .ok_or(LedgerError::UnknownReservation(id.0))?;
        self.revalue();
        Ok(reservation.notional)
    }

    /// Credit (or debit, for negative amounts) a currency balance.
    pub fn deposit(&mut self, currency: &str, amount: Decimal) {
        self.credit(currency, amount);
        self.revalue();
    }

    fn credit(&mut self, currency: &str, amount: Decimal) {
        *self
            .balances
            .entry(currency.to_string())
            .or_insert(Decimal::ZERO) += amount;
    }

    #[allow(clippy::too_many_arguments)]
    fn push_trade(
        &mut self,
        opportunity_id: Option<OpportunityId>,
        symbol: Symbol,
        venue: VenueId,
        side: OrderSide,
        amount: Decimal,
        price: Decimal,
        fees: Decimal,
        realized_pnl: Decimal,
        kind: TradeKind,
    ) -> Trade {
        let trade = Trade {
            id: TradeId::new(self.next_trade),
            opportunity_id,
            symbol,
            venue,
            side,
            amount,
            price,
            fees,
            timestamp: Utc::now(),
            realized_pnl,
            kind,
        };
        self.next_trade += 1;
        self.trades.push(trade.clone());
        trade
    }

    fn revalue(&mut self) {
        let cash: Decimal = self.balances.values().copied().sum();
        let held: Decimal = self.positions.values().map(Position::market_value).sum();
        self.total_value = cash + held;

        if self.total_value > self.peak_value {
            self.peak_value = self.total_value;
        }
        self.max_drawdown = self.max_drawdown.max(self.current_drawdown());
    }
}
