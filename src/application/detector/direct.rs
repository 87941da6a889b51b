//! Direct cross-venue spread detection.
//!
//! For every ordered venue pair (A, B) with `ask(A) < bid(B)`, buying on A
//! and selling on B locks in `bid(B) - ask(A)` per unit before fees.

use rust_decimal::Decimal;
use tracing::trace;

use crate::domain::{MarketSnapshot, Opportunity, StrategyKind, Symbol};
use crate::port::inbound::strategy::{DetectionContext, Strategy};

/// Strategy emitting risk-free-looking spreads between quotes.
pub struct DirectSpreadStrategy {
    confidence: f64,
}

impl DirectSpreadStrategy {
    #[must_use]
    pub const fn new(confidence: f64) -> Self {
        Self { confidence }
    }

    fn evaluate(
        &self,
        ctx: &DetectionContext<'_>,
        symbol: &Symbol,
        buy: &MarketSnapshot,
        sell: &MarketSnapshot,
    ) -> Option<Opportunity> {
        let ask = buy.ask()?;
        let bid = sell.bid()?;
        if ask >= bid {
            return None;
        }

        let fees = ctx.leg_fees(ask, bid);
        let opportunity = Opportunity::builder()
            .symbol(symbol.clone())
            .buy(buy.venue.clone(), ask)
            .sell(sell.venue.clone(), bid)
            .estimated_fees(fees)
            .confidence(self.confidence)
            .volume_available(buy.volume.min(sell.volume))
            .strategy(StrategyKind::Direct)
            .detected_at(ctx.now)
            .build()
            .ok()?;

        if opportunity.net_profit() <= Decimal::ZERO
            || opportunity.net_margin_pct() < ctx.min_profit_pct()
        {
            trace!(
                symbol = %symbol,
                buy = %buy.venue,
                sell = %sell.venue,
                net = %opportunity.net_profit(),
                "Direct spread below threshold"
            );
            return None;
        }

        Some(opportunity)
    }
}

impl Strategy for DirectSpreadStrategy {
    fn name(&self) -> &'static str {
        "direct_spread"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    fn detect(&mut self, ctx: &DetectionContext<'_>) -> Vec<Opportunity> {
        let mut found = Vec::new();
        for (symbol, venues) in &ctx.markets {
            for buy in venues {
                for sell in venues {
                    if buy.venue == sell.venue {
                        continue;
                    }
                    if let Some(opp) = self.evaluate(ctx, symbol, buy, sell) {
                        found.push(opp);
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn context<'a>(snapshots: &'a [MarketSnapshot]) -> DetectionContext<'a> {
        let mut markets: BTreeMap<Symbol, Vec<&MarketSnapshot>> = BTreeMap::new();
        for s in snapshots {
            markets.entry(s.symbol.clone()).or_default().push(s);
        }
        DetectionContext {
            now: Utc::now(),
            markets,
            fee_rate_per_leg: dec!(0.001),
            min_profit_threshold: dec!(0.002),
        }
    }

    #[test]
    fn detects_worked_example() {
        let snapshots = vec![
            MarketSnapshot::new("a", "BTC/USDT")
                .with_quote(dec!(100.0), dec!(100.5))
                .with_volume(dec!(5)),
            MarketSnapshot::new("b", "BTC/USDT")
                .with_quote(dec!(101.0), dec!(101.2))
                .with_volume(dec!(3)),
        ];
        let ctx = context(&snapshots);

        let found = DirectSpreadStrategy::new(0.8).detect(&ctx);

        assert_eq!(found.len(), 1);
        let opp = &found[0];
        assert_eq!(opp.buy_venue().as_str(), "a");
        assert_eq!(opp.sell_venue().as_str(), "b");
        assert_eq!(opp.buy_price(), dec!(100.5));
        assert_eq!(opp.sell_price(), dec!(101.0));
        assert_eq!(opp.gross_profit(), dec!(0.5));
        assert_eq!(opp.estimated_fees(), dec!(0.2015));
        assert_eq!(opp.net_profit(), dec!(0.2985));
        assert_eq!(opp.profit_pct().round_dp(4), dec!(0.4975));
        assert_eq!(opp.volume_available(), dec!(3));
        assert_eq!(opp.confidence(), 0.8);
        assert_eq!(opp.strategy(), StrategyKind::Direct);
    }

    #[test]
    fn fees_can_eat_the_spread() {
        let snapshots = vec![
            MarketSnapshot::new("a", "ETH/USDT").with_quote(dec!(99.9), dec!(100.0)),
            MarketSnapshot::new("b", "ETH/USDT").with_quote(dec!(100.1), dec!(100.3)),
        ];

        let found = DirectSpreadStrategy::new(0.8).detect(&context(&snapshots));

        assert!(found.is_empty());
    }

    #[test]
    fn missing_quote_skips_pair() {
        let snapshots = vec![
            MarketSnapshot::new("a", "BTC/USDT").with_quote(dec!(100.0), dec!(0)),
            MarketSnapshot::new("b", "BTC/USDT").with_quote(dec!(110.0), dec!(110.2)),
        ];

        let found = DirectSpreadStrategy::new(0.8).detect(&context(&snapshots));

        assert!(found.is_empty());
    }

    #[test]
    fn crossed_quotes_do_not_mix_symbols() {
        let snapshots = vec![
            MarketSnapshot::new("a", "BTC/USDT").with_quote(dec!(100.0), dec!(100.5)),
            MarketSnapshot::new("b", "ETH/USDT").with_quote(dec!(200.0), dec!(200.5)),
        ];

        let found = DirectSpreadStrategy::new(0.8).detect(&context(&snapshots));

        assert!(found.is_empty());
    }
}
