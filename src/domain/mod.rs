//! Venue-agnostic domain logic.

pub mod id;
pub mod money;
pub mod opportunity;
pub mod position;
pub mod risk;
pub mod snapshot;
pub mod spread;
pub mod stats;
pub mod time;
pub mod trade;

// Core domain types
pub use id::{OpportunityId, OrderId, Symbol, TradeId, VenueId};
pub use money::{Price, Volume};
pub use opportunity::{Opportunity, OpportunityBuildError, OpportunityBuilder, StrategyKind};
pub use position::{OrderSide, Position, PositionKey, Side};
pub use risk::{BreachAction, BreakerState, LimitKind, RiskEvent, RiskEventKind, RiskLimit};
pub use snapshot::{MarketSnapshot, SnapshotKey, SnapshotMap};
pub use spread::{SpreadBook, SpreadHistory, SpreadKey};
pub use trade::{Trade, TradeKind};
