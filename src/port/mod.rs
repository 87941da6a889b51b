//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (venues, market data, scoring models, notification sinks).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Gateway │            │  Snapshot   │              │ Notifier  │
//! │ Adapter │            │  Adapter    │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```

pub mod inbound;
pub mod outbound;

pub use inbound::strategy::{DetectionContext, Strategy};
pub use outbound::gateway::{Fill, FillStatus, OrderGateway, OrderRequest, OrderType};
pub use outbound::notifier::{
    Event, ExecutionEvent, Notifier, NotifierRegistry, NullNotifier, OpportunityEvent,
    PortfolioSummary, RejectionEvent,
};
pub use outbound::scorer::{Score, Scorer};
pub use outbound::snapshot::SnapshotStore;
