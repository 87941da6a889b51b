//! Market snapshot port.
//!
//! Market-data ingestion is an external concern; the trading cycle only
//! needs the latest quote per (venue, symbol).

use async_trait::async_trait;

use crate::domain::SnapshotMap;
use crate::error::Result;

/// Source of the latest market snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Latest snapshot per (venue, symbol). Staleness is filtered by callers.
    async fn latest(&self) -> Result<SnapshotMap>;
}
