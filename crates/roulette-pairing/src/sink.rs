//! Outbound notice delivery.

use async_trait::async_trait;
use roulette_common::Notice;

/// Receives the notices produced by the [`Orchestrator`](crate::Orchestrator).
///
/// Delivery, formatting and localization are the sink's business. A sink
/// must not call back into the orchestrator.
#[async_trait]
pub trait NoticeSink: Send + Sync {
    async fn deliver(&self, notice: Notice);
}
