//! Event Bus Publisher contract.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::event::Event;
use crate::id::ResourceId;

/// Channel name for a job's event stream: `scan:<job-id>`.
pub fn job_channel(job_id: ResourceId) -> String {
    format!("scan:{job_id}")
}

/// Lightweight, best-effort pub/sub abstraction. `publish` never blocks
/// and never fails loudly — a publish with no subscribers is simply
/// dropped. `subscribe` yields a finite stream that ends once a terminal
/// event kind is observed for that channel.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, channel: &str, event: Event);

    async fn subscribe(&self, channel: &str) -> BoxStream<'static, Event>;
}
