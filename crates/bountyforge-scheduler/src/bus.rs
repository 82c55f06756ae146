//! The in-process Event Bus Publisher: a
//! `tokio::sync::broadcast` channel per job, fanned out to every
//! subscriber of that job's channel.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bountyforge_core::bus::EventBus;
use bountyforge_core::event::Event;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

const CHANNEL_CAPACITY: usize = 256;

/// `EventBus` implementation backed by one `broadcast::Sender` per
/// channel name. Channels are created lazily on first publish or
/// subscribe and are never explicitly torn down — a channel with no
/// subscribers and no further publishes is simply garbage once its
/// `Sender` is dropped along with the map entry's last reference.
pub struct InMemoryEventBus {
    channels: Mutex<HashMap<String, broadcast::Sender<Event>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn sender_for(&self, channel: &str) -> broadcast::Sender<Event> {
        let mut channels = self.channels.lock().expect("event bus mutex poisoned");
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, channel: &str, event: Event) {
        // A send with no receivers is not an error (Bus
        // error... logged and ignored) — it just means nobody is
        // subscribed to this job's channel right now.
        let _ = self.sender_for(channel).send(event);
    }

    async fn subscribe(&self, channel: &str) -> BoxStream<'static, Event> {
        let receiver = self.sender_for(channel).subscribe();
        let inner = BroadcastStream::new(receiver).filter_map(|result| async move { result.ok() });

        // Yield events until (and including) the first terminal one,
        // then end the stream.
        futures::stream::unfold((Box::pin(inner), false), |(mut inner, done)| async move {
            if done {
                return None;
            }
            let event = inner.next().await?;
            let done = event.kind.is_terminal();
            Some((event, (inner, done)))
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bountyforge_core::id::ResourceId;

    #[tokio::test]
    async fn subscriber_receives_published_events_and_stream_ends_at_terminal() {
        let bus = InMemoryEventBus::new();
        let job_id = ResourceId::new();
        let mut stream = bus.subscribe("scan:test").await;

        bus.publish("scan:test", Event::started(job_id)).await;
        bus.publish("scan:test", Event::finished(job_id)).await;

        let first = stream.next().await.unwrap();
        assert_eq!(first.kind, bountyforge_core::event::EventKind::Started);
        let second = stream.next().await.unwrap();
        assert_eq!(second.kind, bountyforge_core::event::EventKind::Finished);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_not_an_error() {
        let bus = InMemoryEventBus::new();
        bus.publish("scan:nobody-listening", Event::started(ResourceId::new())).await;
    }
}
