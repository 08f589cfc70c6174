// Snapshot feed trait - async source of subscription refreshes
use crate::domain::snapshot::SampleSnapshot;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A new snapshot of the subscription.
    Data(SampleSnapshot),
    /// The host viewport changed size.
    Resize,
}

#[async_trait]
pub trait SnapshotFeed: Send {
    /// Next event from the feed, or `None` once it is exhausted.
    async fn next_event(&mut self) -> anyhow::Result<Option<FeedEvent>>;
}
