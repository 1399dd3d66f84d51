pub mod feed;
pub mod keyring;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::item::{Item, ItemDraft, ItemPatch};

/// Errors surfaced by the shared list backend.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The backend could not be reached at all.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The targeted item does not exist on the backend.
    #[error("item not found: {0}")]
    NotFound(String),
    /// The backend answered with a non-success status.
    #[error("backend rejected request: {0}")]
    Rejected(String),
    /// The client could not be built from the given settings.
    #[error("sync configuration error: {0}")]
    Config(String),
}

/// A change-feed delivery.
#[derive(Debug)]
pub enum FeedEvent {
    /// The full current list, ordered most-recent-first.
    Snapshot(Vec<Item>),
    /// The feed failed. Delivered at most once; no further events follow.
    Lost(SyncError),
}

/// Handle to a live change-feed subscription.
///
/// Deliveries are serialized through the channel. Dropping the handle
/// aborts the feed task; no events arrive afterwards.
pub struct Subscription {
    pub events: mpsc::Receiver<FeedEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(events: mpsc::Receiver<FeedEvent>, task: JoinHandle<()>) -> Self {
        Self { events, task }
    }

    /// Stop the feed. Dropping the handle has the same effect.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The remote side of the shared list, as the list engine sees it.
///
/// [`feed::FeedClient`] is the production implementation; tests inject a
/// scripted one.
#[allow(async_fn_in_trait)]
pub trait RemoteList {
    /// Open the change feed. The initial snapshot arrives as the first
    /// event; an `Err` here is the signal to fall back to cache-only mode.
    async fn subscribe(&self) -> Result<Subscription, SyncError>;

    /// Insert a new item. The backend assigns the id and a server-relative
    /// creation time, so ordering holds across clients with clock skew.
    async fn create(&self, draft: &ItemDraft) -> Result<String, SyncError>;

    /// Merge the named patch fields into an existing item. Concurrent
    /// writers resolve last-write-wins per field on the backend.
    async fn update(&self, id: &str, patch: &ItemPatch) -> Result<(), SyncError>;

    /// Delete an item. Deleting an absent item succeeds.
    async fn remove(&self, id: &str) -> Result<(), SyncError>;
}
