use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::mpsc;

use super::{FeedEvent, RemoteList, Subscription, SyncError};
use crate::core::item::{Item, ItemDraft, ItemPatch};

/// Client for the shared list service, a small JSON/HTTP document store:
///
/// - `GET    {base}/lists/{list}/items` — full snapshot ordered by
///   `created_at` descending; the current feed sequence number comes back
///   in the `X-List-Seq` header.
/// - `POST   {base}/lists/{list}/items` — insert an [`ItemDraft`]; the
///   stored item (backend id, server-relative `created_at`) is returned.
/// - `PATCH  {base}/lists/{list}/items/{id}` — merge the named fields,
///   last-write-wins per field.
/// - `DELETE {base}/lists/{list}/items/{id}` — idempotent.
/// - `GET    {base}/lists/{list}/changes?since={seq}` — long-poll; answers
///   with the current sequence number once it advances (or unchanged on a
///   server-side timeout).
#[derive(Clone)]
pub struct FeedClient {
    base_url: String,
    list: String,
    username: String,
    password: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ChangeNotice {
    seq: u64,
}

impl FeedClient {
    pub fn new(
        base_url: &str,
        list: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, SyncError> {
        let http = Client::builder()
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            list: list.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            http,
        })
    }

    fn items_url(&self) -> String {
        format!("{}/lists/{}/items", self.base_url, self.list)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/lists/{}/items/{}", self.base_url, self.list, id)
    }

    fn changes_url(&self, since: u64) -> String {
        format!("{}/lists/{}/changes?since={}", self.base_url, self.list, since)
    }

    /// Fetch the full ordered snapshot plus the feed sequence it reflects.
    async fn fetch_snapshot(&self) -> Result<(Vec<Item>, u64), SyncError> {
        let resp = self
            .http
            .get(self.items_url())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| SyncError::Unavailable(format!("GET items: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Rejected(format!("GET items returned {}", status)));
        }

        let seq = resp
            .headers()
            .get("x-list-seq")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let items = resp
            .json::<Vec<Item>>()
            .await
            .map_err(|e| SyncError::Rejected(format!("decode items: {}", e)))?;

        Ok((items, seq))
    }

    /// Long-poll the changes endpoint. Returns the sequence number the
    /// server answered with; unchanged means "no news, poll again".
    async fn wait_for_change(&self, since: u64) -> Result<u64, SyncError> {
        let resp = self
            .http
            .get(self.changes_url(since))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| SyncError::Unavailable(format!("GET changes: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Rejected(format!(
                "GET changes returned {}",
                status
            )));
        }

        let notice: ChangeNotice = resp
            .json()
            .await
            .map_err(|e| SyncError::Rejected(format!("decode change notice: {}", e)))?;

        Ok(notice.seq)
    }
}

impl RemoteList for FeedClient {
    async fn subscribe(&self) -> Result<Subscription, SyncError> {
        // The initial fetch doubles as the connection check: a failure here
        // sends the caller to cache-only mode.
        let (items, mut seq) = self.fetch_snapshot().await?;

        let (tx, rx) = mpsc::channel(8);
        let client = self.clone();
        let task = tokio::spawn(async move {
            if tx.send(FeedEvent::Snapshot(items)).await.is_err() {
                return;
            }
            loop {
                match client.wait_for_change(seq).await {
                    Ok(new_seq) if new_seq > seq => match client.fetch_snapshot().await {
                        Ok((items, snap_seq)) => {
                            seq = snap_seq.max(new_seq);
                            if tx.send(FeedEvent::Snapshot(items)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(FeedEvent::Lost(e)).await;
                            return;
                        }
                    },
                    // Server-side poll timeout, nothing new.
                    Ok(_) => {}
                    Err(e) => {
                        let _ = tx.send(FeedEvent::Lost(e)).await;
                        return;
                    }
                }
            }
        });

        Ok(Subscription::new(rx, task))
    }

    async fn create(&self, draft: &ItemDraft) -> Result<String, SyncError> {
        let resp = self
            .http
            .post(self.items_url())
            .basic_auth(&self.username, Some(&self.password))
            .json(draft)
            .send()
            .await
            .map_err(|e| SyncError::Unavailable(format!("POST item: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Rejected(format!("POST item returned {}", status)));
        }

        let stored: Item = resp
            .json()
            .await
            .map_err(|e| SyncError::Rejected(format!("decode created item: {}", e)))?;

        log::debug!("Created item {} on backend", stored.id);
        Ok(stored.id)
    }

    async fn update(&self, id: &str, patch: &ItemPatch) -> Result<(), SyncError> {
        let resp = self
            .http
            .patch(self.item_url(id))
            .basic_auth(&self.username, Some(&self.password))
            .json(patch)
            .send()
            .await
            .map_err(|e| SyncError::Unavailable(format!("PATCH item: {}", e)))?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(SyncError::NotFound(id.to_string())),
            s => Err(SyncError::Rejected(format!("PATCH {} returned {}", id, s))),
        }
    }

    async fn remove(&self, id: &str) -> Result<(), SyncError> {
        let resp = self
            .http
            .delete(self.item_url(id))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| SyncError::Unavailable(format!("DELETE item: {}", e)))?;

        match resp.status() {
            // Already gone counts as deleted.
            StatusCode::NO_CONTENT | StatusCode::OK | StatusCode::NOT_FOUND => Ok(()),
            s => Err(SyncError::Rejected(format!("DELETE {} returned {}", id, s))),
        }
    }
}
