use crate::cache::CacheStore;
use crate::core::item::{Category, CategoryFilter, Item, ItemDraft, ItemPatch, SearchResult};
use crate::core::price::parse_price;
use crate::sync::feed::FeedClient;
use crate::sync::{RemoteList, Subscription, SyncError};

/// Operating mode, decided once when the list is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Mirroring the backend; mutations round-trip through the change feed.
    Synced,
    /// Cache-only; mutations apply in memory and persist locally.
    Offline,
}

/// Completed/total counts over the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStats {
    pub completed: usize,
    pub total: usize,
}

/// The shared shopping list: the in-memory working copy plus its derived
/// views.
///
/// In synced mode the visible list lags the backend by one feed round trip:
/// mutations are forwarded and take effect on the next snapshot delivery,
/// never optimistically. In offline mode every mutation applies in memory
/// and triggers a cache save.
pub struct SharedList<R: RemoteList = FeedClient> {
    remote: Option<R>,
    cache: CacheStore,
    items: Vec<Item>,
    filter: CategoryFilter,
}

impl SharedList<FeedClient> {
    /// Open in cache-only mode, with no backend configured.
    pub fn offline(cache: CacheStore) -> Self {
        let items = cache.load();
        log::info!("Opened shopping list offline with {} cached items", items.len());
        Self {
            remote: None,
            cache,
            items,
            filter: CategoryFilter::All,
        }
    }
}

impl<R: RemoteList> SharedList<R> {
    /// Open the list, deciding the operating mode once.
    ///
    /// With a remote configured, a successful subscribe enters synced mode
    /// and the returned subscription delivers the initial snapshot. A
    /// subscribe failure (or no remote at all) falls back to the cached
    /// list; there is no re-promotion within a session.
    pub async fn open(remote: Option<R>, cache: CacheStore) -> (Self, Option<Subscription>) {
        if let Some(remote) = remote {
            match remote.subscribe().await {
                Ok(subscription) => {
                    let list = Self {
                        remote: Some(remote),
                        cache,
                        items: Vec::new(),
                        filter: CategoryFilter::All,
                    };
                    return (list, Some(subscription));
                }
                Err(e) => {
                    log::warn!("List backend unreachable, falling back to cache: {}", e);
                }
            }
        }
        let items = cache.load();
        log::info!("Opened shopping list offline with {} cached items", items.len());
        let list = Self {
            remote: None,
            cache,
            items,
            filter: CategoryFilter::All,
        };
        (list, None)
    }

    pub fn mode(&self) -> Mode {
        if self.remote.is_some() {
            Mode::Synced
        } else {
            Mode::Offline
        }
    }

    /// The full working copy, most-recent-first.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Replace the working copy with a feed snapshot.
    pub fn apply_snapshot(&mut self, items: Vec<Item>) {
        self.items = items;
    }

    /// Add a product picked from search results under the chosen category.
    /// Products with a blank name are skipped.
    pub async fn add_item(
        &mut self,
        product: &SearchResult,
        category: Category,
    ) -> Result<(), SyncError> {
        if product.name.trim().is_empty() {
            return Ok(());
        }
        let draft = ItemDraft::from_product(product, category);
        match &self.remote {
            Some(remote) => {
                // Visible state updates on the next feed delivery.
                remote.create(&draft).await?;
                Ok(())
            }
            None => {
                // Most-recent-first: newest entries go to the front.
                self.items.insert(0, draft.into_local_item());
                self.cache.save(&self.items);
                Ok(())
            }
        }
    }

    /// Reassign an item's category. Unknown ids are a no-op.
    pub async fn set_category(&mut self, id: &str, category: Category) -> Result<(), SyncError> {
        if !self.items.iter().any(|i| i.id == id) {
            return Ok(());
        }
        match &self.remote {
            Some(remote) => remote.update(id, &ItemPatch::category(category)).await,
            None => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
                    item.category = category;
                }
                self.cache.save(&self.items);
                Ok(())
            }
        }
    }

    /// Flip an item's completed flag. Unknown ids are a no-op; the flip
    /// value comes from the working copy, so two toggles restore it.
    pub async fn toggle_completed(&mut self, id: &str) -> Result<(), SyncError> {
        let Some(current) = self
            .items
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.completed)
        else {
            return Ok(());
        };
        match &self.remote {
            Some(remote) => remote.update(id, &ItemPatch::completed(!current)).await,
            None => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
                    item.completed = !current;
                }
                self.cache.save(&self.items);
                Ok(())
            }
        }
    }

    /// Remove an item. Idempotent — removing an absent id succeeds.
    /// Confirmation is the caller's concern.
    pub async fn remove_item(&mut self, id: &str) -> Result<(), SyncError> {
        match &self.remote {
            Some(remote) => remote.remove(id).await,
            None => {
                let before = self.items.len();
                self.items.retain(|i| i.id != id);
                if self.items.len() != before {
                    self.cache.save(&self.items);
                }
                Ok(())
            }
        }
    }

    /// Change which derived view is produced. Purely local.
    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    /// Items under the active filter, in the underlying order.
    pub fn filtered_view(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| self.filter.matches(i.category))
            .collect()
    }

    /// Estimated total over the items currently in view.
    ///
    /// Deliberately scoped to the active filter: the figure tracks what the
    /// user is looking at, not the whole list.
    pub fn total(&self) -> f64 {
        self.filtered_view()
            .iter()
            .map(|i| parse_price(i.price.as_deref()))
            .sum()
    }

    /// Completed/total counts over the unfiltered list.
    pub fn stats(&self) -> ListStats {
        ListStats {
            completed: self.items.iter().filter(|i| i.completed).count(),
            total: self.items.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn product(name: &str, price: Option<&str>) -> SearchResult {
        SearchResult {
            id: "p-1".into(),
            name: name.into(),
            image: Some("https://example.com/p.jpg".into()),
            brands: Some("Mercado Livre".into()),
            price: price.map(str::to_string),
        }
    }

    fn temp_store() -> (TempDir, CacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("list.json"));
        (dir, store)
    }

    fn reload(dir: &TempDir) -> Vec<Item> {
        CacheStore::new(dir.path().join("list.json")).load()
    }

    /// Remote that records calls and never changes any state itself.
    #[derive(Default)]
    struct ScriptedRemote {
        fail_subscribe: bool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRemote {
        fn failing() -> Self {
            Self {
                fail_subscribe: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RemoteList for ScriptedRemote {
        async fn subscribe(&self) -> Result<Subscription, SyncError> {
            if self.fail_subscribe {
                return Err(SyncError::Unavailable("scripted failure".into()));
            }
            let (tx, rx) = tokio::sync::mpsc::channel(1);
            let task = tokio::spawn(async move {
                // Keep the feed open without delivering anything.
                tx.closed().await;
            });
            Ok(Subscription::new(rx, task))
        }

        async fn create(&self, draft: &ItemDraft) -> Result<String, SyncError> {
            self.calls.lock().unwrap().push(format!("create {}", draft.name));
            Ok("remote-1".into())
        }

        async fn update(&self, id: &str, patch: &ItemPatch) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(format!(
                "update {} {}",
                id,
                serde_json::to_string(patch).unwrap()
            ));
            Ok(())
        }

        async fn remove(&self, id: &str) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(format!("remove {}", id));
            Ok(())
        }
    }

    #[tokio::test]
    async fn offline_add_filter_and_total() {
        let (_dir, store) = temp_store();
        let mut list = SharedList::offline(store);

        list.add_item(&product("Arroz", Some("R$ 10,00")), Category::Kitchen)
            .await
            .unwrap();
        list.add_item(&product("Detergente", Some("R$ 5,50")), Category::Cleaning)
            .await
            .unwrap();

        assert_eq!(list.total(), 15.50);
        assert_eq!(list.filtered_view().len(), 2);
        // Most-recent-first.
        assert_eq!(list.filtered_view()[0].name, "Detergente");

        list.set_filter(CategoryFilter::Only(Category::Kitchen));
        let view = list.filtered_view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].name, "Arroz");
        assert_eq!(list.total(), 10.00);
    }

    #[tokio::test]
    async fn offline_mutations_survive_restart() {
        let (dir, store) = temp_store();
        let mut list = SharedList::offline(store);

        list.add_item(&product("Arroz", Some("R$ 29,90")), Category::Kitchen)
            .await
            .unwrap();
        assert_eq!(reload(&dir), list.items());

        let id = list.items()[0].id.clone();
        list.toggle_completed(&id).await.unwrap();
        assert_eq!(reload(&dir), list.items());

        list.set_category(&id, Category::Cleaning).await.unwrap();
        assert_eq!(reload(&dir), list.items());

        list.remove_item(&id).await.unwrap();
        assert!(list.items().is_empty());
        assert_eq!(reload(&dir), list.items());
    }

    #[tokio::test]
    async fn toggle_twice_restores_original() {
        let (_dir, store) = temp_store();
        let mut list = SharedList::offline(store);
        list.add_item(&product("Café", None), Category::Kitchen)
            .await
            .unwrap();
        let id = list.items()[0].id.clone();

        assert!(!list.items()[0].completed);
        list.toggle_completed(&id).await.unwrap();
        assert!(list.items()[0].completed);
        list.toggle_completed(&id).await.unwrap();
        assert!(!list.items()[0].completed);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (_dir, store) = temp_store();
        let mut list = SharedList::offline(store);
        list.add_item(&product("Café", None), Category::Kitchen)
            .await
            .unwrap();
        let id = list.items()[0].id.clone();

        list.remove_item(&id).await.unwrap();
        list.remove_item(&id).await.unwrap();
        assert!(list.items().is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_no_ops() {
        let (_dir, store) = temp_store();
        let mut list = SharedList::offline(store);
        list.add_item(&product("Café", Some("R$ 18,50")), Category::Kitchen)
            .await
            .unwrap();
        let before = list.items().to_vec();

        list.set_category("nope", Category::Cleaning).await.unwrap();
        list.toggle_completed("nope").await.unwrap();
        list.remove_item("nope").await.unwrap();

        assert_eq!(list.items(), before.as_slice());
    }

    #[tokio::test]
    async fn blank_names_are_skipped() {
        let (_dir, store) = temp_store();
        let mut list = SharedList::offline(store);
        list.add_item(&product("   ", None), Category::Kitchen)
            .await
            .unwrap();
        assert!(list.items().is_empty());
    }

    #[tokio::test]
    async fn stats_count_whole_list_regardless_of_filter() {
        let (_dir, store) = temp_store();
        let mut list = SharedList::offline(store);
        list.add_item(&product("Arroz", None), Category::Kitchen)
            .await
            .unwrap();
        list.add_item(&product("Sabão", None), Category::Cleaning)
            .await
            .unwrap();
        let id = list.items()[0].id.clone();
        list.toggle_completed(&id).await.unwrap();

        list.set_filter(CategoryFilter::Only(Category::Bedroom));
        assert!(list.filtered_view().is_empty());
        assert_eq!(
            list.stats(),
            ListStats {
                completed: 1,
                total: 2
            }
        );
    }

    #[tokio::test]
    async fn subscribe_failure_falls_back_to_cache() {
        let (dir, store) = temp_store();
        {
            let mut seeded = SharedList::offline(store);
            seeded
                .add_item(&product("Arroz", Some("R$ 29,90")), Category::Kitchen)
                .await
                .unwrap();
        }

        let store = CacheStore::new(dir.path().join("list.json"));
        let (list, subscription) =
            SharedList::open(Some(ScriptedRemote::failing()), store).await;

        assert!(subscription.is_none());
        assert_eq!(list.mode(), Mode::Offline);
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].name, "Arroz");
    }

    #[tokio::test]
    async fn synced_mutations_forward_without_touching_state() {
        let (_dir, store) = temp_store();
        let (mut list, subscription) =
            SharedList::open(Some(ScriptedRemote::default()), store).await;
        let subscription = subscription.unwrap();
        assert_eq!(list.mode(), Mode::Synced);

        // Feed delivers the authoritative state.
        let snapshot = vec![
            ItemDraft::from_product(&product("Arroz", Some("R$ 10,00")), Category::Kitchen)
                .into_local_item(),
        ];
        let id = snapshot[0].id.clone();
        list.apply_snapshot(snapshot);
        assert_eq!(list.items().len(), 1);

        list.add_item(&product("Café", None), Category::Kitchen)
            .await
            .unwrap();
        list.toggle_completed(&id).await.unwrap();
        list.set_category(&id, Category::Cleaning).await.unwrap();
        list.remove_item(&id).await.unwrap();

        // Nothing applied locally; everything went to the backend.
        assert_eq!(list.items().len(), 1);
        assert!(!list.items()[0].completed);
        assert_eq!(list.items()[0].category, Category::Kitchen);

        let calls = list.remote.as_ref().unwrap().calls();
        assert_eq!(
            calls,
            vec![
                "create Café".to_string(),
                format!("update {} {{\"completed\":true}}", id),
                format!("update {} {{\"category\":\"Cleaning\"}}", id),
                format!("remove {}", id),
            ]
        );

        subscription.cancel();
    }

    #[tokio::test]
    async fn synced_toggle_on_unseen_id_stays_local_no_op() {
        let (_dir, store) = temp_store();
        let (mut list, _subscription) =
            SharedList::open(Some(ScriptedRemote::default()), store).await;

        // No snapshot applied yet: nothing is visible, so nothing forwards.
        list.toggle_completed("ghost").await.unwrap();
        assert!(list.remote.as_ref().unwrap().calls().is_empty());
    }

    #[tokio::test]
    async fn snapshot_replaces_working_copy() {
        let (_dir, store) = temp_store();
        let (mut list, _subscription) =
            SharedList::open(Some(ScriptedRemote::default()), store).await;

        let a = ItemDraft::from_product(&product("Arroz", None), Category::Kitchen)
            .into_local_item();
        let b = ItemDraft::from_product(&product("Café", None), Category::Kitchen)
            .into_local_item();

        list.apply_snapshot(vec![a.clone(), b.clone()]);
        assert_eq!(list.items().len(), 2);

        list.apply_snapshot(vec![b]);
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].name, "Café");
    }

    #[tokio::test]
    async fn filtered_view_preserves_relative_order() {
        let (_dir, store) = temp_store();
        let mut list = SharedList::offline(store);
        for (name, category) in [
            ("Arroz", Category::Kitchen),
            ("Sabão", Category::Cleaning),
            ("Café", Category::Kitchen),
            ("Esponja", Category::Cleaning),
        ] {
            list.add_item(&product(name, None), category).await.unwrap();
        }

        list.set_filter(CategoryFilter::Only(Category::Kitchen));
        let names: Vec<&str> = list
            .filtered_view()
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        // Insertion order was Arroz..Esponja, the list is newest-first.
        assert_eq!(names, vec!["Café", "Arroz"]);

        list.set_filter(CategoryFilter::All);
        let names: Vec<&str> = list
            .filtered_view()
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["Esponja", "Café", "Sabão", "Arroz"]);
    }
}
