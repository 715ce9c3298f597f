//! In-memory session list with background status polling.
//!
//! The store owns the ordered list of captures (newest first). Every mutation
//! runs under one mutex that is never held across an `.await`, so capture
//! flows, the polling loop and auto-removal timers are serialized with each
//! other. `clear()` bumps a generation counter and aborts all background
//! tasks; tasks re-check the generation after every suspension point so a
//! late poll result can never touch a cleared list.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::events::{SessionEvent, SessionEventBroadcaster};
use super::item::{SessionItem, UploadStatus};
use crate::remote::{FileStatusItem, StatusService};

/// Time between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Time an organized item stays visible before it is dropped from the list.
pub const AUTO_REMOVE_DELAY: Duration = Duration::from_secs(6);

/// Message used when the backend reports a failure without details.
pub const DEFAULT_PROCESSING_ERROR: &str = "Processing failed";

const STATUS_COMPLETED: &str = "completed";
const STATUS_FAILED: &str = "failed";

struct StoreState {
    items: Vec<SessionItem>,
    /// Incremented by `clear()`; background tasks compare against it.
    generation: u64,
    /// Present while a polling loop is active.
    poller: Option<JoinHandle<()>>,
    removals: HashMap<String, JoinHandle<()>>,
}

impl StoreState {
    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn has_processing(&self) -> bool {
        self.items.iter().any(|item| item.status().is_processing())
    }

    fn processing_uuids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.status().is_processing())
            .filter_map(|item| item.file_uuid().map(|s| s.to_string()))
            .collect()
    }
}

struct StoreInner {
    state: Mutex<StoreState>,
    status_service: Arc<dyn StatusService>,
    events: SessionEventBroadcaster,
}

impl StoreInner {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Session store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(poller) = state.poller.take() {
            poller.abort();
        }
        for (_, removal) in state.removals.drain() {
            removal.abort();
        }
    }
}

/// Session-scoped list of captures and their upload/organization status.
///
/// Cloning is cheap; all clones share the same list.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    /// Creates an empty store that polls `status_service` for processing items.
    pub fn new(status_service: Arc<dyn StatusService>) -> Self {
        Self::with_broadcaster(status_service, SessionEventBroadcaster::default())
    }

    pub fn with_broadcaster(
        status_service: Arc<dyn StatusService>,
        events: SessionEventBroadcaster,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState {
                    items: Vec::new(),
                    generation: 0,
                    poller: None,
                    removals: HashMap::new(),
                }),
                status_service,
                events,
            }),
        }
    }

    /// Subscribes to list changes. One event is sent per applied mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Inserts an item at the front of the list.
    pub fn add_item(&self, item: SessionItem) {
        let mut state = self.inner.lock();
        debug!("Adding {} item {} ({})", item.kind, item.id, item.original_filename);
        state.items.insert(0, item.clone());
        self.inner.events.send(SessionEvent::ItemAdded { item });
    }

    /// Replaces an item's status in place. Unknown ids and backward
    /// transitions are ignored.
    pub fn update_status(&self, id: &str, status: UploadStatus) {
        let mut state = self.inner.lock();
        apply_status(&mut state, &self.inner.events, id, status);
    }

    pub fn mark_uploading(&self, id: &str) {
        self.update_status(id, UploadStatus::Uploading);
    }

    /// Records the remote identifier, moves the item to `processing` and makes
    /// sure the polling loop is running.
    pub fn mark_processing(&self, id: &str, file_uuid: &str) {
        let mut state = self.inner.lock();
        let Some(index) = state.position(id) else {
            debug!("mark_processing: item {} no longer exists", id);
            return;
        };

        let item = &mut state.items[index];
        if !item.begin_processing(file_uuid) {
            return;
        }
        self.inner.events.send(SessionEvent::StatusChanged {
            id: id.to_string(),
            status: UploadStatus::Processing,
            file_uuid: Some(file_uuid.to_string()),
        });

        self.ensure_polling(&mut state);
    }

    pub fn mark_failed(&self, id: &str, error: &str) {
        self.update_status(
            id,
            UploadStatus::Failed {
                error: error.to_string(),
            },
        );
    }

    pub fn get_item(&self, id: &str) -> Option<SessionItem> {
        let state = self.inner.lock();
        state.items.iter().find(|item| item.id == id).cloned()
    }

    /// Snapshot of the list, newest first.
    pub fn items(&self) -> Vec<SessionItem> {
        self.inner.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    /// Whether a polling loop is currently active.
    pub fn is_polling(&self) -> bool {
        self.inner.lock().poller.is_some()
    }

    /// Cancels polling and pending removals, then empties the list.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.generation += 1;

        if let Some(poller) = state.poller.take() {
            poller.abort();
        }
        for (_, removal) in state.removals.drain() {
            removal.abort();
        }

        let removed = state.items.len();
        state.items.clear();
        info!("Session cleared ({} items dropped)", removed);
        self.inner.events.send(SessionEvent::Cleared);
    }

    /// Starts the polling loop unless one is already running.
    fn ensure_polling(&self, state: &mut StoreState) {
        if state.poller.is_some() {
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available; status polling not started");
            return;
        };

        let generation = state.generation;
        let weak = Arc::downgrade(&self.inner);
        state.poller = Some(runtime.spawn(poll_loop(weak, generation)));
        debug!("Status polling started (generation {})", generation);
    }
}

/// Applies a status update and emits the matching event. Returns whether the
/// item changed.
fn apply_status(
    state: &mut StoreState,
    events: &SessionEventBroadcaster,
    id: &str,
    status: UploadStatus,
) -> bool {
    let Some(index) = state.position(id) else {
        debug!("update_status: item {} no longer exists", id);
        return false;
    };

    let item = &mut state.items[index];
    if !item.advance(status.clone()) {
        return false;
    }

    events.send(SessionEvent::StatusChanged {
        id: id.to_string(),
        status,
        file_uuid: item.file_uuid().map(|s| s.to_string()),
    });
    true
}

/// Upgrades the weak handle and locks the state, but only if the store still
/// exists and has not been cleared since `generation`.
fn with_live_state<T>(
    weak: &Weak<StoreInner>,
    generation: u64,
    f: impl FnOnce(&StoreInner, &mut StoreState) -> T,
) -> Option<T> {
    let inner = weak.upgrade()?;
    let mut state = inner.lock();
    if state.generation != generation {
        return None;
    }
    Some(f(&inner, &mut state))
}

async fn poll_loop(weak: Weak<StoreInner>, generation: u64) {
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let Some(file_uuids) =
            with_live_state(&weak, generation, |_, state| state.processing_uuids())
        else {
            return;
        };

        if !file_uuids.is_empty() {
            let Some(service) = weak
                .upgrade()
                .map(|inner| Arc::clone(&inner.status_service))
            else {
                return;
            };

            debug!("Polling status for {} file(s)", file_uuids.len());
            match service.fetch_statuses(&file_uuids).await {
                Ok(statuses) => {
                    let applied = with_live_state(&weak, generation, |inner, state| {
                        reconcile(inner, state, &weak, generation, statuses)
                    });
                    if applied.is_none() {
                        return;
                    }
                }
                Err(e) => {
                    // Retried on the next tick.
                    debug!("Status poll failed: {}", e);
                }
            }
        }

        let finished = with_live_state(&weak, generation, |_, state| {
            if state.has_processing() {
                false
            } else {
                state.poller = None;
                true
            }
        });

        match finished {
            Some(false) => continue,
            Some(true) => {
                debug!("No items processing, status polling stopped");
                return;
            }
            None => return,
        }
    }
}

/// Folds one batch of remote statuses into the list.
fn reconcile(
    inner: &StoreInner,
    state: &mut StoreState,
    weak: &Weak<StoreInner>,
    generation: u64,
    statuses: Vec<FileStatusItem>,
) {
    for status in statuses {
        let Some(item) = state
            .items
            .iter()
            .find(|item| item.file_uuid() == Some(status.file_uuid.as_str()))
        else {
            continue;
        };
        let id = item.id.clone();

        match status.status.as_str() {
            STATUS_COMPLETED => {
                let next = UploadStatus::Processed {
                    note_id: status.organized_note_id.unwrap_or_default(),
                    title: status.title,
                    category: status.category_name,
                };
                if apply_status(state, &inner.events, &id, next) {
                    info!("Item {} organized", id);
                    schedule_removal(state, weak, generation, id);
                }
            }
            STATUS_FAILED => {
                let error = status
                    .error
                    .unwrap_or_else(|| DEFAULT_PROCESSING_ERROR.to_string());
                if apply_status(state, &inner.events, &id, UploadStatus::Failed { error }) {
                    info!("Item {} failed processing", id);
                }
            }
            _ => {}
        }
    }
}

fn schedule_removal(state: &mut StoreState, weak: &Weak<StoreInner>, generation: u64, id: String) {
    let weak = weak.clone();
    let task_id = id.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(AUTO_REMOVE_DELAY).await;

        with_live_state(&weak, generation, |inner, state| {
            state.removals.remove(&task_id);
            if let Some(index) = state.position(&task_id) {
                state.items.remove(index);
                debug!("Auto-removed organized item {}", task_id);
                inner
                    .events
                    .send(SessionEvent::ItemRemoved { id: task_id.clone() });
            }
        });
    });

    if let Some(previous) = state.removals.insert(id, handle) {
        previous.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::error::Result as ApiResult;
    use crate::session::item::SessionItemKind;
    use async_trait::async_trait;
    use tokio::sync::broadcast::error::TryRecvError;

    /// Status service that never reports progress.
    struct IdleStatusService;

    #[async_trait]
    impl StatusService for IdleStatusService {
        async fn fetch_statuses(&self, file_uuids: &[String]) -> ApiResult<Vec<FileStatusItem>> {
            Ok(file_uuids
                .iter()
                .map(|uuid| FileStatusItem::pending(uuid))
                .collect())
        }
    }

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(IdleStatusService))
    }

    fn text_item(id: &str) -> SessionItem {
        SessionItem::new(SessionItemKind::Text, format!("{}.txt", id)).with_id(id)
    }

    #[test]
    fn test_add_item_is_newest_first() {
        let store = store();
        store.add_item(text_item("a"));
        store.add_item(text_item("b"));
        store.add_item(text_item("c"));

        let ids: Vec<String> = store.items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_update_status_preserves_position() {
        let store = store();
        store.add_item(text_item("a"));
        store.add_item(text_item("b"));

        store.mark_uploading("a");

        let items = store.items();
        assert_eq!(items[1].id, "a");
        assert_eq!(items[1].status(), &UploadStatus::Uploading);
        assert_eq!(items[0].status(), &UploadStatus::Pending);
    }

    #[test]
    fn test_update_missing_item_is_noop() {
        let store = store();
        let mut rx = store.subscribe();

        store.mark_uploading("ghost");
        store.mark_failed("ghost", "nope");

        assert!(store.is_empty());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_mark_failed() {
        let store = store();
        store.add_item(text_item("x1"));
        store.mark_uploading("x1");
        store.mark_failed("x1", "Network unreachable");

        let item = store.get_item("x1").unwrap();
        assert_eq!(item.status().display_text(), "Failed: Network unreachable");
        assert!(item.status().is_retryable());
        assert!(item.file_uuid().is_none());
    }

    #[test]
    fn test_get_item_absent() {
        assert!(store().get_item("missing").is_none());
    }

    #[test]
    fn test_one_event_per_mutation() {
        let store = store();
        let mut rx = store.subscribe();

        store.add_item(text_item("x1"));
        store.mark_uploading("x1");
        // Same state again: not a mutation.
        store.mark_uploading("x1");

        assert!(matches!(
            rx.try_recv().unwrap(),
            SessionEvent::ItemAdded { .. }
        ));
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::StatusChanged {
                id: "x1".to_string(),
                status: UploadStatus::Uploading,
                file_uuid: None,
            }
        );
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_clear_empties_and_notifies() {
        let store = store();
        store.add_item(text_item("a"));
        store.add_item(text_item("b"));
        let mut rx = store.subscribe();

        store.clear();

        assert!(store.is_empty());
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Cleared);
    }

    #[test]
    fn test_mark_processing_without_runtime_still_transitions() {
        let store = store();
        store.add_item(text_item("x1"));
        store.mark_processing("x1", "uuid-1");

        let item = store.get_item("x1").unwrap();
        assert_eq!(item.status(), &UploadStatus::Processing);
        assert_eq!(item.file_uuid(), Some("uuid-1"));
        assert!(!store.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_processing_starts_single_poller() {
        let store = store();
        store.add_item(text_item("a"));
        store.add_item(text_item("b"));

        store.mark_processing("a", "uuid-a");
        assert!(store.is_polling());
        store.mark_processing("b", "uuid-b");
        assert!(store.is_polling());

        store.clear();
        assert!(!store.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_processing_missing_item_does_not_poll() {
        let store = store();
        store.mark_processing("ghost", "uuid-1");
        assert!(!store.is_polling());
    }
}
