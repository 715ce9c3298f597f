//! Builders for creating session fixtures.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use thedump::session::POLL_INTERVAL;
use thedump::{SessionItem, SessionItemKind, SessionStore, StatusService};

/// Creates a text item with a fixed id.
pub fn text_item(id: &str) -> SessionItem {
    SessionItem::new(SessionItemKind::Text, format!("note_{}.txt", id)).with_id(id)
}

/// Creates a store over the given status service.
pub fn store_with<S: StatusService + 'static>(service: &S) -> SessionStore
where
    S: Clone,
{
    SessionStore::new(Arc::new(service.clone()))
}

/// Adds an item and walks it to `processing` with the given remote id.
pub fn add_processing(store: &SessionStore, id: &str, file_uuid: &str) {
    store.add_item(text_item(id));
    store.mark_uploading(id);
    store.mark_processing(id, file_uuid);
}

/// Sleeps just past the given number of poll ticks.
pub async fn after_ticks(ticks: u32) {
    tokio::time::sleep(POLL_INTERVAL * ticks + Duration::from_millis(1)).await;
}
