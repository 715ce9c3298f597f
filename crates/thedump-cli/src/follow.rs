//! Follows session events for one capture and prints its progress.

use std::io::{self, Write};

use log::{debug, info, warn};
use thedump::{SessionEvent, SessionStore, UploadStatus};
use tokio::sync::broadcast::{self, error::RecvError};

/// How a followed capture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Organized(UploadStatus),
    Failed(String),
    /// The item left the session before reaching a terminal state.
    Gone,
}

/// Writes every status change of `id` to `out` until it becomes terminal.
///
/// `rx` must have been subscribed before the capture started so that no
/// transition is missed. An item that is already terminal still gets its
/// final line written.
pub async fn follow_item<W: Write>(
    store: &SessionStore,
    id: &str,
    mut rx: broadcast::Receiver<SessionEvent>,
    out: &mut W,
) -> io::Result<Outcome> {
    if let Some(outcome) = finished(store, id, out)? {
        return Ok(outcome);
    }

    loop {
        match rx.recv().await {
            Ok(SessionEvent::StatusChanged { id: changed, status, .. }) if changed == id => {
                writeln!(out, "{}", status.display_text())?;
                if let Some(outcome) = terminal(&status) {
                    return Ok(outcome);
                }
            }
            Ok(SessionEvent::ItemRemoved { id: removed }) if removed == id => {
                return Ok(Outcome::Gone);
            }
            Ok(SessionEvent::Cleared) => return Ok(Outcome::Gone),
            Ok(other) => debug!("Ignoring session event for {:?}", other.item_id()),
            Err(RecvError::Lagged(n)) => {
                warn!("Session event follower lagged, missed {} events", n);
                // Catch up from the store directly.
                if let Some(outcome) = finished(store, id, out)? {
                    return Ok(outcome);
                }
            }
            Err(RecvError::Closed) => {
                info!("Session events closed");
                return Ok(Outcome::Gone);
            }
        }
    }
}

/// Writes the final line for `id` if the store already holds it as terminal.
fn finished<W: Write>(store: &SessionStore, id: &str, out: &mut W) -> io::Result<Option<Outcome>> {
    let Some(item) = store.get_item(id) else {
        return Ok(None);
    };
    let Some(outcome) = terminal(item.status()) else {
        return Ok(None);
    };
    writeln!(out, "{}", item.status().display_text())?;
    Ok(Some(outcome))
}

fn terminal(status: &UploadStatus) -> Option<Outcome> {
    match status {
        UploadStatus::Processed { .. } => Some(Outcome::Organized(status.clone())),
        UploadStatus::Failed { error } => Some(Outcome::Failed(error.clone())),
        _ => None,
    }
}
