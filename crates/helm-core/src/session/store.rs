use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::state::{OptionSetter, SessionField, SessionState};

/// Owned session record with change notification.
///
/// Every accepted write publishes a new state to subscribers. Writes that leave
/// the state unchanged are not published.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Apply a change made by the surrounding session manager (switching
    /// endpoint, applying a preset, loading another conversation).
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) -> bool {
        self.tx.send_if_modified(|state| {
            let before = state.clone();
            f(state);
            *state != before
        })
    }

    /// Replace the whole record, e.g. when a different conversation is loaded.
    pub fn replace(&self, state: SessionState) -> bool {
        self.update(|current| *current = state)
    }
}

impl OptionSetter for SessionStore {
    fn set_option(&mut self, field: SessionField, value: String) {
        debug!(%field, value = %value, "Setting session option");
        self.tx.send_if_modified(|state| {
            if state.field(field) == Some(value.as_str()) {
                return false;
            }
            state.set_option(field, value);
            true
        });
    }
}
