//! Debounced projection of the session selection to downstream UI state.
//!
//! The projector watches the selection-relevant session fields and, once they
//! have been quiet for the configured window, delivers a normalized
//! [`SelectedValues`] triple. Rapid successive changes coalesce into a single
//! delivery built from the values current when the window elapses.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::endpoint::EndpointKind;
use crate::session::SessionState;
use crate::session::state::is_set;

pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(150);

/// Normalized selection consumed by menus and other downstream state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedValues {
    pub endpoint: String,
    pub model: String,
    pub model_spec: String,
}

/// Map a session to the triple it should publish, or `None` when it has no
/// endpoint or no selection to show. Catalog membership is not checked here.
pub fn project(session: &SessionState) -> Option<SelectedValues> {
    let endpoint = session.endpoint.as_deref().filter(|e| !e.is_empty())?;

    let has_selection = [
        &session.assistant_id,
        &session.agent_id,
        &session.model,
        &session.spec,
    ]
    .into_iter()
    .any(|value| is_set(value.as_deref()));
    if !has_selection {
        return None;
    }

    let model = match EndpointKind::classify(Some(endpoint))? {
        EndpointKind::Agents => &session.agent_id,
        EndpointKind::Assistants => &session.assistant_id,
        EndpointKind::Generic => &session.model,
    };

    Some(SelectedValues {
        endpoint: endpoint.to_string(),
        model: model.clone().unwrap_or_default(),
        model_spec: session.spec.clone().unwrap_or_default(),
    })
}

/// Receiver of projected selections.
pub trait SelectedValuesSink: Send + Sync {
    fn deliver(&self, values: SelectedValues);
}

impl<F> SelectedValuesSink for F
where
    F: Fn(SelectedValues) + Send + Sync,
{
    fn deliver(&self, values: SelectedValues) {
        self(values);
    }
}

/// Downstream store holding the latest delivered selection.
#[derive(Debug)]
pub struct SelectedValuesStore {
    tx: watch::Sender<Option<SelectedValues>>,
}

impl Default for SelectedValuesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectedValuesStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<SelectedValues> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SelectedValues>> {
        self.tx.subscribe()
    }
}

impl SelectedValuesSink for SelectedValuesStore {
    fn deliver(&self, values: SelectedValues) {
        self.tx.send_replace(Some(values));
    }
}

/// Single-slot debounce timer. At most one deadline is outstanding; scheduling
/// again replaces it.
#[derive(Debug, Clone)]
pub struct Debounce {
    quiet_window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            deadline: None,
        }
    }

    /// Arm the timer relative to `now`. Returns true if a pending deadline was
    /// replaced.
    pub fn schedule(&mut self, now: Instant) -> bool {
        self.deadline.replace(now + self.quiet_window).is_some()
    }

    /// Disarm the timer. Returns true if a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has elapsed at `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Handle to a running projector. Dropping or detaching it cancels any
/// pending delivery.
#[derive(Debug)]
pub struct ProjectorHandle {
    cancel: CancellationToken,
    pending: watch::Receiver<bool>,
    task: Option<JoinHandle<()>>,
}

impl ProjectorHandle {
    pub fn detach(&self) {
        self.cancel.cancel();
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until no delivery is pending. Returns at once if the projector has
    /// already stopped.
    pub async fn settled(&self) {
        let mut pending = self.pending.clone();
        if pending.wait_for(|pending| !pending).await.is_err() {
            trace!("Projector stopped while waiting to settle");
        }
    }

    /// Detach and wait for the projector task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ProjectorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct DebouncedProjector<S> {
    session_rx: watch::Receiver<SessionState>,
    sink: S,
    debounce: Debounce,
    last_seen: Option<SessionState>,
    pending: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl<S> DebouncedProjector<S>
where
    S: SelectedValuesSink + 'static,
{
    /// Start projecting on the current tokio runtime. The state present at
    /// spawn time counts as the first change.
    pub fn spawn(
        session_rx: watch::Receiver<SessionState>,
        sink: S,
        quiet_window: Duration,
    ) -> ProjectorHandle {
        let cancel = CancellationToken::new();
        let (pending, pending_rx) = watch::channel(false);
        let projector = Self {
            session_rx,
            sink,
            debounce: Debounce::new(quiet_window),
            last_seen: None,
            pending,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(projector.run());
        ProjectorHandle {
            cancel,
            pending: pending_rx,
            task: Some(task),
        }
    }

    async fn run(mut self) {
        let initial = self.session_rx.borrow_and_update().clone();
        self.observe(initial);

        loop {
            let deadline = self.debounce.deadline();
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    if self.debounce.cancel() {
                        debug!("Projector detached with a pending delivery; dropping it");
                    }
                    self.pending.send_replace(false);
                    break;
                }

                changed = self.session_rx.changed() => {
                    if changed.is_err() {
                        debug!("Session closed; stopping projector");
                        self.debounce.cancel();
                        self.pending.send_replace(false);
                        break;
                    }
                    let current = self.session_rx.borrow_and_update().clone();
                    self.observe(current);
                }

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.deliver();
                }
            }
        }
    }

    fn observe(&mut self, current: SessionState) {
        if self.last_seen.as_ref() == Some(&current) {
            return;
        }
        let qualifies = project(&current).is_some();
        self.last_seen = Some(current);

        if qualifies {
            let replaced = self.debounce.schedule(Instant::now());
            self.pending.send_replace(true);
            trace!(replaced, "Scheduled selection delivery");
        }
    }

    fn deliver(&mut self) {
        if !self.debounce.fire(Instant::now()) {
            return;
        }
        self.pending.send_replace(false);

        // Values as of now, not as of scheduling.
        let current = self.session_rx.borrow().clone();
        match project(&current) {
            Some(values) if !self.cancel.is_cancelled() => {
                debug!(
                    endpoint = %values.endpoint,
                    model = %values.model,
                    model_spec = %values.model_spec,
                    "Delivering selected values"
                );
                self.sink.deliver(values);
            }
            Some(_) => {}
            None => debug!("Selection no longer projectable; skipping delivery"),
        }
    }
}
