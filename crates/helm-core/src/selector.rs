use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::Catalogs;
use crate::config::StartupConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::endpoint::EntityKind;
use crate::error::{Error, Result};
use crate::persistence::PersistenceBridge;
use crate::resolver::{ResolutionContext, apply_effects, resolve};
use crate::session::{OptionSetter, SessionField, SessionSlot, SessionState, SessionStore};

/// Inputs whose change triggers a fresh resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolutionKey {
    endpoint: Option<String>,
    agent_id: Option<String>,
    assistant_id: Option<String>,
    slot: SessionSlot,
    catalog_revision: u64,
    default_agent_id: Option<String>,
}

/// Keeps one session slot's selection consistent with the loaded catalogs.
///
/// Resolution reruns from scratch whenever any of its inputs change: the
/// session's endpoint or selected ids, the slot, the catalogs, or the
/// configured default agent.
pub struct SelectorEffects {
    slot: SessionSlot,
    session: SessionStore,
    catalogs: Arc<Catalogs>,
    catalog_revision: u64,
    startup: StartupConfig,
    persisted: PersistenceBridge,
    diagnostics: Arc<dyn DiagnosticSink>,
    last_key: Option<ResolutionKey>,
}

impl SelectorEffects {
    pub fn new(slot: SessionSlot, session: SessionStore, persisted: PersistenceBridge) -> Self {
        Self {
            slot,
            session,
            catalogs: Arc::new(Catalogs::default()),
            catalog_revision: 0,
            startup: StartupConfig::default(),
            persisted,
            diagnostics: Arc::new(TracingSink),
            last_key: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_catalogs(mut self, catalogs: impl Into<Arc<Catalogs>>) -> Self {
        self.catalogs = catalogs.into();
        self.catalog_revision += 1;
        self
    }

    pub fn with_startup_config(mut self, startup: StartupConfig) -> Self {
        self.startup = startup;
        self
    }

    pub fn slot(&self) -> SessionSlot {
        self.slot
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Swap in freshly loaded catalogs and re-resolve.
    pub fn set_catalogs(&mut self, catalogs: impl Into<Arc<Catalogs>>) -> bool {
        self.catalogs = catalogs.into();
        self.catalog_revision += 1;
        self.sync()
    }

    pub fn set_startup_config(&mut self, startup: StartupConfig) -> bool {
        self.startup = startup;
        self.sync()
    }

    pub fn set_slot(&mut self, slot: SessionSlot) -> bool {
        self.slot = slot;
        self.sync()
    }

    /// Resolve if any input changed since the last run. Returns true if the
    /// session was written.
    pub fn sync(&mut self) -> bool {
        let snapshot = self.session.snapshot();
        let key = self.key_for(&snapshot);
        if self.last_key.as_ref() == Some(&key) {
            return false;
        }
        self.last_key = Some(key);
        self.resolve_snapshot(&snapshot)
    }

    /// Resolve unconditionally.
    pub fn reconcile(&mut self) -> bool {
        let snapshot = self.session.snapshot();
        self.last_key = Some(self.key_for(&snapshot));
        self.resolve_snapshot(&snapshot)
    }

    /// Apply an explicit user pick and remember it for this slot.
    pub fn select_entity(&mut self, kind: EntityKind, id: &str) -> Result<()> {
        let model = match kind {
            EntityKind::Agent => {
                if !self.catalogs.agents.contains(id) {
                    return Err(Error::NotFound(format!("agent '{id}'")));
                }
                String::new()
            }
            EntityKind::Assistant => {
                let endpoint = self.session.snapshot().endpoint.unwrap_or_default();
                let assistant = self
                    .catalogs
                    .assistants
                    .get(&endpoint, id)
                    .ok_or_else(|| Error::NotFound(format!("assistant '{id}' in '{endpoint}'")))?;
                assistant.model.clone()
            }
        };

        info!(slot = %self.slot, %kind, id, "Selecting entity");
        self.session.set_option(SessionField::Model, model);
        self.session.set_option(kind.session_field(), id.to_string());
        self.persisted.remember(self.slot, kind, id)
    }

    /// React to session and catalog changes until cancelled.
    pub async fn run(
        mut self,
        mut catalogs_rx: watch::Receiver<Arc<Catalogs>>,
        cancel: CancellationToken,
    ) {
        let mut session_rx = self.session.subscribe();
        let initial = catalogs_rx.borrow_and_update().clone();
        self.set_catalogs(initial);
        let mut catalogs_open = true;

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                changed = session_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.sync();
                }

                changed = catalogs_rx.changed(), if catalogs_open => {
                    if changed.is_err() {
                        debug!("Catalog source closed; keeping last catalogs");
                        catalogs_open = false;
                        continue;
                    }
                    let catalogs = catalogs_rx.borrow_and_update().clone();
                    self.set_catalogs(catalogs);
                }
            }
        }
        debug!(slot = %self.slot, "Selector stopped");
    }

    fn key_for(&self, session: &SessionState) -> ResolutionKey {
        ResolutionKey {
            endpoint: session.endpoint.clone(),
            agent_id: session.agent_id.clone(),
            assistant_id: session.assistant_id.clone(),
            slot: self.slot,
            catalog_revision: self.catalog_revision,
            default_agent_id: self.startup.default_agent_id.clone(),
        }
    }

    fn resolve_snapshot(&mut self, snapshot: &SessionState) -> bool {
        let ctx = ResolutionContext {
            catalogs: &self.catalogs,
            default_agent_id: self.startup.default_agent_id.as_deref(),
            slot: self.slot,
            persisted: &self.persisted,
        };
        let effects = resolve(snapshot, &ctx);
        apply_effects(effects, &mut self.session, self.diagnostics.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::test_utils::{RecordingSink, catalogs};

    fn selector(session: SessionState, sink: &RecordingSink) -> SelectorEffects {
        SelectorEffects::new(
            SessionSlot(0),
            SessionStore::new(session),
            PersistenceBridge::in_memory(),
        )
        .with_diagnostics(Arc::new(sink.clone()))
    }

    #[test]
    fn resolves_once_catalog_arrives() {
        let sink = RecordingSink::default();
        let mut selector = selector(SessionState::with_endpoint("agents"), &sink);

        assert!(!selector.sync());
        assert_eq!(sink.diagnostics()[0].kind(), DiagnosticKind::ConditionsNotMet);

        assert!(selector.set_catalogs(catalogs(&["A1", "A2"], &[])));
        let session = selector.session().snapshot();
        assert_eq!(session.agent_id.as_deref(), Some("A1"));
        assert_eq!(session.model.as_deref(), Some(""));
    }

    #[test]
    fn unchanged_inputs_do_not_rerun() {
        let sink = RecordingSink::default();
        let mut selector = selector(SessionState::with_endpoint("agents"), &sink);

        selector.sync();
        selector.sync();
        assert_eq!(sink.diagnostics().len(), 1);

        selector.reconcile();
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn configured_default_change_triggers_resolution() {
        let sink = RecordingSink::default();
        let mut selector = selector(SessionState::default(), &sink)
            .with_catalogs(catalogs(&["A1", "A2"], &[]));
        assert!(!selector.sync());

        selector.session().update(|s| s.endpoint = Some("agents".to_string()));
        assert!(selector.set_startup_config(StartupConfig {
            default_agent_id: Some("A2".to_string()),
        }));
        assert_eq!(selector.session().snapshot().agent_id.as_deref(), Some("A2"));
    }

    #[test]
    fn explicit_pick_is_remembered_per_slot() {
        let sink = RecordingSink::default();
        let mut selector = selector(SessionState::with_endpoint("assistants"), &sink)
            .with_catalogs(catalogs(
                &[],
                &[("assistants", "X1", "gpt-x"), ("assistants", "X2", "gpt-y")],
            ));

        selector.select_entity(EntityKind::Assistant, "X2").unwrap();
        let session = selector.session().snapshot();
        assert_eq!(session.model.as_deref(), Some("gpt-y"));
        assert_eq!(session.assistant_id.as_deref(), Some("X2"));

        let err = selector.select_entity(EntityKind::Agent, "A1").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // A fresh session in the same slot picks the remembered assistant.
        selector.session().replace(SessionState::with_endpoint("assistants"));
        assert!(selector.sync());
        assert_eq!(selector.session().snapshot().assistant_id.as_deref(), Some("X2"));
    }

    #[tokio::test]
    async fn run_loop_follows_catalog_updates() {
        let sink = RecordingSink::default();
        let selector = selector(SessionState::with_endpoint("agents"), &sink);
        let session = selector.session().clone();
        let mut session_rx = session.subscribe();
        let (catalogs_tx, catalogs_rx) = watch::channel(Arc::new(Catalogs::default()));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(selector.run(catalogs_rx, cancel.clone()));

        catalogs_tx.send(Arc::new(catalogs(&["A7"], &[]))).unwrap();
        session_rx.wait_for(|s| s.agent_id.is_some()).await.unwrap();
        assert_eq!(session.snapshot().agent_id.as_deref(), Some("A7"));

        cancel.cancel();
        task.await.unwrap();
    }
}
