//! Scripted replays of session changes through the selector and projector.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use helm_core::EntityKind;
use helm_core::catalog::Catalogs;
use helm_core::config::StartupConfig;
use helm_core::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use helm_core::persistence::PersistenceBridge;
use helm_core::projector::{DebouncedProjector, SelectedValues};
use helm_core::selector::SelectorEffects;
use helm_core::session::{SessionSlot, SessionState, SessionStore};

use crate::error::Error;

/// A session starting point followed by timed changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub slot: Option<usize>,
    #[serde(default)]
    pub default_agent_id: Option<String>,
    #[serde(default)]
    pub quiet_window_ms: Option<u64>,
    #[serde(default)]
    pub session: SessionState,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One change, applied `after_ms` after the previous step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub after_ms: u64,
    /// Start a new conversation: every field not named below is cleared.
    #[serde(default)]
    pub reset: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub spec: Option<String>,
    /// Explicit user pick, applied after the field changes.
    #[serde(default)]
    pub pick: Option<Pick>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pick {
    pub kind: EntityKind,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedDelivery {
    pub at_ms: u64,
    #[serde(flatten)]
    pub values: SelectedValues,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub deliveries: Vec<TimedDelivery>,
    pub diagnostics: Vec<Diagnostic>,
    pub session: SessionState,
}

/// Everything a replay needs besides the scenario itself.
pub struct SimulationEnv {
    pub catalogs: Catalogs,
    pub persisted: PersistenceBridge,
    pub slot: SessionSlot,
    pub startup: StartupConfig,
    pub quiet_window: Duration,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents).map_err(|e| Error::Scenario(e.to_string()))
    }

    /// Replay the scenario in real time and collect what downstream state
    /// would have received.
    pub async fn run(&self, env: SimulationEnv) -> Result<SimulationReport, Error> {
        let slot = self.slot.map_or(env.slot, SessionSlot);
        let startup = StartupConfig {
            default_agent_id: self
                .default_agent_id
                .clone()
                .or(env.startup.default_agent_id),
        };
        let quiet_window = self
            .quiet_window_ms
            .map_or(env.quiet_window, Duration::from_millis);

        let diagnostics = Arc::new(Mutex::new(Vec::new()));
        let recorded = diagnostics.clone();
        let sink = move |diagnostic: &Diagnostic| {
            TracingSink.report(diagnostic);
            if let Ok(mut recorded) = recorded.lock() {
                recorded.push(diagnostic.clone());
            }
        };

        let mut selector = SelectorEffects::new(
            slot,
            SessionStore::new(self.session.clone()),
            env.persisted,
        )
        .with_diagnostics(Arc::new(sink))
        .with_catalogs(env.catalogs)
        .with_startup_config(startup);

        let start = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let projector = DebouncedProjector::spawn(
            selector.session().subscribe(),
            move |values: SelectedValues| {
                let delivery = TimedDelivery {
                    at_ms: start.elapsed().as_millis() as u64,
                    values,
                };
                if tx.send(delivery).is_err() {
                    debug!("Simulation ended before delivery was recorded");
                }
            },
            quiet_window,
        );

        info!(%slot, steps = self.steps.len(), "Replaying scenario");
        selector.sync();
        for step in &self.steps {
            if step.after_ms > 0 {
                sleep(Duration::from_millis(step.after_ms)).await;
            }
            step.apply(selector.session());
            if let Some(pick) = &step.pick {
                selector.select_entity(pick.kind, &pick.id)?;
            }
            selector.sync();
        }

        // Give the projector a window to see the last change, then wait out
        // whatever it still has pending.
        sleep(quiet_window).await;
        projector.settled().await;
        projector.shutdown().await;

        let mut deliveries = Vec::new();
        while let Ok(delivery) = rx.try_recv() {
            deliveries.push(delivery);
        }
        let diagnostics = diagnostics
            .lock()
            .map(|d| d.clone())
            .map_err(|_| Error::Scenario("diagnostic log poisoned".to_string()))?;

        Ok(SimulationReport {
            deliveries,
            diagnostics,
            session: selector.session().snapshot(),
        })
    }
}

impl Step {
    fn apply(&self, session: &SessionStore) {
        session.update(|state| {
            if self.reset {
                *state = SessionState::default();
            }
            let fields = [
                (&mut state.endpoint, &self.endpoint),
                (&mut state.agent_id, &self.agent_id),
                (&mut state.assistant_id, &self.assistant_id),
                (&mut state.model, &self.model),
                (&mut state.spec, &self.spec),
            ];
            for (slot, value) in fields {
                if value.is_some() {
                    slot.clone_from(value);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_and_picks() {
        let scenario = Scenario::from_toml(
            r#"
            default_agent_id = "A2"

            [session]
            endpoint = "agents"

            [[steps]]
            after_ms = 40
            pick = { kind = "agent", id = "A1" }

            [[steps]]
            after_ms = 200
            reset = true
            endpoint = "openAI"
            model = "gpt-4o"
            "#,
        )
        .unwrap();

        assert_eq!(scenario.default_agent_id.as_deref(), Some("A2"));
        assert_eq!(scenario.session.endpoint.as_deref(), Some("agents"));
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[0].pick.as_ref().unwrap().kind, EntityKind::Agent);
        assert!(scenario.steps[1].reset);
    }

    #[test]
    fn reset_clears_unnamed_fields() {
        let store = SessionStore::new(SessionState {
            agent_id: Some("A1".to_string()),
            ..SessionState::with_endpoint("agents")
        });
        let step = Step {
            reset: true,
            endpoint: Some("openAI".to_string()),
            model: Some("gpt-4o".to_string()),
            ..Step::default()
        };

        step.apply(&store);

        let state = store.snapshot();
        assert_eq!(state.endpoint.as_deref(), Some("openAI"));
        assert_eq!(state.model.as_deref(), Some("gpt-4o"));
        assert_eq!(state.agent_id, None);
    }

    #[test]
    fn malformed_scenario_is_rejected() {
        let err = Scenario::from_toml("steps = 3").unwrap_err();
        assert!(matches!(err, Error::Scenario(_)));
    }
}
