//! Default-selection resolution.
//!
//! When a session is in agents or assistants mode and nothing is selected yet,
//! the resolver picks an entity from the loaded catalog. Resolution is a pure
//! function of its inputs returning the writes to perform, in order; callers
//! apply them through an [`OptionSetter`].
//!
//! Fallback chain for agents: persisted last-used id, then the configured
//! default agent (only if it is in the catalog), then the first catalog entry.
//! Assistants skip the configured-default step. A persisted id that is no
//! longer in the catalog ends the attempt: nothing is selected and an
//! [`Diagnostic::EntityNotFound`] is reported.

use serde::Serialize;
use strum::Display;
use tracing::debug;

use crate::catalog::{AgentCatalog, AssistantNamespace, Catalogs, Entity, EntityMap};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::endpoint::{EndpointKind, EntityKind};
use crate::persistence::PersistenceBridge;
use crate::session::{OptionSetter, SessionField, SessionSlot, SessionState};

/// Where a resolution candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CandidateSource {
    Persisted,
    ConfiguredDefault,
    FirstInCatalog,
}

/// A write or report produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEffect {
    SetOption { field: SessionField, value: String },
    Report(Diagnostic),
}

impl SelectionEffect {
    fn set(field: SessionField, value: impl Into<String>) -> Self {
        SelectionEffect::SetOption {
            field,
            value: value.into(),
        }
    }

    pub fn is_set_option(&self) -> bool {
        matches!(self, SelectionEffect::SetOption { .. })
    }
}

/// Inputs shared by every resolution for one session slot.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub catalogs: &'a Catalogs,
    pub default_agent_id: Option<&'a str>,
    pub slot: SessionSlot,
    pub persisted: &'a PersistenceBridge,
}

/// Resolve whichever entity kind the session's endpoint governs.
pub fn resolve(session: &SessionState, ctx: &ResolutionContext<'_>) -> Vec<SelectionEffect> {
    match session.endpoint_kind() {
        Some(EndpointKind::Agents) => resolve_agent_selection(
            session,
            &ctx.catalogs.agents,
            ctx.default_agent_id,
            ctx.slot,
            ctx.persisted,
        ),
        Some(EndpointKind::Assistants) => {
            let empty = AssistantNamespace::new();
            let namespace = session
                .endpoint
                .as_deref()
                .and_then(|endpoint| ctx.catalogs.assistants.namespace(endpoint))
                .unwrap_or(&empty);
            resolve_assistant_selection(session, namespace, ctx.slot, ctx.persisted)
        }
        Some(EndpointKind::Generic) | None => Vec::new(),
    }
}

pub fn resolve_agent_selection(
    session: &SessionState,
    catalog: &AgentCatalog,
    default_agent_id: Option<&str>,
    slot: SessionSlot,
    persisted: &PersistenceBridge,
) -> Vec<SelectionEffect> {
    if session.endpoint_kind() != Some(EndpointKind::Agents) || session.agent_id.is_some() {
        return Vec::new();
    }

    let configured = default_agent_id.filter(|id| catalog.contains(id));
    let Some(candidate) = pick_candidate(EntityKind::Agent, catalog, slot, persisted, configured)
    else {
        return vec![SelectionEffect::Report(Diagnostic::EmptyCatalog {
            entity: EntityKind::Agent,
            slot,
            namespace: None,
        })];
    };

    match catalog.get(&candidate.id) {
        Some(agent) => {
            debug!(%slot, agent_id = %agent.id, source = %candidate.source, "Resolved agent selection");
            vec![
                SelectionEffect::set(SessionField::Model, ""),
                SelectionEffect::set(SessionField::AgentId, agent.id.clone()),
            ]
        }
        None => vec![SelectionEffect::Report(candidate.not_found(EntityKind::Agent, slot))],
    }
}

pub fn resolve_assistant_selection(
    session: &SessionState,
    namespace: &AssistantNamespace,
    slot: SessionSlot,
    persisted: &PersistenceBridge,
) -> Vec<SelectionEffect> {
    if session.endpoint_kind() != Some(EndpointKind::Assistants)
        || session.assistant_id.is_some()
    {
        return Vec::new();
    }

    let Some(candidate) = pick_candidate(EntityKind::Assistant, namespace, slot, persisted, None)
    else {
        return vec![SelectionEffect::Report(Diagnostic::EmptyCatalog {
            entity: EntityKind::Assistant,
            slot,
            namespace: session.endpoint.clone(),
        })];
    };

    match namespace.get(&candidate.id) {
        Some(assistant) => {
            debug!(%slot, assistant_id = %assistant.id, source = %candidate.source, "Resolved assistant selection");
            vec![
                SelectionEffect::set(SessionField::Model, assistant.model.clone()),
                SelectionEffect::set(SessionField::AssistantId, assistant.id.clone()),
            ]
        }
        None => vec![SelectionEffect::Report(
            candidate.not_found(EntityKind::Assistant, slot),
        )],
    }
}

/// Apply resolution effects in order. Returns true if any session write ran.
pub fn apply_effects(
    effects: Vec<SelectionEffect>,
    setter: &mut impl OptionSetter,
    sink: &dyn DiagnosticSink,
) -> bool {
    let mut wrote = false;
    for effect in effects {
        match effect {
            SelectionEffect::SetOption { field, value } => {
                setter.set_option(field, value);
                wrote = true;
            }
            SelectionEffect::Report(diagnostic) => sink.report(&diagnostic),
        }
    }
    wrote
}

struct Candidate {
    id: String,
    source: CandidateSource,
}

impl Candidate {
    fn not_found(self, entity: EntityKind, slot: SessionSlot) -> Diagnostic {
        Diagnostic::EntityNotFound {
            entity,
            id: self.id,
            source: self.source,
            slot,
        }
    }
}

/// Walk the fallback chain. Returns `None` only for an empty catalog. The
/// persisted id, when present, is returned as is even if the catalog no longer
/// holds it.
fn pick_candidate<T: Entity>(
    kind: EntityKind,
    catalog: &EntityMap<T>,
    slot: SessionSlot,
    persisted: &PersistenceBridge,
    configured: Option<&str>,
) -> Option<Candidate> {
    let first = catalog.first()?;

    let candidate = if let Some(id) = persisted.read(slot, kind) {
        Candidate {
            id,
            source: CandidateSource::Persisted,
        }
    } else if let Some(id) = configured {
        Candidate {
            id: id.to_string(),
            source: CandidateSource::ConfiguredDefault,
        }
    } else {
        Candidate {
            id: first.id().to_string(),
            source: CandidateSource::FirstInCatalog,
        }
    };
    Some(candidate)
}
