use std::fmt;

use serde::Serialize;
use strum::Display;
use tracing::warn;

use crate::endpoint::EntityKind;
use crate::resolver::CandidateSource;
use crate::session::SessionSlot;

/// Non-fatal condition observed while resolving a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A persisted or configured id is not in the catalog. Resolution stopped
    /// without substituting another entity.
    EntityNotFound {
        entity: EntityKind,
        id: String,
        source: CandidateSource,
        slot: SessionSlot,
    },
    /// Nothing to select from.
    EmptyCatalog {
        entity: EntityKind,
        slot: SessionSlot,
        #[serde(skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DiagnosticKind {
    #[strum(serialize = "entity not found during resolution")]
    EntityNotFound,
    #[strum(serialize = "resolution conditions not met")]
    ConditionsNotMet,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::EntityNotFound { .. } => DiagnosticKind::EntityNotFound,
            Diagnostic::EmptyCatalog { .. } => DiagnosticKind::ConditionsNotMet,
        }
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            Diagnostic::EntityNotFound { entity, .. } | Diagnostic::EmptyCatalog { entity, .. } => {
                *entity
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EntityNotFound {
                entity, id, source, ..
            } => write!(f, "{}: {entity} '{id}' ({source})", self.kind()),
            Diagnostic::EmptyCatalog { entity, .. } => {
                write!(f, "{}: no {entity} available", self.kind())
            }
        }
    }
}

/// Receiver of resolution diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Logs each diagnostic as a structured warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::EntityNotFound {
                entity,
                id,
                source,
                slot,
            } => warn!(
                %entity,
                id = %id,
                %source,
                %slot,
                "Selection not found in catalog"
            ),
            Diagnostic::EmptyCatalog {
                entity,
                slot,
                namespace,
            } => warn!(
                %entity,
                %slot,
                namespace = namespace.as_deref().unwrap_or_default(),
                "Selection conditions not met: catalog is empty"
            ),
        }
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic);
    }
}
