//! Test utilities for helm-core
//!
//! Recording collaborators that capture setter calls, diagnostics and
//! deliveries so tests can assert on order and content.

use std::sync::{Arc, Mutex};

use crate::catalog::{Agent, AgentCatalog, Assistant, Catalogs};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::projector::{SelectedValues, SelectedValuesSink};
use crate::session::{OptionSetter, SessionField};

/// Setter that records every call instead of writing a session.
#[derive(Debug, Default)]
pub struct RecordingSetter {
    calls: Vec<(SessionField, String)>,
}

impl RecordingSetter {
    pub fn calls(&self) -> Vec<(SessionField, String)> {
        self.calls.clone()
    }
}

impl OptionSetter for RecordingSetter {
    fn set_option(&mut self, field: SessionField, value: String) {
        self.calls.push((field, value));
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic.clone());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingValuesSink {
    deliveries: Arc<Mutex<Vec<SelectedValues>>>,
}

impl RecordingValuesSink {
    pub fn deliveries(&self) -> Vec<SelectedValues> {
        self.deliveries
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl SelectedValuesSink for RecordingValuesSink {
    fn deliver(&self, values: SelectedValues) {
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.push(values);
        }
    }
}

/// Agent catalog with the given ids, in order.
pub fn agent_catalog(ids: &[&str]) -> AgentCatalog {
    ids.iter().copied().map(Agent::new).collect()
}

/// Catalogs holding `agents` plus `(namespace, id, model)` assistants.
pub fn catalogs(agents: &[&str], assistants: &[(&str, &str, &str)]) -> Catalogs {
    let mut catalogs = Catalogs {
        agents: agent_catalog(agents),
        ..Catalogs::default()
    };
    for (namespace, id, model) in assistants {
        catalogs
            .assistants
            .insert(*namespace, Assistant::new(*id, *model));
    }
    catalogs
}
