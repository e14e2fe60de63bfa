use async_trait::async_trait;
use comfy_table::{Cell, Color, Table};
use eyre::Result;
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex};

use helm_core::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use helm_core::projector::{SelectedValues, project};
use helm_core::selector::SelectorEffects;
use helm_core::session::{SessionState, SessionStore};

use super::{Command, CommandContext};
use crate::error::Error;

pub struct ResolveCommand {
    pub context: CommandContext,
    pub session: SessionState,
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub session: SessionState,
    pub diagnostics: Vec<Diagnostic>,
    pub selected_values: Option<SelectedValues>,
}

#[async_trait]
impl Command for ResolveCommand {
    async fn execute(&self) -> Result<()> {
        let report = self.resolve()?;
        let mut stdout = std::io::stdout();
        if self.json {
            writeln!(stdout, "{}", serde_json::to_string_pretty(&report)?)?;
        } else {
            print_report(&mut stdout, &report)?;
        }
        Ok(())
    }
}

impl ResolveCommand {
    pub fn resolve(&self) -> std::result::Result<ResolveReport, Error> {
        let diagnostics = Arc::new(Mutex::new(Vec::new()));
        let recorded = diagnostics.clone();
        let sink = move |diagnostic: &Diagnostic| {
            TracingSink.report(diagnostic);
            if let Ok(mut recorded) = recorded.lock() {
                recorded.push(diagnostic.clone());
            }
        };

        let mut selector = SelectorEffects::new(
            self.context.slot,
            SessionStore::new(self.session.clone()),
            self.context.persistence()?,
        )
        .with_diagnostics(Arc::new(sink))
        .with_catalogs(self.context.load_catalogs()?)
        .with_startup_config(self.context.config.startup_config());
        selector.sync();

        let session = selector.session().snapshot();
        let diagnostics = diagnostics
            .lock()
            .map(|d| d.clone())
            .map_err(|_| Error::Config("diagnostic log poisoned".to_string()))?;

        Ok(ResolveReport {
            selected_values: project(&session),
            session,
            diagnostics,
        })
    }
}

fn print_report(out: &mut impl Write, report: &ResolveReport) -> std::io::Result<()> {
    let field = |value: &Option<String>| match value.as_deref() {
        None => "-".to_string(),
        Some("") => "(empty)".to_string(),
        Some(value) => value.to_string(),
    };

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Field").fg(Color::Green),
        Cell::new("Value").fg(Color::Green),
    ]);
    let session = &report.session;
    table.add_row(vec![Cell::new("endpoint"), Cell::new(field(&session.endpoint))]);
    table.add_row(vec![Cell::new("agent_id"), Cell::new(field(&session.agent_id))]);
    table.add_row(vec![
        Cell::new("assistant_id"),
        Cell::new(field(&session.assistant_id)),
    ]);
    table.add_row(vec![Cell::new("model"), Cell::new(field(&session.model))]);
    table.add_row(vec![Cell::new("spec"), Cell::new(field(&session.spec))]);
    writeln!(out, "{table}")?;

    for diagnostic in &report.diagnostics {
        writeln!(out, "warning: {diagnostic}")?;
    }

    match &report.selected_values {
        Some(values) => writeln!(
            out,
            "Selected values: endpoint={} model={} modelSpec={}",
            values.endpoint, values.model, values.model_spec
        ),
        None => writeln!(out, "Selected values: (none)"),
    }
}
