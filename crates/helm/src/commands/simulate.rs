use async_trait::async_trait;
use comfy_table::{Cell, Color, Table};
use eyre::Result;
use std::io::Write;
use std::path::PathBuf;

use super::{Command, CommandContext};
use crate::scenario::{Scenario, SimulationEnv, SimulationReport};

pub struct SimulateCommand {
    pub context: CommandContext,
    pub scenario: PathBuf,
    pub json: bool,
}

#[async_trait]
impl Command for SimulateCommand {
    async fn execute(&self) -> Result<()> {
        let scenario = Scenario::load(&self.scenario)?;
        let env = SimulationEnv {
            catalogs: self.context.load_catalogs()?,
            persisted: self.context.persistence()?,
            slot: self.context.slot,
            startup: self.context.config.startup_config(),
            quiet_window: self.context.config.quiet_window(),
        };
        let report = scenario.run(env).await?;

        let mut stdout = std::io::stdout();
        if self.json {
            writeln!(stdout, "{}", serde_json::to_string_pretty(&report)?)?;
        } else {
            print_report(&mut stdout, &report)?;
        }
        Ok(())
    }
}

fn print_report(out: &mut impl Write, report: &SimulationReport) -> std::io::Result<()> {
    if report.deliveries.is_empty() {
        writeln!(out, "No selected values were delivered.")?;
    } else {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("At (ms)").fg(Color::Green),
            Cell::new("Endpoint").fg(Color::Green),
            Cell::new("Model").fg(Color::Green),
            Cell::new("Model Spec").fg(Color::Green),
        ]);
        for delivery in &report.deliveries {
            table.add_row(vec![
                Cell::new(delivery.at_ms),
                Cell::new(&delivery.values.endpoint),
                Cell::new(&delivery.values.model),
                Cell::new(&delivery.values.model_spec),
            ]);
        }
        writeln!(out, "{table}")?;
    }

    for diagnostic in &report.diagnostics {
        writeln!(out, "warning: {diagnostic}")?;
    }
    writeln!(
        out,
        "Final session: {}",
        serde_json::to_string(&report.session).unwrap_or_default()
    )
}
