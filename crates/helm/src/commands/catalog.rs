use async_trait::async_trait;
use comfy_table::{Cell, Color, Table};
use eyre::Result;
use std::io::Write;

use super::{Command, CommandContext};

pub struct CatalogCommand {
    pub context: CommandContext,
}

#[async_trait]
impl Command for CatalogCommand {
    async fn execute(&self) -> Result<()> {
        let catalogs = self.context.load_catalogs()?;
        let mut stdout = std::io::stdout();

        if catalogs.agents.is_empty() && catalogs.assistants.is_empty() {
            writeln!(stdout, "No catalog entries loaded.")?;
            return Ok(());
        }

        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("Kind").fg(Color::Green),
            Cell::new("Namespace").fg(Color::Green),
            Cell::new("ID").fg(Color::Green),
            Cell::new("Name").fg(Color::Green),
            Cell::new("Model").fg(Color::Green),
        ]);

        for agent in catalogs.agents.iter() {
            let mut id = Cell::new(&agent.id);
            if agent.is_default_starred {
                id = id.fg(Color::Yellow);
            }
            table.add_row(vec![
                Cell::new("agent"),
                Cell::new("agents"),
                id,
                Cell::new(agent.name.as_deref().unwrap_or("")),
                Cell::new(""),
            ]);
        }

        let mut namespaces: Vec<&str> = catalogs.assistants.namespaces().collect();
        namespaces.sort_unstable();
        for ns in namespaces {
            let Some(assistants) = catalogs.assistants.namespace(ns) else {
                continue;
            };
            for assistant in assistants.iter() {
                table.add_row(vec![
                    Cell::new("assistant"),
                    Cell::new(ns),
                    Cell::new(&assistant.id),
                    Cell::new(assistant.name.as_deref().unwrap_or("")),
                    Cell::new(&assistant.model),
                ]);
            }
        }

        writeln!(stdout, "{table}")?;
        Ok(())
    }
}
