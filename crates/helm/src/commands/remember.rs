use async_trait::async_trait;
use eyre::Result;
use std::io::Write;
use tracing::warn;

use helm_core::EntityKind;
use helm_core::persistence::storage_key;

use super::{Command, CommandContext};

pub struct RememberCommand {
    pub context: CommandContext,
    pub kind: EntityKind,
    pub id: String,
}

#[async_trait]
impl Command for RememberCommand {
    async fn execute(&self) -> Result<()> {
        let catalogs = self.context.load_catalogs()?;
        let known = match self.kind {
            EntityKind::Agent => catalogs.agents.contains(&self.id),
            EntityKind::Assistant => catalogs
                .assistants
                .namespaces()
                .any(|ns| catalogs.assistants.get(ns, &self.id).is_some()),
        };
        if !known {
            // Resolution will report it as not found until the catalog has it.
            warn!(kind = %self.kind, id = %self.id, "Remembering an id missing from the loaded catalogs");
        }

        let persisted = self.context.persistence()?;
        persisted.remember(self.context.slot, self.kind, &self.id)?;

        let mut stdout = std::io::stdout();
        writeln!(
            stdout,
            "Remembered {} '{}' for slot {} ({})",
            self.kind,
            self.id,
            self.context.slot,
            storage_key(self.kind, self.context.slot)
        )?;
        Ok(())
    }
}
