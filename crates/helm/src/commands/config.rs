use async_trait::async_trait;
use eyre::Result;
use std::io::Write;

use super::{Command, CommandContext};
use crate::error::Error;

pub struct ConfigCommand {
    pub context: CommandContext,
    pub action: ConfigAction,
}

pub enum ConfigAction {
    Show,
    Init,
}

#[async_trait]
impl Command for ConfigCommand {
    async fn execute(&self) -> Result<()> {
        match &self.action {
            ConfigAction::Show => self.show().map_err(Into::into),
            ConfigAction::Init => self.init().map_err(Into::into),
        }
    }
}

impl ConfigCommand {
    fn show(&self) -> std::result::Result<(), Error> {
        let mut stdout = std::io::stdout();
        writeln!(
            stdout,
            "Config file: {}",
            self.context.config_path.display()
        )?;
        writeln!(stdout, "Selection store: {}", self.context.store_path.display())?;
        for path in &self.context.catalog_paths {
            writeln!(stdout, "Catalog: {}", path.display())?;
        }
        writeln!(stdout, "\n{}", toml::to_string_pretty(&self.context.config)?)?;
        Ok(())
    }

    fn init(&self) -> std::result::Result<(), Error> {
        let path = &self.context.config_path;
        if path.exists() {
            return Err(Error::Config(format!(
                "{} already exists",
                path.display()
            )));
        }
        self.context.config.save_to(path)?;

        let mut stdout = std::io::stdout();
        writeln!(stdout, "Wrote {}", path.display())?;
        Ok(())
    }
}
