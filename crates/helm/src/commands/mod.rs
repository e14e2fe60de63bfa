use async_trait::async_trait;
use eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use helm_core::catalog::Catalogs;
use helm_core::config::HelmConfig;
use helm_core::persistence::{FileStore, PersistenceBridge};
use helm_core::session::SessionSlot;
use helm_core::utils::paths::AppPaths;

use crate::cli::Cli;
use crate::error::Error;

pub mod catalog;
pub mod config;
pub mod remember;
pub mod resolve;
pub mod simulate;

#[async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Inputs shared by every subcommand, assembled from flags and the config file.
pub struct CommandContext {
    pub config: HelmConfig,
    pub config_path: PathBuf,
    pub catalog_paths: Vec<PathBuf>,
    pub store_path: PathBuf,
    pub slot: SessionSlot,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> std::result::Result<Self, Error> {
        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => HelmConfig::config_path()?,
        };
        let config = HelmConfig::load_from(&config_path)?;

        // Flags win over the config file; discovered catalogs are used only
        // when neither names any.
        let catalog_paths = if !cli.catalogs.is_empty() {
            cli.catalogs.clone()
        } else if !config.catalog_paths.is_empty() {
            config.catalog_paths.clone()
        } else {
            AppPaths::discover_catalogs()
        };
        debug!("Using catalog paths: {:?}", catalog_paths);

        let store_path = match &cli.store {
            Some(path) => path.clone(),
            None => config.store_path()?,
        };

        Ok(Self {
            config,
            config_path,
            catalog_paths,
            store_path,
            slot: SessionSlot(cli.slot),
        })
    }

    pub fn load_catalogs(&self) -> std::result::Result<Catalogs, Error> {
        Ok(Catalogs::load(&self.catalog_paths)?)
    }

    pub fn persistence(&self) -> std::result::Result<PersistenceBridge, Error> {
        let store = FileStore::open(&self.store_path)?;
        Ok(PersistenceBridge::new(Arc::new(store)))
    }
}
