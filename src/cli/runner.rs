//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::cli::server::serve;
use crate::config::{Settings, StateBackend};
use crate::error::Result;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let settings = self.load_settings()?;

        match &self.cli.command {
            Commands::Serve { port } => {
                let port = port.unwrap_or(settings.port);
                let engine = settings.build_engine()?;
                serve(Arc::new(settings), Arc::new(engine), port).await
            }
            Commands::Run => {
                let engine = settings.build_engine()?;
                let report = engine.run(&settings.sources).await?;
                print_json(&report)
            }
            Commands::Checkpoints => {
                let state = settings.state_manager()?;
                print_json(&state.load().await?.checkpoints)
            }
            Commands::Subscribers => {
                let registry = settings.registry(settings.state_manager()?);
                print_json(&registry.list().await?)
            }
            Commands::Subscribe { address } => {
                let registry = settings.registry(settings.state_manager()?);
                print_json(&registry.add(address).await?)
            }
            Commands::Unsubscribe { address, token } => {
                let registry = settings.registry(settings.state_manager()?);
                let removed = registry.remove(address, token.as_deref()).await?;
                print_json(&json!({ "address": address, "removed": removed }))
            }
            Commands::Sources => print_json(&settings.sources),
        }
    }

    /// Load settings; `--state` replaces the configured backend
    fn load_settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.cli.config.as_deref())?;
        if let Some(path) = &self.cli.state {
            settings.state = StateBackend::File { path: path.clone() };
        }
        Ok(settings)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
