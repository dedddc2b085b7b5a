//! Config command - resolve and display the supervisor configuration.

use std::path::PathBuf;

use agentd_core::{Config, ConfigStore};
use anyhow::{Context, Result};
use tracing::info;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub listen: Option<String>,
    pub program: Option<String>,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
}

impl Overrides {
    fn apply(&self, config: &mut Config) {
        if let Some(listen) = &self.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(program) = &self.program {
            config.worker.program = program.clone();
            // A new program never inherits the old program's arguments.
            config.worker.args = self.args.clone();
        } else if !self.args.is_empty() {
            config.worker.args = self.args.clone();
        }
        if let Some(dir) = &self.workdir {
            config.worker.working_dir = Some(dir.clone());
        }
    }
}

fn store(path: Option<PathBuf>) -> Result<ConfigStore> {
    match path {
        Some(path) => Ok(ConfigStore::with_path(path)),
        None => ConfigStore::new().context("failed to locate default config"),
    }
}

/// Load the config file, layer the overrides on top and validate the result.
pub async fn resolve(path: Option<PathBuf>, overrides: &Overrides) -> Result<Config> {
    let store = store(path)?;
    let mut config = store
        .load()
        .await
        .with_context(|| format!("failed to load {}", store.path().display()))?;

    overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Print the resolved config, optionally persisting it first.
pub async fn show(
    path: Option<PathBuf>,
    overrides: &Overrides,
    json: bool,
    save: bool,
) -> Result<()> {
    let store = store(path.clone())?;
    let config = resolve(path, overrides).await?;

    if save {
        store
            .save(&config)
            .await
            .with_context(|| format!("failed to write {}", store.path().display()))?;
        info!(path = %store.path().display(), "Saved configuration");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config file:  {}", store.path().display());
    println!("Listen:       {}", config.listen_addr);
    println!("Worker:       {}", config.worker);
    if let Some(dir) = &config.worker.working_dir {
        println!("Working dir:  {}", dir.display());
    }
    for (key, value) in &config.worker.env {
        println!("Env:          {}={}", key, value);
    }
    println!(
        "Escalation:   {}ms / {}ms / {}ms",
        config.escalation.graceful_timeout_ms,
        config.escalation.forceful_timeout_ms,
        config.escalation.direct_timeout_ms
    );
    Ok(())
}
