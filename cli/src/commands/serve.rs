//! Serve command - run the supervisor behind the HTTP control surface.

use std::path::PathBuf;
use std::sync::Arc;

use agentd_core::{PlatformBackend, Supervisor};
use anyhow::Result;

use super::config::{resolve, Overrides};
use crate::server;

pub async fn run(config_path: Option<PathBuf>, overrides: &Overrides) -> Result<()> {
    let config = resolve(config_path, overrides).await?;
    let addr = config.socket_addr()?;

    let supervisor = Arc::new(Supervisor::from_config(PlatformBackend::new(), &config));
    server::serve(supervisor, addr).await
}
