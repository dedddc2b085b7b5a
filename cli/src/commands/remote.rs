//! Remote commands - call a running control server.

use std::path::PathBuf;
use std::time::Duration;

use agentd_core::{EscalationBudget, StartReport, StopReport};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::config::{resolve, Overrides};

/// Requests to the control server give up after this long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Extra time a close may take beyond the escalation waits themselves.
const CLOSE_SLACK: Duration = Duration::from_secs(10);

/// The control command to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Close,
    Health,
    Status,
}

impl Action {
    fn method(self) -> reqwest::Method {
        match self {
            Action::Start | Action::Close => reqwest::Method::POST,
            Action::Health | Action::Status => reqwest::Method::GET,
        }
    }

    /// How long to wait for the server's answer.
    ///
    /// A close can legitimately run the whole ladder before it replies.
    fn timeout(self, budget: &EscalationBudget) -> Duration {
        match self {
            Action::Close => (budget.total() + CLOSE_SLACK).max(REQUEST_TIMEOUT),
            Action::Start | Action::Health | Action::Status => REQUEST_TIMEOUT,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Action::Start => "/start",
            Action::Close => "/close",
            Action::Health => "/",
            Action::Status => "/status",
        }
    }
}

/// Join `base` and `path` without doubling the slash.
fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

async fn request<T: DeserializeOwned>(base: &str, action: Action, timeout: Duration) -> Result<T> {
    let url = endpoint(base, action.path());
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .request(action.method(), &url)
        .send()
        .await
        .with_context(|| format!("failed to reach control server at {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("control server returned {} for {}", status, url);
    }

    response
        .json()
        .await
        .with_context(|| format!("invalid response from {}", url))
}

/// Escalation budget the server is expected to use, taken from the local config.
async fn budget(config_path: Option<PathBuf>) -> Result<EscalationBudget> {
    let config = resolve(config_path, &Overrides::default()).await?;
    Ok(config.escalation.budget())
}

pub async fn run(
    base: &str,
    action: Action,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let timeout = match action {
        Action::Close => action.timeout(&budget(config_path).await?),
        _ => action.timeout(&EscalationBudget::default()),
    };

    match action {
        Action::Start => {
            let report: StartReport = request(base, action, timeout).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                match report.pid {
                    Some(pid) => println!("{} (pid {})", report.status, pid),
                    None => println!("{}", report.status),
                }
            }
            if !report.ok {
                bail!("worker failed to start: {}", report.status);
            }
        }
        Action::Close => {
            let report: StopReport = request(base, action, timeout).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.status);
            }
            if !report.ok {
                bail!("worker failed to stop: {}", report.status);
            }
        }
        Action::Health | Action::Status => {
            let body: Value = request(base, action, timeout).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
