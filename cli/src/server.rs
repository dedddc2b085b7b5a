//! HTTP control surface.
//!
//! Maps each request 1:1 onto a supervisor operation and always answers with
//! a structured JSON body; failures are reported through `ok: false`.

use std::net::SocketAddr;
use std::sync::Arc;

use agentd_core::{ProcessBackend, StartReport, StatusReport, StopReport, Supervisor};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use crate::signals::wait_for_shutdown_signal;

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    ok: bool,
    #[serde(flatten)]
    report: StatusReport,
}

/// Build the control router for `supervisor`.
pub fn router<B: ProcessBackend + 'static>(supervisor: Arc<Supervisor<B>>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/start", post(start::<B>).get(start::<B>))
        .route("/close", post(close::<B>).get(close::<B>))
        .route("/status", get(status::<B>))
        .with_state(supervisor)
        .layer(axum::middleware::from_fn(log_request))
}

/// Serve the control surface until a shutdown signal arrives, then stop the worker.
pub async fn serve<B: ProcessBackend + 'static>(
    supervisor: Arc<Supervisor<B>>,
    addr: SocketAddr,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind control server to {}", addr))?;
    info!(addr = %addr, command = %supervisor.command(), "Control server listening");

    axum::serve(listener, router(Arc::clone(&supervisor)))
        .with_graceful_shutdown(async {
            if let Err(e) = wait_for_shutdown_signal().await {
                error!(error = %e, "Failed to listen for shutdown signals");
            }
        })
        .await
        .context("control server failed")?;

    let report = supervisor.shutdown().await;
    info!(ok = report.ok, status = %report.status, "Control server stopped");
    Ok(())
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    info!(method = %request.method(), path = %request.uri().path(), "Control request");
    next.run(request).await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        status: "running",
    })
}

// Start and stop run on their own tasks so a dropped connection cannot
// abandon a launch or a termination ladder halfway.

async fn start<B: ProcessBackend + 'static>(
    State(supervisor): State<Arc<Supervisor<B>>>,
) -> Json<StartReport> {
    let report = tokio::spawn(async move { supervisor.start().await })
        .await
        .unwrap_or_else(|e| StartReport::error(format!("control task failed: {}", e)));
    Json(report)
}

async fn close<B: ProcessBackend + 'static>(
    State(supervisor): State<Arc<Supervisor<B>>>,
) -> Json<StopReport> {
    let report = tokio::spawn(async move { supervisor.stop().await })
        .await
        .unwrap_or_else(|e| StopReport::error(format!("control task failed: {}", e)));
    Json(report)
}

async fn status<B: ProcessBackend + 'static>(
    State(supervisor): State<Arc<Supervisor<B>>>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        ok: true,
        report: supervisor.status(),
    })
}
