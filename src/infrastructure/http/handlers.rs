//! Request handlers for the enforcement proxy.
//!
//! The `/tool/{name}` flow is fail-closed end to end: a malformed body is
//! refused (and audited) without touching the kernel, any error on the
//! pre-execution path maps to 403, and the tool body runs only after a GO
//! decision. Tool failures surface as 502 with the original decision
//! re-audited alongside the execution error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::models::{Decision, Signals};
use crate::domain::ports::ToolHandler;
use crate::infrastructure::audit::GENESIS_HASH;
use crate::services::kernel::Kernel;
use crate::services::contracts;

use super::metrics::Metrics;

/// Immutable name-to-handler table built before the server starts.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Look up a handler.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }
}

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    /// The governed kernel; the mutex serializes step + audit write.
    pub kernel: Arc<Mutex<Kernel>>,
    /// Registered tool handlers.
    pub tools: Arc<ToolRegistry>,
    /// Step/halt counters.
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Assemble proxy state around a kernel.
    pub fn new(kernel: Kernel, tools: ToolRegistry) -> Self {
        Self {
            kernel: Arc::new(Mutex::new(kernel)),
            tools: Arc::new(tools),
            metrics: Arc::new(Metrics::new()),
        }
    }
}

/// `POST /tool/{name}` request body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolRequest {
    #[serde(default)]
    params: Value,
    signals: Signals,
    #[serde(default)]
    #[allow(dead_code)]
    agent_id: Option<String>,
}

fn halt_response(decision: &Decision) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "halted": true,
            "failure": decision.failure,
            "reason": decision.reason,
            "step": decision.step_index,
        })),
    )
        .into_response()
}

fn fail_closed(detail: &str) -> Response {
    warn!(%detail, "pre-execution failure, refusing");
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "halted": true,
            "failure": "EXTERNAL",
            "reason": detail,
        })),
    )
        .into_response()
}

/// `POST /tool/{name}`: govern one tool invocation.
pub async fn handle_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    // Step 1: parse. A malformed body is refused and audited without
    // stepping the kernel.
    let request: ToolRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(parse_err) => {
            debug!(tool = %name, error = %parse_err, "malformed request body");
            let audit = {
                let mut kernel = state.kernel.lock().expect("kernel mutex poisoned");
                kernel.log_blocked(&name, "malformed request body")
            };
            if let Err(audit_err) = audit {
                return fail_closed(&format!("audit failure: {audit_err}"));
            }
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "malformed"}))).into_response();
        }
    };

    // Steps 2-3: one kernel step under the mutex; audit happens inside.
    let (decision, was_halted) = {
        let mut kernel = state.kernel.lock().expect("kernel mutex poisoned");
        let was_halted = kernel.is_halted();
        match kernel.step_for_action(&name, &request.params, &request.signals) {
            Ok(decision) => (decision, was_halted),
            Err(step_err) => return fail_closed(&step_err.to_string()),
        }
    };
    state.metrics.record_step();
    if decision.halted {
        if !was_halted {
            if let Some(failure) = decision.failure {
                state.metrics.record_halt(failure);
            }
        }
        return halt_response(&decision);
    }

    // Kernel isolation: the step has fully unwound before any handler runs.
    if contracts::enabled() {
        if let Err(violation) = contracts::assert_outside_kernel() {
            return fail_closed(&violation.to_string());
        }
    }

    // Step 4: forward to the registered handler.
    let Some(handler) = state.tools.get(&name) else {
        let audit = {
            let mut kernel = state.kernel.lock().expect("kernel mutex poisoned");
            kernel.log_execution_error(&name, &request.params, &decision, "unknown tool")
        };
        if let Err(audit_err) = audit {
            warn!(tool = %name, error = %audit_err, "audit append failed");
        }
        return (StatusCode::BAD_GATEWAY, Json(json!({"error": "upstream"}))).into_response();
    };

    match handler.call(request.params.clone()).await {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({"result": result, "step": decision.step_index})),
        )
            .into_response(),
        Err(tool_err) => {
            let audit = {
                let mut kernel = state.kernel.lock().expect("kernel mutex poisoned");
                kernel.log_execution_error(
                    &name,
                    &request.params,
                    &decision,
                    &tool_err.to_string(),
                )
            };
            if let Err(audit_err) = audit {
                warn!(tool = %name, error = %audit_err, "audit append failed");
            }
            (StatusCode::BAD_GATEWAY, Json(json!({"error": "upstream"}))).into_response()
        }
    }
}

/// `GET /health`: liveness only, never consults the kernel.
pub async fn handle_health() -> Response {
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}

/// `GET /metrics`: plain-text counters and gauges.
pub async fn handle_metrics(State(state): State<AppState>) -> Response {
    let text = {
        let kernel = state.kernel.lock().expect("kernel mutex poisoned");
        state.metrics.render(kernel.state())
    };
    (StatusCode::OK, text).into_response()
}

/// `GET /audit`: chain summary.
pub async fn handle_audit(State(state): State<AppState>) -> Response {
    let summary = {
        let kernel = state.kernel.lock().expect("kernel mutex poisoned");
        kernel.audit_summary()
    };
    match summary {
        Some(summary) => (
            StatusCode::OK,
            Json(json!({"entries": summary.entries, "head_hash": summary.head_hash})),
        )
            .into_response(),
        None => (
            StatusCode::OK,
            Json(json!({"entries": 0, "head_hash": GENESIS_HASH})),
        )
            .into_response(),
    }
}
