//! Enforcement proxy behavior: status codes, fail-closed refusal, and audit
//! coupling, exercised by invoking the handlers directly.

use std::sync::Arc;

use axum::body::{to_bytes, Bytes};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{json, Value};
use tempfile::tempdir;
use warden::domain::models::{Profile, Signals};
use warden::domain::ports::FnTool;
use warden::infrastructure::audit::{verify, AuditLog};
use warden::infrastructure::http::{handlers, AppState, ToolRegistry};
use warden::services::Kernel;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn registry() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(
        "echo",
        Arc::new(FnTool::new(|params| Ok(json!({ "echoed": params })))),
    );
    tools.register(
        "broken",
        Arc::new(FnTool::new(|_| anyhow::bail!("tool exploded"))),
    );
    tools
}

fn state_with(profile: Profile) -> AppState {
    let kernel = Kernel::new("proxy", profile).with_contracts(false);
    AppState::new(kernel, registry())
}

fn tool_body(signals: Signals) -> Bytes {
    Bytes::from(
        serde_json::to_vec(&json!({
            "params": {"q": "hello"},
            "signals": signals,
        }))
        .unwrap(),
    )
}

#[tokio::test]
async fn test_go_executes_tool() {
    let state = state_with(Profile::balanced());
    let response = handlers::handle_tool(
        State(state),
        Path("echo".to_string()),
        tool_body(Signals::new(0.9, 0.0, 0.0)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["echoed"]["q"], "hello");
    assert_eq!(body["step"], 1);
}

#[tokio::test]
async fn test_halted_kernel_gets_403_and_tool_never_runs() {
    let mut profile = Profile::balanced();
    profile.limits.max_steps = 1;
    let state = state_with(profile);

    // First call consumes the only step and halts.
    let first = handlers::handle_tool(
        State(state.clone()),
        Path("echo".to_string()),
        tool_body(Signals::new(0.9, 0.0, 0.0)),
    )
    .await;
    assert_eq!(first.status(), StatusCode::FORBIDDEN);
    let body = body_json(first).await;
    assert_eq!(body["halted"], true);
    assert_eq!(body["failure"], "EXTERNAL");
    assert_eq!(body["step"], 1);

    // Terminal thereafter.
    let second = handlers::handle_tool(
        State(state),
        Path("echo".to_string()),
        tool_body(Signals::new(1.0, 0.0, 0.0)),
    )
    .await;
    assert_eq!(second.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_body_gets_400_and_blocked_audit_entry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let kernel = Kernel::new("proxy", Profile::balanced())
        .with_contracts(false)
        .with_audit(AuditLog::create(&path).unwrap());
    let state = AppState::new(kernel, registry());

    let response = handlers::handle_tool(
        State(state.clone()),
        Path("echo".to_string()),
        Bytes::from_static(b"{not json"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "malformed"}));

    // The refusal was audited without stepping the kernel.
    let summary = verify(&path).unwrap();
    assert_eq!(summary.entries, 1);
    let kernel = state.kernel.lock().unwrap();
    assert_eq!(kernel.state().step_index, 0);
    assert!(!kernel.is_halted());
}

#[tokio::test]
async fn test_unknown_field_in_body_is_malformed() {
    let state = state_with(Profile::balanced());
    let body = Bytes::from(
        serde_json::to_vec(&json!({
            "params": {},
            "signals": {"reward": 0.5, "novelty": 0.0, "urgency": 0.0},
            "surprise": true,
        }))
        .unwrap(),
    );
    let response = handlers::handle_tool(State(state), Path("echo".to_string()), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failing_tool_gets_502_with_execution_error_audited() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let kernel = Kernel::new("proxy", Profile::balanced())
        .with_contracts(false)
        .with_audit(AuditLog::create(&path).unwrap());
    let state = AppState::new(kernel, registry());

    let response = handlers::handle_tool(
        State(state),
        Path("broken".to_string()),
        tool_body(Signals::new(0.9, 0.0, 0.0)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await, json!({"error": "upstream"}));

    // Decision entry plus a follow-up record carrying the tool error.
    assert_eq!(verify(&path).unwrap().entries, 2);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("execution_error"));
    assert!(contents.contains("tool exploded"));
}

#[tokio::test]
async fn test_unregistered_tool_is_upstream_failure() {
    let state = state_with(Profile::balanced());
    let response = handlers::handle_tool(
        State(state),
        Path("missing".to_string()),
        tool_body(Signals::new(0.9, 0.0, 0.0)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_health_never_consults_kernel() {
    let response = handlers::handle_health().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_metrics_exposition() {
    let state = state_with(Profile::balanced());
    handlers::handle_tool(
        State(state.clone()),
        Path("echo".to_string()),
        tool_body(Signals::new(0.9, 0.0, 0.0)),
    )
    .await;

    let response = handlers::handle_metrics(State(state)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("governance_steps_total 1"));
    assert!(text.contains("governance_effort"));
    assert!(text.contains("governance_risk"));
    assert!(text.contains("governance_persistence"));
    assert!(text.contains("governance_exploration"));
}

#[tokio::test]
async fn test_audit_endpoint_reports_chain_head() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let kernel = Kernel::new("proxy", Profile::balanced())
        .with_contracts(false)
        .with_audit(AuditLog::create(&path).unwrap());
    let state = AppState::new(kernel, registry());

    handlers::handle_tool(
        State(state.clone()),
        Path("echo".to_string()),
        tool_body(Signals::new(0.9, 0.0, 0.0)),
    )
    .await;

    let response = handlers::handle_audit(State(state)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["entries"], 1);
    assert_eq!(
        body["head_hash"].as_str().unwrap(),
        verify(&path).unwrap().head_hash
    );
}

#[tokio::test]
async fn test_router_builds() {
    let _router = warden::infrastructure::http::build_router(state_with(Profile::balanced()));
}
