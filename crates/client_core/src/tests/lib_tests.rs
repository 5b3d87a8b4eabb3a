use std::sync::Arc;

use super::*;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{Phase, QueryMode};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn handle_query(
    State(state): State<MockState>,
    uri: Uri,
    Json(payload): Json<Value>,
) -> (StatusCode, String) {
    state
        .received
        .lock()
        .await
        .push((uri.path().to_string(), payload));
    (state.status, state.body.clone())
}

async fn spawn_query_server(
    status: StatusCode,
    body: impl Into<String>,
) -> anyhow::Result<(String, Arc<Mutex<Vec<(String, Value)>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        body: body.into(),
        received: received.clone(),
    };
    let app = Router::new()
        .route("/query", post(handle_query))
        .route("/research", post(handle_query))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), received))
}

fn controller_for(base_url: &str) -> QueryController<HttpQueryTransport> {
    let settings = ClientSettings {
        api_base_url: format!("{base_url}/"),
        request_timeout_secs: None,
    };
    QueryController::from_settings(&settings).expect("controller")
}

#[tokio::test]
async fn quick_mode_posts_to_query_and_renders_answer() {
    let body = json!({
        "response": "<p>6.5%</p>",
        "Sources": [{"url": "https://rbi.org.in", "domain": "rbi.org.in", "score": 1.0}],
        "Confidence_score": 0.95
    });
    let (base_url, received) = spawn_query_server(StatusCode::OK, body.to_string())
        .await
        .expect("spawn server");
    let controller = controller_for(&base_url);
    controller.set_query_text("What is RBI repo rate?").await;

    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Settled(Phase::Success)
    );

    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, "/query");
    assert_eq!(received[0].1, json!({"query": "What is RBI repo rate?"}));

    let View::Answer(answer) = render(&controller.snapshot().await) else {
        panic!("expected answer view");
    };
    assert_eq!(answer.body.as_str(), "<p>6.5%</p>");
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(
        answer.confidence.map(|badge| badge.label()),
        Some("High (95%)".to_string())
    );
}

#[tokio::test]
async fn deep_mode_posts_to_research() {
    let (base_url, received) = spawn_query_server(StatusCode::OK, r#"{"response": "<h1>Report</h1>"}"#)
        .await
        .expect("spawn server");
    let controller = controller_for(&base_url);
    controller.set_mode(QueryMode::Deep).await.expect("mode");
    controller.set_query_text("  Long-term outlook for Indian bonds  ").await;

    controller.submit().await;

    let received = received.lock().await;
    assert_eq!(received[0].0, "/research");
    assert_eq!(
        received[0].1,
        json!({"query": "Long-term outlook for Indian bonds"})
    );
    let session = controller.snapshot().await;
    assert_eq!(session.response_html(), "<h1>Report</h1>");
    assert!(session.sources().is_empty());
    assert_eq!(session.confidence_score(), None);
}

#[tokio::test]
async fn server_error_surfaces_backend_message() {
    let (base_url, _received) = spawn_query_server(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"error":"upstream search timeout"}"#,
    )
    .await
    .expect("spawn server");
    let controller = controller_for(&base_url);
    controller.set_query_text("repo rate").await;

    assert_eq!(controller.submit().await, SubmitOutcome::Settled(Phase::Error));

    let session = controller.snapshot().await;
    assert_eq!(session.error_message(), Some("upstream search timeout"));
    assert_eq!(
        render(&session),
        View::Failed {
            banner: "upstream search timeout".to_string()
        }
    );
}

#[tokio::test]
async fn server_error_without_body_uses_status_text() {
    let (base_url, _received) = spawn_query_server(StatusCode::BAD_GATEWAY, "<html>oops</html>")
        .await
        .expect("spawn server");
    let controller = controller_for(&base_url);
    controller.set_query_text("repo rate").await;

    controller.submit().await;

    assert_eq!(
        controller.snapshot().await.error_message(),
        Some("request failed with status code 502")
    );
}

#[tokio::test]
async fn malformed_success_payload_enters_error_phase() {
    let (base_url, _received) = spawn_query_server(StatusCode::OK, "not json at all")
        .await
        .expect("spawn server");
    let controller = controller_for(&base_url);
    controller.set_query_text("repo rate").await;

    assert_eq!(controller.submit().await, SubmitOutcome::Settled(Phase::Error));
    let session = controller.snapshot().await;
    assert_eq!(
        session.error_message(),
        Some(transport::MALFORMED_RESPONSE_MESSAGE)
    );
    assert_eq!(session.response_html(), "");
}

#[tokio::test]
async fn wrong_typed_fields_keep_the_rest_of_the_answer() {
    let body = json!({
        "response": "<p>6.5%</p>",
        "Sources": [{"url": "https://rbi.org.in", "domain": "rbi.org.in", "score": "high"}],
        "Confidence_score": "0.9"
    });
    let (base_url, _received) = spawn_query_server(StatusCode::OK, body.to_string())
        .await
        .expect("spawn server");
    let controller = controller_for(&base_url);
    controller.set_query_text("repo rate").await;

    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Settled(Phase::Success)
    );
    let session = controller.snapshot().await;
    assert_eq!(session.response_html(), "<p>6.5%</p>");
    assert_eq!(session.sources().len(), 1);
    assert_eq!(session.sources()[0].score, 0.0);
    assert_eq!(session.confidence_score(), None);
}

#[tokio::test]
async fn non_object_success_body_enters_error_phase() {
    let (base_url, _received) = spawn_query_server(StatusCode::OK, "[1, 2, 3]")
        .await
        .expect("spawn server");
    let controller = controller_for(&base_url);
    controller.set_query_text("repo rate").await;

    assert_eq!(controller.submit().await, SubmitOutcome::Settled(Phase::Error));
}

#[tokio::test]
async fn unreachable_service_surfaces_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let controller = controller_for(&format!("http://{addr}"));
    controller.set_query_text("repo rate").await;

    assert_eq!(controller.submit().await, SubmitOutcome::Settled(Phase::Error));
    let session = controller.snapshot().await;
    let message = session.error_message().expect("message");
    assert!(!message.trim().is_empty());
    assert_eq!(confidence_badge_of(&session), None);
}

fn confidence_badge_of(session: &Session) -> Option<ConfidenceBadge> {
    presenter::confidence_badge(session)
}

#[test]
fn endpoint_url_joins_base_and_mode_path() {
    let transport = HttpQueryTransport::from_settings(&ClientSettings {
        api_base_url: "http://localhost:5000/".into(),
        request_timeout_secs: Some(5),
    })
    .expect("transport");
    assert_eq!(transport.base_url(), "http://localhost:5000");
    assert_eq!(
        transport.endpoint_url(QueryMode::Quick),
        "http://localhost:5000/query"
    );
    assert_eq!(
        transport.endpoint_url(QueryMode::Deep),
        "http://localhost:5000/research"
    );
}
