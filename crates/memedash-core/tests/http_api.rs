//! End-to-end tests of the dashboard services against a stub HTTP server.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use memedash_config::MemedashConfig;
use memedash_core::{Dashboard, HttpMemeApi, MemoryStorage, ReportOutcome};
use memedash_protocol::{ApiError, Credentials, MemeApi};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct StubState {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    reports: Arc<Mutex<Vec<Value>>>,
}

fn stub_meme(id: String, score: i64, num_comments: i64) -> Value {
    json!({
        "reddit_id": id,
        "title": format!("Meme {id}"),
        "url": format!("https://i.redd.it/{id}.png"),
        "permalink": format!("https://reddit.com/r/memes/comments/{id}"),
        "score": score,
        "num_comments": num_comments,
        "created_at": "2024-05-01T12:00:00Z",
        "reddit_created_at": "2024-05-01T11:30:00Z",
        "subreddit": "memes"
    })
}

async fn top(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.queries.lock().push(params);
    Json(json!([stub_meme("1".to_string(), 10, 2)]))
}

async fn all_memes(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let cursor = params.get("cursor").cloned();
    state.queries.lock().push(params);
    match cursor.as_deref() {
        None => Json(json!({
            "items": (0..20).map(|i| stub_meme(format!("a{i}"), i, 0)).collect::<Vec<_>>(),
            "next_cursor": "c1"
        })),
        Some(_) => Json(json!({
            "items": (0..5).map(|i| stub_meme(format!("b{i}"), i, 0)).collect::<Vec<_>>(),
            "next_cursor": null
        })),
    }
}

async fn send_report(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let bad_token = body["credentials"]["bot_token"] == json!("bad");
    state.reports.lock().push(body);
    if bad_token {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Invalid bot token" })),
        )
    } else {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    }
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

async fn memes_server(state: StubState) -> String {
    let router = Router::new()
        .route("/memes/top", get(top))
        .route("/memes/allmemes", get(all_memes))
        .route("/memes/send-report", post(send_report))
        .with_state(state);
    spawn_stub(router).await
}

fn dashboard(base_url: &str) -> Dashboard {
    let config = MemedashConfig::builder().base_url(base_url).build();
    let api = HttpMemeApi::from_config(&config.api).expect("client");
    Dashboard::new(Arc::new(api), Arc::new(MemoryStorage::new()), &config)
}

/// The leaderboard decodes cards and sends the configured limit.
#[tokio::test]
async fn top_memes_round_trip() {
    let state = StubState::default();
    let base_url = memes_server(state.clone()).await;
    let dashboard = dashboard(&base_url);

    let memes = dashboard.top_memes.refresh().await.expect("top");
    assert_eq!(memes.len(), 1);
    assert_eq!(memes[0].score, 10);
    assert_eq!(memes[0].num_comments, 2);
    assert_eq!(
        state.queries.lock()[0].get("limit").map(String::as_str),
        Some("20")
    );
}

/// Following the cursor appends pages until the server stops sending one.
#[tokio::test]
async fn history_follows_cursor_to_end() {
    let state = StubState::default();
    let base_url = memes_server(state.clone()).await;
    let dashboard = dashboard(&base_url);

    dashboard.history.fetch_first().await.expect("first");
    dashboard.history.load_more().await.expect("more");
    let snapshot = dashboard.history.snapshot();
    assert_eq!(snapshot.items.len(), 25);
    assert!(!snapshot.has_more);

    let queries = state.queries.lock().clone();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].get("cursor"), None);
    assert_eq!(queries[0].get("sort_by").map(String::as_str), Some("created_at"));
    assert_eq!(queries[0].get("order").map(String::as_str), Some("desc"));
    assert_eq!(queries[0].get("limit").map(String::as_str), Some("20"));
    assert_eq!(queries[1].get("cursor").map(String::as_str), Some("c1"));
}

/// A rejected report surfaces the server's detail text.
#[tokio::test]
async fn report_rejection_surfaces_detail() {
    let state = StubState::default();
    let base_url = memes_server(state.clone()).await;
    let dashboard = dashboard(&base_url);

    assert!(matches!(
        dashboard.reports.send().await,
        ReportOutcome::Sent(_)
    ));
    dashboard
        .settings
        .save(Credentials::new("bad", "42"))
        .expect("save");
    assert_eq!(
        dashboard.reports.send().await,
        ReportOutcome::Failed("Invalid bot token".to_string())
    );

    let reports = state.reports.lock().clone();
    assert_eq!(reports[0], json!({ "limit": 20 }));
    assert_eq!(
        reports[1],
        json!({ "credentials": { "bot_token": "bad", "chat_id": "42" }, "limit": 20 })
    );
}

/// Non-success reads map to the generic network error.
#[tokio::test]
async fn failed_read_is_generic_error() {
    let router = Router::new()
        .route("/memes/top", get(broken))
        .route("/memes/send-report", post(broken));
    let base_url = spawn_stub(router).await;
    let api = HttpMemeApi::new(&base_url, None).expect("client");

    let err = api.top_memes(20).await.unwrap_err();
    assert_eq!(err, ApiError::Status { status: 500 });
    assert_eq!(err.to_string(), "Network response was not ok");

    let dashboard = dashboard(&base_url);
    assert_eq!(
        dashboard.reports.send().await,
        ReportOutcome::Failed("Failed to send report".to_string())
    );
}
