//! RestCatalog against a fake PostgREST server.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use id8_catalog::{
    CatalogBackend, InstallEvent, ListFilters, PageRequest, RestCatalog, ViewEvent,
};
use id8_core::Error;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
struct Call {
    method: String,
    path: String,
    params: Vec<(String, String)>,
    prefer: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct Fake {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_rpc: bool,
    rows: Option<Value>,
}

impl Fake {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn table(&self) -> Vec<Value> {
        let rows = self.rows.clone().unwrap_or_else(rows);
        rows.as_array().unwrap().clone()
    }
}

fn rows() -> Value {
    json!([
        {
            "id": "1", "slug": "pr-writer", "name": "PR Writer",
            "description": "Drafts review summaries", "item_type": "skill",
            "category": "git", "tags": ["git"], "status": "published",
            "install_count": 500, "view_count": 900
        },
        {
            "id": "2", "slug": "review", "name": "Review",
            "description": "Reviews code", "item_type": "agent",
            "category": "quality", "tags": [], "status": "published",
            "install_count": 5, "view_count": 10, "featured": true
        },
        {
            "id": "3", "slug": "review-bot", "name": "Review Bot",
            "description": null, "item_type": "command",
            "category": "quality", "status": "published",
            "install_count": 50, "view_count": 80
        }
    ])
}

/// Six popular rows that mention the query only in their description, plus
/// one unpopular row whose name is the query.
fn crowded_rows() -> Value {
    let mut rows: Vec<Value> = (0..6)
        .map(|n| {
            json!({
                "id": format!("d{n}"), "slug": format!("tool-{n}"), "name": format!("Tool {n}"),
                "description": "Pairs well with any commit helper", "item_type": "skill",
                "status": "published", "install_count": 995 + n, "view_count": 0
            })
        })
        .collect();
    rows.push(json!({
        "id": "exact", "slug": "commit-helper", "name": "Commit Helper",
        "description": "", "item_type": "skill", "status": "published",
        "install_count": 0, "view_count": 0
    }));
    Value::Array(rows)
}

/// PostgREST `ilike` with `*` wildcards at either end.
fn ilike(value: &str, pattern: &str) -> bool {
    let value = value.to_lowercase();
    let pattern = pattern.to_lowercase();
    let core = pattern.trim_matches('*');
    match (pattern.starts_with('*'), pattern.len() > 1 && pattern.ends_with('*')) {
        (true, true) => value.contains(core),
        (false, true) => value.starts_with(core),
        (true, false) => value.ends_with(core),
        (false, false) => value == core,
    }
}

fn matches(row: &Value, params: &[(String, String)]) -> bool {
    let field = |name: &str| row[name].as_str().unwrap_or("").to_string();
    params.iter().all(|(key, value)| match key.as_str() {
        "slug" => field("slug") == value.trim_start_matches("eq."),
        "status" => field("status") == value.trim_start_matches("eq."),
        "name" => ilike(&field("name"), value.trim_start_matches("ilike.")),
        "or" => value
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .filter_map(|cond| cond.split_once(".ilike."))
            .any(|(name, pattern)| ilike(&field(name), pattern)),
        _ => true,
    })
}

fn decode(query: Option<String>) -> Vec<(String, String)> {
    let raw = format!("http://fake/?{}", query.unwrap_or_default());
    reqwest::Url::parse(&raw)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn prefer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn items(
    State(fake): State<Fake>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if headers.get("apikey").is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let params = decode(query);
    fake.record(Call {
        method: method.to_string(),
        path: "catalog_items".to_string(),
        params: params.clone(),
        prefer: prefer(&headers),
        body: None,
    });

    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };
    let mut selected: Vec<Value> = fake
        .table()
        .into_iter()
        .filter(|row| matches(row, &params))
        .collect();
    if param("order").is_some_and(|o| o.starts_with("install_count.desc")) {
        selected.sort_by_key(|row| std::cmp::Reverse(row["install_count"].as_u64()));
    }
    if let Some(limit) = param("limit").and_then(|l| l.parse().ok()) {
        selected.truncate(limit);
    }
    let range = format!("0-{}/{}", selected.len().saturating_sub(1), selected.len());
    (
        [(axum::http::header::CONTENT_RANGE, range)],
        axum::Json(Value::Array(selected)),
    )
        .into_response()
}

async fn rpc(
    State(fake): State<Fake>,
    Path(procedure): Path<String>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    fake.record(Call {
        method: "POST".to_string(),
        path: format!("rpc/{procedure}"),
        params: Vec::new(),
        prefer: prefer(&headers),
        body: Some(body),
    });
    if fake.fail_rpc {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database is down").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn insert(
    State(fake): State<Fake>,
    Path(table): Path<String>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    fake.record(Call {
        method: "POST".to_string(),
        path: table,
        params: Vec::new(),
        prefer: prefer(&headers),
        body: Some(body),
    });
    StatusCode::CREATED.into_response()
}

async fn start(fake: Fake) -> SocketAddr {
    let app = Router::new()
        .route("/rest/v1/catalog_items", get(items).head(items))
        .route("/rest/v1/rpc/{procedure}", post(rpc))
        .route("/rest/v1/{table}", post(insert))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> RestCatalog {
    RestCatalog::new(
        &format!("http://{addr}"),
        "test-key",
        Duration::from_secs(5),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn test_list_fetches_rows_and_count_in_parallel() {
    let fake = Fake::default();
    let catalog = client(start(fake.clone()).await);

    let page = catalog
        .list(&ListFilters::default(), PageRequest::new(Some(1), Some(20)))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.items[2].description, "");

    let calls = fake.calls();
    let get = calls.iter().find(|c| c.method == "GET").unwrap();
    assert!(get.params.contains(&("status".into(), "eq.published".into())));
    assert!(get.params.contains(&("offset".into(), "0".into())));
    assert!(get.params.iter().any(|(k, _)| k == "order"));

    let head = calls.iter().find(|c| c.method == "HEAD").unwrap();
    assert_eq!(head.prefer.as_deref(), Some("count=exact"));
    assert!(head.params.contains(&("status".into(), "eq.published".into())));
}

#[tokio::test]
async fn test_search_ranks_name_matches_first() {
    let fake = Fake::default();
    let catalog = client(start(fake.clone()).await);

    let results = catalog.search("review", 10).await.unwrap();
    let ids: Vec<_> = results.iter().map(|i| i.id.as_str()).collect();
    // Exact name, then prefix, then description-only despite higher installs.
    assert_eq!(ids, vec!["2", "3", "1"]);

    let calls = fake.calls();
    let or = calls
        .iter()
        .flat_map(|c| c.params.iter())
        .find(|(k, _)| k == "or")
        .unwrap();
    assert_eq!(or.1, "(name.ilike.*review*,description.ilike.*review*)");
    assert!(calls.iter().any(|c| {
        c.params.contains(&("name".into(), "ilike.review".into()))
            && c.params.contains(&("limit".into(), "10".into()))
    }));
}

#[tokio::test]
async fn test_search_finds_exact_name_behind_popular_descriptions() {
    let fake = Fake {
        rows: Some(crowded_rows()),
        ..Default::default()
    };
    let catalog = client(start(fake).await);

    let results = catalog.search("commit helper", 1).await.unwrap();
    assert_eq!(results[0].id, "exact");

    let results = catalog.search("commit helper", 3).await.unwrap();
    let ids: Vec<_> = results.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["exact", "d5", "d4"]);
}

#[tokio::test]
async fn test_search_ranks_on_sanitized_query() {
    let fake = Fake {
        rows: Some(crowded_rows()),
        ..Default::default()
    };
    let catalog = client(start(fake).await);

    // Commas are stripped before filtering; ranking sees the same text.
    let results = catalog.search("commit, helper", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "exact");
}

#[tokio::test]
async fn test_get_by_slug() {
    let catalog = client(start(Fake::default()).await);
    let item = catalog.get_by_slug("review-bot").await.unwrap().unwrap();
    assert_eq!(item.id, "3");
    assert!(catalog.get_by_slug("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_record_view_calls_counter_and_logs_metadata() {
    let fake = Fake::default();
    let catalog = client(start(fake.clone()).await);

    let event = ViewEvent {
        item_id: "2".to_string(),
        session_id: Some("s-1".to_string()),
        referrer: None,
    };
    catalog.record_view(&event).await.unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].path, "rpc/increment_view_count");
    assert_eq!(calls[0].body.as_ref().unwrap()["item_id"], "2");
    assert_eq!(calls[1].path, "item_views");
    assert_eq!(calls[1].prefer.as_deref(), Some("return=minimal"));
}

#[tokio::test]
async fn test_record_view_without_metadata_skips_log() {
    let fake = Fake::default();
    let catalog = client(start(fake.clone()).await);
    catalog.record_view(&ViewEvent::new("2")).await.unwrap();
    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn test_record_install_logs_method() {
    let fake = Fake::default();
    let catalog = client(start(fake.clone()).await);

    let event = InstallEvent {
        item_id: "1".to_string(),
        method: "cli".to_string(),
        platform: Some("linux".to_string()),
    };
    catalog.record_install(&event).await.unwrap();

    let calls = fake.calls();
    assert_eq!(calls[0].path, "rpc/increment_install_count");
    assert_eq!(calls[1].path, "item_installs");
    assert_eq!(calls[1].body.as_ref().unwrap()["install_method"], "cli");
}

#[tokio::test]
async fn test_rpc_failure_is_upstream_error() {
    let fake = Fake {
        fail_rpc: true,
        ..Default::default()
    };
    let catalog = client(start(fake).await);

    let err = catalog
        .record_install(&InstallEvent::new("1"))
        .await
        .unwrap_err();
    match err {
        Error::Upstream { status, .. } => assert_eq!(status, Some(500)),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_database_is_upstream_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let catalog = client(addr);
    let err = catalog.search("x", 5).await.unwrap_err();
    assert!(matches!(err, Error::Upstream { status: None, .. }));
}
