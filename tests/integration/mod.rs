//! Integration tests for the FundX backend.
//!
//! These tests run the real REST client against an in-process fake of
//! the database gateway bound to an ephemeral local port.
//! Run with: cargo test --test integration

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use fundx_backend::api::{create_router, AppState};
use fundx_backend::error::StoreError;
use fundx_backend::records::{Row, Table};
use fundx_backend::store::{IsFilter, SupabaseClient, TableStore};

const API_KEY: &str = "test-service-key";

/// Request as seen by the fake gateway.
#[derive(Debug, Clone)]
struct SeenRequest {
    method: String,
    table: String,
    query: HashMap<String, String>,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
}

/// Minimal stand-in for the hosted REST gateway.
#[derive(Clone, Default)]
struct FakeGateway {
    rows: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    failure: Option<(StatusCode, Value)>,
    next_id: Arc<Mutex<u64>>,
}

impl FakeGateway {
    fn failing(status: StatusCode, body: Value) -> Self {
        Self {
            failure: Some((status, body)),
            ..Self::default()
        }
    }

    fn seed(&self, table: &str, row: Value) {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    fn record(
        &self,
        method: &str,
        table: &str,
        query: HashMap<String, String>,
        headers: &HeaderMap,
    ) {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(SeenRequest {
            method: method.to_string(),
            table: table.to_string(),
            query,
            apikey: text("apikey"),
            authorization: text("authorization"),
            prefer: text("prefer"),
        });
    }

    fn last_seen(&self) -> SeenRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

async fn gateway_select(
    State(gateway): State<FakeGateway>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    gateway.record("GET", &table, query.clone(), &headers);
    if let Some((status, body)) = gateway.failure.clone() {
        return (status, Json(body)).into_response();
    }

    let rows = gateway
        .rows
        .lock()
        .unwrap()
        .get(&table)
        .cloned()
        .unwrap_or_default();

    let filtered: Vec<Value> = rows
        .into_iter()
        .filter(|row| {
            query.iter().all(|(column, op)| match op.as_str() {
                "is.false" => row.get(column) == Some(&json!(false)),
                "is.true" => row.get(column) == Some(&json!(true)),
                _ => true,
            })
        })
        .collect();

    Json(filtered).into_response()
}

async fn gateway_insert(
    State(gateway): State<FakeGateway>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Response {
    gateway.record("POST", &table, HashMap::new(), &headers);
    if let Some((status, body)) = gateway.failure.clone() {
        return (status, Json(body)).into_response();
    }

    let id = {
        let mut next = gateway.next_id.lock().unwrap();
        *next += 1;
        *next
    };
    row["id"] = json!(id);
    gateway.seed(&table, row.clone());

    (StatusCode::CREATED, Json(vec![row])).into_response()
}

/// Start the fake gateway and return its base URL.
async fn start_gateway(gateway: FakeGateway) -> String {
    let app = Router::new()
        .route("/rest/v1/:table", get(gateway_select).post(gateway_insert))
        .with_state(gateway);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn client(base_url: &str) -> SupabaseClient {
    SupabaseClient::with_timeout(base_url, API_KEY, Duration::from_secs(5)).unwrap()
}

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn project_body() -> Value {
    json!({
        "blob_id": "blob-42",
        "creator": "0xcreator",
        "name": "Clean water",
        "target_amount": 12000,
        "reward_type": "token",
        "img_blob_id": "img-42",
        "currency": "SUI",
        "early_investor_limit": 5,
        "is_completed": false
    })
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn select_sends_filter_and_credentials() {
    let gateway = FakeGateway::default();
    gateway.seed("projects", json!({"name": "open", "is_completed": false}));
    gateway.seed("projects", json!({"name": "done", "is_completed": true}));
    let base_url = start_gateway(gateway.clone()).await;

    let rows = client(&base_url)
        .select(Table::Projects, &IsFilter::new("is_completed", false))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("open"));

    let seen = gateway.last_seen();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.table, "projects");
    assert_eq!(seen.query.get("select").map(String::as_str), Some("*"));
    assert_eq!(
        seen.query.get("is_completed").map(String::as_str),
        Some("is.false")
    );
    assert_eq!(seen.apikey.as_deref(), Some(API_KEY));
    assert_eq!(
        seen.authorization,
        Some(format!("Bearer {}", API_KEY))
    );
}

#[tokio::test]
async fn insert_returns_representation() {
    let gateway = FakeGateway::default();
    let base_url = start_gateway(gateway.clone()).await;

    let rows = client(&base_url)
        .insert(Table::Contributions, row(json!({"amount": 10, "tx_hash": "0x1"})))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["tx_hash"], json!("0x1"));
    assert_eq!(rows[0]["id"], json!(1));

    let seen = gateway.last_seen();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.table, "contributions");
    assert_eq!(seen.prefer.as_deref(), Some("return=representation"));
}

#[tokio::test]
async fn gateway_error_becomes_rejected() {
    let gateway = FakeGateway::failing(
        StatusCode::UNAUTHORIZED,
        json!({"message": "Invalid API key", "code": null, "details": null, "hint": null}),
    );
    let base_url = start_gateway(gateway).await;

    let err = client(&base_url)
        .select(Table::Projects, &IsFilter::new("is_completed", false))
        .await
        .unwrap_err();

    match err {
        StoreError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_gateway_is_http_error() {
    // Grab a free port and release it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr))
        .insert(Table::Projects, Row::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Http(_)));
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn create_then_list_through_router() {
    let gateway = FakeGateway::default();
    gateway.seed("projects", json!({"name": "finished", "is_completed": true}));
    let base_url = start_gateway(gateway.clone()).await;
    let router = create_router(AppState::from_store(client(&base_url)));

    let create = Request::builder()
        .method(Method::POST)
        .uri("/create-project")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&project_body()).unwrap()))
        .unwrap();
    let response = router.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["name"], json!("Clean water"));

    let list = Request::builder()
        .uri("/projects")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(list).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let projects = json_body(response).await;
    let names: Vec<&str> = projects
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Clean water"]);
}

#[tokio::test]
async fn gateway_failure_surfaces_as_500() {
    let gateway = FakeGateway::failing(
        StatusCode::CONFLICT,
        json!({"message": "duplicate key value violates unique constraint", "code": "23505"}),
    );
    let base_url = start_gateway(gateway).await;
    let router = create_router(AppState::from_store(client(&base_url)));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/create-project")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&project_body()).unwrap()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let expected = "database rejected request (HTTP 409): \
                    duplicate key value violates unique constraint (23505)";
    assert_eq!(json_body(response).await, json!({ "error": expected }));
}
