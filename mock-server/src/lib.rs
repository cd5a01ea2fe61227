use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Header carrying the number of stored items on list responses.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    /// Seconds since the Unix epoch.
    pub created_at: i64,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Error payload returned alongside failing statuses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item))
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/empty", get(empty))
        .route("/text", get(text))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("mock server listening on {addr}");
    }
    axum::serve(listener, app()).await
}

async fn list_items(State(db): State<Db>) -> impl IntoResponse {
    let items = db.read().await;
    let mut list: Vec<Item> = items.values().cloned().collect();
    list.sort_by_key(|item| item.created_at);
    ([(TOTAL_COUNT_HEADER, list.len().to_string())], Json(list))
}

async fn create_item(State(db): State<Db>, Json(input): Json<CreateItem>) -> (StatusCode, Json<Item>) {
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        created_at: input.created_at,
    };
    db.write().await.insert(item.id, item.clone());
    (StatusCode::CREATED, Json(item))
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let items = db.read().await;
    match items.get(&id) {
        Some(item) => Json(item.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorPayload {
                message: format!("item {id} does not exist"),
                code: Some("ITEM_NOT_FOUND".to_string()),
            }),
        )
            .into_response(),
    }
}

async fn echo(
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
        .collect();
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    Json(Echo {
        method: method.to_string(),
        query,
        headers,
        body,
    })
}

/// Respond with `code`. `message` and `error_code` query parameters, when
/// present, become an `ErrorPayload` body.
async fn status(Path(code): Path<u16>, Query(query): Query<HashMap<String, String>>) -> Response {
    let Ok(status) = StatusCode::from_u16(code) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match query.get("message") {
        Some(message) => (
            status,
            Json(ErrorPayload {
                message: message.clone(),
                code: query.get("error_code").cloned(),
            }),
        )
            .into_response(),
        None => status.into_response(),
    }
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn text() -> &'static str {
    "plain text, not json"
}
