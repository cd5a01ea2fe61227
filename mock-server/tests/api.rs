use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, ErrorPayload, Item, TOTAL_COUNT_HEADER};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- items ---

#[tokio::test]
async fn list_items_empty_with_count_header() {
    let resp = app().oneshot(get("/items")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[TOTAL_COUNT_HEADER], "0");
    let items: Vec<Item> = body_json(resp).await;
    assert!(items.is_empty());
}

#[tokio::test]
async fn create_item_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/items", r#"{"name":"bolt","created_at":60}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let item: Item = body_json(resp).await;
    assert_eq!(item.name, "bolt");
    assert_eq!(item.created_at, 60);
}

#[tokio::test]
async fn create_item_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/items", r#"{"not_name":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_item_not_found_carries_error_payload() {
    let resp = app()
        .oneshot(get("/items/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let payload: ErrorPayload = body_json(resp).await;
    assert_eq!(payload.code.as_deref(), Some("ITEM_NOT_FOUND"));
}

#[tokio::test]
async fn get_item_bad_uuid_returns_400() {
    let resp = app().oneshot(get("/items/not-a-uuid")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn item_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/items", r#"{"name":"nut"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Item = body_json(resp).await;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/items/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Item = body_json(resp).await;
    assert_eq!(fetched.id, created.id);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/items"))
        .await
        .unwrap();
    assert_eq!(resp.headers()[TOTAL_COUNT_HEADER], "1");
    let items: Vec<Item> = body_json(resp).await;
    assert_eq!(items.len(), 1);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_query_headers_and_body() {
    let req = Request::builder()
        .method("PATCH")
        .uri("/echo?id=42&q=a%20b")
        .header("x-trace", "abc")
        .body(r#"{"k":true}"#.to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.query["id"], "42");
    assert_eq!(echo.query["q"], "a b");
    assert_eq!(echo.headers["x-trace"], "abc");
    assert_eq!(echo.body, Some(serde_json::json!({"k": true})));
}

#[tokio::test]
async fn echo_without_body() {
    let resp = app().oneshot(get("/echo")).await.unwrap();
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert!(echo.query.is_empty());
    assert!(echo.body.is_none());
}

// --- status ---

#[tokio::test]
async fn status_without_message_has_empty_body() {
    let resp = app().oneshot(get("/status/403")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_with_message_returns_payload() {
    let resp = app()
        .oneshot(get("/status/500?message=db%20down&error_code=E_DB"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload: ErrorPayload = body_json(resp).await;
    assert_eq!(payload.message, "db down");
    assert_eq!(payload.code.as_deref(), Some("E_DB"));
}

#[tokio::test]
async fn status_rejects_invalid_code() {
    let resp = app().oneshot(get("/status/99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- misc ---

#[tokio::test]
async fn empty_returns_no_body() {
    let resp = app().oneshot(get("/empty")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}
