mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{ORDERS_CSV, orders_service, seeded_store};
use tabula::api::TabulaApi;
use tabula::service::TabulaService;

fn orders_app() -> (Router, tempfile::TempDir) {
    let (service, dir) = orders_service();
    (TabulaApi::new(service).router(), dir)
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn select_orders() -> Request<Body> {
    put_json(
        "/api/v1/session/table",
        json!({"schema": "SALES", "name": "ORDERS"}),
    )
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = orders_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_schemas_and_tables() {
    let (app, _dir) = orders_app();

    let response = app.clone().oneshot(get("/api/v1/schemas")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!(["SALES"]));

    let response = app
        .oneshot(get("/api/v1/schemas/SALES/tables"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tables = json_body(response).await;
    assert_eq!(tables["ORDERS"]["schema"], "SALES");
    assert_eq!(tables["ORDERS"]["name"], "ORDERS");
}

#[tokio::test]
async fn test_unknown_schema_is_404() {
    let (app, _dir) = orders_app();
    let response = app
        .oneshot(get("/api/v1/schemas/NOPE/tables"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "SCHEMA_NOT_FOUND");
}

#[tokio::test]
async fn test_select_and_render() {
    let (app, _dir) = orders_app();

    let response = app.clone().oneshot(select_orders()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let transition = json_body(response).await;
    assert_eq!(transition["phase"], "editing");
    assert_eq!(transition["generation"], 0);
    assert!(transition.get("notice").is_none());

    let response = app.oneshot(get("/api/v1/session")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view = json_body(response).await;
    assert_eq!(view["table"], "SALES.ORDERS");
    assert_eq!(view["binding_key"], "editor-0");
    assert_eq!(view["data"]["columns"], json!(["id", "status", "amount"]));
    assert_eq!(view["data"]["rows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_empty_filter_is_400() {
    let (app, _dir) = orders_app();
    app.clone().oneshot(select_orders()).await.unwrap();

    let response = app
        .oneshot(post_json("/api/v1/session/filter", json!({"text": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_FILTER");
}

#[tokio::test]
async fn test_filter_apply_and_clear() {
    let (app, _dir) = orders_app();
    app.clone().oneshot(select_orders()).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/session/filter",
            json!({"text": "status = 'active'"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view = json_body(app.clone().oneshot(get("/api/v1/session")).await.unwrap()).await;
    assert_eq!(view["filter"], "status = 'active'");
    assert_eq!(view["data"]["rows"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/session/filter")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view = json_body(app.oneshot(get("/api/v1/session")).await.unwrap()).await;
    assert_eq!(view["filter"], Value::Null);
    assert_eq!(view["data"]["rows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_commit_returns_notice_once() {
    let (app, _dir) = orders_app();
    app.clone().oneshot(select_orders()).await.unwrap();

    let edited = json!({
        "columns": ["id", "status", "amount"],
        "rows": [[1, "active", 10.0], [2, "active", 150.0], [3, "done", 7.5]],
    });
    let response = app
        .clone()
        .oneshot(post_json("/api/v1/session/commit", edited))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let transition = json_body(response).await;
    assert_eq!(transition["generation"], 1);
    assert!(transition["notice"].as_str().unwrap().contains("COMMIT"));

    // The notice is consumed with the transition; renders never carry one.
    let view = json_body(app.oneshot(get("/api/v1/session")).await.unwrap()).await;
    assert!(view.get("notice").is_none());
    assert_eq!(view["data"]["rows"][1][2], 150.0);
}

#[tokio::test]
async fn test_commit_without_selection_is_409() {
    let (app, _dir) = orders_app();
    let response = app
        .oneshot(post_json(
            "/api/v1/session/commit",
            json!({"columns": [], "rows": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "NO_TABLE_SELECTED");
}

#[tokio::test]
async fn test_rollback() {
    let (app, _dir) = orders_app();
    app.clone().oneshot(select_orders()).await.unwrap();

    let response = app
        .oneshot(post_json("/api/v1/session/rollback", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let transition = json_body(response).await;
    assert_eq!(transition["generation"], 1);
    assert!(transition["notice"].as_str().unwrap().contains("ROLLBACK"));
}

#[tokio::test]
async fn test_import_csv_body() {
    let (app, _dir) = orders_app();
    app.clone().oneshot(select_orders()).await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/session/import")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from("id,status,amount\n9,new,1.0\n"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view = json_body(app.oneshot(get("/api/v1/session")).await.unwrap()).await;
    assert_eq!(view["data"]["rows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_export_csv_download() {
    let (app, _dir) = orders_app();
    app.clone().oneshot(select_orders()).await.unwrap();

    let response = app.oneshot(get("/api/v1/session/export")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("ORDERS_"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("id,status,amount"));
    assert_eq!(text.lines().count(), 4);
}

#[tokio::test]
async fn test_select_missing_table_is_404() {
    let (store, _dir) = seeded_store(&[("SALES", "ORDERS", ORDERS_CSV)]);
    let app = TabulaApi::new(TabulaService::new(Box::new(store))).router();

    let response = app
        .oneshot(put_json(
            "/api/v1/session/table",
            json!({"schema": "SALES", "name": "NOPE"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "TABLE_NOT_FOUND");
}
