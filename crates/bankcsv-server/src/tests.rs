//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

const STATEMENT: &str = "15-01-2024 Albert Heijn -45,32\n16-01-2024 Salaris ACME 2.500,00\n";
const BOUNDARY: &str = "bankcsv-test-boundary";

fn test_config() -> ServerConfig {
    ServerConfig {
        require_auth: false,
        ..Default::default()
    }
}

fn setup_app(config: ServerConfig) -> Router {
    let state = AppState::new(&Settings::default(), config).unwrap();
    create_router(state, None)
}

fn setup_test_app() -> Router {
    setup_app(test_config())
}

fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/convert")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn get_body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&get_body_bytes(response).await).unwrap()
}

// ========== Conversion Tests ==========

#[tokio::test]
async fn test_convert_statement() {
    let app = setup_test_app();

    let response = app
        .oneshot(upload_request("statement.txt", STATEMENT.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let id = json["id"].as_str().unwrap();
    assert_eq!(id.len(), 16);
    assert_eq!(json["transaction_count"], 2);
    assert_eq!(json["source"], "structured");
    assert_eq!(json["synthetic"], false);
    assert_eq!(json["bank"], "generic");
    assert_eq!(json["results_url"], format!("/api/statement/{}", id));
    assert_eq!(json["download_url"], format!("/api/statement/{}/download", id));
    assert!(json.get("warning").is_none());
}

#[tokio::test]
async fn test_convert_then_fetch_results() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(upload_request("statement.txt", STATEMENT.as_bytes()))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let results_url = json["results_url"].as_str().unwrap().to_string();

    let response = app.oneshot(get_request(&results_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report = get_body_json(response).await;
    assert_eq!(report["filename"], "statement.txt");
    assert_eq!(report["synthetic"], false);
    assert_eq!(report["transactions"].as_array().unwrap().len(), 2);
    assert!(report.get("overview").is_some());
    assert!(report.get("categories").is_some());
}

#[tokio::test]
async fn test_same_upload_same_id() {
    let app = setup_test_app();

    let first = get_body_json(
        app.clone()
            .oneshot(upload_request("a.txt", STATEMENT.as_bytes()))
            .await
            .unwrap(),
    )
    .await;
    let second = get_body_json(
        app.clone()
            .oneshot(upload_request("b.txt", STATEMENT.as_bytes()))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first["id"], second["id"]);

    let health = get_body_json(app.oneshot(get_request("/api/health")).await.unwrap()).await;
    assert_eq!(health["statements"], 1);
}

#[tokio::test]
async fn test_unparseable_statement_is_labelled_synthetic() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(upload_request(
            "letter.txt",
            b"Dear customer, your new card is on its way.",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["synthetic"], true);
    assert_eq!(json["source"], "synthetic");
    assert!(json["warning"].as_str().unwrap().contains("sample data"));

    let download_url = json["download_url"].as_str().unwrap().to_string();
    let response = app.oneshot(get_request(&download_url)).await.unwrap();
    let csv = String::from_utf8(get_body_bytes(response).await).unwrap();
    assert!(csv.lines().skip(1).all(|l| l.ends_with(",synthetic")));
}

#[tokio::test]
async fn test_convert_rejects_unsupported_format() {
    let app = setup_test_app();

    let response = app
        .oneshot(upload_request("photo.png", &[0x89, 0x50, 0x00, 0xff]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Unsupported"));
}

#[tokio::test]
async fn test_convert_rejects_oversized_upload() {
    let app = setup_app(ServerConfig {
        max_upload_bytes: 16,
        ..test_config()
    });

    let response = app
        .oneshot(upload_request("statement.txt", STATEMENT.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn test_convert_rejects_empty_upload() {
    let app = setup_test_app();

    let response = app
        .oneshot(upload_request("statement.txt", b"  \n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_convert_rejects_malformed_text_layer() {
    let app = setup_test_app();

    let response = app
        .oneshot(upload_request("statement.json", b"{\"pages\": 12"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_convert_missing_file_field() {
    let app = setup_test_app();

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/convert")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Statement Tests ==========

#[tokio::test]
async fn test_unknown_statement_returns_404() {
    let app = setup_test_app();

    let response = app
        .oneshot(get_request("/api/statement/0123456789abcdef"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = setup_test_app()
        .oneshot(get_request("/api/statement/0123456789abcdef/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_csv_default() {
    let app = setup_test_app();

    let json = get_body_json(
        app.clone()
            .oneshot(upload_request("statement.txt", STATEMENT.as_bytes()))
            .await
            .unwrap(),
    )
    .await;
    let id = json["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(&format!("/api/statement/{}/download", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(&format!("statement-{}.csv", id)));

    let csv = String::from_utf8(get_body_bytes(response).await).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Date,Description,Amount,Category,Merchant,Type,Source");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2024-01-15,"));
    assert!(lines[1].contains("-45.32"));
}

#[tokio::test]
async fn test_download_excel_and_json() {
    let app = setup_test_app();

    let json = get_body_json(
        app.clone()
            .oneshot(upload_request("statement.txt", STATEMENT.as_bytes()))
            .await
            .unwrap(),
    )
    .await;
    let download_url = json["download_url"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get_request(&format!("{}?format=xls", download_url)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/vnd.ms-excel"
    );
    let html = String::from_utf8(get_body_bytes(response).await).unwrap();
    assert!(html.contains("<table"));

    let response = app
        .oneshot(get_request(&format!("{}?format=json", download_url)))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let report = get_body_json(response).await;
    assert_eq!(report["synthetic"], false);
}

#[tokio::test]
async fn test_download_invalid_format() {
    let app = setup_test_app();

    let response = app
        .oneshot(get_request("/api/statement/0123456789abcdef/download?format=docx"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Categorize Tests ==========

#[tokio::test]
async fn test_categorize_description() {
    let app = setup_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/categorize")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"description":"ALBERT HEIJN 1403 AMSTERDAM"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Groceries");
    assert_eq!(json["merchant"], "ALBERT HEIJN");
}

#[tokio::test]
async fn test_categorize_empty_description() {
    let app = setup_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/categorize")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"description":"   "}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Authentication Tests ==========

fn auth_app() -> Router {
    setup_app(ServerConfig {
        require_auth: true,
        api_keys: vec!["secret-key".to_string()],
        ..Default::default()
    })
}

#[tokio::test]
async fn test_auth_required() {
    let response = auth_app()
        .oneshot(upload_request("statement.txt", STATEMENT.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_with_api_key() {
    let mut request = upload_request("statement.txt", STATEMENT.as_bytes());
    request
        .headers_mut()
        .insert("authorization", "Bearer secret-key".parse().unwrap());

    let response = auth_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_wrong_api_key() {
    let request = Request::builder()
        .uri("/api/statement/0123456789abcdef")
        .header("authorization", "Bearer secret-kez")
        .body(Body::empty())
        .unwrap();

    let response = auth_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_cancelled_conversion_skips_remaining_work() {
    use std::sync::atomic::AtomicBool;

    use crate::handlers::convert::convert_document;

    let state = AppState::new(&Settings::default(), test_config()).unwrap();

    let cancelled = AtomicBool::new(true);
    let result = convert_document(&state, STATEMENT.as_bytes(), Some("s.txt"), &cancelled).unwrap();
    assert!(result.is_none());

    let running = AtomicBool::new(false);
    let (extraction, report) = convert_document(&state, STATEMENT.as_bytes(), Some("s.txt"), &running)
        .unwrap()
        .unwrap();
    assert!(!extraction.is_synthetic());
    assert_eq!(report.transactions.len(), 2);
}

#[tokio::test]
async fn test_health_is_public() {
    let response = auth_app().oneshot(get_request("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["statements"], 0);
    assert_eq!(json["store_capacity"], 100);
}

#[tokio::test]
async fn test_health_reports_configured_capacity() {
    let app = setup_app(ServerConfig {
        store_capacity: 7,
        ..test_config()
    });

    let json = get_body_json(app.oneshot(get_request("/api/health")).await.unwrap()).await;
    assert_eq!(json["store_capacity"], 7);
}

#[tokio::test]
async fn test_internal_error_detail_stays_in_logs() {
    let err: AppError = anyhow::anyhow!("failed to open /var/lib/bankcsv/secret").into();
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "An internal error occurred");
}

#[test]
fn test_validate_api_key() {
    let keys = vec!["abc123".to_string(), "other".to_string()];
    assert!(validate_api_key("abc123", &keys));
    assert!(validate_api_key("other", &keys));
    assert!(!validate_api_key("abc124", &keys));
    assert!(!validate_api_key("abc", &keys));
    assert!(!validate_api_key("", &keys));
    assert!(!validate_api_key("abc123", &[]));
}

#[test]
fn test_parse_api_keys() {
    assert_eq!(parse_api_keys(" a, b ,,c "), vec!["a", "b", "c"]);
    assert!(parse_api_keys("").is_empty());
}

// ========== Middleware Tests ==========

#[tokio::test]
async fn test_security_headers() {
    let response = setup_test_app()
        .oneshot(get_request("/api/health"))
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("content-security-policy").is_some());
}

#[tokio::test]
async fn test_serves_static_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>BankCSV</h1>").unwrap();

    let state = AppState::new(&Settings::default(), test_config()).unwrap();
    let app = create_router(state, dir.path().to_str());

    let response = app.oneshot(get_request("/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(get_body_bytes(response).await).unwrap();
    assert!(body.contains("BankCSV"));
}
