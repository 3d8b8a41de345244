use std::io::Write as _;

use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

use super::*;

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
    })
    .to_string()
}

fn receipt_json() -> &'static str {
    r#"{"expense_type": "Meals - Lunch", "merchant": "Cafe Nine",
        "total_amount": 18.40, "currency": "USD", "date": "2026-03-04",
        "time": "12:15", "city": "Chicago"}"#
}

fn temp_receipt() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
    file.write_all(b"\xff\xd8\xff\xe0fakejpeg").unwrap();
    file
}

fn extractor_for(server: &MockServer) -> ReceiptExtractor {
    let mut config = Config::default();
    config.llm.base_url = server.uri();
    config.llm.api_key = "test-key".to_string();
    ReceiptExtractor::new(&config)
}

#[tokio::test]
async fn test_vision_extraction_success() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/"))
        .and(matchers::header("Authorization", "Bearer test-key"))
        .and(matchers::body_string_contains("image_url"))
        .and(matchers::body_string_contains("json_object"))
        .respond_with(ResponseTemplate::new(200).set_body_string(completion_body(receipt_json())))
        .expect(1)
        .mount(&server)
        .await;

    let file = temp_receipt();
    let raw = extractor_for(&server).extract(file.path()).await.unwrap();
    assert_eq!(raw.merchant.as_deref(), Some("Cafe Nine"));
    assert_eq!(raw.total_amount, Some(18.40));
    assert_eq!(raw.city.as_deref(), Some("Chicago"));
}

#[tokio::test]
async fn test_fenced_payload_is_unwrapped() {
    let server = MockServer::start().await;
    let fenced = format!("```json\n{}\n```", receipt_json());
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(completion_body(&fenced)))
        .mount(&server)
        .await;

    let file = temp_receipt();
    let raw = extractor_for(&server).extract(file.path()).await.unwrap();
    assert_eq!(raw.expense_type.as_deref(), Some("Meals - Lunch"));
}

#[tokio::test]
async fn test_server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(completion_body(receipt_json())))
        .expect(1)
        .mount(&server)
        .await;

    let file = temp_receipt();
    let raw = extractor_for(&server).extract(file.path()).await.unwrap();
    assert_eq!(raw.merchant.as_deref(), Some("Cafe Nine"));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let file = temp_receipt();
    let err = extractor_for(&server).extract(file.path()).await.unwrap_err();
    match err {
        ExtractError::Api { status, .. } => assert_eq!(status, 400),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_required_field_is_schema_violation() {
    let server = MockServer::start().await;
    let body = completion_body(r#"{"merchant": "Cafe Nine", "currency": "USD"}"#);
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let file = temp_receipt();
    let err = extractor_for(&server).extract(file.path()).await.unwrap_err();
    match err {
        ExtractError::SchemaViolation(message) => {
            assert!(message.contains("total_amount"), "{message}");
        }
        other => panic!("expected SchemaViolation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_payload_is_schema_violation() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(completion_body("I could not read this receipt.")),
        )
        .mount(&server)
        .await;

    let file = temp_receipt();
    let err = extractor_for(&server).extract(file.path()).await.unwrap_err();
    assert!(matches!(err, ExtractError::SchemaViolation(_)));
}

#[tokio::test]
async fn test_probe_success_and_failure() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(completion_body("pong")))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let extractor = extractor_for(&server);
    extractor.probe().await.unwrap();

    let unreachable = {
        let mut config = Config::default();
        config.llm.base_url = "http://127.0.0.1:1/unreachable".to_string();
        ReceiptExtractor::new(&config)
    };
    let err = unreachable.probe().await.unwrap_err();
    assert!(matches!(err, ExtractError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn test_batch_preserves_input_order() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(completion_body(receipt_json())))
        .mount(&server)
        .await;

    let a = temp_receipt();
    let b = temp_receipt();
    let missing = PathBuf::from("/nonexistent/receipt.jpg");
    let files = vec![a.path().to_path_buf(), missing, b.path().to_path_buf()];

    let results = extractor_for(&server).extract_batch(&files).await;
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ExtractError::Io(_))));
    assert!(results[2].is_ok());
}
