//! Pipeline-level test: extraction through normalization to the run
//! summary, with the extraction service mocked. Covers the failing
//! middle receipt: its record flows through as failed while its
//! neighbors are created, and totals count only the created ones.

use std::io::Write as _;
use std::path::PathBuf;

use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

use expenser_config::{Config, ConfigLoader, ExpenseCategory, ExpenseType};
use expenser_core::{
    normalize, resolve_trip_destination, DatePrompt, DateResolver, ExpenseRecord, RecordStatus,
    RunContext, RunSummary,
};
use expenser_extract::ReceiptExtractor;

struct NoPrompt;

impl DatePrompt for NoPrompt {
    fn prompt_date(
        &mut self,
        file_name: &str,
    ) -> Result<chrono::NaiveDate, expenser_core::CoreError> {
        panic!("no prompt expected, asked for {file_name}");
    }
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

fn test_config(server_uri: &str) -> Config {
    let mut config = ConfigLoader::load_str("").unwrap();
    config.llm.base_url = server_uri.to_string();
    config.llm.api_key = "test-key".to_string();
    config.user.home_city = "Austin".to_string();
    config.expense_types = vec![
        expense_type("Meals - Lunch", ExpenseCategory::Meal),
        expense_type("Meals - Dinner", ExpenseCategory::Meal),
        expense_type("Miscellaneous Other", ExpenseCategory::Generic),
    ];
    config
}

fn expense_type(label: &str, category: ExpenseCategory) -> ExpenseType {
    ExpenseType {
        label: label.to_string(),
        category,
        keywords: Vec::new(),
    }
}

fn write_receipt(dir: &std::path::Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content).unwrap();
    path
}

/// Base64 of the file content, as it appears inside the vision data URL.
/// Used to route each mocked response to the right receipt.
fn marker(content: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(content)
}

#[tokio::test]
async fn test_failing_middle_receipt_flows_through_as_failed() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let first = write_receipt(dir.path(), "img_001.jpg", b"alpha");
    let second = write_receipt(dir.path(), "img_002.jpg", b"beta");
    let third = write_receipt(dir.path(), "img_003.jpg", b"gamma");

    Mock::given(matchers::method("POST"))
        .and(matchers::body_string_contains(marker(b"alpha")))
        .respond_with(ResponseTemplate::new(200).set_body_string(completion_body(
            r#"{"expense_type": "Meals - Lunch", "merchant": "Cafe Nine",
                "total_amount": 18.40, "currency": "USD",
                "date": "2026-03-04", "time": "12:15", "city": "Chicago"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_string_contains(marker(b"beta")))
        .respond_with(ResponseTemplate::new(400).set_body_string("unreadable image"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_string_contains(marker(b"gamma")))
        .respond_with(ResponseTemplate::new(200).set_body_string(completion_body(
            r#"{"expense_type": "Meals - Dinner", "merchant": "Trattoria Due",
                "total_amount": 61.60, "currency": "USD",
                "date": "2026-03-04", "time": "19:30", "city": "Chicago"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let extractor = ReceiptExtractor::new(&config);

    let images = vec![first, second, third];
    let results = extractor.extract_batch(&images).await;

    let records: Vec<ExpenseRecord> = images
        .iter()
        .zip(results)
        .map(|(image, result)| match result {
            Ok(raw) => normalize(&raw, &config, image),
            Err(e) => ExpenseRecord::failed(image.clone(), e.to_string()),
        })
        .collect();

    let mut ctx = RunContext::new(records, "Austin", false);
    DateResolver::new()
        .resolve_batch(&mut ctx.records, &mut NoPrompt)
        .unwrap();
    ctx.trip_destination = resolve_trip_destination(&ctx.records, "Austin", "Offsite");
    assert_eq!(ctx.trip_destination, "Chicago");

    // Stand in for the item loop: every still-pending record enters.
    for record in &mut ctx.records {
        if record.status == RecordStatus::Pending {
            record.status = RecordStatus::Created;
        }
    }

    let statuses: Vec<_> = ctx.records.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            RecordStatus::Created,
            RecordStatus::Failed,
            RecordStatus::Created,
        ]
    );

    let summary = RunSummary::from_context(&ctx);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed, 1);
    assert!(summary.has_failures());

    let totals = ctx.totals_by_currency();
    assert_eq!(totals["USD"], 8000);

    let rendered = summary.render(&ctx.trip_destination);
    assert!(rendered.contains("Trip to Chicago"), "{rendered}");
    assert!(rendered.contains("img_002.jpg"), "{rendered}");
}
