use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, path_regex, query_param};

use appointment_cell::services::{ReportService, ReportUpload};
use shared_utils::test_utils::{TestConfig, MockBackendResponses};

const LEGACY_ENTRY: &str = r#"{"url":"https://files/old.pdf","type":"Lab","fileName":"old.pdf"}"#;

async fn mount_existing_reports(mock_server: &MockServer, reports: Value) {
    let mut row = MockBackendResponses::appointment_row("appt-1", "p-1", "Ada Byrne", "completed");
    row["reports"] = reports;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.appt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "reports": row["reports"] }])))
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/clinic-files/reports/appt-1/.+_new\.pdf$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "stored"})))
        .mount(mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.appt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(mock_server)
        .await;
}

fn new_pdf() -> ReportUpload {
    ReportUpload {
        file_name: "new.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.4".to_vec(),
        report_type: None,
    }
}

async fn patched_reports(mock_server: &MockServer) -> Vec<Value> {
    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|r| r.method.as_str() == "PATCH")
        .expect("reports were written");
    let body: Value = serde_json::from_slice(&patch.body).unwrap();
    body["reports"].as_array().unwrap().clone()
}

#[tokio::test]
async fn test_upload_keeps_existing_entry_without_timestamp() {
    let mock_server = MockServer::start().await;
    mount_existing_reports(&mock_server, json!([LEGACY_ENTRY])).await;

    let service = ReportService::new(&TestConfig::with_backend(&mock_server.uri()).to_app_config());
    let reports = service.upload_report("appt-1", new_pdf(), "admin-token").await.unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].url, "https://files/old.pdf");
    assert_eq!(reports[1].report_type, "Other");
    assert!(reports[1].uploaded_at.is_some());

    let written = patched_reports(&mock_server).await;
    assert_eq!(written.len(), 2);
    assert_eq!(written[0], json!(LEGACY_ENTRY));
}

#[tokio::test]
async fn test_upload_never_drops_unreadable_entries() {
    let mock_server = MockServer::start().await;
    mount_existing_reports(
        &mock_server,
        json!(["not json", {"url": "https://files/scan.png", "type": "Scan"}]),
    )
    .await;

    let service = ReportService::new(&TestConfig::with_backend(&mock_server.uri()).to_app_config());
    let reports = service.upload_report("appt-1", new_pdf(), "admin-token").await.unwrap();

    assert_eq!(reports.len(), 2);

    let written = patched_reports(&mock_server).await;
    assert_eq!(written.len(), 3);
    assert_eq!(written[0], json!("not json"));
    let object_entry: Value = serde_json::from_str(written[1].as_str().unwrap()).unwrap();
    assert_eq!(object_entry["url"], "https://files/scan.png");
}
