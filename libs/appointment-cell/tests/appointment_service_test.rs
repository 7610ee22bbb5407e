use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::json;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{body_partial_json, method, path, query_param};

use appointment_cell::models::*;
use appointment_cell::services::{AppointmentService, SmsSender};
use shared_utils::test_utils::{TestConfig, MockBackendResponses};

/// Captures outgoing texts instead of delivering them.
#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send_sms(&self, user_id: &str, content: &str, _auth_token: &str) -> Result<()> {
        self.sent.lock().unwrap().push((user_id.to_string(), content.to_string()));
        if self.fail {
            return Err(anyhow!("gateway unavailable"));
        }
        Ok(())
    }
}

async fn mount_appointment(mock_server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.appt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::appointment_row("appt-1", "patient-1", "Ada Byrne", status)
        ])))
        .mount(mock_server)
        .await;
}

async fn mount_patch(mock_server: &MockServer, new_status: &str) {
    let mut row = MockBackendResponses::appointment_row("appt-1", "patient-1", "Ada Byrne", new_status);
    if new_status == "cancelled" {
        row["cancellation_reason"] = json!("Doctor unavailable");
    }

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.appt-1"))
        .and(body_partial_json(json!({ "status": new_status })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_schedule_pending_appointment_sends_confirmation() {
    let mock_server = MockServer::start().await;
    mount_appointment(&mock_server, "pending").await;
    mount_patch(&mock_server, "scheduled").await;

    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let sms = Arc::new(RecordingSms::default());
    let service = AppointmentService::with_sms_sender(&config, sms.clone());

    let updated = service
        .update_appointment("appt-1", AppointmentAction::Schedule, UpdateAppointmentRequest::default(), "admin-token")
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Scheduled);

    let sent = sms.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "user-1");
    assert_eq!(
        sent[0].1,
        "Greetings from CarePulse. Your appointment is confirmed for Mar 4, 2030, 10:00 AM with Dr. Ada Byrne."
    );
}

#[tokio::test]
async fn test_cancel_uses_time_zone_and_reason() {
    let mock_server = MockServer::start().await;
    mount_appointment(&mock_server, "scheduled").await;
    mount_patch(&mock_server, "cancelled").await;

    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let sms = Arc::new(RecordingSms::default());
    let service = AppointmentService::with_sms_sender(&config, sms.clone());

    let request = UpdateAppointmentRequest {
        cancellation_reason: Some("Doctor unavailable".to_string()),
        time_zone: Some("Europe/Dublin".to_string()),
        ..Default::default()
    };

    let updated = service
        .update_appointment("appt-1", AppointmentAction::Cancel, request, "admin-token")
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Cancelled);

    let sent = sms.sent.lock().unwrap();
    assert_eq!(
        sent[0].1,
        "Greetings from CarePulse. We regret to inform that your appointment for Mar 4, 2030, 10:00 AM is cancelled. Reason: Doctor unavailable."
    );
}

#[tokio::test]
async fn test_pending_appointment_cannot_be_completed() {
    let mock_server = MockServer::start().await;
    mount_appointment(&mock_server, "pending").await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let sms = Arc::new(RecordingSms::default());
    let service = AppointmentService::with_sms_sender(&config, sms.clone());

    let result = service
        .update_appointment("appt-1", AppointmentAction::Complete, UpdateAppointmentRequest::default(), "admin-token")
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Pending,
            to: AppointmentStatus::Completed,
        })
    );
    assert!(sms.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_sms_failure_does_not_fail_update() {
    let mock_server = MockServer::start().await;
    mount_appointment(&mock_server, "scheduled").await;
    mount_patch(&mock_server, "completed").await;

    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let sms = Arc::new(RecordingSms { fail: true, ..Default::default() });
    let service = AppointmentService::with_sms_sender(&config, sms.clone());

    let updated = service
        .update_appointment("appt-1", AppointmentAction::Complete, UpdateAppointmentRequest::default(), "admin-token")
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Completed);
    assert_eq!(sms.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_missing_appointment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let service = AppointmentService::with_sms_sender(&config, Arc::new(RecordingSms::default()));

    let result = service
        .update_appointment("missing", AppointmentAction::Schedule, UpdateAppointmentRequest::default(), "admin-token")
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound));
}

#[tokio::test]
async fn test_create_appointment_starts_pending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({ "status": "pending", "reports": [] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockBackendResponses::appointment_row("appt-9", "patient-1", "Ada Byrne", "pending")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let service = AppointmentService::with_sms_sender(&config, Arc::new(RecordingSms::default()));

    let request = CreateAppointmentRequest {
        patient_id: "patient-1".to_string(),
        user_id: "user-1".to_string(),
        primary_physician: "Ada Byrne".to_string(),
        schedule: "2030-03-04T10:00:00Z".parse().unwrap(),
        reason: "Annual check-up".to_string(),
        note: None,
    };

    let appointment = service.create_appointment(request, "patient-token").await.unwrap();

    assert_eq!(appointment.id, "appt-9");
    assert_eq!(appointment.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn test_create_appointment_requires_reason() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let service = AppointmentService::with_sms_sender(&config, Arc::new(RecordingSms::default()));

    let request = CreateAppointmentRequest {
        patient_id: "patient-1".to_string(),
        user_id: "user-1".to_string(),
        primary_physician: "Ada Byrne".to_string(),
        schedule: "2030-03-04T10:00:00Z".parse().unwrap(),
        reason: "   ".to_string(),
        note: None,
    };

    let result = service.create_appointment(request, "patient-token").await;

    assert_matches!(result, Err(AppointmentError::ValidationError(_)));
}

#[tokio::test]
async fn test_appointments_with_patient_info_builds_household_map() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", "eq.patient-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::appointment_row("appt-1", "patient-1", "Ada Byrne", "scheduled"),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", "eq.patient-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::patient_row("patient-1", "user-1", "Jane Doe")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::patient_row("patient-1", "user-1", "Jane Doe"),
            MockBackendResponses::patient_row("patient-2", "user-1", ""),
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let service = AppointmentService::with_sms_sender(&config, Arc::new(RecordingSms::default()));

    let result = service
        .get_appointments_with_patient_info("patient-1", "patient-token")
        .await
        .unwrap();

    assert_eq!(result.appointments.len(), 1);
    assert_eq!(result.patients_map.len(), 2);
    assert_eq!(result.patients_map["patient-1"].name, "Jane Doe");
    assert_eq!(result.patients_map["patient-2"].name, "Unknown Patient");
}

#[tokio::test]
async fn test_appointments_with_unknown_patient_have_empty_map() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_backend(&mock_server.uri()).to_app_config();
    let service = AppointmentService::with_sms_sender(&config, Arc::new(RecordingSms::default()));

    let result = service
        .get_appointments_with_patient_info("ghost", "patient-token")
        .await
        .unwrap();

    assert!(result.appointments.is_empty());
    assert!(result.patients_map.is_empty());
}
