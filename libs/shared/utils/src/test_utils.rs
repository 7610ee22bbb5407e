use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub admin_passkey: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            admin_passkey: "123456".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_backend(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        let mut config = AppConfig::with_backend(
            &self.supabase_url,
            &self.supabase_anon_key,
            &self.jwt_secret,
        );
        config.admin_passkey = self.admin_passkey.clone();
        config
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }
}

/// Row shapes the backend returns for each collection.
pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn doctor_row(id: &str, name: &str, availability: serde_json::Value) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "email": "doctor@clinic.test",
            "phone": "+353871234567",
            "specialization": "General Practice",
            "experience": 8,
            "image_id": null,
            "image_url": null,
            "availability": availability.to_string(),
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn patient_row(id: &str, user_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": user_id,
            "name": name,
            "email": "patient@example.com",
            "phone": "+353871234567",
            "birth_date": "1990-01-01",
            "gender": "female",
            "address": "1 Main Street",
            "occupation": "Engineer",
            "emergency_contact_name": "Jane Doe",
            "emergency_contact_number": "+353879999999",
            "primary_physician": "Dr. Test",
            "insurance_provider": "Laya",
            "insurance_policy_number": "POL-1",
            "allergies": null,
            "current_medication": null,
            "family_medical_history": null,
            "past_medical_history": null,
            "identification_type": null,
            "identification_number": null,
            "identification_document_id": null,
            "identification_document_url": null,
            "privacy_consent": true,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_row(id: &str, patient_id: &str, doctor: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "user_id": "user-1",
            "primary_physician": doctor,
            "schedule": "2030-03-04T10:00:00Z",
            "status": status,
            "reason": "Annual check-up",
            "note": null,
            "cancellation_reason": null,
            "reports": [],
            "created_at": "2024-01-01T00:00:00Z"
        })
    }
}
