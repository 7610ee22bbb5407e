use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub storage_bucket: String,
    pub admin_passkey: String,
    pub clinic_name: String,
    pub sms_function_path: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| {
                    warn!("STORAGE_BUCKET not set, using default");
                    "clinic-files".to_string()
                }),
            admin_passkey: env::var("ADMIN_PASSKEY")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_PASSKEY not set, admin passkey login disabled");
                    String::new()
                }),
            clinic_name: env::var("CLINIC_NAME")
                .unwrap_or_else(|_| "CarePulse".to_string()),
            sms_function_path: env::var("SMS_FUNCTION_PATH")
                .unwrap_or_else(|_| "/functions/v1/send-sms".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Config pointing at a given backend, everything else defaulted.
    pub fn with_backend(supabase_url: &str, anon_key: &str, jwt_secret: &str) -> Self {
        Self {
            supabase_url: supabase_url.to_string(),
            supabase_anon_key: anon_key.to_string(),
            supabase_jwt_secret: jwt_secret.to_string(),
            storage_bucket: "clinic-files".to_string(),
            admin_passkey: String::new(),
            clinic_name: "CarePulse".to_string(),
            sms_function_path: "/functions/v1/send-sms".to_string(),
            port: 3000,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_admin_passkey_configured(&self) -> bool {
        !self.admin_passkey.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_backend_defaults() {
        let config = AppConfig::with_backend("http://localhost:54321", "anon", "secret");

        assert!(config.is_configured());
        assert!(!config.is_admin_passkey_configured());
        assert_eq!(config.storage_bucket, "clinic-files");
        assert_eq!(config.clinic_name, "CarePulse");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_unconfigured_backend() {
        let config = AppConfig::with_backend("", "anon", "secret");
        assert!(!config.is_configured());
    }
}
