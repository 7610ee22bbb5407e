use anyhow::{Result, anyhow};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

/// A file written to the storage bucket.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: String,
    pub path: String,
    pub public_url: String,
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            bucket: config.storage_bucket.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        Self::read_response(response).await
    }

    /// PostgREST insert/update header asking for the written rows back.
    pub fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    /// Uploads raw bytes to the configured bucket under `{prefix}/{uuid}_{file_name}`.
    pub async fn upload_object(
        &self,
        prefix: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        auth_token: Option<&str>,
    ) -> Result<StoredObject> {
        let id = Uuid::new_v4().to_string();
        let object_path = format!("{}/{}_{}", prefix, id, sanitize_file_name(file_name));
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, object_path);
        debug!("Uploading {} bytes to {}", bytes.len(), url);

        let mut headers = self.get_headers(auth_token)?;
        let content_type = if content_type.is_empty() { "application/octet-stream" } else { content_type };
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);

        let response = self.client.post(&url)
            .headers(headers)
            .body(bytes)
            .send()
            .await?;

        let _: Value = Self::read_response(response).await?;

        Ok(StoredObject {
            id,
            public_url: self.get_public_url(&object_path),
            path: object_path,
        })
    }

    pub async fn delete_object(&self, object_path: &str, auth_token: Option<&str>) -> Result<()> {
        let path = format!("/storage/v1/object/{}/{}", self.bucket, object_path);
        let _: Value = self.request(Method::DELETE, &path, auth_token, None).await?;
        Ok(())
    }

    /// Calls an edge function with a JSON payload.
    pub async fn invoke_function(&self, function_path: &str, payload: Value, auth_token: Option<&str>) -> Result<Value> {
        self.request(Method::POST, function_path, auth_token, Some(payload)).await
    }

    async fn read_response<T>(response: reqwest::Response) -> Result<T>
    where T: DeserializeOwned {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                409 => anyhow!("Conflict: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        // DELETE and minimal-return writes come back with an empty body
        let text = response.text().await?;
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(serde_json::from_value(value)?)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn get_public_url(&self, object_path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, object_path)
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    if cleaned.is_empty() { "file".to_string() } else { cleaned }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("blood test (1).pdf"), "blood_test__1_.pdf");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("x-ray_01.png"), "x-ray_01.png");
    }

    #[test]
    fn test_public_url_uses_bucket() {
        let config = AppConfig::with_backend("http://localhost:54321/", "anon", "secret");
        let client = SupabaseClient::new(&config);

        assert_eq!(
            client.get_public_url("reports/abc_scan.pdf"),
            "http://localhost:54321/storage/v1/object/public/clinic-files/reports/abc_scan.pdf"
        );
    }
}
