//! Object storage abstraction.
//!
//! The core never talks to storage credentials directly: uploads and reads go
//! through signed, time-limited URLs issued here. The production
//! implementation targets the Supabase Storage REST API; tests swap in an
//! in-memory mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of requesting a signed upload slot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignedUpload {
    pub signed_url: String,
    pub file_path: String,
}

#[async_trait]
pub trait ObjectStorage {
    /// Issue a signed URL the client can PUT the file to.
    async fn create_signed_upload_url(&self, file_path: &str) -> Result<SignedUpload, String>;

    /// Issue a time-limited signed URL for viewing an object.
    async fn create_signed_view_url(
        &self,
        file_path: &str,
        expires_in_secs: u32,
    ) -> Result<String, String>;

    /// Download an object's raw bytes (used by the document renderer for
    /// logo/signature/stamp images).
    async fn fetch_bytes(&self, file_path: &str) -> Result<Vec<u8>, String>;
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
    pub bucket: String,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self, String> {
        let url = std::env::var("SUPABASE_URL").map_err(|_| "SUPABASE_URL must be set")?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| "SUPABASE_SERVICE_ROLE_KEY must be set")?;
        let bucket =
            std::env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "berkas-persyaratan".to_string());
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            service_role_key,
            bucket,
        })
    }
}

pub struct SupabaseStorage {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn object_url(&self, prefix: &str, file_path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}/{}",
            self.config.url, prefix, self.config.bucket, file_path
        )
    }
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "url")]
    signed_url: String,
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn create_signed_upload_url(&self, file_path: &str) -> Result<SignedUpload, String> {
        let url = self.object_url("upload/sign", file_path);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.service_role_key)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| format!("signed upload request failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("signed upload request returned {}", resp.status()));
        }

        let body: SignedUrlResponse = resp
            .json()
            .await
            .map_err(|e| format!("invalid signed upload response: {e}"))?;

        Ok(SignedUpload {
            signed_url: format!("{}{}", self.config.url, body.signed_url),
            file_path: file_path.to_string(),
        })
    }

    async fn create_signed_view_url(
        &self,
        file_path: &str,
        expires_in_secs: u32,
    ) -> Result<String, String> {
        let url = self.object_url("sign", file_path);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.service_role_key)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await
            .map_err(|e| format!("signed view request failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("signed view request returned {}", resp.status()));
        }

        let body: SignedUrlResponse = resp
            .json()
            .await
            .map_err(|e| format!("invalid signed view response: {e}"))?;

        Ok(format!("{}{}", self.config.url, body.signed_url))
    }

    async fn fetch_bytes(&self, file_path: &str) -> Result<Vec<u8>, String> {
        let url = self.object_url("authenticated", file_path);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.config.service_role_key)
            .send()
            .await
            .map_err(|e| format!("object download failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("object download returned {}", resp.status()));
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| format!("object body read failed: {e}"))
    }
}
