use crate::config::AppConfig;
use crate::errors::ServiceError;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::instrument;

/// Bucket for roll label photos.
pub const ROLLS_BUCKET: &str = "rolls";
/// Bucket for raw-pallet sticker photos.
pub const RAW_PALLETS_BUCKET: &str = "raw-pallets";

/// Thin client for an S3-compatible object store exposed over the
/// Supabase storage REST surface. Uploads are authenticated with the
/// service key; reads go through public or signed URLs.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl StorageClient {
    pub fn new(base_url: String, service_key: String) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ServiceError::StorageError(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(config.storage_url.clone(), config.storage_service_key.clone())
    }

    /// Uploads an object, replacing any existing one at the same path.
    #[instrument(skip(self, body), fields(len = body.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), ServiceError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::StorageError(format!("upload request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::StorageError(format!(
                "upload failed with {}: {}",
                status, detail
            )));
        }
        Ok(())
    }

    /// Stable public URL for an object in a public bucket.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        )
    }

    /// Time-limited read URL for an object in a private bucket.
    #[instrument(skip(self))]
    pub async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/storage/v1/object/sign/{}/{}", self.base_url, bucket, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await
            .map_err(|e| ServiceError::StorageError(format!("sign request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::StorageError(format!(
                "sign failed with {}: {}",
                status, detail
            )));
        }

        let signed: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::StorageError(format!("sign response: {}", e)))?;
        Ok(format!(
            "{}/storage/v1{}",
            self.base_url,
            signed.signed_url.trim_start_matches("/storage/v1")
        ))
    }
}

/// Decodes a base64 payload (with or without a data-URL prefix) and rejects
/// anything over the configured cap before the bytes travel any further.
pub fn decode_image_base64(raw: &str, max_bytes: usize) -> Result<Bytes, ServiceError> {
    use base64::Engine;

    let encoded = raw
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(raw);

    // 4 base64 chars encode 3 bytes; reject before decoding.
    if encoded.len() / 4 * 3 > max_bytes {
        return Err(ServiceError::PayloadTooLarge(format!(
            "image exceeds {} bytes",
            max_bytes
        )));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ServiceError::InvalidInput(format!("invalid base64 image: {}", e)))?;

    if bytes.len() > max_bytes {
        return Err(ServiceError::PayloadTooLarge(format!(
            "image exceeds {} bytes",
            max_bytes
        )));
    }
    Ok(Bytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        let raw = base64::engine::general_purpose::STANDARD.encode(b"hello");
        assert_eq!(decode_image_base64(&raw, 1024).unwrap().as_ref(), b"hello");
        let data_url = format!("data:image/jpeg;base64,{}", raw);
        assert_eq!(
            decode_image_base64(&data_url, 1024).unwrap().as_ref(),
            b"hello"
        );
    }

    #[test]
    fn rejects_oversized_payloads() {
        let raw = base64::engine::general_purpose::STANDARD.encode(vec![0u8; 2048]);
        let err = decode_image_base64(&raw, 1024).unwrap_err();
        assert!(matches!(err, ServiceError::PayloadTooLarge(_)));
    }

    #[test]
    fn rejects_garbage_base64() {
        let err = decode_image_base64("!!not base64!!", 1024).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
