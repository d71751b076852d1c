//! Upload storage strategies.
//!
//! The mode (local filesystem vs. signed-URL blob gateway) is decided once
//! at process startup from configuration and the chosen strategy is injected
//! wherever uploads are handled; nothing re-reads the environment per call.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    Local,
    Remote,
}

impl UploadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMode::Local => "local",
            UploadMode::Remote => "remote",
        }
    }
}

/// Pick the upload mode: an explicit "local" always wins, otherwise remote
/// when the blob gateway is fully configured.
pub fn select_upload_mode(explicit: Option<&str>, remote_configured: bool) -> UploadMode {
    if explicit == Some("local") {
        return UploadMode::Local;
    }
    if remote_configured {
        UploadMode::Remote
    } else {
        UploadMode::Local
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUpload {
    pub upload_url: String,
    pub public_url: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("signed uploads are not available in local mode")]
    SignedUnavailable,
    #[error("direct writes are not available in remote mode")]
    DirectWriteUnavailable,
    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// The storage strategy the upload flow is written against.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    fn mode(&self) -> UploadMode;

    /// Remote mode: a presigned PUT url plus the public url the stored
    /// object will be served from.
    async fn signed_upload(&self, key: &str, content_type: &str)
        -> Result<SignedUpload, StorageError>;

    /// Local mode: persist the bytes directly and return the public path.
    async fn save_upload(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

fn sanitized_extension(file_name: &str) -> String {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !ext.is_empty() && ext.len() <= 7 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        format!(".{ext}")
    } else {
        ".bin".to_string()
    }
}

/// Object key for an upload: `sites/{site_id}/{yyyy}/{mm}/{uuid}{ext}`.
pub fn build_upload_key(site_id: i64, file_name: &str) -> String {
    let now = Utc::now();
    format!(
        "sites/{site_id}/{}/{}{}",
        now.format("%Y/%m"),
        Uuid::new_v4(),
        sanitized_extension(file_name),
    )
}

/// Filesystem storage under an uploads root, served from a public prefix.
pub struct LocalPhotoStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalPhotoStorage {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    fn mode(&self) -> UploadMode {
        UploadMode::Local
    }

    async fn signed_upload(
        &self,
        _key: &str,
        _content_type: &str,
    ) -> Result<SignedUpload, StorageError> {
        Err(StorageError::SignedUnavailable)
    }

    async fn save_upload(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let full_path = self.root.join(key);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;
        Ok(format!("{}/{key}", self.public_prefix.trim_end_matches('/')))
    }
}

/// Blob-gateway storage: uploads go straight to the gateway through a
/// presigned PUT url, signed with a shared HMAC secret.
pub struct RemoteSignedStorage {
    endpoint: String,
    bucket: String,
    secret: String,
    public_base: String,
    ttl_secs: i64,
}

impl RemoteSignedStorage {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        secret: impl Into<String>,
        public_base: impl Into<String>,
        ttl_secs: i64,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            secret: secret.into(),
            public_base: public_base.into(),
            ttl_secs,
        }
    }
}

/// Signature over `PUT\n{key}\n{content_type}\n{expires}` with the shared
/// secret, base64url without padding. Stable across processes so the
/// gateway can verify independently.
pub fn presign(secret: &str, key: &str, content_type: &str, expires_unix: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(b"PUT\n");
    mac.update(key.as_bytes());
    mac.update(b"\n");
    mac.update(content_type.as_bytes());
    mac.update(b"\n");
    mac.update(expires_unix.to_string().as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

#[async_trait]
impl PhotoStorage for RemoteSignedStorage {
    fn mode(&self) -> UploadMode {
        UploadMode::Remote
    }

    async fn signed_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<SignedUpload, StorageError> {
        let expires = Utc::now().timestamp() + self.ttl_secs;
        let signature = presign(&self.secret, key, content_type, expires);
        let endpoint = self.endpoint.trim_end_matches('/');
        let public_base = self.public_base.trim_end_matches('/');

        Ok(SignedUpload {
            upload_url: format!(
                "{endpoint}/{}/{key}?expires={expires}&signature={signature}",
                self.bucket
            ),
            public_url: format!("{public_base}/{key}"),
        })
    }

    async fn save_upload(&self, _key: &str, _bytes: &[u8]) -> Result<String, StorageError> {
        Err(StorageError::DirectWriteUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selection_prefers_explicit_local() {
        assert_eq!(select_upload_mode(Some("local"), true), UploadMode::Local);
        assert_eq!(select_upload_mode(None, true), UploadMode::Remote);
        assert_eq!(select_upload_mode(None, false), UploadMode::Local);
        assert_eq!(select_upload_mode(Some("remote"), false), UploadMode::Local);
    }

    #[test]
    fn upload_keys_scope_by_site_and_month() {
        let key = build_upload_key(42, "Dinner Photo.JPG");
        assert!(key.starts_with("sites/42/"));
        assert!(key.ends_with(".jpg"));
        // sites/42/yyyy/mm/{uuid}.jpg
        assert_eq!(key.split('/').count(), 5);
    }

    #[test]
    fn weird_extensions_become_bin() {
        for name in ["archive.tar.verylongext", "noext", "shot.j pg", "dots..."] {
            let key = build_upload_key(1, name);
            assert!(key.ends_with(".bin"), "{name} -> {key}");
        }
    }

    #[test]
    fn presign_is_deterministic_and_input_sensitive() {
        let a = presign("secret", "sites/1/k.jpg", "image/jpeg", 1_700_000_000);
        let b = presign("secret", "sites/1/k.jpg", "image/jpeg", 1_700_000_000);
        assert_eq!(a, b);

        assert_ne!(a, presign("secret", "sites/1/other.jpg", "image/jpeg", 1_700_000_000));
        assert_ne!(a, presign("secret", "sites/1/k.jpg", "image/png", 1_700_000_000));
        assert_ne!(a, presign("other", "sites/1/k.jpg", "image/jpeg", 1_700_000_000));
    }

    #[tokio::test]
    async fn local_storage_writes_and_returns_public_path() {
        let root = std::env::temp_dir().join(format!("sitesmith-test-{}", Uuid::new_v4()));
        let storage = LocalPhotoStorage::new(root.clone(), "/uploads/");

        let public = storage.save_upload("sites/1/a.jpg", b"bytes").await.unwrap();
        assert_eq!(public, "/uploads/sites/1/a.jpg");
        let written = tokio::fs::read(root.join("sites/1/a.jpg")).await.unwrap();
        assert_eq!(written, b"bytes");

        assert!(matches!(
            storage.signed_upload("k", "image/jpeg").await,
            Err(StorageError::SignedUnavailable)
        ));

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn remote_storage_signs_and_rejects_direct_writes() {
        let storage =
            RemoteSignedStorage::new("https://blobs.example.com/", "photos", "secret", "https://cdn.example.com", 300);

        let signed = storage.signed_upload("sites/1/a.jpg", "image/jpeg").await.unwrap();
        assert!(signed
            .upload_url
            .starts_with("https://blobs.example.com/photos/sites/1/a.jpg?expires="));
        assert!(signed.upload_url.contains("&signature="));
        assert_eq!(signed.public_url, "https://cdn.example.com/sites/1/a.jpg");

        assert!(matches!(
            storage.save_upload("k", b"x").await,
            Err(StorageError::DirectWriteUnavailable)
        ));
    }
}
