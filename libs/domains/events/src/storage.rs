//! Image file store
//!
//! Decodes base64 payloads and writes them under a storage root with a
//! generated name. The returned path is the public URL path
//! (`<public_prefix>/<name>`) that the API serves the file from.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub const DEFAULT_UPLOAD_DIR: &str = "public/uploads";
pub const DEFAULT_PUBLIC_PATH: &str = "/uploads";
/// Request body cap for event creation; images travel inline as base64
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("Invalid base64 image payload: {0}")]
    Decode(String),

    #[error("Failed to write image file: {0}")]
    Write(#[from] std::io::Error),

    #[error("Invalid stored image path: {0}")]
    InvalidPath(String),
}

/// Durable storage for uploaded images
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Decode `encoded` and write it under a fresh name; `filename` only
    /// contributes the extension. Returns the public path.
    async fn store(&self, encoded: &str, filename: &str) -> Result<String, ImageStoreError>;

    /// Delete a file previously returned by [`ImageStore::store`]
    async fn remove(&self, path: &str) -> Result<(), ImageStoreError>;
}

/// Storage root, public prefix and the upload body cap
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageStoreConfig {
    pub root: PathBuf,
    /// No trailing slash; empty means files live at `/<name>`
    pub public_prefix: String,
    /// Largest accepted event creation body, in bytes
    pub max_body_bytes: usize,
}

impl ImageStoreConfig {
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: normalize_prefix(public_prefix),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl Default for ImageStoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_DIR, DEFAULT_PUBLIC_PATH)
    }
}

impl FromEnv for ImageStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self::new(
            env_or_default("UPLOAD_DIR", DEFAULT_UPLOAD_DIR),
            &env_or_default("UPLOAD_PUBLIC_PATH", DEFAULT_PUBLIC_PATH),
        );
        let max_body_bytes = env_parse_or("UPLOAD_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;

        Ok(config.with_max_body_bytes(max_body_bytes))
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Decode a standard, padded base64 payload, dropping a data-URL header
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>, ImageStoreError> {
    let trimmed = encoded.trim();

    let data = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| ImageStoreError::Decode("data URL is not base64".to_string()))?,
        None => trimmed,
    };

    let bytes = STANDARD
        .decode(data)
        .map_err(|e| ImageStoreError::Decode(e.to_string()))?;

    if bytes.is_empty() {
        return Err(ImageStoreError::Decode("empty payload".to_string()));
    }

    Ok(bytes)
}

/// Lower-cased extension of the last path component, if it is short and
/// alphanumeric
pub fn extension_hint(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (_, extension) = name.rsplit_once('.')?;

    let valid = !extension.is_empty()
        && extension.len() <= MAX_EXTENSION_LEN
        && extension.chars().all(|c| c.is_ascii_alphanumeric());

    valid.then(|| extension.to_ascii_lowercase())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// [`ImageStore`] on the local filesystem
#[derive(Clone, Debug)]
pub struct LocalImageStore {
    config: ImageStoreConfig,
}

impl LocalImageStore {
    pub fn new(config: ImageStoreConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.config.public_prefix
    }

    /// Filesystem location of a public path returned by `store`
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ImageStoreError> {
        let name = path
            .strip_prefix(self.config.public_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| is_plain_file_name(name))
            .ok_or_else(|| ImageStoreError::InvalidPath(path.to_string()))?;

        Ok(self.config.root.join(name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, encoded: &str, filename: &str) -> Result<String, ImageStoreError> {
        let bytes = decode_payload(encoded)?;

        let id = Uuid::now_v7().simple().to_string();
        let name = match extension_hint(filename) {
            Some(extension) => format!("{id}.{extension}"),
            None => id,
        };

        fs::create_dir_all(&self.config.root).await?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.config.root.join(&name))
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        tracing::debug!(file = %name, size = bytes.len(), "Stored image");

        Ok(format!("{}/{}", self.config.public_prefix, name))
    }

    async fn remove(&self, path: &str) -> Result<(), ImageStoreError> {
        let target = self.resolve(path)?;

        match fs::remove_file(&target).await {
            Ok(()) => {
                tracing::debug!(path = %path, "Removed image");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> LocalImageStore {
        LocalImageStore::new(ImageStoreConfig::new(dir.path(), "/uploads"))
    }

    #[test]
    fn test_decode_payload_plain_and_data_url() {
        assert_eq!(decode_payload("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_payload("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert_eq!(decode_payload("  aGVsbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_payload_rejects_invalid() {
        assert!(matches!(
            decode_payload("not base64!!"),
            Err(ImageStoreError::Decode(_))
        ));
        assert!(matches!(decode_payload("aGVsbG8"), Err(ImageStoreError::Decode(_))));
        assert!(matches!(decode_payload(""), Err(ImageStoreError::Decode(_))));
        assert!(matches!(
            decode_payload("data:image/png,aGVsbG8="),
            Err(ImageStoreError::Decode(_))
        ));
    }

    #[test]
    fn test_extension_hint() {
        assert_eq!(extension_hint("a.png").as_deref(), Some("png"));
        assert_eq!(extension_hint("Photo.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(extension_hint("../../etc/x.gif").as_deref(), Some("gif"));
        assert_eq!(extension_hint("dir.d/noext"), None);
        assert_eq!(extension_hint("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_hint("evil.p/hp"), None);
        assert_eq!(extension_hint("x.verylongextension"), None);
        assert_eq!(extension_hint("x.p-g"), None);
        assert_eq!(extension_hint(""), None);
        assert_eq!(extension_hint("trailing."), None);
    }

    #[test]
    fn test_config_normalizes_prefix() {
        assert_eq!(ImageStoreConfig::new("x", "/uploads/").public_prefix, "/uploads");
        assert_eq!(ImageStoreConfig::new("x", "media").public_prefix, "/media");
        assert_eq!(ImageStoreConfig::new("x", "/").public_prefix, "");
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("UPLOAD_DIR", Some("/var/lib/events/uploads")),
                ("UPLOAD_PUBLIC_PATH", Some("/files/")),
                ("UPLOAD_MAX_BODY_BYTES", Some("52428800")),
            ],
            || {
                let config = ImageStoreConfig::from_env().unwrap();
                assert_eq!(config.root, PathBuf::from("/var/lib/events/uploads"));
                assert_eq!(config.public_prefix, "/files");
                assert_eq!(config.max_body_bytes, 50 * 1024 * 1024);
            },
        );

        temp_env::with_vars_unset(
            ["UPLOAD_DIR", "UPLOAD_PUBLIC_PATH", "UPLOAD_MAX_BODY_BYTES"],
            || {
                let config = ImageStoreConfig::from_env().unwrap();
                assert_eq!(config, ImageStoreConfig::default());
                assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
            },
        );
    }

    #[test]
    fn test_config_rejects_unparseable_body_limit() {
        temp_env::with_var("UPLOAD_MAX_BODY_BYTES", Some("25MB"), || {
            let err = ImageStoreConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("UPLOAD_MAX_BODY_BYTES"));
        });
    }

    #[tokio::test]
    async fn test_store_writes_decoded_bytes() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let path = store.store("aGVsbG8=", "a.png").await.unwrap();

        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".png"));
        let contents = std::fs::read(store.resolve(&path).unwrap()).unwrap();
        assert_eq!(contents, b"hello");
    }

    #[tokio::test]
    async fn test_store_ignores_client_file_name() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let path = store.store("aGVsbG8=", "../../escape.png").await.unwrap();
        let name = path.trim_start_matches("/uploads/");

        assert!(is_plain_file_name(name));
        assert!(!name.contains("escape"));
        assert_eq!(name.len(), 32 + ".png".len());
    }

    #[tokio::test]
    async fn test_store_without_extension() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let path = store.store("aGVsbG8=", "").await.unwrap();

        assert!(!path.trim_start_matches("/uploads/").contains('.'));
    }

    #[tokio::test]
    async fn test_store_creates_missing_root() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("public").join("uploads");
        let store = LocalImageStore::new(ImageStoreConfig::new(&nested, "/uploads"));

        store.store("aGVsbG8=", "a.png").await.unwrap();

        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_store_names_are_unique() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let first = store.store("aGVsbG8=", "a.png").await.unwrap();
        let second = store.store("aGVsbG8=", "a.png").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_store_decode_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let result = store.store("%%%", "a.png").await;

        assert!(matches!(result, Err(ImageStoreError::Decode(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_remove_deletes_file_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let path = store.store("aGVsbG8=", "a.png").await.unwrap();
        let on_disk = store.resolve(&path).unwrap();

        store.remove(&path).await.unwrap();
        assert!(!on_disk.exists());

        store.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_rejects_foreign_paths() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        for path in ["/etc/passwd", "/uploads/../secret", "/uploads/", "/uploads/a/b", "uploads/x"] {
            assert!(
                matches!(store.remove(path).await, Err(ImageStoreError::InvalidPath(_))),
                "{path} should be rejected"
            );
        }
    }
}
