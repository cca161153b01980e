/// S3 operations for media upload and removal
use crate::config::S3Config;
use crate::{Result, S3Error};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Object stored by [`S3Operations::upload_path`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub key: String,
    pub url: String,
}

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Upload a local file under a fresh key, then remove the local copy.
    ///
    /// The local file is removed whether or not the upload succeeds.
    pub async fn upload_path(&self, path: &Path) -> Result<UploadedObject> {
        let key = object_key(&self.config.folder, path);
        let result = self.put_path(path, &key).await;

        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove local upload");
        }

        result.map(|()| UploadedObject {
            url: self.config.object_url(&key),
            key,
        })
    }

    async fn put_path(&self, path: &Path, key: &str) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| S3Error::LocalFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type(path))
            .body(body)
            .send()
            .await
            .map_err(|e| S3Error::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        debug!(key, "Uploaded object");
        Ok(())
    }

    /// Delete the object addressed by a public URL
    pub async fn delete_url(&self, url: &str) -> Result<()> {
        let key = self
            .config
            .key_from_url(url)
            .ok_or_else(|| S3Error::ForeignUrl {
                bucket: self.config.bucket.clone(),
                url: url.to_string(),
            })?;

        self.delete_file(&key).await
    }

    pub async fn delete_file(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| S3Error::Delete {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        debug!(key, "Deleted object");
        Ok(())
    }
}

/// `{folder}/{uuid}.{ext}`, keeping the source extension lowercased
pub fn object_key(folder: &str, path: &Path) -> String {
    let id = Uuid::new_v4();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let name = match ext {
        Some(ext) if !ext.is_empty() => format!("{id}.{ext}"),
        _ => id.to_string(),
    };

    if folder.is_empty() {
        name
    } else {
        format!("{folder}/{name}")
    }
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_keeps_extension() {
        let key = object_key("uploads", Path::new("/tmp/Holiday.MP4"));
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with(".mp4"));
    }

    #[test]
    fn test_object_key_without_folder_or_extension() {
        let key = object_key("", Path::new("/tmp/blob"));
        assert!(Uuid::parse_str(&key).is_ok());
    }

    #[test]
    fn test_object_keys_are_unique() {
        let path = Path::new("a.png");
        assert_ne!(object_key("x", path), object_key("x", path));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type(Path::new("a.webm")), "video/webm");
        assert_eq!(content_type(Path::new("a")), "application/octet-stream");
    }
}
