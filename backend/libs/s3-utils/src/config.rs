/// S3 configuration shared across services
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access; a CDN domain or the bucket endpoint
    pub base_url: String,
    /// Whether public URLs include the bucket as the first path segment
    pub path_style: bool,
    /// Key prefix every upload lands under
    pub folder: String,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "vidora-media".to_string());
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let base_url = std::env::var("S3_BASE_URL")
            .unwrap_or_else(|_| format!("https://{bucket}.s3.{region}.amazonaws.com"));

        Self {
            bucket,
            region,
            base_url: base_url.trim_end_matches('/').to_string(),
            path_style: std::env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            folder: std::env::var("S3_FOLDER")
                .unwrap_or_else(|_| "uploads".to_string())
                .trim_matches('/')
                .to_string(),
        }
    }

    fn url_prefix(&self) -> String {
        if self.path_style {
            format!("{}/{}/", self.base_url, self.bucket)
        } else {
            format!("{}/", self.base_url)
        }
    }

    /// Public URL of an object key
    pub fn object_url(&self, key: &str) -> String {
        format!("{}{}", self.url_prefix(), key)
    }

    /// Recover the object key from a URL produced by [`S3Config::object_url`]
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.url_prefix())?;
        let key = key.split(['?', '#']).next().unwrap_or_default();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(path_style: bool) -> S3Config {
        S3Config {
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            base_url: "https://media.example.com".to_string(),
            path_style,
            folder: "uploads".to_string(),
        }
    }

    #[test]
    fn test_object_url_virtual_hosted_style() {
        let url = config(false).object_url("uploads/a.jpg");
        assert_eq!(url, "https://media.example.com/uploads/a.jpg");
    }

    #[test]
    fn test_object_url_path_style() {
        let url = config(true).object_url("uploads/a.jpg");
        assert_eq!(url, "https://media.example.com/test-bucket/uploads/a.jpg");
    }

    #[test]
    fn test_key_from_url_round_trip() {
        for path_style in [false, true] {
            let cfg = config(path_style);
            let url = cfg.object_url("uploads/clip.mp4");
            assert_eq!(cfg.key_from_url(&url).as_deref(), Some("uploads/clip.mp4"));
        }
    }

    #[test]
    fn test_key_from_url_rejects_foreign_urls() {
        let cfg = config(false);
        assert!(cfg.key_from_url("https://elsewhere.example.com/a.jpg").is_none());
        assert!(cfg.key_from_url("https://media.example.com/").is_none());
        assert_eq!(
            cfg.key_from_url("https://media.example.com/uploads/a.jpg?v=2").as_deref(),
            Some("uploads/a.jpg")
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_defaults() {
        for key in ["S3_BUCKET", "AWS_REGION", "S3_BASE_URL", "S3_PATH_STYLE", "S3_FOLDER"] {
            std::env::remove_var(key);
        }
        let cfg = S3Config::from_env();
        assert_eq!(cfg.bucket, "vidora-media");
        assert_eq!(cfg.base_url, "https://vidora-media.s3.us-east-1.amazonaws.com");
        assert!(!cfg.path_style);
        assert_eq!(cfg.folder, "uploads");
    }
}
