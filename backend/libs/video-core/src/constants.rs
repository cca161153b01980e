//! Video catalog constants

/// Maximum video title length
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum video description length
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Allowed video file extensions
pub const ALLOWED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "avi", "mov", "mkv"];

/// Allowed image extensions for thumbnails, avatars and covers
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Catalog page size when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Catalog page size ceiling; larger requests are clamped
pub const MAX_PAGE_SIZE: u32 = 100;
