use crate::error::Result;
use crate::repository::VideoRepository;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;
use video_core::{CatalogFilter, CatalogSort, NewVideo, PageRequest, Video, VideoChanges};

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_url, thumbnail_url, \
     duration, views, is_published, created_at, updated_at";

/// Shared by the page query and the count query; binds $1..$3
const CATALOG_WHERE: &str = r#"
    ($1::text IS NULL OR title ILIKE $1 ESCAPE '\' OR description ILIKE $1 ESCAPE '\')
    AND ($2::uuid IS NULL OR owner_id = $2)
    AND (is_published OR $3)
"#;

/// PostgreSQL video storage and catalog queries
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%needle%` with LIKE metacharacters escaped
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn insert(&self, video: NewVideo) -> Result<Video> {
        let query = format!(
            r#"
            INSERT INTO videos (id, owner_id, title, description, video_url, thumbnail_url,
                                duration, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, Video>(&query)
            .bind(Uuid::new_v4())
            .bind(video.owner_id)
            .bind(&video.title)
            .bind(&video.description)
            .bind(&video.video_url)
            .bind(&video.thumbnail_url)
            .bind(video.duration)
            .bind(video.is_published)
            .fetch_one(&self.pool)
            .await?;

        debug!(video_id = %record.id, owner_id = %record.owner_id, "Inserted video");
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");
        let video = sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Video>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ANY($1)");
        let videos = sqlx::query_as::<_, Video>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    async fn search(
        &self,
        filter: &CatalogFilter,
        sort: CatalogSort,
        page: PageRequest,
    ) -> Result<(Vec<Video>, u64)> {
        let pattern = filter
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM videos WHERE {CATALOG_WHERE}"
        ))
        .bind(&pattern)
        .bind(filter.owner_id)
        .bind(filter.include_unpublished)
        .fetch_one(&self.pool)
        .await?;

        // Sort column and direction come from closed enums
        let direction = sort.direction.as_sql();
        let query = format!(
            r#"
            SELECT {VIDEO_COLUMNS} FROM videos
            WHERE {CATALOG_WHERE}
            ORDER BY {column} {direction}, id {direction}
            LIMIT $4 OFFSET $5
            "#,
            column = sort.field.column(),
        );

        let videos = sqlx::query_as::<_, Video>(&query)
            .bind(&pattern)
            .bind(filter.owner_id)
            .bind(filter.include_unpublished)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((videos, total.max(0) as u64))
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: &VideoChanges,
    ) -> Result<Option<Video>> {
        let query = format!(
            r#"
            UPDATE videos
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                thumbnail_url = COALESCE($5, thumbnail_url),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        let video = sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.thumbnail_url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn toggle_published(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        let query = format!(
            r#"
            UPDATE videos
            SET is_published = NOT is_published, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        let video = sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        let query = format!(
            "DELETE FROM videos WHERE id = $1 AND owner_id = $2 RETURNING {VIDEO_COLUMNS}"
        );

        let video = sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Video>> {
        let query = format!(
            "UPDATE videos SET views = views + 1 WHERE id = $1 RETURNING {VIDEO_COLUMNS}"
        );

        let video = sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("cat"), "%cat%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
