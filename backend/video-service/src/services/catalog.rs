//! Catalog search over published videos

use crate::error::{AppError, Result};
use crate::repository::Repositories;
use crate::services::summarize;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use video_core::{CatalogFilter, CatalogSort, Page, PageRequest, VideoSummary};

/// Raw search input; `page` is 1-based
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub text: Option<String>,
    pub owner_id: Option<Uuid>,
    /// Honoured only when the viewer is `owner_id`
    pub include_unpublished: bool,
    pub sort: CatalogSort,
    pub page: u32,
    pub page_size: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        let page = PageRequest::default();
        Self {
            text: None,
            owner_id: None,
            include_unpublished: false,
            sort: CatalogSort::default(),
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    repos: Repositories,
}

impl CatalogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// A page past the last match is empty, not an error
    pub async fn search(
        &self,
        viewer_id: Option<Uuid>,
        query: CatalogQuery,
    ) -> Result<Page<VideoSummary>> {
        let page = PageRequest::new(query.page, query.page_size)
            .ok_or_else(|| AppError::validation("page and page_size must be at least 1"))?;

        let owns_listing = query.owner_id.is_some() && query.owner_id == viewer_id;
        let filter = CatalogFilter {
            text: query
                .text
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            owner_id: query.owner_id,
            include_unpublished: query.include_unpublished && owns_listing,
        };

        let (videos, total) = self
            .repos
            .run(
                "videos.search",
                self.repos.videos.search(&filter, query.sort, page),
            )
            .await?;

        let items = summarize(&self.repos, videos).await?;
        Ok(Page::new(items, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::repository::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_zero_page_is_validation() {
        let repos = Repositories::memory(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        let service = CatalogService::new(repos);

        let err = service
            .search(
                None,
                CatalogQuery {
                    page: 0,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let repos = Repositories::memory(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        let page = CatalogService::new(repos)
            .search(None, CatalogQuery::default())
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
    }
}
