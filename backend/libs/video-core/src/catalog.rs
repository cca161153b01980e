//! Catalog search vocabulary: filtering, ordering and offset pagination
//!
//! The Postgres repository translates these into SQL; the in-memory store
//! evaluates them directly with [`CatalogFilter::matches`] and
//! [`CatalogSort::compare`], so both agree on semantics.

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::models::Video;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl SortField {
    /// Sort expression over the `videos` table
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Views => "views",
            SortField::Duration => "duration",
            SortField::Title => "lower(title)",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "createdat" | "created_at" | "created" => Ok(SortField::CreatedAt),
            "views" => Ok(SortField::Views),
            "duration" => Ok(SortField::Duration),
            "title" => Ok(SortField::Title),
            other => Err(format!("unsupported sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(SortDirection::Asc),
            "desc" | "descending" | "-1" => Ok(SortDirection::Desc),
            other => Err(format!("unsupported sort direction: {other}")),
        }
    }
}

/// Which videos a catalog query selects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Case-insensitive substring matched against title or description
    pub text: Option<String>,
    pub owner_id: Option<Uuid>,
    pub include_unpublished: bool,
}

impl CatalogFilter {
    pub fn matches(&self, video: &Video) -> bool {
        if !self.include_unpublished && !video.is_published {
            return false;
        }
        if let Some(owner_id) = self.owner_id {
            if video.owner_id != owner_id {
                return false;
            }
        }
        match self.text.as_deref() {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                video.title.to_lowercase().contains(&needle)
                    || video.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Result ordering; ties fall back to id so pages never overlap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl CatalogSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Titles compare case-folded, matching `lower(title)` in SQL. Beyond
    /// case, Postgres may still order by its collation where this uses code
    /// points.
    pub fn compare(&self, a: &Video, b: &Video) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Views => a.views.cmp(&b.views),
            SortField::Duration => a.duration.total_cmp(&b.duration),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        let ordered = primary.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ordered,
            SortDirection::Desc => ordered.reverse(),
        }
    }
}

/// 1-based offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Returns `None` for a zero page or page size; clamps oversized pages
    pub fn new(page: u32, page_size: u32) -> Option<Self> {
        if page == 0 || page_size == 0 {
            return None;
        }
        Some(Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let page_size = u64::from(request.page_size);
        let total_pages = total_items.div_ceil(page_size);
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            has_next: u64::from(request.page) < total_pages,
        }
    }
}
