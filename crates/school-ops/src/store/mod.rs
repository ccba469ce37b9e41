//! Shared storage contracts: repository errors and pagination.

pub mod memory;

use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Page size bounds applied to every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Raw paging parameters as received from a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn normalize(self, config: &PaginationConfig) -> Pagination {
        let page = match self.page {
            Some(page) if page >= 1 => u32::try_from(page).unwrap_or(u32::MAX),
            _ => 1,
        };

        let max = i64::from(config.max_page_size);
        let page_size = match self.page_size {
            Some(size) if size >= 1 => size.min(max) as u32,
            _ => config.default_page_size,
        };

        Pagination { page, page_size }
    }
}

/// Normalized, 1-based paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self
        }
    }

    /// Slice an already filtered and ordered collection.
    pub fn apply<T>(self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.page_size as usize)
            .collect();

        Page {
            items,
            page: self.page,
            page_size: self.page_size,
            total,
        }
    }
}

/// One page of a listing plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        let seen = (self.page as usize).saturating_mul(self.page_size as usize);
        seen < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}
