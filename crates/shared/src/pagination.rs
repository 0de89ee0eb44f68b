//! Offset-based pagination utilities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for page requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Page size must be greater than 0")]
    ZeroPageSize,
    #[error("Page size {requested} exceeds maximum of {max}")]
    PageSizeTooLarge { requested: u32, max: u32 },
}

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page_index: u32,
    page_size: u32,
}

impl PageRequest {
    /// Creates a page request, rejecting an empty page size.
    pub fn new(page_index: u32, page_size: u32) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self {
            page_index,
            page_size,
        })
    }

    /// Creates a page request bounded by `max_page_size`.
    pub fn bounded(page_index: u32, page_size: u32, max_page_size: u32) -> Result<Self, PaginationError> {
        if page_size > max_page_size {
            return Err(PaginationError::PageSizeTooLarge {
                requested: page_size,
                max: max_page_size,
            });
        }
        Self::new(page_index, page_size)
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of records to return.
    pub fn limit(&self) -> u32 {
        self.page_size
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size)
    }
}

/// One page of results together with the size of the full filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page_index: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page_index: request.page_index(),
            page_size: request.page_size(),
        }
    }

    /// Total number of pages for the filtered set.
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total, self.page_size)
    }

    /// Maps the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}

/// Computes the page count for `total` records split into pages of `page_size`.
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}
