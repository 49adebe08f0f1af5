//! Offset pagination types
//!
//! Listings are paged by offset ("load more") rather than by page number.

use serde::{Deserialize, Serialize};

/// Number of coloring pages fetched per listing request
pub const PAGE_SIZE: i64 = 12;

/// Offset and limit for a range query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: i64,
    limit: i64,
}

impl PageRequest {
    /// Create a request. Negative offsets are clamped to zero and the limit
    /// to at least one row.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: offset.max(0),
            limit: limit.max(1),
        }
    }

    /// The first page of [`PAGE_SIZE`] rows
    pub fn first() -> Self {
        Self::new(0, PAGE_SIZE)
    }

    /// A page of [`PAGE_SIZE`] rows starting at `offset`
    pub fn at(offset: i64) -> Self {
        Self::new(offset, PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// A slice of rows together with the total number of matching rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OffsetPage<T> {
    /// Rows in this slice
    pub items: Vec<T>,
    /// Total matching rows across all slices
    pub total: i64,
    /// Offset of the first row in `items`
    pub offset: i64,
}

impl<T> OffsetPage<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            items,
            total,
            offset: request.offset(),
        }
    }

    /// Whether more rows exist past this slice.
    ///
    /// Derived from the total count, never from the slice length alone.
    /// Always false when there are no matching rows.
    pub fn has_more(&self) -> bool {
        self.total > 0 && self.offset + (self.items.len() as i64) < self.total
    }

    /// Offset to request the following slice from
    pub fn next_offset(&self) -> i64 {
        self.offset + self.items.len() as i64
    }
}

impl<T> Default for OffsetPage<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: 0,
        }
    }
}
