//! Category model
//!
//! Categories group coloring pages. ColorMyPage only reads them; they are
//! seeded and edited outside of this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named group of coloring pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// Short description shown in the category header
    pub description: String,
    /// Number of images advertised for the category
    pub image_count: i64,
    /// Optional cover image URL
    pub featured_image: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a category value that has not been stored yet.
    pub fn new(title: String, description: String, image_count: i64) -> Self {
        Self {
            id: 0,
            title,
            description,
            image_count,
            featured_image: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a cover image
    pub fn with_featured_image(mut self, url: impl Into<String>) -> Self {
        self.featured_image = Some(url.into());
        self
    }
}
