//! Coloring page model

use serde::{Deserialize, Serialize};

/// A printable coloring page image.
///
/// Pages are linked to categories through the `coloring_page_categories`
/// association, whose timestamp drives listing order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColoringPage {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// Description
    pub description: String,
    /// Public image URL
    pub image_url: String,
    /// Original file name, used for downloads
    pub file_name: String,
    /// Published flag
    pub is_published: bool,
}

impl ColoringPage {
    /// Create a page value that has not been stored yet.
    pub fn new(title: String, description: String, image_url: String, file_name: String) -> Self {
        Self {
            id: 0,
            title,
            description,
            image_url,
            file_name,
            is_published: true,
        }
    }
}
