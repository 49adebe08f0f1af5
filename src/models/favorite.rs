//! Favorite model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// A favorited category together with the moment it was favorited
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteCategory {
    #[serde(flatten)]
    pub category: Category,
    pub favorited_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_category_flattens_category() {
        let favorite = FavoriteCategory {
            category: Category::new("Ocean".to_string(), "Fish and whales".to_string(), 8),
            favorited_at: Utc::now(),
        };
        let json = serde_json::to_value(&favorite).unwrap();

        assert_eq!(json["title"], "Ocean");
        assert_eq!(json["image_count"], 8);
        assert!(json["favorited_at"].is_string());
        assert!(json.get("category").is_none());
    }
}
