use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{ArticleCategory, ContentType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub category: ArticleCategory,
    pub content_type: ContentType,
    pub image_url: Option<String>,
    pub read_minutes: Option<i64>,
    pub published: bool,
    pub featured: bool,
    pub views: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Knowledge-base listing filter. `category: None` means every category.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub category: Option<ArticleCategory>,
    pub search: Option<String>,
    pub featured_only: bool,
}
