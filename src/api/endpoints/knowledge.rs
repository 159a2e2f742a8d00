//! Knowledge base endpoints. Public: no session required.

use std::str::FromStr;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::extract::{optional_text, ApiPath, ApiQuery};
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::enums::ArticleCategory;
use crate::models::{Article, ArticleFilter};

#[derive(Debug, Default, Deserialize)]
pub struct ArticleQuery {
    /// A category name, or `all` for no filter.
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub views: i64,
}

pub fn parse_category(raw: Option<&str>) -> Result<Option<ArticleCategory>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(name) => ArticleCategory::from_str(name)
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Unknown category: {name}"))),
    }
}

/// `GET /api/knowledge/articles`
pub async fn articles(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<ArticleQuery>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let filter = ArticleFilter {
        category: parse_category(query.category.as_deref())?,
        search: optional_text("search", query.search, 200)?,
        featured_only: query.featured,
    };
    let articles = ctx.core.with_db(|conn| repository::get_articles(conn, &filter))?;
    Ok(Json(articles))
}

/// `GET /api/knowledge/articles/:id`
pub async fn article(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Option<Article>>, ApiError> {
    let article = ctx.core.with_db(|conn| repository::get_article_by_id(conn, id))?;
    Ok(Json(article))
}

/// `POST /api/knowledge/articles/:id/views`
pub async fn increment_views(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Option<ViewsResponse>>, ApiError> {
    let views = ctx
        .core
        .with_db(|conn| repository::increment_article_views(conn, id))?;
    Ok(Json(views.map(|views| ViewsResponse { views })))
}
