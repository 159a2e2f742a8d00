use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

use super::escape_like;

const ARTICLE_COLUMNS: &str = "id, title, description, content, category, content_type, image_url,
     read_minutes, published, featured, views, created_at, updated_at";

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        content: row.get(3)?,
        category: row.get(4)?,
        content_type: row.get(5)?,
        image_url: row.get(6)?,
        read_minutes: row.get(7)?,
        published: row.get(8)?,
        featured: row.get(9)?,
        views: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Published articles matching the filter, newest first.
pub fn get_articles(conn: &Connection, filter: &ArticleFilter) -> Result<Vec<Article>, DatabaseError> {
    let mut sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE published = 1");
    let mut values: Vec<Value> = Vec::new();

    if let Some(category) = filter.category {
        values.push(Value::Text(category.as_str().into()));
        sql.push_str(&format!(" AND category = ?{}", values.len()));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        values.push(Value::Text(format!("%{}%", escape_like(term))));
        let n = values.len();
        sql.push_str(&format!(
            " AND (title LIKE ?{n} ESCAPE '\\' OR description LIKE ?{n} ESCAPE '\\')"
        ));
    }
    if filter.featured_only {
        sql.push_str(" AND featured = 1");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), row_to_article)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// A single published article; drafts are invisible.
pub fn get_article_by_id(conn: &Connection, article_id: i64) -> Result<Option<Article>, DatabaseError> {
    let article = conn
        .query_row(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1 AND published = 1"),
            params![article_id],
            row_to_article,
        )
        .optional()?;
    Ok(article)
}

/// Bump the view counter atomically. Returns the new count, or `None`
/// when there is no such published article.
pub fn increment_article_views(
    conn: &Connection,
    article_id: i64,
) -> Result<Option<i64>, DatabaseError> {
    let views = conn
        .query_row(
            "UPDATE articles SET views = views + 1 WHERE id = ?1 AND published = 1
             RETURNING views",
            params![article_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::ArticleCategory;

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn drafts_never_listed() {
        let conn = open_memory_database().unwrap();
        seed_article(&conn, "Live", "recovery", true, false);
        let draft = seed_article(&conn, "Draft", "recovery", false, false);

        let all = get_articles(&conn, &ArticleFilter::default()).unwrap();
        assert_eq!(titles(&all), vec!["Live"]);
        assert!(get_article_by_id(&conn, draft).unwrap().is_none());
    }

    #[test]
    fn filters_combine() {
        let conn = open_memory_database().unwrap();
        seed_article(&conn, "Knee bends", "exercises", true, true);
        seed_article(&conn, "Ankle pumps", "exercises", true, false);
        seed_article(&conn, "Protein after surgery", "nutrition", true, true);

        let filter = ArticleFilter {
            category: Some(ArticleCategory::Exercises),
            ..Default::default()
        };
        assert_eq!(get_articles(&conn, &filter).unwrap().len(), 2);

        let filter = ArticleFilter {
            category: Some(ArticleCategory::Exercises),
            featured_only: true,
            ..Default::default()
        };
        assert_eq!(titles(&get_articles(&conn, &filter).unwrap()), vec!["Knee bends"]);

        let filter = ArticleFilter {
            search: Some("protein".into()),
            ..Default::default()
        };
        assert_eq!(
            titles(&get_articles(&conn, &filter).unwrap()),
            vec!["Protein after surgery"]
        );
    }

    #[test]
    fn newest_first() {
        let conn = open_memory_database().unwrap();
        let old = seed_article(&conn, "Old", "faq", true, false);
        seed_article(&conn, "New", "faq", true, false);
        conn.execute(
            "UPDATE articles SET created_at = '2020-01-01 00:00:00' WHERE id = ?1",
            params![old],
        )
        .unwrap();

        let all = get_articles(&conn, &ArticleFilter::default()).unwrap();
        assert_eq!(titles(&all), vec!["New", "Old"]);
    }

    #[test]
    fn views_increment_by_one() {
        let conn = open_memory_database().unwrap();
        let id = seed_article(&conn, "Live", "faq", true, false);
        assert_eq!(increment_article_views(&conn, id).unwrap(), Some(1));
        assert_eq!(increment_article_views(&conn, id).unwrap(), Some(2));
        assert_eq!(increment_article_views(&conn, 999).unwrap(), None);
    }
}
