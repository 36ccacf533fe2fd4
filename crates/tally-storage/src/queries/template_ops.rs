//! Template CRUD: insert, owner-scoped get, filtered listing, partial
//! update, delete, distinct categories. Hashtag lists are stored as JSON.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use tracing::warn;

use tally_core::errors::TallyResult;
use tally_core::models::template::{
    HashtagTemplate, Platform, TemplateFilter, TemplatePage, TemplateUpdate,
};

use crate::to_storage_err;

const TEMPLATE_COLUMNS: &str =
    "id, user_id, name, description, hashtags, category, platform, created_at, updated_at";

fn row_to_template(row: &Row<'_>) -> rusqlite::Result<HashtagTemplate> {
    let hashtags_json: String = row.get(4)?;
    let hashtags = serde_json::from_str(&hashtags_json).unwrap_or_else(|e| {
        warn!(error = %e, "Corrupt hashtags column — reading as empty list");
        Vec::new()
    });
    let platform_tag: String = row.get(6)?;
    Ok(HashtagTemplate {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        hashtags,
        category: row.get(5)?,
        platform: Platform::parse(&platform_tag).unwrap_or_default(),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn insert(conn: &Connection, template: &HashtagTemplate) -> TallyResult<()> {
    let hashtags_json = serde_json::to_string(&template.hashtags)?;
    conn.execute(
        "INSERT INTO templates
         (id, user_id, name, description, hashtags, category, platform, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            template.id,
            template.user_id,
            template.name,
            template.description,
            hashtags_json,
            template.category,
            template.platform.as_tag(),
            template.created_at,
            template.updated_at,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Owner-scoped lookup: a template is only visible to its owner.
pub fn get(conn: &Connection, user_id: &str, id: &str) -> TallyResult<Option<HashtagTemplate>> {
    let sql = format!(
        "SELECT {} FROM templates WHERE id = ?1 AND user_id = ?2",
        TEMPLATE_COLUMNS
    );
    let result = conn.query_row(&sql, params![id, user_id], row_to_template);
    match result {
        Ok(template) => Ok(Some(template)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

/// Filtered, paginated listing, newest first.
pub fn list(
    conn: &Connection,
    user_id: &str,
    filter: &TemplateFilter,
) -> TallyResult<TemplatePage> {
    let mut where_sql = String::from("user_id = ?1");
    let mut values: Vec<Value> = vec![Value::Text(user_id.to_string())];

    if let Some(category) = &filter.category {
        values.push(Value::Text(category.clone()));
        where_sql.push_str(&format!(" AND category = ?{}", values.len()));
    }
    // Platform::All matches everything, same as no filter.
    if let Some(platform) = filter.platform {
        if platform != Platform::All {
            values.push(Value::Text(platform.as_tag().to_string()));
            where_sql.push_str(&format!(" AND platform = ?{}", values.len()));
        }
    }

    let total_count: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM templates WHERE {}", where_sql),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let page_size = filter.page_size();
    values.push(Value::Integer(page_size as i64));
    let limit_idx = values.len();
    values.push(Value::Integer(filter.offset as i64));
    let offset_idx = values.len();

    let sql = format!(
        "SELECT {} FROM templates WHERE {}
         ORDER BY created_at DESC, rowid DESC LIMIT ?{} OFFSET ?{}",
        TEMPLATE_COLUMNS, where_sql, limit_idx, offset_idx
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), row_to_template)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut templates = Vec::new();
    for row in rows {
        templates.push(row.map_err(|e| to_storage_err(e.to_string()))?);
    }

    let has_more = (filter.offset as i64 + page_size as i64) < total_count;
    Ok(TemplatePage {
        templates,
        total_count: total_count as u64,
        has_more,
    })
}

/// Partial update; returns the updated row, or None when the template does
/// not exist or belongs to another user.
pub fn update(
    conn: &Connection,
    user_id: &str,
    id: &str,
    changes: &TemplateUpdate,
    updated_at: i64,
) -> TallyResult<Option<HashtagTemplate>> {
    let Some(mut template) = get(conn, user_id, id)? else {
        return Ok(None);
    };

    if let Some(name) = &changes.name {
        template.name = name.clone();
    }
    if let Some(description) = &changes.description {
        template.description = Some(description.clone());
    }
    if let Some(hashtags) = &changes.hashtags {
        template.hashtags = hashtags.clone();
    }
    if let Some(category) = &changes.category {
        template.category = Some(category.clone());
    }
    if let Some(platform) = changes.platform {
        template.platform = platform;
    }
    template.updated_at = updated_at;

    let hashtags_json = serde_json::to_string(&template.hashtags)?;
    conn.execute(
        "UPDATE templates
         SET name = ?3, description = ?4, hashtags = ?5, category = ?6,
             platform = ?7, updated_at = ?8
         WHERE id = ?1 AND user_id = ?2",
        params![
            id,
            user_id,
            template.name,
            template.description,
            hashtags_json,
            template.category,
            template.platform.as_tag(),
            updated_at,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Some(template))
}

/// Returns whether a row was deleted.
pub fn delete(conn: &Connection, user_id: &str, id: &str) -> TallyResult<bool> {
    let affected = conn
        .execute(
            "DELETE FROM templates WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(affected > 0)
}

/// Distinct non-null categories across the user's templates.
pub fn categories(conn: &Connection, user_id: &str) -> TallyResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT category FROM templates
             WHERE user_id = ?1 AND category IS NOT NULL
             ORDER BY category",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![user_id], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| to_storage_err(e.to_string()))?);
    }
    Ok(result)
}
