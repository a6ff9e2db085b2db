use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Post, PostFields, PostView};
use super::{conflict_on_unique, StoreResult};

const POST_VIEW_SELECT: &str = "SELECT p.id, p.title, p.subtitle, p.date, p.body, p.img_url, p.author_id,
            u.name AS author_name
     FROM posts p
     JOIN users u ON u.id = p.author_id";

fn post_view_from_row(row: &Row<'_>) -> rusqlite::Result<PostView> {
    Ok(PostView {
        post: Post::from_row(row)?,
        author_name: row.get("author_name")?,
    })
}

/// All posts in creation order.
pub fn list(conn: &Connection) -> StoreResult<Vec<PostView>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY p.id ASC", POST_VIEW_SELECT))?;
    let posts = stmt
        .query_map([], post_view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn find(conn: &Connection, id: i64) -> StoreResult<Option<PostView>> {
    let post = conn
        .query_row(
            &format!("{} WHERE p.id = ?1", POST_VIEW_SELECT),
            params![id],
            post_view_from_row,
        )
        .optional()?;
    Ok(post)
}

pub fn exists(conn: &Connection, id: i64) -> StoreResult<bool> {
    let found: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![id],
        |r| r.get(0),
    )?;
    Ok(found)
}

/// Insert a post. A taken title surfaces as `StoreError::Conflict("title")`.
pub fn insert(
    conn: &Connection,
    fields: &PostFields,
    date: &str,
    author_id: i64,
) -> StoreResult<Post> {
    conn.execute(
        "INSERT INTO posts (title, subtitle, date, body, img_url, author_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            fields.title,
            fields.subtitle,
            date,
            fields.body,
            fields.img_url,
            author_id
        ],
    )
    .map_err(|e| conflict_on_unique(e, "title"))?;

    Ok(Post {
        id: conn.last_insert_rowid(),
        title: fields.title.clone(),
        subtitle: fields.subtitle.clone(),
        date: date.to_string(),
        body: fields.body.clone(),
        img_url: fields.img_url.clone(),
        author_id,
    })
}

/// Overwrite the editable fields and hand authorship to `editor_id`.
/// The display date is left alone. Returns false when the post is gone.
pub fn update(
    conn: &Connection,
    id: i64,
    fields: &PostFields,
    editor_id: i64,
) -> StoreResult<bool> {
    let changed = conn
        .execute(
            "UPDATE posts
             SET title = ?1, subtitle = ?2, body = ?3, img_url = ?4, author_id = ?5
             WHERE id = ?6",
            params![
                fields.title,
                fields.subtitle,
                fields.body,
                fields.img_url,
                editor_id,
                id
            ],
        )
        .map_err(|e| conflict_on_unique(e, "title"))?;
    Ok(changed > 0)
}

/// Delete a post together with its comments. Returns false when the post
/// did not exist.
pub fn delete(conn: &mut Connection, id: i64) -> StoreResult<bool> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM comments WHERE post_id = ?1", params![id])?;
    let removed = tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(removed > 0)
}
