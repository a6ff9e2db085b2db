use rusqlite::{params, Connection};

use super::models::{Comment, CommentView};
use super::StoreResult;

pub fn insert(conn: &Connection, author_id: i64, post_id: i64, text: &str) -> StoreResult<Comment> {
    conn.execute(
        "INSERT INTO comments (author_id, post_id, text) VALUES (?1, ?2, ?3)",
        params![author_id, post_id, text],
    )?;

    Ok(Comment {
        id: conn.last_insert_rowid(),
        author_id,
        post_id,
        text: text.to_string(),
    })
}

pub fn list_for_post(conn: &Connection, post_id: i64) -> StoreResult<Vec<CommentView>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.text, u.name, u.email
         FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.id ASC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            Ok(CommentView {
                id: row.get(0)?,
                text: row.get(1)?,
                author_name: row.get(2)?,
                author_email: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(comments)
}
