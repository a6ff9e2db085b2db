use rusqlite::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: String,
}

impl User {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            name: row.get("name")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: String,
    pub img_url: String,
    pub author_id: i64,
}

impl Post {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            subtitle: row.get("subtitle")?,
            date: row.get("date")?,
            body: row.get("body")?,
            img_url: row.get("img_url")?,
            author_id: row.get("author_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub text: String,
}

/// Fields an admin supplies when creating or editing a post.
#[derive(Debug, Clone)]
pub struct PostFields {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

/// A post joined with its author's display name.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author_name: String,
}

/// A comment joined with the fields needed to show its author.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub author_name: String,
    pub author_email: String,
}
