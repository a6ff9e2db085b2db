use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::auth::guard::ADMIN_USER_ID;
use crate::config::AuthConfig;
use crate::db::models::User;
use crate::db::users;
use crate::error::AppResult;
use crate::state::DbPool;

/// Who is behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(|u| u.id == ADMIN_USER_ID)
    }
}

/// Server-side sessions keyed by a random token kept in a cookie.
#[derive(Clone)]
pub struct SessionManager {
    pool: DbPool,
    cookie_name: String,
    hours: u64,
}

impl SessionManager {
    pub fn new(pool: DbPool, config: &AuthConfig) -> Self {
        Self {
            pool,
            cookie_name: config.cookie_name.clone(),
            hours: config.session_hours,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Bind a new session to `user`. Returns the `Set-Cookie` value.
    pub fn login(&self, user: &User) -> AppResult<String> {
        let conn = self.pool.get()?;
        let token = generate_token();
        let id = uuid::Uuid::now_v7().to_string();

        conn.execute(
            "INSERT INTO sessions (id, user_id, token, expires_at)
             VALUES (?1, ?2, ?3, datetime('now', ?4))",
            params![id, user.id, token, format!("+{} hours", self.hours)],
        )?;

        Ok(self.session_cookie(&token))
    }

    /// Drop the session behind `token`, if any. Returns a clearing cookie.
    pub fn logout(&self, token: Option<&str>) -> AppResult<String> {
        if let Some(token) = token {
            let conn = self.pool.get()?;
            conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        }
        Ok(self.clear_cookie())
    }

    /// Resolve a session token. Missing, unknown and expired tokens are
    /// all anonymous.
    pub fn current_identity(&self, token: Option<&str>) -> AppResult<Identity> {
        let Some(token) = token else {
            return Ok(Identity::Anonymous);
        };

        let user_id: Option<i64> = {
            let conn = self.pool.get()?;
            conn.query_row(
                "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
                params![token],
                |row| row.get(0),
            )
            .optional()?
        };

        let Some(user_id) = user_id else {
            return Ok(Identity::Anonymous);
        };

        match self.load_user(user_id)? {
            Some(user) => Ok(Identity::Authenticated(user)),
            None => {
                tracing::warn!("Session points at missing user {}", user_id);
                Ok(Identity::Anonymous)
            }
        }
    }

    pub fn load_user(&self, id: i64) -> AppResult<Option<User>> {
        let conn = self.pool.get()?;
        Ok(users::find_by_id(&conn, id)?)
    }

    fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
            self.cookie_name,
            token,
            self.hours.saturating_mul(3600)
        )
    }

    fn clear_cookie(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
            self.cookie_name
        )
    }
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
