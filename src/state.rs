use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::session::SessionManager;
use crate::avatar::Gravatar;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub sessions: SessionManager,
    pub avatars: Gravatar,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let sessions = SessionManager::new(db.clone(), &config.auth);
        let avatars = Gravatar::new(&config.avatar);
        Self {
            db,
            config,
            sessions,
            avatars,
        }
    }
}
