use axum::routing::get;
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/register", get(handlers::register_page).post(handlers::register))
        .route("/logout", get(handlers::logout))
}
