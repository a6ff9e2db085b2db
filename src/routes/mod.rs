pub mod assets;
pub mod auth;
pub mod home;
pub mod pages;
pub mod posts;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::guard;
use crate::state::AppState;

/// The full application router.
pub fn router(state: AppState) -> Router {
    let admin = posts::admin_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        guard::admin_only,
    ));

    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(posts::router())
        .merge(pages::router())
        .merge(auth::router())
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
