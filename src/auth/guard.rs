use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::session::Identity;
use crate::db::models::User;
use crate::error::AppError;

/// The one account allowed to manage posts.
pub const ADMIN_USER_ID: i64 = 1;

/// Proof that the caller passed the admin check. Inserted into request
/// extensions by [`admin_only`].
#[derive(Debug, Clone)]
pub struct Admin(pub User);

#[derive(Debug)]
pub enum Access {
    Allow(Admin),
    Deny,
}

pub fn require_admin(identity: Identity) -> Access {
    match identity {
        Identity::Authenticated(user) if user.id == ADMIN_USER_ID => Access::Allow(Admin(user)),
        _ => Access::Deny,
    }
}

/// Route middleware for post management: 403 unless the caller is the admin.
pub async fn admin_only(identity: Identity, mut request: Request, next: Next) -> Response {
    match require_admin(identity) {
        Access::Allow(admin) => {
            request.extensions_mut().insert(admin);
            next.run(request).await
        }
        Access::Deny => {
            tracing::warn!("Denied admin route {} {}", request.method(), request.uri().path());
            AppError::Forbidden.into_response()
        }
    }
}
