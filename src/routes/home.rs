use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::auth::session::Identity;
use crate::db::models::PostView;
use crate::db::posts;
use crate::error::AppResult;
use crate::state::AppState;

/// Navigation state shared by every page layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nav {
    pub logged_in: bool,
    pub is_admin: bool,
}

impl Nav {
    pub fn admin() -> Self {
        Self {
            logged_in: true,
            is_admin: true,
        }
    }
}

impl From<&Identity> for Nav {
    fn from(identity: &Identity) -> Self {
        Self {
            logged_in: identity.is_authenticated(),
            is_admin: identity.is_admin(),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub posts: Vec<PostView>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Html<IndexTemplate>> {
    let posts = {
        let conn = state.db.get()?;
        posts::list(&conn)?
    };

    Ok(Html(IndexTemplate {
        nav: Nav::from(&identity),
        posts,
    }))
}
