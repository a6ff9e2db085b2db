use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::auth::session::Identity;
use crate::error::AppError;
use crate::flash::{Notice, FLASH_COOKIE};
use crate::state::AppState;

/// Resolves the caller from the session cookie. Anonymous callers are not
/// rejected; only store failures are.
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, state.sessions.cookie_name());
        state.sessions.current_identity(token)
    }
}

/// The pending flash notice, if the request carries one.
pub struct Flash(pub Option<Notice>);

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(
            cookie_value(&parts.headers, FLASH_COOKIE).and_then(Notice::from_cookie),
        ))
    }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, val) = cookie.split_once('=')?;
            if key.trim() == name {
                Some(val.trim())
            } else {
                None
            }
        })
        .filter(|val| !val.is_empty())
}
