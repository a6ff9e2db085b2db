use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;

use crate::auth::password;
use crate::auth::session::Identity;
use crate::db::{users, StoreError};
use crate::error::AppResult;
use crate::extractors::{cookie_value, Flash};
use crate::flash::{Notice, CLEAR_FLASH};
use crate::forms::{self, FormErrors, LoginForm, RegisterForm};
use crate::routes::home::{Html, Nav};
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub email: String,
    pub notice: Option<Notice>,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub email: String,
    pub name: String,
    pub errors: FormErrors,
}

// -- Response helpers --

fn with_cookie(cookie: String, to: &str) -> Response {
    ([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response()
}

fn login_page_with(
    identity: &Identity,
    email: String,
    notice: Option<Notice>,
    errors: FormErrors,
) -> Response {
    Html(LoginTemplate {
        nav: Nav::from(identity),
        email,
        notice,
        errors,
    })
    .into_response()
}

// -- Login --

/// GET /login: shows, then drops, any notice queued by a redirect
pub async fn login_page(identity: Identity, Flash(notice): Flash) -> Response {
    let page = login_page_with(&identity, String::new(), notice, FormErrors::default());
    match notice {
        Some(_) => ([(header::SET_COOKIE, CLEAR_FLASH)], page).into_response(),
        None => page,
    }
}

/// POST /login: unknown email and wrong password get different notices
pub async fn login(
    State(state): State<AppState>,
    identity: Identity,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let form = form.trimmed();
    if let Err(errors) = forms::check(&form) {
        return Ok(login_page_with(&identity, form.email, None, errors));
    }

    let user = {
        let conn = state.db.get()?;
        users::find_by_email(&conn, &form.email)?
    };

    let Some(user) = user else {
        tracing::info!("Login rejected: no account for submitted email");
        return Ok(login_page_with(
            &identity,
            form.email,
            Some(Notice::UnknownEmail),
            FormErrors::default(),
        ));
    };

    if !password::verify(&user.password_hash, &form.password) {
        tracing::warn!("Login rejected: wrong password for user {}", user.id);
        return Ok(login_page_with(
            &identity,
            form.email,
            Some(Notice::IncorrectPassword),
            FormErrors::default(),
        ));
    }

    let cookie = state.sessions.login(&user)?;
    tracing::info!("User {} logged in", user.id);
    Ok(with_cookie(cookie, "/"))
}

// -- Registration --

/// GET /register
pub async fn register_page(identity: Identity) -> Html<RegisterTemplate> {
    Html(RegisterTemplate {
        nav: Nav::from(&identity),
        email: String::new(),
        name: String::new(),
        errors: FormErrors::default(),
    })
}

/// POST /register: creates the account and logs it in
pub async fn register(
    State(state): State<AppState>,
    identity: Identity,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let form = form.trimmed();
    if let Err(errors) = forms::check(&form) {
        return Ok(Html(RegisterTemplate {
            nav: Nav::from(&identity),
            email: form.email,
            name: form.name,
            errors,
        })
        .into_response());
    }

    let taken = {
        let conn = state.db.get()?;
        users::find_by_email(&conn, &form.email)?.is_some()
    };
    if taken {
        return Ok(with_cookie(Notice::EmailTaken.cookie(), "/login"));
    }

    let digest = password::hash(&form.password, state.config.auth.bcrypt_cost)?;
    let inserted = {
        let conn = state.db.get()?;
        users::insert(&conn, &form.email, &digest, &form.name)
    };

    let user = match inserted {
        Ok(user) => user,
        // Lost a race with a concurrent registration for the same email.
        Err(StoreError::Conflict(_)) => {
            return Ok(with_cookie(Notice::EmailTaken.cookie(), "/login"))
        }
        Err(e) => return Err(e.into()),
    };

    let cookie = state.sessions.login(&user)?;
    tracing::info!("Registered user {}", user.id);
    Ok(with_cookie(cookie, "/"))
}

// -- Logout --

/// GET /logout: harmless when already anonymous
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let token = cookie_value(&headers, state.sessions.cookie_name());
    let cleared = state.sessions.logout(token)?;
    Ok(with_cookie(cleared, "/"))
}
