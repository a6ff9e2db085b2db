use askama::Template;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Form, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::auth::guard::Admin;
use crate::auth::session::Identity;
use crate::db::models::PostView;
use crate::db::{comments, posts, StoreError};
use crate::error::{AppError, AppResult};
use crate::flash::Notice;
use crate::forms::{self, CommentForm, FormErrors, PostForm};
use crate::routes::home::{Html, Nav};
use crate::state::AppState;

const TITLE_TAKEN: &str = "A post with this title already exists";

// --- View structs ---

pub struct CommentItem {
    pub text: String,
    pub author_name: String,
    pub avatar_url: String,
}

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub nav: Nav,
    pub post: PostView,
    pub comments: Vec<CommentItem>,
    pub comment: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/make_post.html")]
pub struct MakePostTemplate {
    pub nav: Nav,
    pub is_edit: bool,
    pub action: String,
    pub form: PostForm,
    pub errors: FormErrors,
}

// --- Queries ---

#[derive(Deserialize)]
pub struct PostQuery {
    pub post_id: Option<i64>,
}

impl PostQuery {
    fn id(&self) -> AppResult<i64> {
        self.post_id.ok_or(AppError::NotFound)
    }
}

// --- Routers ---

pub fn router() -> Router<AppState> {
    Router::new().route("/posts", get(show_post).post(submit_comment))
}

/// Post management routes. The caller layers the admin guard on top.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/add", get(new_post_page).post(create_post))
        .route("/edit", get(edit_post_page).post(update_post))
        .route("/delete", get(delete_post))
}

// --- Reader handlers ---

async fn show_post(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<PostQuery>,
) -> AppResult<Html<PostTemplate>> {
    render_post(&state, &identity, query.id()?, String::new(), FormErrors::default())
}

async fn submit_comment(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<PostQuery>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post_id = query.id()?;
    let form = form.trimmed();

    if let Err(errors) = forms::check(&form) {
        return Ok(render_post(&state, &identity, post_id, form.comment, errors)?.into_response());
    }

    let Identity::Authenticated(user) = &identity else {
        return Ok((
            [(header::SET_COOKIE, Notice::LoginRequired.cookie())],
            Redirect::to("/login"),
        )
            .into_response());
    };

    {
        let conn = state.db.get()?;
        if !posts::exists(&conn, post_id)? {
            return Err(AppError::NotFound);
        }
        comments::insert(&conn, user.id, post_id, &form.comment)?;
    }

    tracing::debug!("User {} commented on post {}", user.id, post_id);
    Ok(Redirect::to(&post_url(post_id)).into_response())
}

// --- Admin handlers ---

async fn new_post_page(Extension(_admin): Extension<Admin>) -> Html<MakePostTemplate> {
    make_post_page(false, "/add".to_string(), PostForm::default(), FormErrors::default())
}

async fn create_post(
    State(state): State<AppState>,
    Extension(Admin(admin)): Extension<Admin>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let form = form.trimmed();
    if let Err(errors) = forms::check(&form) {
        return Ok(make_post_page(false, "/add".to_string(), form, errors).into_response());
    }

    let date = post_date(Local::now().date_naive());
    let result = {
        let conn = state.db.get()?;
        posts::insert(&conn, &form.fields(), &date, admin.id)
    };

    match result {
        Ok(post) => {
            tracing::info!("Admin {} created post {}", admin.id, post.id);
            Ok(Redirect::to("/").into_response())
        }
        Err(StoreError::Conflict(_)) => {
            Ok(make_post_page(false, "/add".to_string(), form, title_taken()).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_post_page(
    State(state): State<AppState>,
    Extension(_admin): Extension<Admin>,
    Query(query): Query<PostQuery>,
) -> AppResult<Html<MakePostTemplate>> {
    let id = query.id()?;
    let post = {
        let conn = state.db.get()?;
        posts::find(&conn, id)?.ok_or(AppError::NotFound)?
    };

    Ok(make_post_page(
        true,
        edit_url(id),
        PostForm::from(&post.post),
        FormErrors::default(),
    ))
}

async fn update_post(
    State(state): State<AppState>,
    Extension(Admin(admin)): Extension<Admin>,
    Query(query): Query<PostQuery>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let id = query.id()?;
    let form = form.trimmed();
    if let Err(errors) = forms::check(&form) {
        return Ok(make_post_page(true, edit_url(id), form, errors).into_response());
    }

    let result = {
        let conn = state.db.get()?;
        posts::update(&conn, id, &form.fields(), admin.id)
    };

    match result {
        Ok(true) => {
            tracing::info!("Admin {} edited post {}", admin.id, id);
            Ok(Redirect::to(&post_url(id)).into_response())
        }
        Ok(false) => Err(AppError::NotFound),
        Err(StoreError::Conflict(_)) => {
            Ok(make_post_page(true, edit_url(id), form, title_taken()).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_post(
    State(state): State<AppState>,
    Extension(Admin(admin)): Extension<Admin>,
    Query(query): Query<PostQuery>,
) -> AppResult<Response> {
    let id = query.id()?;
    let removed = {
        let mut conn = state.db.get()?;
        posts::delete(&mut conn, id)?
    };

    if !removed {
        return Err(AppError::NotFound);
    }

    tracing::info!("Admin {} deleted post {}", admin.id, id);
    Ok(Redirect::to("/").into_response())
}

// --- Helpers ---

fn render_post(
    state: &AppState,
    identity: &Identity,
    post_id: i64,
    comment: String,
    errors: FormErrors,
) -> AppResult<Html<PostTemplate>> {
    let (post, rows) = {
        let conn = state.db.get()?;
        let post = posts::find(&conn, post_id)?.ok_or(AppError::NotFound)?;
        (post, comments::list_for_post(&conn, post_id)?)
    };

    let comments = rows
        .into_iter()
        .map(|c| CommentItem {
            avatar_url: state.avatars.url(&c.author_email),
            author_name: c.author_name,
            text: c.text,
        })
        .collect();

    Ok(Html(PostTemplate {
        nav: Nav::from(identity),
        post,
        comments,
        comment,
        errors,
    }))
}

fn make_post_page(
    is_edit: bool,
    action: String,
    form: PostForm,
    errors: FormErrors,
) -> Html<MakePostTemplate> {
    Html(MakePostTemplate {
        nav: Nav::admin(),
        is_edit,
        action,
        form,
        errors,
    })
}

fn title_taken() -> FormErrors {
    let mut errors = FormErrors::default();
    errors.add("title", TITLE_TAKEN);
    errors
}

fn post_url(id: i64) -> String {
    format!("/posts?post_id={}", id)
}

fn edit_url(id: i64) -> String {
    format!("/edit?post_id={}", id)
}

/// Display date stamped on new posts, e.g. "October 19, 2026".
pub fn post_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}
