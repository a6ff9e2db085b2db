use askama::Template;
use axum::routing::get;
use axum::Router;

use crate::auth::session::Identity;
use crate::routes::home::{Html, Nav};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub nav: Nav,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about", get(about))
        .route("/contact", get(contact))
}

async fn about(identity: Identity) -> Html<AboutTemplate> {
    Html(AboutTemplate {
        nav: Nav::from(&identity),
    })
}

async fn contact(identity: Identity) -> Html<ContactTemplate> {
    Html(ContactTemplate {
        nav: Nav::from(&identity),
    })
}
