//! End-to-end tests against a live router on an ephemeral port.
//!
//! Covers:
//! - Registration, login and logout state transitions
//! - Distinct login failure notices
//! - Admin gating of post management
//! - Comment attribution and the anonymous comment path
//! - Post edit/delete semantics

use std::collections::HashMap;

use penlog::config::Config;
use penlog::db;
use penlog::routes;
use penlog::state::{AppState, DbPool};
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use rusqlite::params;
use tempfile::TempDir;

struct TestServer {
    base: String,
    pool: DbPool,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let pool = db::create_pool(&dir.path().join("blog.db")).unwrap();
        db::run_migrations(&pool).unwrap();

        let mut config = Config::default();
        config.auth.bcrypt_cost = 4;
        let app = routes::router(AppState::new(pool.clone(), config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            pool,
            _dir: dir,
        }
    }

    fn browser(&self) -> Browser {
        Browser {
            client: reqwest::Client::builder()
                .redirect(Policy::none())
                .build()
                .unwrap(),
            base: self.base.clone(),
            cookies: HashMap::new(),
        }
    }

    fn count(&self, table: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get(0)
        })
        .unwrap()
    }
}

struct Page {
    status: u16,
    location: Option<String>,
    body: String,
}

/// A minimal browser: no redirect following, cookies kept by name.
struct Browser {
    client: reqwest::Client,
    base: String,
    cookies: HashMap<String, String>,
}

impl Browser {
    async fn get(&mut self, path: &str) -> Page {
        let request = self.client.get(format!("{}{}", self.base, path));
        self.send(request).await
    }

    async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> Page {
        let request = self
            .client
            .post(format!("{}{}", self.base, path))
            .form(form);
        self.send(request).await
    }

    async fn send(&mut self, mut request: reqwest::RequestBuilder) -> Page {
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header(COOKIE, header);
        }

        let response = request.send().await.unwrap();
        for value in response.headers().get_all(SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let (name, rest) = raw.split_once('=').unwrap();
            let value = rest.split(';').next().unwrap_or("");
            if raw.contains("Max-Age=0") || value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        Page {
            status: response.status().as_u16(),
            location: response
                .headers()
                .get(LOCATION)
                .map(|v| v.to_str().unwrap().to_string()),
            body: response.text().await.unwrap(),
        }
    }

    async fn register(&mut self, email: &str, password: &str, name: &str) -> Page {
        self.post(
            "/register",
            &[("email", email), ("password", password), ("name", name)],
        )
        .await
    }

    async fn login(&mut self, email: &str, password: &str) -> Page {
        self.post("/login", &[("email", email), ("password", password)])
            .await
    }

    async fn is_logged_in(&mut self) -> bool {
        self.get("/").await.body.contains("Log Out")
    }

    async fn add_post(&mut self, title: &str) -> Page {
        self.post(
            "/add",
            &[
                ("title", title),
                ("subtitle", "A subtitle"),
                ("img_url", "https://example.com/header.jpg"),
                ("body", "<p>Post body</p>"),
            ],
        )
        .await
    }
}

fn assert_redirect(page: &Page, to: &str) {
    assert_eq!(page.status, 303, "expected redirect, body: {}", page.body);
    assert_eq!(page.location.as_deref(), Some(to));
}

// ============================================================================
// IDENTITY FLOW
// ============================================================================

#[tokio::test]
async fn register_logout_login_round_trip() {
    let server = TestServer::start().await;
    let mut browser = server.browser();

    let page = browser.register("a@x.com", "pw1", "Ada").await;
    assert_redirect(&page, "/");
    assert!(browser.is_logged_in().await, "registration should log in");

    assert_redirect(&browser.get("/logout").await, "/");
    assert!(!browser.is_logged_in().await);

    let page = browser.login("a@x.com", "wrong").await;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("Incorrect Password"));
    assert!(!browser.is_logged_in().await);

    let page = browser.login("a@x.com", "pw1").await;
    assert_redirect(&page, "/");
    assert!(browser.is_logged_in().await);
}

#[tokio::test]
async fn wrong_password_never_authenticates() {
    let server = TestServer::start().await;
    let mut owner = server.browser();
    owner.register("a@x.com", "pw1", "Ada").await;

    let mut attacker = server.browser();
    for guess in ["pw", "PW1", "pw1 ", "", "pw12"] {
        let page = attacker.login("a@x.com", guess).await;
        assert_eq!(page.status, 200);
        assert!(!attacker.is_logged_in().await, "guess {:?} logged in", guess);
    }
}

#[tokio::test]
async fn unknown_email_gets_its_own_notice() {
    let server = TestServer::start().await;
    let mut browser = server.browser();

    let page = browser.login("ghost@x.com", "pw1").await;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("does not Exist please Register now!"));
    assert!(!page.body.contains("Incorrect Password"));
}

#[tokio::test]
async fn duplicate_registration_redirects_to_login_once() {
    let server = TestServer::start().await;
    let mut first = server.browser();
    assert_redirect(&first.register("a@x.com", "pw1", "Ada").await, "/");

    let mut second = server.browser();
    let page = second.register("a@x.com", "other", "Imposter").await;
    assert_redirect(&page, "/login");
    assert_eq!(server.count("users"), 1);
    assert!(!second.is_logged_in().await);

    let notice = "The email you are trying to register is already exist please login!";
    assert!(second.get("/login").await.body.contains(notice));
    assert!(
        !second.get("/login").await.body.contains(notice),
        "notice should be shown only once"
    );
}

#[tokio::test]
async fn invalid_registration_rerenders_with_errors() {
    let server = TestServer::start().await;
    let mut browser = server.browser();

    let page = browser.register("not-an-email", "pw1", "Ada").await;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("Enter a valid email address"));
    assert_eq!(server.count("users"), 0);
}

#[tokio::test]
async fn logout_while_anonymous_is_harmless() {
    let server = TestServer::start().await;
    let mut browser = server.browser();
    assert_redirect(&browser.get("/logout").await, "/");
}

// ============================================================================
// ADMIN GATE
// ============================================================================

#[tokio::test]
async fn only_the_first_user_can_manage_posts() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;
    assert_redirect(&admin.add_post("Hello").await, "/");

    let mut reader = server.browser();
    reader.register("r@x.com", "pw1", "Reader").await;
    let mut anonymous = server.browser();

    for browser in [&mut reader, &mut anonymous] {
        assert_eq!(browser.get("/add").await.status, 403);
        assert_eq!(browser.add_post("Sneaky").await.status, 403);
        assert_eq!(browser.get("/edit?post_id=1").await.status, 403);
        assert_eq!(browser.get("/delete?post_id=1").await.status, 403);
        let page = browser
            .post(
                "/edit?post_id=1",
                &[
                    ("title", "Defaced"),
                    ("subtitle", "Defaced"),
                    ("img_url", "https://example.com/d.jpg"),
                    ("body", "<p>defaced</p>"),
                ],
            )
            .await;
        assert_eq!(page.status, 403);
    }

    assert_eq!(server.count("posts"), 1);
    let conn = server.pool.get().unwrap();
    let (title, author_id): (String, i64) = conn
        .query_row(
            "SELECT title, author_id FROM posts WHERE id = ?1",
            params![1],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(title, "Hello");
    assert_eq!(author_id, 1);
    drop(conn);
    assert_eq!(admin.get("/add").await.status, 200);
}

// ============================================================================
// POSTS
// ============================================================================

#[tokio::test]
async fn admin_post_appears_in_listing() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;
    admin.add_post("First Light").await;

    let mut visitor = server.browser();
    let page = visitor.get("/").await;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("First Light"));
    assert!(page.body.contains("Posted by Admin"));
    assert!(!page.body.contains("/delete?post_id="));
}

#[tokio::test]
async fn invalid_post_form_is_rerendered_without_writes() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;

    let page = admin
        .post(
            "/add",
            &[
                ("title", "Broken"),
                ("subtitle", "Sub"),
                ("img_url", "not a url"),
                ("body", "text"),
            ],
        )
        .await;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("Blog image URL must be a valid URL"));
    assert_eq!(server.count("posts"), 0);
}

#[tokio::test]
async fn duplicate_title_is_a_field_error() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;
    admin.add_post("Twice").await;

    let page = admin.add_post("Twice").await;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("A post with this title already exists"));
    assert_eq!(server.count("posts"), 1);
}

#[tokio::test]
async fn edit_overwrites_fields_and_reassigns_author() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;
    let mut writer = server.browser();
    writer.register("w@x.com", "pw1", "Writer").await;

    {
        let conn = server.pool.get().unwrap();
        conn.execute(
            "INSERT INTO posts (title, subtitle, date, body, img_url, author_id)
             VALUES ('Old', 'Old sub', 'May 01, 2026', '<p>old</p>', 'https://example.com/o.jpg', 2)",
            [],
        )
        .unwrap();
    }

    let form = admin.get("/edit?post_id=1").await;
    assert_eq!(form.status, 200);
    assert!(form.body.contains("value=\"Old sub\""));

    let page = admin
        .post(
            "/edit?post_id=1",
            &[
                ("title", "New"),
                ("subtitle", "New sub"),
                ("img_url", "https://example.com/n.jpg"),
                ("body", "<p>new</p>"),
            ],
        )
        .await;
    assert_redirect(&page, "/posts?post_id=1");

    let conn = server.pool.get().unwrap();
    let (title, subtitle, date, author_id): (String, String, String, i64) = conn
        .query_row(
            "SELECT title, subtitle, date, author_id FROM posts WHERE id = ?1",
            params![1],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(title, "New");
    assert_eq!(subtitle, "New sub");
    assert_eq!(date, "May 01, 2026");
    assert_eq!(author_id, 1);
}

#[tokio::test]
async fn delete_removes_post_and_its_comments() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;
    admin.add_post("Doomed").await;
    admin.add_post("Survivor").await;
    admin.post("/posts?post_id=1", &[("comment", "bye")]).await;
    admin.post("/posts?post_id=2", &[("comment", "still here")]).await;
    assert_eq!(server.count("comments"), 2);

    assert_redirect(&admin.get("/delete?post_id=1").await, "/");

    assert_eq!(server.count("posts"), 1);
    assert_eq!(server.count("comments"), 1);
    assert_eq!(admin.get("/posts?post_id=1").await.status, 404);
    assert_eq!(admin.get("/posts?post_id=2").await.status, 200);
}

#[tokio::test]
async fn missing_posts_are_404() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;

    assert_eq!(admin.get("/posts?post_id=999").await.status, 404);
    assert_eq!(admin.get("/posts").await.status, 404);
    assert_eq!(admin.get("/edit?post_id=999").await.status, 404);
    assert_eq!(admin.get("/delete?post_id=999").await.status, 404);
}

// ============================================================================
// COMMENTS
// ============================================================================

#[tokio::test]
async fn anonymous_comment_is_discarded_and_redirects_to_login() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;
    admin.add_post("Open Thread").await;

    let mut anonymous = server.browser();
    let page = anonymous
        .post("/posts?post_id=1", &[("comment", "drive-by")])
        .await;
    assert_redirect(&page, "/login");
    assert_eq!(server.count("comments"), 0);
    assert!(anonymous.get("/login").await.body.contains("Login Required!"));
}

#[tokio::test]
async fn comment_is_attributed_to_the_logged_in_user() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;
    admin.add_post("Open Thread").await;

    let mut reader = server.browser();
    reader.register("r@x.com", "pw1", "Reader").await;
    let page = reader
        .post("/posts?post_id=1", &[("comment", "Great read")])
        .await;
    assert_redirect(&page, "/posts?post_id=1");

    let conn = server.pool.get().unwrap();
    let (author_id, post_id): (i64, i64) = conn
        .query_row("SELECT author_id, post_id FROM comments", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!((author_id, post_id), (2, 1));
    drop(conn);

    let page = reader.get("/posts?post_id=1").await;
    assert!(page.body.contains("Great read"));
    assert!(page.body.contains("Reader"));
    assert!(page.body.contains("gravatar.com/avatar/"));
}

#[tokio::test]
async fn blank_comment_rerenders_post() {
    let server = TestServer::start().await;
    let mut admin = server.browser();
    admin.register("admin@x.com", "pw1", "Admin").await;
    admin.add_post("Open Thread").await;

    let page = admin.post("/posts?post_id=1", &[("comment", "   ")]).await;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("Comment cannot be empty"));
    assert_eq!(server.count("comments"), 0);
}

// ============================================================================
// STATIC PAGES
// ============================================================================

#[tokio::test]
async fn static_pages_render() {
    let server = TestServer::start().await;
    let mut browser = server.browser();
    assert_eq!(browser.get("/about").await.status, 200);
    assert_eq!(browser.get("/contact").await.status, 200);
    assert_eq!(browser.get("/assets/css/site.css").await.status, 200);
}
