//! An in-process test client for the application.
//!
//! Drives the router directly as a tower service, so tests exercise the
//! full middleware stack (sessions included) without binding a socket.
//! Session cookies are carried between requests the way a browser would
//! carry them.

use std::collections::BTreeMap;

use axum::Router;
use axum::body::Body;
use gamevault::config::AppConfig;
use gamevault::db;
use gamevault::router::{self, AppState};
use http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
    cookies: BTreeMap<String, String>,
    pub pool: SqlitePool,
    _upload_dir: TempDir,
}

impl TestApp {
    /// Boots the application against an in-memory database seeded with
    /// the 8-game demo catalog and a temporary upload directory.
    pub async fn spawn() -> Self {
        let upload_dir = tempfile::tempdir().expect("could not create upload dir");
        let config = AppConfig {
            database_url: "sqlite::memory:".to_owned(),
            upload_dir: upload_dir.path().to_path_buf(),
            ..AppConfig::default()
        };

        let state = AppState::from_config(config)
            .await
            .expect("could not boot the application");
        db::seed_demo(&state.pool).await.expect("could not seed");

        Self {
            pool: state.pool.clone(),
            router: router::build(state),
            cookies: BTreeMap::new(),
            _upload_dir: upload_dir,
        }
    }

    pub async fn request(&mut self, mut request: Request<Body>) -> Response<Body> {
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(COOKIE, header.parse().expect("invalid cookie header"));
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router call failed");

        for set_cookie in response.headers().get_all(SET_COOKIE) {
            let raw = set_cookie.to_str().expect("non-utf8 set-cookie");
            let pair = raw.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies.insert(name.to_owned(), value.to_owned());
            }
        }
        response
    }

    pub async fn get(&mut self, path: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("invalid request"),
        )
        .await
    }

    /// GETs a path, asserts a 200 and returns the body text.
    pub async fn get_ok(&mut self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        body_text(response).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = serde_urlencoded::to_string(fields).expect("could not encode form");
        self.request(
            Request::builder()
                .method(http::Method::POST)
                .uri(path)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .expect("invalid request"),
        )
        .await
    }

    pub async fn post_multipart(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Response<Body> {
        let boundary = "gamevault-integration-boundary";
        let body = multipart_body(boundary, fields, file);
        self.request(
            Request::builder()
                .method(http::Method::POST)
                .uri(path)
                .header(
                    CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .expect("invalid request"),
        )
        .await
    }

    /// Asserts `response` is a redirect to `expected` and follows it,
    /// returning the target page's body.
    pub async fn follow(&mut self, response: Response<Body>, expected: &str) -> String {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(LOCATION)
            .expect("redirect without location")
            .to_str()
            .expect("non-utf8 location")
            .to_owned();
        assert_eq!(location, expected);
        self.get_ok(&location).await
    }

    /// Logs in with the default credential pair.
    pub async fn login_as_admin(&mut self) {
        let response = self
            .post_form("/login", &[("username", "admin"), ("password", "password123")])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    pub async fn game_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM game")
            .fetch_one(&self.pool)
            .await
            .expect("count query failed")
    }

    pub async fn comment_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .expect("count query failed")
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("could not read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("non-utf8 body")
}

pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
