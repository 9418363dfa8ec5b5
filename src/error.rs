//! Error types for the application.
//!
//! Every fallible path funnels into [`Error`], which knows the HTTP status
//! it maps to. User-correctable errors (bad form input, missing rows, bad
//! credentials) are normally caught by the handler that produced them and
//! turned into a flash message; anything that escapes to the router is
//! converted into a response by the [`IntoResponse`] impl here.

use axum::response::{IntoResponse, Response};
use http::StatusCode;

/// An error that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required form field was missing or exceeded its length limit.
    #[error("{0}")]
    Validation(String),

    /// A referenced game or comment does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The submitted credentials did not match.
    #[error("Access Denied!")]
    Authentication,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to render template: {0}")]
    Template(#[from] askama::Error),

    #[error("error while accessing the session object: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("malformed multipart request: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("failed to read request body: {0}")]
    BodyRead(#[from] axum::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the HTTP status code associated with this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Authentication => StatusCode::UNAUTHORIZED,
            Error::Multipart(_) | Error::BodyRead(_) => StatusCode::BAD_REQUEST,
            Error::Database(_)
            | Error::Template(_)
            | Error::Session(_)
            | Error::Config(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error should surface to the visitor as a flash message
    /// rather than an error page.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::Authentication
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request handler failed");
            (status, "Internal Server Error").into_response()
        } else {
            (status, self.to_string()).into_response()
        }
    }
}
