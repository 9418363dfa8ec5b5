//! Typed access to the per-visitor session.
//!
//! [`AppSession`] wraps the cookie-keyed server-side session and exposes
//! the two things the application stores in it: the `authenticated` flag
//! that gates the admin panel, and the flash messages consumed by the
//! next rendered page.

use axum::extract::FromRequestParts;
use http::request::Parts;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::Result;

const AUTHENTICATED_KEY: &str = "authenticated";
const FLASH_KEY: &str = "_flashes";

/// The severity of a flash message, rendered as the CSS class of the
/// notice on the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

/// A one-time notice attached to the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// The application's view of a visitor session.
#[derive(Debug, Clone)]
pub struct AppSession(Session);

impl AppSession {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Whether this session belongs to a logged-in administrator.
    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self
            .0
            .get::<bool>(AUTHENTICATED_KEY)
            .await?
            .unwrap_or(false))
    }

    /// Marks the session as authenticated.
    pub async fn log_in(&self) -> Result<()> {
        self.0.insert(AUTHENTICATED_KEY, true).await?;
        Ok(())
    }

    /// Clears the authenticated flag. Does nothing if it was never set.
    pub async fn log_out(&self) -> Result<()> {
        self.0.remove::<bool>(AUTHENTICATED_KEY).await?;
        Ok(())
    }

    /// Queues a flash message for the next rendered page.
    pub async fn flash(&self, level: FlashLevel, message: impl Into<String>) -> Result<()> {
        let mut flashes: Vec<Flash> = self.0.get(FLASH_KEY).await?.unwrap_or_default();
        flashes.push(Flash {
            level,
            message: message.into(),
        });
        self.0.insert(FLASH_KEY, flashes).await?;
        Ok(())
    }

    /// Removes and returns the queued flash messages. Each message is
    /// surfaced exactly once.
    pub async fn take_flashes(&self) -> Result<Vec<Flash>> {
        Ok(self.0.remove::<Vec<Flash>>(FLASH_KEY).await?.unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for AppSession
where
    S: Send + Sync,
{
    type Rejection = <Session as FromRequestParts<S>>::Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Session::from_request_parts(parts, state).await?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn fresh_session() -> AppSession {
        let store = MemoryStore::default();
        AppSession::new(Session::new(None, Arc::new(store), None))
    }

    #[tokio::test]
    async fn new_session_is_anonymous() {
        let session = fresh_session();
        assert!(!session.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn log_in_then_out_round_trip() {
        let session = fresh_session();

        session.log_in().await.unwrap();
        assert!(session.is_authenticated().await.unwrap());

        session.log_out().await.unwrap();
        assert!(!session.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn log_out_without_log_in_is_harmless() {
        let session = fresh_session();
        session.log_out().await.unwrap();
        assert!(!session.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn flashes_are_taken_once_in_order() {
        let session = fresh_session();
        session
            .flash(FlashLevel::Success, "Game added successfully!")
            .await
            .unwrap();
        session
            .flash(FlashLevel::Error, "Access Denied!")
            .await
            .unwrap();

        let flashes = session.take_flashes().await.unwrap();
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].level, FlashLevel::Success);
        assert_eq!(flashes[0].message, "Game added successfully!");
        assert_eq!(flashes[1].level, FlashLevel::Error);

        assert!(session.take_flashes().await.unwrap().is_empty());
    }

    #[test]
    fn flash_levels_render_as_css_classes() {
        assert_eq!(FlashLevel::Success.as_str(), "success");
        assert_eq!(FlashLevel::Error.as_str(), "error");
    }
}
