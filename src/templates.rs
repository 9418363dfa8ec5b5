//! Page templates.
//!
//! One context struct per rendered page, each carrying the flash messages
//! taken from the session for this render. Comment timestamps are
//! preformatted here so the markup stays dumb.

use askama::Template;
use axum::response::Html;

use crate::Result;
use crate::db::{Comment, Game, GameSummary};
use crate::session::Flash;

/// Renders a template into an HTML response.
///
/// # Errors
///
/// Returns an error if rendering fails.
pub fn render<T: Template>(template: &T) -> Result<Html<String>> {
    Ok(Html(template.render()?))
}

/// A comment prepared for display.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub commentid: i64,
    pub commentatorsname: String,
    pub comment: String,
    pub game_id: i64,
    pub posted_at: String,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            commentid: comment.commentid,
            commentatorsname: comment.commentatorsname,
            comment: comment.comment,
            game_id: comment.game_id,
            posted_at: comment.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Template)]
#[template(path = "homepage.html")]
pub struct HomePage {
    pub flashes: Vec<Flash>,
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Template)]
#[template(path = "gamepage.html")]
pub struct GamePage {
    pub flashes: Vec<Flash>,
    pub game: Game,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Template)]
#[template(path = "loginpage.html")]
pub struct LoginPage {
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Template)]
#[template(path = "adminpage.html")]
pub struct AdminPage {
    pub flashes: Vec<Flash>,
    pub games: Vec<GameSummary>,
    pub comments: Vec<CommentView>,
}
