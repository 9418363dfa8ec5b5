//! Request handlers.
//!
//! Mutations follow redirect-after-post: the handler applies the change,
//! queues exactly one flash message and issues a 303 back to the page
//! that displays it. User-correctable failures become error flashes; only
//! infrastructure faults propagate to the error responder.

use axum::Form;
use axum::extract::{Path, Request, State};
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::db::{Comment, Game, GameUpdate, NewGame};
use crate::forms::{self, AdminAction, CommentForm, LoginForm};
use crate::router::AppState;
use crate::session::{AppSession, FlashLevel};
use crate::templates::{AdminPage, CommentView, GamePage, HomePage, LoginPage, render};
use crate::{Error, Result, uploads};

/// `GET /` — the game list.
pub async fn index(State(state): State<AppState>, session: AppSession) -> Result<Html<String>> {
    let games = Game::all_summaries(&state.pool).await?;
    let flashes = session.take_flashes().await?;
    render(&HomePage { flashes, games })
}

/// `GET /display_image/{filename}` — serves an uploaded image.
pub async fn display_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let (content, mime) = uploads::read(&state.config.upload_dir, &filename).await?;
    Ok(([(http::header::CONTENT_TYPE, mime)], content).into_response())
}

/// `GET /game/{game_id}` — the detail page, or 404 if the game is gone.
pub async fn game_page(
    State(state): State<AppState>,
    session: AppSession,
    Path(game_id): Path<i64>,
) -> Result<Html<String>> {
    let game = Game::by_id(&state.pool, game_id)
        .await?
        .ok_or_else(|| Error::NotFound("Game not found".to_owned()))?;
    let comments = Comment::for_game(&state.pool, game_id)
        .await?
        .into_iter()
        .map(CommentView::from)
        .collect();
    let flashes = session.take_flashes().await?;
    render(&GamePage {
        flashes,
        game,
        comments,
    })
}

/// `POST /game/{game_id}/add_comment` — appends a visitor comment.
pub async fn add_comment(
    State(state): State<AppState>,
    session: AppSession,
    Path(game_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    if let Err(error) = form.validate() {
        session.flash(FlashLevel::Error, error.to_string()).await?;
        return Ok(Redirect::to(&format!("/game/{game_id}")).into_response());
    }

    Comment::insert(&state.pool, game_id, &form.name, &form.comment).await?;
    session
        .flash(FlashLevel::Success, "Comment added successfully!")
        .await?;
    Ok(Redirect::to(&format!("/game/{game_id}")).into_response())
}

/// `GET /login` — the login form.
pub async fn login_page(session: AppSession) -> Result<Html<String>> {
    let flashes = session.take_flashes().await?;
    render(&LoginPage { flashes })
}

/// `POST /login` — checks the credential pair against the injected
/// verifier. Success sets the session flag and lands on the admin panel;
/// failure re-renders the form with a flash and no flag.
pub async fn login_submit(
    State(state): State<AppState>,
    session: AppSession,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if state.verifier.verify(&form.username, &form.password) {
        session.log_in().await?;
        return Ok(Redirect::to("/admin").into_response());
    }

    tracing::debug!(username = %form.username, "rejected login attempt");
    session
        .flash(FlashLevel::Error, Error::Authentication.to_string())
        .await?;
    let flashes = session.take_flashes().await?;
    Ok(render(&LoginPage { flashes })?.into_response())
}

/// `GET /logout` — clears the session flag unconditionally.
pub async fn logout(session: AppSession) -> Result<Redirect> {
    session.log_out().await?;
    Ok(Redirect::to("/login"))
}

/// `GET /admin` — the admin panel, gated on the session flag.
pub async fn admin_page(
    State(state): State<AppState>,
    session: AppSession,
) -> Result<Response> {
    if !session.is_authenticated().await? {
        return Ok(Redirect::to("/login").into_response());
    }

    let games = Game::all_summaries(&state.pool).await?;
    let comments = Comment::all(&state.pool)
        .await?
        .into_iter()
        .map(CommentView::from)
        .collect();
    let flashes = session.take_flashes().await?;
    Ok(render(&AdminPage {
        flashes,
        games,
        comments,
    })?
    .into_response())
}

/// `POST /admin` — the catalog mutation engine entry point.
///
/// Dispatches on the `action` form field, applies at most one mutation,
/// queues exactly one flash and redirects back to the panel.
pub async fn admin_submit(
    State(state): State<AppState>,
    session: AppSession,
    request: Request,
) -> Result<Response> {
    if !session.is_authenticated().await? {
        return Ok(Redirect::to("/login").into_response());
    }

    match apply_admin_action(&state, request).await {
        Ok(message) => session.flash(FlashLevel::Success, message).await?,
        Err(error) if error.is_user_error() => {
            session.flash(FlashLevel::Error, error.to_string()).await?;
        }
        Err(error) => return Err(error),
    }
    Ok(Redirect::to("/admin").into_response())
}

/// Parses, validates and applies one admin mutation, returning the
/// success flash message.
async fn apply_admin_action(state: &AppState, request: Request) -> Result<String> {
    let action = forms::admin_submission(request).await?.into_action()?;

    match action {
        AdminAction::Add { fields, picture } => {
            let gamepicture = match picture {
                Some(file) => uploads::save(&state.config.upload_dir, &file).await?,
                None => uploads::DEFAULT_PICTURE.to_owned(),
            };
            Game::insert(
                &state.pool,
                &NewGame {
                    gamepicture,
                    gamename: fields.gamename,
                    description: fields.description,
                    developer: fields.developer,
                    publisher: fields.publisher,
                    releasedate: fields.releasedate,
                },
            )
            .await?;
            Ok("Game added successfully!".to_owned())
        }
        AdminAction::Update { id, patch, picture } => {
            // Resolve the target before persisting the attachment so a
            // bad id leaves no stray file behind.
            if Game::by_id(&state.pool, id).await?.is_none() {
                return Err(Error::NotFound(format!("No game found with ID {id}")));
            }
            let mut update = GameUpdate {
                gamepicture: None,
                gamename: patch.gamename,
                description: patch.description,
                developer: patch.developer,
                publisher: patch.publisher,
                releasedate: patch.releasedate,
            };
            if let Some(file) = picture {
                update.gamepicture = Some(uploads::save(&state.config.upload_dir, &file).await?);
            }
            Game::update(&state.pool, id, &update).await?;
            Ok(format!("Game with ID {id} updated successfully!"))
        }
        AdminAction::Delete { id } => {
            Game::delete_and_renumber(&state.pool, id).await?;
            Ok(format!("Game with ID {id} deleted successfully!"))
        }
        AdminAction::DeleteComment { commentid } => {
            Comment::delete(&state.pool, commentid).await?;
            Ok(format!("Comment with ID {commentid} deleted successfully!"))
        }
    }
}
