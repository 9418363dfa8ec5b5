//! Form parsing and validation.
//!
//! The comment and login forms arrive urlencoded and deserialize through
//! serde. The admin form is richer: it carries an `action` discriminator,
//! action-specific fields and an optional file attachment, and may arrive
//! either urlencoded or as `multipart/form-data` depending on whether the
//! browser included a file. [`admin_submission`] normalizes both encodings
//! into an [`AdminSubmission`], and [`AdminSubmission::into_action`]
//! validates it into an [`AdminAction`] without touching the store.

use axum::extract::{FromRequest, Multipart, Request};
use bytes::Bytes;
use serde::Deserialize;

use crate::{Error, Result};

/// Maximum length of a game name, developer or publisher, in characters.
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of a game description or a comment body.
pub const MAX_DESCRIPTION_LEN: usize = 800;
/// Maximum length of a comment author name.
pub const MAX_COMMENT_AUTHOR_LEN: usize = 80;

/// Request bodies above this size are rejected outright.
const BODY_LIMIT: usize = 16 * 1024 * 1024;

const MISSING_FIELDS_MESSAGE: &str =
    "All fields must be filled out, except id when adding a new game.";
const LENGTH_MESSAGE: &str = "Field lengths exceed the allowed limit";

/// The login form fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// The visitor comment form fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub name: String,
    pub comment: String,
}

impl CommentForm {
    /// Checks that both fields are present and within their length limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with the user-facing message on
    /// failure.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.comment.is_empty() {
            return Err(Error::Validation(
                "Both name and comment are required.".to_owned(),
            ));
        }
        if self.name.chars().count() > MAX_COMMENT_AUTHOR_LEN
            || self.comment.chars().count() > MAX_DESCRIPTION_LEN
        {
            return Err(Error::Validation(LENGTH_MESSAGE.to_owned()));
        }
        Ok(())
    }
}

/// An uploaded file attachment: the client-supplied name and the content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Bytes,
}

/// The validated field set for a game to be added.
#[derive(Debug, Clone)]
pub struct GameFields {
    pub gamename: String,
    pub description: String,
    pub developer: String,
    pub publisher: String,
    pub releasedate: String,
}

/// The validated partial field set for a game update. Empty fields were
/// omitted and keep their prior values.
#[derive(Debug, Clone, Default)]
pub struct GamePatch {
    pub gamename: Option<String>,
    pub description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub releasedate: Option<String>,
}

/// A validated admin mutation, ready to be applied to the store.
#[derive(Debug)]
pub enum AdminAction {
    Add {
        fields: GameFields,
        picture: Option<UploadedFile>,
    },
    Update {
        id: i64,
        patch: GamePatch,
        picture: Option<UploadedFile>,
    },
    Delete {
        id: i64,
    },
    DeleteComment {
        commentid: i64,
    },
}

/// The raw admin form as submitted, before validation.
#[derive(Debug, Default)]
pub struct AdminSubmission {
    pub action: Option<String>,
    pub id: Option<String>,
    pub commentid: Option<String>,
    pub gamename: Option<String>,
    pub description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub releasedate: Option<String>,
    pub picture: Option<UploadedFile>,
}

impl AdminSubmission {
    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "action" => self.action = Some(value),
            "id" => self.id = Some(value),
            "commentid" => self.commentid = Some(value),
            "gamename" => self.gamename = Some(value),
            "description" => self.description = Some(value),
            "developer" => self.developer = Some(value),
            "publisher" => self.publisher = Some(value),
            "releasedate" => self.releasedate = Some(value),
            _ => {}
        }
    }

    /// Validates the submission into an [`AdminAction`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for missing or oversized fields and
    /// [`Error::NotFound`] for an unparsable target id; both carry the
    /// message the admin panel flashes.
    pub fn into_action(self) -> Result<AdminAction> {
        match self.action.as_deref() {
            Some("add") => self.into_add(),
            Some("update") => self.into_update(),
            Some("delete") => {
                let id = parse_game_id(self.id.as_deref())?;
                Ok(AdminAction::Delete { id })
            }
            Some("delete_comment") => {
                let commentid = parse_comment_id(self.commentid.as_deref())?;
                Ok(AdminAction::DeleteComment { commentid })
            }
            _ => Err(Error::Validation("Unknown admin action".to_owned())),
        }
    }

    fn into_add(self) -> Result<AdminAction> {
        let gamename = self.gamename.unwrap_or_default();
        let description = self.description.unwrap_or_default();
        let developer = self.developer.unwrap_or_default();
        let publisher = self.publisher.unwrap_or_default();
        let releasedate = self.releasedate.unwrap_or_default();

        if gamename.is_empty()
            || description.is_empty()
            || developer.is_empty()
            || publisher.is_empty()
            || releasedate.is_empty()
        {
            return Err(Error::Validation(MISSING_FIELDS_MESSAGE.to_owned()));
        }
        check_lengths(&gamename, &description, &developer, &publisher)?;

        Ok(AdminAction::Add {
            fields: GameFields {
                gamename,
                description,
                developer,
                publisher,
                releasedate,
            },
            picture: self.picture,
        })
    }

    fn into_update(self) -> Result<AdminAction> {
        let id = parse_game_id(self.id.as_deref())?;

        let gamename = self.gamename.unwrap_or_default();
        let description = self.description.unwrap_or_default();
        let developer = self.developer.unwrap_or_default();
        let publisher = self.publisher.unwrap_or_default();
        let releasedate = self.releasedate.unwrap_or_default();
        check_lengths(&gamename, &description, &developer, &publisher)?;

        Ok(AdminAction::Update {
            id,
            patch: GamePatch {
                gamename: non_empty(gamename),
                description: non_empty(description),
                developer: non_empty(developer),
                publisher: non_empty(publisher),
                releasedate: non_empty(releasedate),
            },
            picture: self.picture,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn check_lengths(
    gamename: &str,
    description: &str,
    developer: &str,
    publisher: &str,
) -> Result<()> {
    if gamename.chars().count() > MAX_NAME_LEN
        || description.chars().count() > MAX_DESCRIPTION_LEN
        || developer.chars().count() > MAX_NAME_LEN
        || publisher.chars().count() > MAX_NAME_LEN
    {
        return Err(Error::Validation(LENGTH_MESSAGE.to_owned()));
    }
    Ok(())
}

fn parse_game_id(raw: Option<&str>) -> Result<i64> {
    raw.and_then(|value| value.parse().ok())
        .ok_or_else(|| Error::NotFound(format!("No game found with ID {}", raw.unwrap_or(""))))
}

fn parse_comment_id(raw: Option<&str>) -> Result<i64> {
    raw.and_then(|value| value.parse().ok())
        .ok_or_else(|| Error::NotFound(format!("No comment found with ID {}", raw.unwrap_or(""))))
}

/// Reads the admin form out of a request, accepting either urlencoded or
/// multipart encoding.
///
/// File fields are only meaningful in the multipart encoding; an attached
/// file with an empty name or empty content counts as absent, matching
/// what browsers send for an untouched file input.
///
/// # Errors
///
/// Returns [`Error::Validation`] for an unsupported content type and a
/// parse error for a malformed body.
pub async fn admin_submission(request: Request) -> Result<AdminSubmission> {
    let content_type = request
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let mut submission = AdminSubmission::default();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection| Error::Validation(rejection.to_string()))?;
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            if name == "gamepicture" {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content = field.bytes().await?;
                if !filename.is_empty() && !content.is_empty() {
                    submission.picture = Some(UploadedFile { filename, content });
                }
            } else {
                let value = field.text().await?;
                submission.set_field(&name, value);
            }
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let bytes = axum::body::to_bytes(request.into_body(), BODY_LIMIT).await?;
        for (name, value) in form_urlencoded::parse(&bytes) {
            submission.set_field(&name, value.into_owned());
        }
    } else {
        return Err(Error::Validation(format!(
            "invalid content type; expected a form submission, found `{content_type}`"
        )));
    }

    Ok(submission)
}
