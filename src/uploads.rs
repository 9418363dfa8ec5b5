//! Storage for uploaded game imagery.
//!
//! Files are stored under a content-addressed name: the truncated SHA-256
//! digest of the content plus the sanitized extension of the original
//! filename. Client-supplied names never touch the filesystem, identical
//! uploads converge on a single file, and concurrent writes of the same
//! content race onto identical bytes.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::forms::UploadedFile;
use crate::{Error, Result};

/// Saves an uploaded file under the upload directory, creating the
/// directory on demand. Returns the stored filename, which becomes the
/// game's picture reference.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub async fn save(upload_dir: &Path, file: &UploadedFile) -> Result<String> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let name = stored_name(&file.filename, &file.content);
    tokio::fs::write(upload_dir.join(&name), &file.content).await?;
    Ok(name)
}

/// Reads a previously stored file back, returning its content and MIME
/// type.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for unsafe names and missing files.
pub async fn read(upload_dir: &Path, filename: &str) -> Result<(Vec<u8>, String)> {
    if !is_safe_name(filename) {
        return Err(Error::NotFound("Image not found".to_owned()));
    }

    let path = upload_dir.join(filename);
    match tokio::fs::read(&path).await {
        Ok(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            Ok((content, mime.to_string()))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::NotFound("Image not found".to_owned()))
        }
        Err(err) => Err(err.into()),
    }
}

fn stored_name(filename: &str, content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let prefix = hex::encode(&digest[..8]);
    match sanitized_extension(filename) {
        Some(extension) => format!("{prefix}.{extension}"),
        None => prefix,
    }
}

fn sanitized_extension(filename: &str) -> Option<String> {
    let extension: String = Path::new(filename)
        .extension()?
        .to_str()?
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect::<String>()
        .to_ascii_lowercase();
    if extension.is_empty() {
        None
    } else {
        Some(extension)
    }
}

/// Whether a client-supplied name is safe to look up in the upload
/// directory: a bare filename, no path separators, not hidden.
fn is_safe_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\'])
        && !filename.contains("..")
}

/// The picture reference used when a game has no uploaded image.
pub const DEFAULT_PICTURE: &str = "default.jpg";

/// Returns the path a stored file lives at. Only used by tests and tools;
/// request handlers go through [`read`].
#[must_use]
pub fn path_of(upload_dir: &Path, filename: &str) -> PathBuf {
    upload_dir.join(filename)
}
