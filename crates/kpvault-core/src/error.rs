//! Error types for the core object model.

use thiserror::Error;

/// Errors surfaced by the core tree and session layers.
///
/// Missing fields are never errors; every field accessor returns an
/// `Option` instead. These variants cover structural problems and
/// session-level failures only.
#[derive(Debug, Error)]
pub enum VaultError {
    /// XML could not be parsed or serialized.
    #[error("XML error: {0}")]
    Xml(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The decoded document does not have the expected
    /// KeePassFile/Root/Group skeleton.
    #[error("malformed database document: {0}")]
    MalformedDocument(String),

    /// A group path did not resolve.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// An entry with the same title already exists in the destination
    /// group and creation was not forced.
    #[error("an entry titled \"{title}\" already exists in group \"{group}\"")]
    DuplicateEntry { title: String, group: String },
}

pub type Result<T> = std::result::Result<T, VaultError>;
