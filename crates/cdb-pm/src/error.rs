use std::path::PathBuf;

use thiserror::Error;

use crate::archive::{ArchiveError, ArchiveType};
use crate::http::HttpError;
use crate::modconf::ConfParseError;

#[derive(Error, Debug)]
pub enum ContentDbError {
    // Network errors
    #[error(transparent)]
    Http(#[from] HttpError),

    // Archive errors
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    // Parsing errors
    #[error("Failed to parse {path}: {source}")]
    ConfParse {
        path: String,
        #[source]
        source: ConfParseError,
    },

    // Package errors
    #[error("Invalid package identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Package not found: {name}")]
    PackageNotFound { name: String },

    #[error("Release not found: {name}@{release}")]
    ReleaseNotFound { name: String, release: String },

    // Installation errors
    #[error("Unsupported archive for {name}: detected type {kind}")]
    UnsupportedArchive { name: String, kind: ArchiveType },

    #[error("Could not locate the package root inside the archive of {name}")]
    RootNotFound { name: String },

    #[error("Destination {} already exists, use update mode to replace it", path.display())]
    DestinationExists { path: PathBuf },

    #[error("{} is not managed by cdb: missing author or name in its configuration", path.display())]
    NotManaged { path: PathBuf },

    #[error("Mod not found: {name}")]
    ModNotFound { name: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ContentDbError {
    /// Whether this error means "no such package/release" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContentDbError::PackageNotFound { .. }
                | ContentDbError::ReleaseNotFound { .. }
                | ContentDbError::ModNotFound { .. }
                | ContentDbError::Http(HttpError::NotFound { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, ContentDbError>;
