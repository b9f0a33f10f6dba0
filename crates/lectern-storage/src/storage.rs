//! The [`Storage`] trait and its error type.
//!
//! Articles are addressed by a `(group, file)` pair: `group` names a content
//! collection such as `"fundamentals"`, `file` is a bare article file name such
//! as `"101.html"`. Neither part may contain a path separator.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Why a storage call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// The article, group or content root is absent.
    NotFound,
    /// The process may not read the entry.
    PermissionDenied,
    /// A group or file name that is not a single plain path segment.
    InvalidPath,
    /// Anything else.
    Other,
}

impl StorageErrorKind {
    fn describe(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::InvalidPath => "invalid article name",
            Self::Other => "read failed",
        }
    }
}

impl From<io::ErrorKind> for StorageErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidFilename => Self::InvalidPath,
            _ => Self::Other,
        }
    }
}

/// A failed storage call.
///
/// `path` names what was being read, `backend` which implementation failed.
#[derive(Debug)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub path: Option<PathBuf>,
    pub backend: Option<&'static str>,
    cause: Option<Box<dyn Error + Send + Sync>>,
}

impl StorageError {
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            cause: None,
        }
    }

    /// Shorthand for a [`StorageErrorKind::NotFound`] error at `path`.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Wrap an I/O failure, keeping it as the error source.
    #[must_use]
    pub fn io(err: io::Error, path: Option<PathBuf>) -> Self {
        Self {
            kind: err.kind().into(),
            path,
            backend: None,
            cause: Some(Box::new(err)),
        }
    }

    #[must_use]
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_backend(self, backend: &'static str) -> Self {
        Self {
            backend: Some(backend),
            ..self
        }
    }

    #[must_use]
    pub fn with_source(self, source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            cause: Some(Box::new(source)),
            ..self
        }
    }

    /// Whether the requested article is absent.
    ///
    /// Invalid names count as absent: `../secret` is a missing page to the
    /// reader, not a server failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            StorageErrorKind::NotFound | StorageErrorKind::InvalidPath
        )
    }
}

// "<path>: <kind>: <cause> (<backend> storage)"
impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: ", path.display())?;
        }
        f.write_str(self.kind.describe())?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        match self.backend {
            Some(backend) => write!(f, " ({backend} storage)"),
            None => Ok(()),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        let cause: &(dyn Error + 'static) = self.cause.as_deref()?;
        Some(cause)
    }
}

/// Check that a group or file name is one plain path segment.
///
/// # Errors
///
/// [`StorageErrorKind::InvalidPath`] for an empty name, a dot-file name, or a
/// name containing `/`, `\` or NUL.
pub fn validate_file_name(name: &str) -> Result<(), StorageError> {
    let plain = !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(StorageError::new(StorageErrorKind::InvalidPath).with_path(name))
    }
}

/// Source of article files, shared by every request handler.
pub trait Storage: Send + Sync {
    /// Content groups, sorted by name.
    ///
    /// # Errors
    ///
    /// Fails when the content root cannot be listed; a missing root is
    /// `NotFound`.
    fn groups(&self) -> Result<Vec<String>, StorageError>;

    /// Raw bytes of `group/file`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the article does not exist, another kind otherwise.
    fn read(&self, group: &str, file: &str) -> Result<Vec<u8>, StorageError>;

    /// Sorted `*.html` file names of a group.
    ///
    /// # Errors
    ///
    /// Fails when the group cannot be listed.
    fn list(&self, group: &str) -> Result<Vec<String>, StorageError>;

    /// On-disk directory of the group's images, when the backend has one.
    fn resource_dir(&self, _group: &str) -> Option<PathBuf> {
        None
    }
}
