//! Filesystem storage backend.
//!
//! Layout on disk:
//!
//! ```text
//! {pages_dir}/
//! ├── fundamentals/
//! │   ├── 101.html
//! │   ├── ...
//! │   └── res/          # optional images, served at <prefix>/res/
//! └── blog/
//!     └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::{Storage, StorageError, validate_file_name};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Name of the per-group resource directory.
const RESOURCE_DIR: &str = "res";

/// Filesystem-based [`Storage`] rooted at a pages directory.
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Create a storage reading groups from the sub-directories of `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn group_dir(&self, group: &str) -> Result<PathBuf, StorageError> {
        validate_file_name(group).map_err(|e| e.with_backend(BACKEND))?;
        Ok(self.root.join(group))
    }

    fn io_error(err: std::io::Error, path: &Path) -> StorageError {
        StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
    }
}

impl Storage for FsStorage {
    fn groups(&self) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.root).map_err(|e| Self::io_error(e, &self.root))?;

        let mut groups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Self::io_error(e, &self.root))?;
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_dir && !name.starts_with('.') {
                groups.push(name);
            }
        }
        groups.sort();
        Ok(groups)
    }

    fn read(&self, group: &str, file: &str) -> Result<Vec<u8>, StorageError> {
        validate_file_name(file).map_err(|e| e.with_backend(BACKEND))?;
        let path = self.group_dir(group)?.join(file);
        fs::read(&path).map_err(|e| Self::io_error(e, &path))
    }

    fn list(&self, group: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.group_dir(group)?;
        let entries = fs::read_dir(&dir).map_err(|e| Self::io_error(e, &dir))?;

        let mut files: Vec<String> = entries
            .flatten()
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".html"))
            .collect();
        files.sort();
        Ok(files)
    }

    fn resource_dir(&self, group: &str) -> Option<PathBuf> {
        let dir = self.group_dir(group).ok()?.join(RESOURCE_DIR);
        dir.is_dir().then_some(dir)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::storage::StorageErrorKind;

    fn create_pages() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("fundamentals/res")).unwrap();
        fs::create_dir_all(root.join("blog")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("fundamentals/101.html"), "<h1>Go 101</h1>").unwrap();
        fs::write(root.join("fundamentals/basic.html"), "<h1>Basic</h1>").unwrap();
        fs::write(root.join("fundamentals/notes.txt"), "not an article").unwrap();
        fs::write(root.join("fundamentals/res/pic.png"), [0u8; 4]).unwrap();
        fs::write(root.join("README.md"), "top-level file").unwrap();
        temp_dir
    }

    #[test]
    fn test_groups_lists_visible_directories() {
        let temp_dir = create_pages();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        assert_eq!(storage.groups().unwrap(), vec!["blog", "fundamentals"]);
    }

    #[test]
    fn test_groups_missing_root_is_not_found() {
        let storage = FsStorage::new(PathBuf::from("/nonexistent/lectern/pages"));

        let err = storage.groups().unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::NotFound);
    }

    #[test]
    fn test_read_article() {
        let temp_dir = create_pages();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        let content = storage.read("fundamentals", "101.html").unwrap();
        assert_eq!(content, b"<h1>Go 101</h1>");
    }

    #[test]
    fn test_read_missing_article_is_not_found() {
        let temp_dir = create_pages();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        let err = storage.read("fundamentals", "nope.html").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.backend, Some("Fs"));
    }

    #[test]
    fn test_read_rejects_traversal() {
        let temp_dir = create_pages();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        let err = storage.read("fundamentals", "../README.md").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidPath);

        let err = storage.read("..", "README.md").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_list_only_html_files() {
        let temp_dir = create_pages();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        assert_eq!(
            storage.list("fundamentals").unwrap(),
            vec!["101.html", "basic.html"]
        );
        assert!(storage.list("blog").unwrap().is_empty());
    }

    #[test]
    fn test_resource_dir() {
        let temp_dir = create_pages();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        assert_eq!(
            storage.resource_dir("fundamentals"),
            Some(temp_dir.path().join("fundamentals/res"))
        );
        assert_eq!(storage.resource_dir("blog"), None);
    }
}
