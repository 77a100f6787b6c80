//! Filesystem operations
//!
//! Handles file and directory operations.

use std::path::{Path, PathBuf};

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Write content to a file, creating parent directories
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// List file names in `dir` (not recursive) with the given extension, sorted
pub fn files_with_extension(dir: &Path, extension: &str) -> Vec<String> {
    let mut names: Vec<String> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .filter_map(|e| e.file_name().to_str().map(String::from))
        .collect();
    names.sort();
    names
}

/// A file that only lives for the duration of one operation
///
/// The file is deleted when the guard drops, whether or not the operation
/// that needed it succeeded.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
}

impl TransientFile {
    /// Write `content` to `path` and guard it
    pub fn create(path: PathBuf, content: &str) -> Result<Self, FilesystemError> {
        write_file(&path, content)?;
        Ok(Self { path })
    }

    /// Path of the guarded file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("Could not remove {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_transient_file_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Dockerfile");
        {
            let guard = TransientFile::create(path.clone(), "FROM scratch").unwrap();
            assert!(guard.path().exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_files_with_extension_is_case_insensitive_and_flat() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.ino"), "").unwrap();
        std::fs::write(temp.path().join("A.INO"), "").unwrap();
        std::fs::write(temp.path().join("main.cpp"), "").unwrap();
        std::fs::create_dir(temp.path().join("lib")).unwrap();
        std::fs::write(temp.path().join("lib").join("c.ino"), "").unwrap();

        assert_eq!(files_with_extension(temp.path(), "ino"), vec!["A.INO", "b.ino"]);
    }

    #[test]
    fn test_write_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b").join("c.txt");
        write_file(&path, "x").unwrap();
        assert_eq!(read_file(&path).unwrap(), "x");
    }
}
