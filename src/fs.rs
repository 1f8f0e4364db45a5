//! Filesystem collaborator used by static routes.
//!
//! # Responsibilities
//! - Existence, directory and absoluteness checks
//! - File metadata (size, modification time, media type)
//! - File contents
//!
//! # Design Decisions
//! - A trait so routing can be tested against fixtures or fakes
//! - Media type derived from the extension, octet-stream fallback
//! - File contents are read through `block_in_place` on a multi-threaded
//!   runtime so other connections keep their worker

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::error::FileSystemError;

/// Metadata the response writer needs to serve a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub len: u64,
    pub modified: Option<DateTime<Utc>>,
    pub content_type: String,
}

pub trait FileSystem: Send + Sync + std::fmt::Debug {
    fn exists(&self, path: &Path) -> bool;

    fn is_directory(&self, path: &Path) -> bool;

    fn is_absolute(&self, path: &Path) -> bool {
        path.is_absolute()
    }

    fn info(&self, path: &Path) -> Result<FileInfo, FileSystemError>;

    fn read(&self, path: &Path) -> Result<Vec<u8>, FileSystemError>;
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn info(&self, path: &Path) -> Result<FileInfo, FileSystemError> {
        let meta = fs::metadata(path).map_err(|e| FileSystemError::new(path, e.to_string()))?;
        if meta.is_dir() {
            return Err(FileSystemError::new(path, "is a directory"));
        }
        Ok(FileInfo {
            len: meta.len(),
            modified: meta.modified().ok().map(to_utc),
            content_type: media_type(path),
        })
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        blocking(|| fs::read(path)).map_err(|e| FileSystemError::new(path, e.to_string()))
    }
}

/// Run blocking work in place, handing this worker's other tasks to a new
/// thread when the runtime allows it. The current-thread runtime cannot.
pub(crate) fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
        _ => f(),
    }
}

/// Media type for a file, guessed from its extension.
pub fn media_type(path: &Path) -> String {
    let guess = mime_guess::from_path(path).first_or_octet_stream();
    if guess.type_() == mime_guess::mime::TEXT && guess.get_param(mime_guess::mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", guess)
    } else {
        guess.to_string()
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_types_by_extension() {
        assert_eq!(media_type(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(media_type(Path::new("logo.png")), "image/png");
        assert_eq!(media_type(Path::new("blob.unknownext")), "application/octet-stream");
    }

    #[test]
    fn local_file_info() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();

        let local = LocalFileSystem;
        assert!(local.exists(&file));
        assert!(local.is_directory(dir.path()));
        assert!(!local.is_directory(&file));

        let info = local.info(&file).unwrap();
        assert_eq!(info.len, 5);
        assert!(info.modified.is_some());
        assert!(info.content_type.starts_with("text/plain"));
        assert_eq!(local.read(&file).unwrap(), b"hello");

        let err = local.info(&dir.path().join("missing.txt")).unwrap_err();
        assert!(err.target_path.ends_with("missing.txt"));
        assert!(local.info(dir.path()).is_err());
    }

    #[tokio::test]
    async fn read_works_on_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("b.txt");
        fs::write(&file, b"inline").unwrap();
        assert_eq!(LocalFileSystem.read(&file).unwrap(), b"inline");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn blocking_work_does_not_stall_other_tasks() {
        let slow = tokio::spawn(async {
            blocking(|| std::thread::sleep(std::time::Duration::from_millis(600)));
        });
        let quick = tokio::spawn(tokio::time::sleep(std::time::Duration::from_millis(20)));

        tokio::time::timeout(std::time::Duration::from_millis(400), quick)
            .await
            .expect("timer starved by blocking work")
            .unwrap();
        slow.await.unwrap();
    }
}
