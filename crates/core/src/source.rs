//! Source provider abstraction for filesystem-independent compilation.
//!
//! The [`SourceProvider`] trait abstracts file I/O so drivers, the import
//! resolver and the preprocessed-file reader can run against the real
//! filesystem or against an in-memory fixture.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Trait that abstracts file I/O for the compilation pipeline.
pub trait SourceProvider {
    /// Read the whole text of `path`.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Whether `path` names a readable file.
    fn exists(&self, path: &Path) -> bool;

    /// Canonicalize a path so the same file reached two ways compares equal.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error>;
}

/// Default filesystem-backed source provider.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        path.canonicalize()
    }
}

/// In-memory source provider for tests and embedding.
///
/// Maps paths to source text. Canonicalization normalizes the path
/// without requiring filesystem access.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    /// Create a new in-memory provider from a map of paths to source text.
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        let files = files
            .into_iter()
            .map(|(p, s)| (Self::normalize_path(&p), s))
            .collect();
        Self { files }
    }

    /// Add or replace one file.
    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.files
            .insert(Self::normalize_path(path.as_ref()), source.into());
    }

    /// Normalize a path by resolving `.` and `..` components without
    /// touching the filesystem.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    // pop unless we are at root
                    if !components.is_empty() {
                        components.pop();
                    }
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&Self::normalize_path(path))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        let normalized = Self::normalize_path(path);
        if self.files.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "path not found in memory provider: {}",
                    normalized.display()
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        let p = Path::new("/a/b/../c/./d");
        let normalized = InMemoryProvider::normalize_path(p);
        assert_eq!(normalized, PathBuf::from("/a/c/d"));
    }

    #[test]
    fn in_memory_read_source_found() {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("/a/IFoo.aidl"), "interface IFoo {}".to_string());
        let provider = InMemoryProvider::new(files);
        let content = provider.read_source(Path::new("/a/IFoo.aidl")).unwrap();
        assert_eq!(content, "interface IFoo {}");
    }

    #[test]
    fn in_memory_read_source_not_found() {
        let provider = InMemoryProvider::default();
        let err = provider
            .read_source(Path::new("/missing.aidl"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn in_memory_exists_after_insert() {
        let mut provider = InMemoryProvider::default();
        assert!(!provider.exists(Path::new("imports/a/B.aidl")));
        provider.insert("imports/./a/B.aidl", "parcelable B;");
        assert!(provider.exists(Path::new("imports/a/B.aidl")));
    }

    #[test]
    fn in_memory_canonicalize_existing_file() {
        let mut provider = InMemoryProvider::default();
        provider.insert("/a/b/IFoo.aidl", "interface IFoo {}");
        let canon = provider
            .canonicalize(Path::new("/a/b/../b/IFoo.aidl"))
            .unwrap();
        assert_eq!(canon, PathBuf::from("/a/b/IFoo.aidl"));
    }

    #[test]
    fn in_memory_canonicalize_missing_returns_error() {
        let provider = InMemoryProvider::default();
        let err = provider
            .canonicalize(Path::new("/nonexistent"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
