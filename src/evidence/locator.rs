//! Artifact resolution
//!
//! Relative locations resolve against an explicit evidence root passed in
//! by the caller, never against ambient process state beyond the working
//! directory. Schemes other than plain paths and `file://` cannot be
//! checked here and therefore count as absent.

use std::path::{Path, PathBuf};

/// Result of resolving an artifact location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Artifact exists at this path.
    Present(PathBuf),
    /// Location is well formed but nothing is there.
    Absent(PathBuf),
    /// Location uses a scheme this locator cannot check.
    Unsupported(String),
    /// Location string is empty.
    Empty,
}

impl Resolution {
    pub fn is_present(&self) -> bool {
        matches!(self, Resolution::Present(_))
    }
}

/// Checks whether referenced artifacts physically exist.
pub trait ArtifactLocator: Send + Sync {
    fn resolve(&self, location: &str) -> Resolution;
}

/// Resolves locations on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileSystemLocator {
    root: Option<PathBuf>,
}

impl FileSystemLocator {
    /// Relative locations resolve against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative locations resolve against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn to_path(&self, location: &str) -> Result<PathBuf, String> {
        let raw = if let Some(rest) = location.strip_prefix("file://") {
            rest
        } else if let Some((scheme, _)) = location.split_once("://") {
            return Err(scheme.to_string());
        } else {
            location
        };

        let path = Path::new(raw);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl ArtifactLocator for FileSystemLocator {
    fn resolve(&self, location: &str) -> Resolution {
        let location = location.trim();
        if location.is_empty() {
            return Resolution::Empty;
        }
        match self.to_path(location) {
            Ok(path) if path.exists() => Resolution::Present(path),
            Ok(path) => Resolution::Absent(path),
            Err(scheme) => Resolution::Unsupported(scheme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_relative_against_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("shap_values.npy"), b"x").unwrap();

        let locator = FileSystemLocator::with_root(dir.path());
        assert!(locator.resolve("shap_values.npy").is_present());
        assert!(matches!(locator.resolve("drift.html"), Resolution::Absent(_)));
    }

    #[test]
    fn test_absolute_ignores_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.html");
        fs::write(&file, b"<html/>").unwrap();

        let locator = FileSystemLocator::with_root("/somewhere/else");
        assert!(locator.resolve(file.to_str().unwrap()).is_present());
    }

    #[test]
    fn test_file_scheme() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.bin");
        fs::write(&file, b"1").unwrap();

        let locator = FileSystemLocator::new();
        let location = format!("file://{}", file.display());
        assert!(locator.resolve(&location).is_present());
    }

    #[test]
    fn test_other_schemes_unsupported() {
        let locator = FileSystemLocator::new();
        assert_eq!(
            locator.resolve("s3://bucket/shap.npy"),
            Resolution::Unsupported("s3".into())
        );
    }

    #[test]
    fn test_empty_location() {
        assert_eq!(FileSystemLocator::new().resolve("  "), Resolution::Empty);
    }

    #[test]
    fn test_missing_absolute() {
        assert!(matches!(
            FileSystemLocator::new().resolve("/tmp/trustgate-definitely-missing.npy"),
            Resolution::Absent(_)
        ));
    }
}
