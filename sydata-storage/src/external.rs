use std::path::Path;

use sydata_result::{Error, Result};

use crate::dataset::Dataset;
use crate::file::path_location;

/// Validated target of an external link: a file location plus an absolute
/// object path inside it.
///
/// Every external link is built through [`ExternalTarget::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalTarget {
    file: String,
    path: String,
}

impl ExternalTarget {
    pub fn new(file: &str, path: &str) -> Result<Self> {
        if file.is_empty() || file.contains('\0') {
            return Err(Error::InvalidArgumentError(format!(
                "invalid external file location {file:?}"
            )));
        }
        let valid_path = path.starts_with('/')
            && !path.contains('\0')
            && path[1..].split('/').all(|segment| !segment.is_empty());
        if !valid_path {
            return Err(Error::InvalidArgumentError(format!(
                "invalid external object path {path:?}"
            )));
        }
        Ok(Self {
            file: file.to_string(),
            path: path.to_string(),
        })
    }

    /// Target inside a filesystem file. The path must be valid UTF-8.
    pub fn from_path(file: &Path, path: &str) -> Result<Self> {
        Self::new(&path_location(file)?, path)
    }

    /// Target naming an existing dataset.
    pub fn to_dataset(dataset: &Dataset) -> Result<Self> {
        Self::new(dataset.file().location(), dataset.path())
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_and_empty_paths() {
        assert!(ExternalTarget::new("mem://a", "/x/y").is_ok());
        assert!(ExternalTarget::new("mem://a", "x").is_err());
        assert!(ExternalTarget::new("mem://a", "/x//y").is_err());
        assert!(ExternalTarget::new("", "/x").is_err());
    }
}
