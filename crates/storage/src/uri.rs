//! Storage URI parsing
//!
//! The scheme alone picks the backend. Anything without `://` is a local path,
//! as is a single-letter scheme so drive-letter paths survive.

use std::fmt;
use std::path::{Path, PathBuf};
use tes_core::{Error, Result, FILE_SCHEME, S3_SCHEME};
use url::Url;

/// A parsed storage location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageUri {
    /// A path on the local filesystem
    Local(PathBuf),
    /// An object (or key prefix) in an S3-compatible bucket
    S3 { bucket: String, key: String },
}

impl StorageUri {
    /// Parse `raw` without touching the filesystem or the network
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::configuration("storage URI cannot be empty"));
        }

        let Some((scheme, rest)) = trimmed.split_once("://") else {
            return Ok(Self::Local(PathBuf::from(trimmed)));
        };
        if scheme.len() == 1 {
            return Ok(Self::Local(PathBuf::from(trimmed)));
        }

        match scheme.to_ascii_lowercase().as_str() {
            FILE_SCHEME => {
                let url = Url::parse(trimmed).map_err(|e| {
                    Error::configuration(format!("invalid file URI '{trimmed}': {e}"))
                })?;
                url.to_file_path().map(Self::Local).map_err(|()| {
                    Error::configuration(format!(
                        "file URI '{trimmed}' does not name an absolute local path"
                    ))
                })
            }
            S3_SCHEME => {
                let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(Error::configuration(format!(
                        "S3 URI '{trimmed}' has no bucket"
                    )));
                }
                Ok(Self::S3 {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            _ => Err(Error::unsupported_scheme(trimmed, scheme)),
        }
    }

    /// Local path for `file://` locations
    pub fn as_local(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::S3 { .. } => None,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Local(_) => FILE_SCHEME,
            Self::S3 { .. } => S3_SCHEME,
        }
    }

    /// Whether the location names a key prefix rather than a single object
    pub fn is_prefix(&self) -> bool {
        match self {
            Self::Local(path) => path.is_dir(),
            Self::S3 { key, .. } => key.is_empty() || key.ends_with('/'),
        }
    }

    /// URI for a local path, made absolute against the working directory
    pub fn file_uri(path: &Path) -> String {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        Url::from_file_path(&absolute)
            .map(String::from)
            .unwrap_or_else(|()| format!("{FILE_SCHEME}://{}", absolute.display()))
    }

    /// URI for an object in a bucket
    pub fn s3_uri(bucket: &str, key: &str) -> String {
        format!("{S3_SCHEME}://{bucket}/{key}")
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => f.write_str(&Self::file_uri(path)),
            Self::S3 { bucket, key } => f.write_str(&Self::s3_uri(bucket, key)),
        }
    }
}
