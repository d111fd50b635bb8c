//! Scheme-dispatching storage front end
//!
//! The resolver keeps nothing between calls except its configuration. Every
//! operation parses the URI, rejects unknown schemes before any I/O and builds
//! the matching backend fresh.

use crate::backend::{StorageBackend, UriStream};
use crate::local::LocalBackend;
use crate::s3::S3Backend;
use crate::uri::StorageUri;
use std::path::Path;
use tes_config::StorageConfig;
use tes_core::{Error, Result};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct StorageResolver {
    config: StorageConfig,
}

impl StorageResolver {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn backend(&self, uri: &StorageUri) -> Result<Box<dyn StorageBackend>> {
        match uri {
            StorageUri::Local(_) => Ok(Box::new(LocalBackend::new())),
            StorageUri::S3 { .. } => Ok(Box::new(S3Backend::from_config(&self.config)?)),
        }
    }

    /// Copy a local file or directory to `destination`
    pub async fn upload(&self, local_path: impl AsRef<Path>, destination: &str) -> Result<u64> {
        let local_path = local_path.as_ref();
        let uri = StorageUri::parse(destination)?;
        let bytes = self.backend(&uri)?.upload(local_path, &uri).await?;
        info!(source = %local_path.display(), destination = %uri, bytes, "upload complete");
        Ok(bytes)
    }

    /// Copy `source` to a local file or directory
    pub async fn download(&self, local_path: impl AsRef<Path>, source: &str) -> Result<u64> {
        let local_path = local_path.as_ref();
        let uri = StorageUri::parse(source)?;
        let bytes = self.backend(&uri)?.download(&uri, local_path).await?;
        info!(source = %uri, destination = %local_path.display(), bytes, "download complete");
        Ok(bytes)
    }

    /// Every object under `location`
    ///
    /// `location` is `s3://bucket[/prefix]`, a `file://` directory or a bare
    /// path. The stream fetches lazily and can be consumed once.
    pub fn list(&self, location: &str) -> Result<UriStream> {
        let uri = StorageUri::parse(location)?;
        Ok(self.backend(&uri)?.list(&uri))
    }

    pub async fn bucket_exists(&self, name: &str) -> Result<bool> {
        let name = bucket_name(name)?;
        S3Backend::from_config(&self.config)?.bucket_exists(name).await
    }

    pub async fn make_bucket(&self, name: &str) -> Result<()> {
        let name = bucket_name(name)?;
        S3Backend::from_config(&self.config)?.make_bucket(name).await
    }
}

/// Accept either a bare bucket name or `s3://bucket`
fn bucket_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    let bare = match trimmed.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(tes_core::S3_SCHEME) => {
            rest.trim_end_matches('/')
        }
        Some((scheme, _)) => return Err(Error::unsupported_scheme(trimmed, scheme)),
        None => trimmed,
    };
    if bare.is_empty() || bare.contains('/') {
        return Err(Error::configuration(format!("invalid bucket name '{name}'")));
    }
    Ok(bare)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_forms() {
        assert_eq!(bucket_name("tes-test").unwrap(), "tes-test");
        assert_eq!(bucket_name("s3://tes-test/").unwrap(), "tes-test");
        assert!(matches!(
            bucket_name("gs://tes-test"),
            Err(Error::UnsupportedScheme { .. })
        ));
        assert!(bucket_name("a/b").is_err());
        assert!(bucket_name("").is_err());
    }

    #[tokio::test]
    async fn test_s3_without_configuration_fails_fast() {
        let resolver = StorageResolver::default();
        let err = resolver
            .upload("/tmp/whatever", "s3://bucket/key")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let err = resolver.bucket_exists("bucket").await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
