//! Storage backend trait

use crate::uri::StorageUri;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::Path;
use tes_core::Result;

/// Lazily produced storage URIs; consumed once
pub type UriStream = BoxStream<'static, Result<String>>;

/// Moves files between the local filesystem and one kind of storage
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Copy `local_path` (file or directory) to `destination`, returning bytes written
    async fn upload(&self, local_path: &Path, destination: &StorageUri) -> Result<u64>;

    /// Copy `source` (object, prefix, file or directory) to `local_path`
    async fn download(&self, source: &StorageUri, local_path: &Path) -> Result<u64>;

    /// Every object under `location`
    fn list(&self, location: &StorageUri) -> UriStream;

    /// Scheme handled by this backend
    fn scheme(&self) -> &'static str;
}
