//! Local filesystem backend
//!
//! Transfers are plain copies. Each destination file is written through a
//! temporary file and renamed into place.

use crate::backend::{StorageBackend, UriStream};
use crate::uri::StorageUri;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::executor::block_on;
use futures::stream::{self, StreamExt};
use futures::SinkExt;
use std::path::{Path, PathBuf};
use tes_core::{Error, Result};
use tes_utils::copy_atomic;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

fn local_path(uri: &StorageUri) -> Result<&Path> {
    uri.as_local()
        .ok_or_else(|| Error::unsupported_scheme(uri.to_string(), uri.scheme()))
}

/// Copy a file, or a directory tree file by file, from `source` to `destination`
pub(crate) fn copy_tree(source: &Path, destination: &Path) -> Result<u64> {
    if !source.is_dir() {
        return copy_atomic(source, destination);
    }

    let mut total = 0;
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| {
            Error::transfer_with_source(StorageUri::file_uri(source), "failed to walk directory", e)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source).map_err(|e| {
            let uri = StorageUri::file_uri(entry.path());
            Error::transfer_with_source(uri, "path outside source", e)
        })?;
        total += copy_atomic(entry.path(), &destination.join(relative))?;
    }
    Ok(total)
}

async fn copy_blocking(source: PathBuf, destination: PathBuf, uri: String) -> Result<u64> {
    tokio::task::spawn_blocking(move || copy_tree(&source, &destination))
        .await
        .map_err(|e| Error::transfer_with_source(uri.clone(), "copy task failed", e))?
        .map_err(|e| match e {
            Error::Transfer { .. } => e,
            other => Error::transfer_with_source(uri, "local copy failed", other),
        })
}

/// Entries buffered between the directory walk and the consumer
const LIST_BUFFER: usize = 64;

/// Files below `root`, as `file://` URIs, in walk order
///
/// The walk runs on the blocking pool once the stream is first polled and
/// stops early if the stream is dropped.
pub(crate) fn list_files(root: &Path) -> UriStream {
    let root = root.to_path_buf();
    stream::once(async move {
        let (tx, rx) = mpsc::channel(LIST_BUFFER);
        tokio::task::spawn_blocking(move || walk_files(&root, tx));
        rx
    })
    .flatten()
    .boxed()
}

fn walk_files(root: &Path, mut tx: mpsc::Sender<Result<String>>) {
    let root_uri = StorageUri::file_uri(root);
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let item = match entry {
            Ok(entry) if entry.file_type().is_file() => Ok(StorageUri::file_uri(entry.path())),
            Ok(_) => continue,
            Err(e) => Err(Error::transfer_with_source(
                root_uri.clone(),
                "failed to list directory",
                e,
            )),
        };
        if block_on(tx.send(item)).is_err() {
            debug!(root = %root.display(), "listing dropped before the walk finished");
            return;
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn upload(&self, local: &Path, destination: &StorageUri) -> Result<u64> {
        let target = local_path(destination)?;
        debug!(source = %local.display(), destination = %destination, "local upload");
        copy_blocking(local.to_path_buf(), target.to_path_buf(), destination.to_string()).await
    }

    async fn download(&self, source: &StorageUri, local: &Path) -> Result<u64> {
        let origin = local_path(source)?;
        debug!(source = %source, destination = %local.display(), "local download");
        copy_blocking(origin.to_path_buf(), local.to_path_buf(), source.to_string()).await
    }

    fn list(&self, location: &StorageUri) -> UriStream {
        match local_path(location) {
            Ok(root) => list_files(root),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    fn scheme(&self) -> &'static str {
        tes_core::FILE_SCHEME
    }
}
