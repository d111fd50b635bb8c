//! S3-compatible object store backend

use crate::backend::{StorageBackend, UriStream};
use crate::uri::StorageUri;
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use tes_config::StorageConfig;
use tes_core::{Error, Result, DEFAULT_S3_REGION};
use tes_utils::write_atomic_from;
use tracing::{debug, info};
use walkdir::WalkDir;

const CREDENTIALS_PROVIDER: &str = "tes-client";

/// Object store access built from one [`StorageConfig`]
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    region: String,
}

fn describe<E: std::error::Error>(err: &E) -> String {
    DisplayErrorContext(err).to_string()
}

impl S3Backend {
    /// Build a client; endpoint and both credential halves are required
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let endpoint = config
            .s3_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::configuration("object store endpoint is not configured"))?;
        let credentials = config
            .credentials()
            .ok_or_else(|| Error::configuration("object store credentials are not configured"))?;

        let region = if config.region.trim().is_empty() {
            DEFAULT_S3_REGION.to_string()
        } else {
            config.region.clone()
        };

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new(region.clone()))
            .credentials_provider(Credentials::new(
                credentials.access_key,
                credentials.secret_key.expose(),
                None,
                None,
                CREDENTIALS_PROVIDER,
            ))
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            region,
        })
    }

    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(HeadBucketError::is_not_found)
                    || err.raw_response().map(|r| r.status().as_u16()) == Some(404) =>
            {
                Ok(false)
            }
            Err(err) => Err(Error::transfer(
                StorageUri::s3_uri(bucket, ""),
                format!("failed to check bucket: {}", describe(&err)),
            )),
        }
    }

    pub async fn make_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_S3_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(|err| {
            Error::transfer(
                StorageUri::s3_uri(bucket, ""),
                format!("failed to create bucket: {}", describe(&err)),
            )
        })?;
        info!(bucket, "created bucket");
        Ok(())
    }

    async fn put_file(&self, path: &Path, bucket: &str, key: &str) -> Result<u64> {
        let uri = StorageUri::s3_uri(bucket, key);
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| Error::transfer_with_source(&uri, "failed to read local file", e))?;
        let length = body.size_hint().0;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                Error::transfer(&uri, format!("failed to upload object: {}", describe(&err)))
            })?;

        debug!(uri = %uri, bytes = length, "uploaded object");
        Ok(length)
    }

    /// `None` when no object has this key
    async fn open_object(&self, bucket: &str, key: &str) -> Result<Option<GetObjectOutput>> {
        match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(object) => Ok(Some(object)),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key) =>
            {
                Ok(None)
            }
            Err(err) => Err(Error::transfer(
                StorageUri::s3_uri(bucket, key),
                format!("failed to download object: {}", describe(&err)),
            )),
        }
    }

    /// Stream an object's body to `path`
    async fn save_object(&self, uri: &str, object: GetObjectOutput, path: &Path) -> Result<u64> {
        let bytes = write_atomic_from(path, object.body.into_async_read())
            .await
            .map_err(|e| Error::transfer_with_source(uri, "failed to write local file", e))?;
        debug!(uri, bytes, "downloaded object");
        Ok(bytes)
    }

    async fn get_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        let uri = StorageUri::s3_uri(bucket, key);
        let object = self
            .open_object(bucket, key)
            .await?
            .ok_or_else(|| Error::transfer(&uri, "object does not exist"))?;
        self.save_object(&uri, object, path).await
    }

    /// Every object under `prefix` into `local`, returning files and bytes written
    async fn get_prefix(&self, bucket: &str, prefix: &str, local: &Path) -> Result<(usize, u64)> {
        let keys: Vec<String> = self.list_keys(bucket, prefix).try_collect().await?;
        // Map every key before fetching any so a bad key leaves nothing behind
        let targets = keys
            .iter()
            .filter(|key| !key.ends_with('/'))
            .map(|key| Ok((key, local_target(local, bucket, prefix, key)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut total = 0;
        for (key, target) in &targets {
            total += self.get_file(bucket, key, target).await?;
        }
        Ok((targets.len(), total))
    }

    /// Object keys under `prefix`, fetched one page at a time as the stream is polled
    fn list_keys(&self, bucket: &str, prefix: &str) -> BoxStream<'static, Result<String>> {
        struct Pages {
            client: Client,
            bucket: String,
            prefix: Option<String>,
            token: Option<String>,
            pending: VecDeque<String>,
            exhausted: bool,
        }

        let pages = Pages {
            client: self.client.clone(),
            bucket: bucket.to_string(),
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            token: None,
            pending: VecDeque::new(),
            exhausted: false,
        };

        stream::unfold(pages, |mut pages| async move {
            loop {
                if let Some(key) = pages.pending.pop_front() {
                    return Some((Ok(key), pages));
                }
                if pages.exhausted {
                    return None;
                }

                let page = pages
                    .client
                    .list_objects_v2()
                    .bucket(&pages.bucket)
                    .set_prefix(pages.prefix.clone())
                    .set_continuation_token(pages.token.take())
                    .send()
                    .await;

                match page {
                    Ok(page) => {
                        pages.pending.extend(
                            page.contents()
                                .iter()
                                .filter_map(|object| object.key().map(str::to_string)),
                        );
                        pages.token = page.next_continuation_token().map(str::to_string);
                        pages.exhausted = pages.token.is_none();
                    }
                    Err(err) => {
                        pages.exhausted = true;
                        let prefix = pages.prefix.as_deref().unwrap_or("");
                        let error = Error::transfer(
                            StorageUri::s3_uri(&pages.bucket, prefix),
                            format!("failed to list objects: {}", describe(&err)),
                        );
                        return Some((Err(error), pages));
                    }
                }
            }
        })
        .boxed()
    }
}

fn s3_location(uri: &StorageUri) -> Result<(&str, &str)> {
    match uri {
        StorageUri::S3 { bucket, key } => Ok((bucket, key)),
        StorageUri::Local(_) => Err(Error::unsupported_scheme(uri.to_string(), uri.scheme())),
    }
}

/// Where the object `key` lands below `root` when `prefix` is downloaded
///
/// Keys are split on `/`; any part that is not a plain name (`..`, a drive or
/// a root) would escape `root` and is refused.
fn local_target(root: &Path, bucket: &str, prefix: &str, key: &str) -> Result<PathBuf> {
    let relative = key.strip_prefix(prefix).unwrap_or(key);
    let mut target = root.to_path_buf();
    for part in relative.split('/').filter(|p| !p.is_empty() && *p != ".") {
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => target.push(name),
            _ => {
                return Err(Error::transfer(
                    StorageUri::s3_uri(bucket, key),
                    format!("object key escapes the destination '{}'", root.display()),
                ))
            }
        }
    }
    Ok(target)
}

/// Key for `relative` below a directory-like `prefix`
fn join_key(prefix: &str, relative: &Path) -> String {
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        relative
    } else {
        format!("{prefix}/{relative}")
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn upload(&self, local: &Path, destination: &StorageUri) -> Result<u64> {
        let (bucket, key) = s3_location(destination)?;

        if !local.is_dir() {
            let key = if key.is_empty() || key.ends_with('/') {
                let name = local
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{key}{name}")
            } else {
                key.to_string()
            };
            return self.put_file(local, bucket, &key).await;
        }

        let mut total = 0;
        for entry in WalkDir::new(local).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::transfer_with_source(destination.to_string(), "failed to walk directory", e)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(local).map_err(|e| {
                Error::transfer_with_source(destination.to_string(), "path outside source", e)
            })?;
            total += self
                .put_file(entry.path(), bucket, &join_key(key, relative))
                .await?;
        }
        Ok(total)
    }

    async fn download(&self, source: &StorageUri, local: &Path) -> Result<u64> {
        let (bucket, key) = s3_location(source)?;
        if source.is_prefix() {
            let (_, bytes) = self.get_prefix(bucket, key, local).await?;
            return Ok(bytes);
        }

        if let Some(object) = self.open_object(bucket, key).await? {
            return self.save_object(&source.to_string(), object, local).await;
        }

        // Directory outputs are often named without the trailing slash
        match self.get_prefix(bucket, &format!("{key}/"), local).await? {
            (0, _) => Err(Error::transfer(
                source.to_string(),
                "no object or directory with this key",
            )),
            (files, bytes) => {
                debug!(uri = %source, files, "downloaded key as a directory");
                Ok(bytes)
            }
        }
    }

    fn list(&self, location: &StorageUri) -> UriStream {
        match s3_location(location) {
            Ok((bucket, prefix)) => {
                let bucket_name = bucket.to_string();
                self.list_keys(bucket, prefix)
                    .map_ok(move |key| StorageUri::s3_uri(&bucket_name, &key))
                    .boxed()
            }
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    fn scheme(&self) -> &'static str {
        tes_core::S3_SCHEME
    }
}
