//! Storage commands: upload, download, list, make-bucket, bucket-exists

use futures::StreamExt;
use std::path::Path;
use tes_client::TesClient;
use tes_config::ClientConfig;
use tes_storage::StorageResolver;
use tracing::{debug, warn};

use crate::output::{print_json, Outcome};

pub async fn upload(config: ClientConfig, path: &Path, uri: &str) -> eyre::Result<Outcome> {
    let resolver = resolver(config, uri).await;
    let bytes = resolver.upload(path, uri).await?;
    print_json(&serde_json::json!({ "uri": uri, "bytes": bytes }))?;
    Ok(Outcome::Success)
}

pub async fn download(config: ClientConfig, uri: &str, path: &Path) -> eyre::Result<Outcome> {
    let resolver = resolver(config, uri).await;
    let bytes = resolver.download(path, uri).await?;
    print_json(&serde_json::json!({ "path": path.display().to_string(), "bytes": bytes }))?;
    Ok(Outcome::Success)
}

/// One URI per line as the listing arrives
pub async fn list(config: ClientConfig, location: &str) -> eyre::Result<Outcome> {
    let resolver = resolver(config, location).await;
    let mut uris = resolver.list(location)?;
    while let Some(uri) = uris.next().await {
        println!("{}", uri?);
    }
    Ok(Outcome::Success)
}

pub async fn make_bucket(config: ClientConfig, name: &str) -> eyre::Result<Outcome> {
    let resolver = resolver(config, "s3://").await;
    resolver.make_bucket(name).await?;
    print_json(&serde_json::json!({ "bucket": name, "created": true }))?;
    Ok(Outcome::Success)
}

pub async fn bucket_exists(config: ClientConfig, name: &str) -> eyre::Result<Outcome> {
    let resolver = resolver(config, "s3://").await;
    let exists = resolver.bucket_exists(name).await?;
    print_json(&serde_json::json!({ "bucket": name, "exists": exists }))?;
    Ok(Outcome::Success)
}

/// Build a resolver, asking the server for its object store when an S3
/// location has no configured endpoint
async fn resolver(config: ClientConfig, location: &str) -> StorageResolver {
    if !needs_advertised_endpoint(&config, location) {
        return StorageResolver::new(config.storage);
    }

    let storage = config.storage.clone();
    let discovered = match TesClient::new(config) {
        Ok(client) => client.get_service_info().await,
        Err(e) => Err(e),
    };
    match discovered {
        Ok(info) => {
            debug!(endpoint = ?info.s3_endpoint(), "using advertised object store");
            StorageResolver::new(storage.with_service_info(&info))
        }
        Err(e) => {
            warn!(error = %e, "could not read the server's object store endpoint");
            StorageResolver::new(storage)
        }
    }
}

fn needs_advertised_endpoint(config: &ClientConfig, location: &str) -> bool {
    location.starts_with("s3://") && config.storage.s3_endpoint.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_endpoint_discovery_only_for_s3() {
        let mut config = ClientConfig::default();
        assert!(needs_advertised_endpoint(&config, "s3://bucket/key"));
        assert!(!needs_advertised_endpoint(&config, "/tmp/file"));
        assert!(!needs_advertised_endpoint(&config, "file:///tmp/file"));

        config.storage.s3_endpoint = Some("http://localhost:9000".to_string());
        assert!(!needs_advertised_endpoint(&config, "s3://bucket/key"));
    }

    #[tokio::test]
    async fn test_local_upload_and_download() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, "payload").unwrap();
        let stored = dir.path().join("stored.txt");
        let fetched = dir.path().join("fetched.txt");

        let stored_uri = stored.display().to_string();
        let outcome = upload(ClientConfig::default(), &source, &stored_uri)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Success);

        download(ClientConfig::default(), &stored_uri, &fetched)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(fetched).unwrap(), "payload");
    }
}
