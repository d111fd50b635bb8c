//! Upload followed by download returns identical bytes

use futures::TryStreamExt;
use std::fs;
use tempfile::TempDir;
use tes_config::StorageConfig;
use tes_core::{Error, SecretString};
use tes_storage::{StorageResolver, StorageUri};

#[tokio::test]
async fn test_local_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("hello.txt");
    fs::write(&source, b"hello world\n").unwrap();

    let stored = temp_dir.path().join("store").join("hello.txt");
    let uri = StorageUri::file_uri(&stored);
    let restored = temp_dir.path().join("restored.txt");

    let resolver = StorageResolver::default();
    resolver.upload(&source, &uri).await.unwrap();
    resolver.download(&restored, &uri).await.unwrap();

    assert_eq!(fs::read(&source).unwrap(), fs::read(&restored).unwrap());
}

#[tokio::test]
async fn test_local_list_is_lazy_and_finite() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(temp_dir.path().join(name), name).unwrap();
    }

    let resolver = StorageResolver::default();
    let uris: Vec<String> = resolver
        .list(&StorageUri::file_uri(temp_dir.path()))
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(uris.len(), 3);
}

#[tokio::test]
async fn test_unsupported_scheme_before_io() {
    let temp_dir = TempDir::new().unwrap();
    let resolver = StorageResolver::default();

    let err = resolver
        .upload(temp_dir.path().join("missing"), "ftp://example.org/file")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedScheme { .. }));

    let err = resolver
        .download(temp_dir.path().join("out"), "gs://bucket/file")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedScheme { .. }));
    assert!(!temp_dir.path().join("out").exists());
}

/// Runs against a live object store when `TES_TEST_S3_ENDPOINT` is set,
/// e.g. a local MinIO with `minioadmin` credentials.
#[tokio::test]
async fn test_s3_round_trip() {
    let Ok(endpoint) = std::env::var("TES_TEST_S3_ENDPOINT") else {
        return;
    };
    let config = StorageConfig {
        s3_endpoint: Some(endpoint),
        access_key: Some(
            std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_else(|_| "minioadmin".to_string()),
        ),
        secret_key: Some(SecretString::new(
            std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
        )),
        ..Default::default()
    };
    let resolver = StorageResolver::new(config);
    let bucket = format!("tes-test-{}", uuid::Uuid::new_v4().simple());

    assert!(!resolver.bucket_exists(&bucket).await.unwrap());
    resolver.make_bucket(&bucket).await.unwrap();
    assert!(resolver.bucket_exists(&bucket).await.unwrap());

    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("hello.txt");
    fs::write(&source, b"hello object store\n").unwrap();
    let uri = format!("s3://{bucket}/inputs/hello.txt");

    resolver.upload(&source, &uri).await.unwrap();
    let restored = temp_dir.path().join("restored.txt");
    resolver.download(&restored, &uri).await.unwrap();
    assert_eq!(fs::read(&source).unwrap(), fs::read(&restored).unwrap());

    let listed: Vec<String> = resolver
        .list(&format!("s3://{bucket}"))
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(listed, vec![uri]);
}
