//! Directory downloads against a scripted object store

use std::fs;
use tempfile::TempDir;
use tes_config::StorageConfig;
use tes_core::{Error, SecretString};
use tes_storage::StorageResolver;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "tes-test";

fn resolver_for(server: &MockServer) -> StorageResolver {
    StorageResolver::new(StorageConfig {
        s3_endpoint: Some(server.uri()),
        access_key: Some("minioadmin".to_string()),
        secret_key: Some(SecretString::new("minioadmin")),
        ..Default::default()
    })
}

fn listing(prefix: &str, keys: &[&str]) -> String {
    let contents: String = keys
        .iter()
        .map(|key| format!("<Contents><Key>{key}</Key><Size>1</Size></Contents>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{BUCKET}</Name><Prefix>{prefix}</Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys><IsTruncated>false</IsTruncated>{contents}</ListBucketResult>"#,
        keys.len()
    )
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

async fn mount_listing(server: &MockServer, prefix: &str, keys: &[&str]) {
    Mock::given(method("GET"))
        .and(path_regex(format!("^/{BUCKET}/?$")))
        .and(query_param("list-type", "2"))
        .and(query_param("prefix", prefix))
        .respond_with(xml(listing(prefix, keys)))
        .mount(server)
        .await;
}

async fn mount_object(server: &MockServer, key: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{BUCKET}/{key}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/octet-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_key_without_slash_falls_back_to_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{BUCKET}/out")))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message>\
                 <Key>out</Key></Error>",
                "application/xml",
            ),
        )
        .mount(&server)
        .await;
    mount_listing(&server, "out/", &["out/", "out/a.txt", "out/nested/b.txt"]).await;
    mount_object(&server, "out/a.txt", "alpha").await;
    mount_object(&server, "out/nested/b.txt", "beta").await;

    let temp_dir = TempDir::new().unwrap();
    let local = temp_dir.path().join("out");
    let bytes = resolver_for(&server)
        .download(&local, &format!("s3://{BUCKET}/out"))
        .await
        .unwrap();

    assert_eq!(bytes, 9);
    assert_eq!(fs::read_to_string(local.join("a.txt")).unwrap(), "alpha");
    assert_eq!(
        fs::read_to_string(local.join("nested").join("b.txt")).unwrap(),
        "beta"
    );
}

#[tokio::test]
async fn test_single_object_streams_to_file() {
    let server = MockServer::start().await;
    let body = "x".repeat(64 * 1024);
    mount_object(&server, "results/stdout", &body).await;

    let temp_dir = TempDir::new().unwrap();
    let local = temp_dir.path().join("stdout");
    let bytes = resolver_for(&server)
        .download(&local, &format!("s3://{BUCKET}/results/stdout"))
        .await
        .unwrap();

    assert_eq!(bytes, body.len() as u64);
    assert_eq!(fs::read_to_string(&local).unwrap(), body);
}

#[tokio::test]
async fn test_escaping_key_is_refused() {
    let server = MockServer::start().await;
    mount_listing(&server, "out/", &["out/ok.txt", "out/../../escape.txt"]).await;
    mount_object(&server, "out/ok.txt", "fine").await;

    let temp_dir = TempDir::new().unwrap();
    let local = temp_dir.path().join("a").join("b");
    let err = resolver_for(&server)
        .download(&local, &format!("s3://{BUCKET}/out/"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transfer { .. }), "unexpected error: {err:?}");
    assert!(!temp_dir.path().join("escape.txt").exists());
    assert!(!local.join("ok.txt").exists());
}
