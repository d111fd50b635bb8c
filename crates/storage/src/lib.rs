//! Storage for task inputs and outputs
//!
//! The URI scheme picks the backend: `file://` (or a bare path) copies on the
//! local filesystem, `s3://` talks to an S3-compatible object store.

pub mod backend;
pub mod local;
pub mod resolver;
pub mod s3;
pub mod uri;

pub use backend::{StorageBackend, UriStream};
pub use local::LocalBackend;
pub use resolver::StorageResolver;
pub use s3::S3Backend;
pub use uri::StorageUri;
