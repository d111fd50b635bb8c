//! Core domain types for the TES client.
//!
//! ## Organization
//!
//! - **`api`**: API generations and task views
//! - **`task`**: The canonical task document submitted to a server
//! - **`job`**: Job identifiers, the job state machine and job records
//! - **`service`**: Server capability metadata
//! - **`secret`**: Zeroizing wrapper for credentials held in configuration

pub mod api;
pub mod job;
pub mod secret;
pub mod service;
pub mod task;

// Re-export all public types for convenient access
pub use api::*;
pub use job::*;
pub use secret::*;
pub use service::*;
pub use task::*;
