//! Core domain types, errors, and constants for the TES client.
//!
//! This crate establishes the data structures and error handling shared by
//! every other crate in the workspace. Wire formats live in the client crate;
//! everything here is the canonical, schema-independent representation.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   centralizing all possible failure modes for predictable error handling.
//! - **`types`**: Task documents, job identifiers, job states and records, and
//!   service metadata.
//! - **`constants`**: Environment variable names, defaults and well-known keys.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
    types::*,
};
