//! Configuration for the TES client
//!
//! Builds the explicit [`ClientConfig`] object every other crate is
//! constructed from, layering defaults, a JSON file and the environment.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::*;
