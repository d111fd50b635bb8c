//! Shared utilities for the TES client
//!
//! Small helpers used by several crates in the workspace: tracing setup for
//! binaries, atomic file writes for downloads, and XDG path resolution for the
//! client configuration file.

pub mod atomic_file;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use xdg::*;
