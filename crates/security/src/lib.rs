//! Security features for the TES client
//!
//! This crate provides credential delegation: packaging object-store keys
//! into a short-lived signed token the server hands to the worker, so the
//! keys never appear in the task document itself.

pub mod delegation;

pub use delegation::*;
