//! Client for GA4GH Task Execution Service servers
//!
//! [`TesClient`] submits tasks, reads and cancels jobs and waits for them to
//! finish. Requests go through a [`wire::WireAdapter`] chosen by the
//! configured API generation, so callers only see the canonical types from
//! `tes_core`.

pub mod client;
pub mod poll;
pub mod validate;
pub mod wire;

pub use client::TesClient;
pub use poll::PollTimeout;
pub use validate::validate_task;
