//! Quarry Core
//!
//! Core types for the Quarry benchmark worker.
//!
//! This crate contains the batch descriptor and its nested records as the
//! coordinator serves them. They are shared between the coordinator client
//! (deserialization) and the worker (cache keying, subprocess arguments).

pub mod batch;

pub use batch::{Batch, BatchSettings, RuntimeConfig};
