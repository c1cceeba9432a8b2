//! Ingot Core
//!
//! Shared building blocks for the Ingot asset pipeline: hash collections,
//! logging setup and optional profiling scopes.

pub mod alloc;
pub mod logging;
pub mod profiling;
