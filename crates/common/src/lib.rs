//! Shared building blocks for the catalog workspace.
//!
//! - `utils::logging`: tracing subscriber setup used by binaries and tests.
//! - `pagination`: page window normalisation and the paged result envelope.

pub mod pagination;
pub mod utils;
