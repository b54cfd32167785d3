//! Shared test utilities for candash.
//!
//! - [`mod@must`] - Unwrap helpers with `#[track_caller]` panic locations
//! - [`fixtures`] - Canned frames and snapshots
//! - [`prelude`] - Convenience re-exports
//!
//! ```rust,ignore
//! use candash_test_helpers::prelude::*;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod fixtures;
pub mod must;
pub mod prelude;

pub use must::*;
