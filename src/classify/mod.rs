//! Failure classification
//!
//! This module turns raw failure shapes coming out of the crawl engine into a
//! stable `(category, subcategory, code)` triple:
//! - `taxonomy`: the three categories and their numeric code ranges
//! - `failure`: the tagged `FailureContext` describing what went wrong
//! - `classifier`: the pure mapping from a `FailureContext` to a `Classification`

mod classifier;
mod failure;
mod taxonomy;

pub use classifier::{classify, Classification};
pub use failure::{FailureContext, ParseFailure};
pub use taxonomy::{ErrorCategory, ErrorCode};
