//! State module for tracking the lifecycle of a crawl run
//!
//! # Components
//!
//! - `RunState`: Where a spider run currently is (started, crawling, paginating, closed)
//! - `CloseReason`: Why a run was closed

mod run_state;

// Re-export main types
pub use run_state::{CloseReason, RunState};
