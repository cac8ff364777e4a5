//! Pull request and review-comment metrics for GitHub teams.
//!
//! Members' pull requests are searched within a creation-date window, their
//! issue and review comments are classified as team or external by roster
//! membership, and the result is aggregated per member and per quarter, scored,
//! and rendered as Markdown or JSON reports.

pub mod analyze;
pub mod cache;
pub mod error;
pub mod github;
pub mod model;
pub mod report;
pub mod service;
pub mod utils;

pub use error::{Error, FetchFailure, FetchUnit, Partial, Result};
pub use service::MetricsService;
