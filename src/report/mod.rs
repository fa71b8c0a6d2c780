//! Report module.
//!
//! This module renders the durable output of a run: a plain-text
//! artifact describing what was compared or restored.

pub mod report;
pub use report::{
    render_comparison, render_restore, write_artifact, write_comparison, write_restore, Error,
    Result,
};
