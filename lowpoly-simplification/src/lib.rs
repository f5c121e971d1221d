//! Adaptive mesh decimation with geometric quality control
//!
//! This crate reduces polygon counts while bounding the geometric error of
//! the result:
//! - Quadric error edge collapse
//! - One-sided and bidirectional Hausdorff distance
//! - Quality presets and size-relative error thresholds
//! - A quality-gated retry loop that raises the target until the error fits
//! - Pre-decimation cleanup and a per-group pipeline

pub mod collapse;
pub mod decimate;
pub mod hausdorff;
pub mod quality;
pub mod adaptive;
pub mod cleanup;
pub mod pipeline;

pub use collapse::*;
pub use decimate::*;
pub use hausdorff::*;
pub use quality::*;
pub use adaptive::*;
pub use cleanup::*;
pub use pipeline::*;
