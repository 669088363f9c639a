//! Error types shared across the viewer library.

use crate::plot::bounds::Axis;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    /// Malformed dataset or out-of-range axis selection. Raised before any
    /// buffer is allocated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The normalization bound of an axis is not strictly positive.
    #[error("degenerate normalization on {axis} axis (bound = {bound})")]
    DivisionDegenerate { axis: Axis, bound: f64 },

    #[error("headset unavailable: {0}")]
    Headset(String),

    #[error("controller input: {0}")]
    Controller(String),

    #[error("malformed world dataset: {0}")]
    Dataset(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = VizError> = std::result::Result<T, E>;
