// src/data/mod.rs
//! Data handling modules for the viewer.
//!
//! This module provides functionality for:
//! - Parsing the tabular dataset carried by a saved world.
//! - Defining the data structures uploaded to GPU buffers.

pub mod dataset;
pub mod types;

// Re-export commonly used types for convenience.
pub use self::dataset::{Dataset, DatasetSource, WorldFile};
pub use self::types::{LineVertex, ViewUniform};
