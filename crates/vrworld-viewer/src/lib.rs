// src/lib.rs
//! VR point cloud viewer library.
//!
//! Loads a tabular world file, plots three of its columns as a colored point
//! cloud inside a box with labeled axes, and lets the user inspect and select
//! points with a mouse, a keyboard or tracked VR controllers.

pub mod app;
pub mod bootstrap;
pub mod camera;
pub mod config;
pub mod data;
pub mod error;
pub mod input;
pub mod plot;
pub mod renderer;
pub mod scene;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod ui;
