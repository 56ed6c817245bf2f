//! Shared test fixtures for StrokeForge crates.
//!
//! This crate provides frozen models, canvases and configurations for
//! testing. It does NOT depend on `strokeforge-solver` or
//! `strokeforge-service` to avoid circular dependencies.
//!
//! - [`model`] - frozen linear classifiers with known preferences
//! - [`canvas`] - blank and pre-inked canvases
//! - [`config`] - small, seeded search configurations
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! strokeforge-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use strokeforge_test::model::corner_model;
//! use strokeforge_test::config::seeded_config;
//! ```

pub mod canvas;
pub mod config;
pub mod model;

pub use canvas::{blank_canvas, filled_canvas};
pub use config::{quick_config, seeded_config};
pub use model::{corner_model, indifferent_model, ink_model, CORNER_CLASS};
