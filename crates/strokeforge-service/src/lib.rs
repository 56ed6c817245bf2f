//! StrokeForge Service
//!
//! Boundary between the game layer and the stroke search:
//! - [`InferenceService`] - reference-counted model instances per label pair,
//!   scoring, inference and stroke search, sync and async
//! - [`LabelPair`] - the two target classes of one game
//! - [`ModelLoader`] - where model instances come from

pub mod label;
pub mod loader;
pub mod service;

pub use label::LabelPair;
pub use loader::{DirectoryModelLoader, FnModelLoader, ModelLoader, MODEL_FILE_NAME};
pub use service::{FoundStroke, InferenceService, StrokeQuery};
pub use strokeforge_solver::{CancellationToken, SearchProgress};
