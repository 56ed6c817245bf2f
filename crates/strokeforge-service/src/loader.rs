//! Model loading.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use strokeforge_core::{Result, StrokeForgeError};
use strokeforge_scoring::{LinearModelParams, LinearSoftmaxModel, ScoreModel};
use tracing::debug;

use crate::label::LabelPair;

/// File name of a model inside its label-pair directory.
pub const MODEL_FILE_NAME: &str = "model.yaml";

/// Produces a fresh model instance for a label pair.
pub trait ModelLoader: Send + Sync + Debug {
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::ModelLoad`] if no model can be produced.
    fn load(&self, pair: &LabelPair) -> Result<Box<dyn ScoreModel>>;
}

/// Loads [`LinearSoftmaxModel`]s from `<root>/<label-pair key>/model.yaml`.
#[derive(Debug, Clone)]
pub struct DirectoryModelLoader {
    root: PathBuf,
}

impl DirectoryModelLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the model for `pair` is expected.
    pub fn model_path(&self, pair: &LabelPair) -> PathBuf {
        self.root.join(pair.key()).join(MODEL_FILE_NAME)
    }
}

impl ModelLoader for DirectoryModelLoader {
    fn load(&self, pair: &LabelPair) -> Result<Box<dyn ScoreModel>> {
        let path = self.model_path(pair);
        debug!(label_pair = %pair, path = %path.display(), "loading model");

        let text = fs::read_to_string(&path).map_err(|e| {
            StrokeForgeError::ModelLoad(format!("reading {}: {e}", path.display()))
        })?;
        let params: LinearModelParams = serde_yaml::from_str(&text).map_err(|e| {
            StrokeForgeError::ModelLoad(format!("parsing {}: {e}", path.display()))
        })?;
        Ok(Box::new(LinearSoftmaxModel::new(params)?))
    }
}

/// Loader backed by a closure.
///
/// # Example
///
/// ```
/// use strokeforge_core::CanvasShape;
/// use strokeforge_scoring::{LinearSoftmaxModel, ScoreModel};
/// use strokeforge_service::{FnModelLoader, LabelPair, ModelLoader};
///
/// let loader = FnModelLoader::new(|_pair: &LabelPair| {
///     let model = LinearSoftmaxModel::from_fn(CanvasShape::square(8), 2, |_, _, _| 0.0)?;
///     Ok(Box::new(model) as Box<dyn ScoreModel>)
/// });
/// let model = loader.load(&LabelPair::new("a", "b")).unwrap();
/// assert_eq!(model.class_count(), 2);
/// ```
pub struct FnModelLoader<F> {
    load: F,
}

impl<F> FnModelLoader<F>
where
    F: Fn(&LabelPair) -> Result<Box<dyn ScoreModel>> + Send + Sync,
{
    pub fn new(load: F) -> Self {
        Self { load }
    }
}

impl<F> Debug for FnModelLoader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModelLoader").finish_non_exhaustive()
    }
}

impl<F> ModelLoader for FnModelLoader<F>
where
    F: Fn(&LabelPair) -> Result<Box<dyn ScoreModel>> + Send + Sync,
{
    fn load(&self, pair: &LabelPair) -> Result<Box<dyn ScoreModel>> {
        (self.load)(pair)
    }
}
