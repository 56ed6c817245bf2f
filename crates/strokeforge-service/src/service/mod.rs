//! Inference service: one scoring model per active label pair.
//!
//! Every model instance sits behind its own mutex. Forward passes, and
//! whole stroke searches, hold that lock for their entire duration, so two
//! requests for the same label pair run one after the other while requests
//! for different pairs proceed independently. Searches carry a step budget,
//! an optional time limit and an optional cancellation token so a single
//! request cannot hold a model indefinitely.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use strokeforge_config::ServiceConfig;
use strokeforge_core::{Canvas, Point, Result, StrokeForgeError};
use strokeforge_scoring::{ModelOutput, ScoreModel};
use strokeforge_solver::{
    CancellationToken, MultiStartSearch, SearchProgress, SearchResult, StrokeRequest,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::label::LabelPair;
use crate::loader::ModelLoader;

type SharedModel = Arc<Mutex<Box<dyn ScoreModel>>>;

/// A stroke search request.
#[derive(Debug, Clone)]
pub struct StrokeQuery {
    /// Canvas drawn so far, in `[0, 1]`.
    pub base: Canvas,
    pub target_class: usize,
    /// Finest stroke width in pixels; the search starts at
    /// `stroke_width * width_multiplier`.
    pub stroke_width: f64,
    /// Maximum arc length in pixels.
    pub max_length: f64,
}

impl StrokeQuery {
    pub fn new(base: Canvas, target_class: usize, stroke_width: f64, max_length: f64) -> Self {
        Self {
            base,
            target_class,
            stroke_width,
            max_length,
        }
    }
}

/// Answer to a [`StrokeQuery`].
#[derive(Debug, Clone)]
pub struct FoundStroke {
    /// Winning curve resampled at uniform parameters, `(x, y)` in `[0, 1]²`.
    pub polyline: Vec<Point>,
    pub result: SearchResult,
}

impl FoundStroke {
    pub fn score(&self) -> f64 {
        self.result.score
    }
}

#[derive(Debug)]
struct ModelEntry {
    model: SharedModel,
    active_games: usize,
}

/// Owns the model instances of every active label pair.
///
/// # Example
///
/// ```
/// use strokeforge_config::{SearchConfig, ServiceConfig};
/// use strokeforge_core::{Canvas, CanvasShape};
/// use strokeforge_scoring::{LinearSoftmaxModel, ScoreModel};
/// use strokeforge_service::{FnModelLoader, InferenceService, LabelPair, StrokeQuery};
///
/// let shape = CanvasShape::square(16);
/// let loader = FnModelLoader::new(move |_: &LabelPair| {
///     let model = LinearSoftmaxModel::from_fn(shape, 2, |class, _, _| {
///         if class == 0 { 0.05 } else { 0.0 }
///     })?;
///     Ok(Box::new(model) as Box<dyn ScoreModel>)
/// });
/// let search = SearchConfig::new().with_grid_size(2).with_steps(5).with_random_seed(1);
/// let service = InferenceService::new(ServiceConfig::new().with_search(search), loader).unwrap();
///
/// let pair = LabelPair::new("cat", "dog");
/// service.acquire(&pair).unwrap();
///
/// let query = StrokeQuery::new(Canvas::new(shape), 0, 2.0, 8.0);
/// let stroke = service.find_stroke(&pair, &query).unwrap();
/// assert_eq!(stroke.polyline.len(), 20);
///
/// service.release(&pair).unwrap();
/// assert!(!service.is_running(&pair));
/// ```
#[derive(Debug)]
pub struct InferenceService {
    config: ServiceConfig,
    loader: Arc<dyn ModelLoader>,
    models: RwLock<HashMap<LabelPair, ModelEntry>>,
}

impl InferenceService {
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] if `config` fails validation.
    pub fn new(config: ServiceConfig, loader: impl ModelLoader + 'static) -> Result<Self> {
        Self::with_shared_loader(config, Arc::new(loader))
    }

    pub fn with_shared_loader(config: ServiceConfig, loader: Arc<dyn ModelLoader>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader,
            models: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Starts a model instance for `pair` unless one is running.
    ///
    /// Returns `true` if a new instance was loaded.
    ///
    /// # Errors
    ///
    /// Propagates loader errors; nothing is registered on failure.
    pub fn start(&self, pair: &LabelPair) -> Result<bool> {
        if self.models.read().contains_key(pair) {
            return Ok(false);
        }
        let model = self.loader.load(pair)?;

        let mut models = self.models.write();
        if models.contains_key(pair) {
            return Ok(false);
        }
        info!(
            event = "model_start",
            label_pair = %pair,
            classes = model.class_count(),
            running = models.len() + 1,
        );
        models.insert(
            pair.clone(),
            ModelEntry {
                model: Arc::new(Mutex::new(model)),
                active_games: 0,
            },
        );
        Ok(true)
    }

    /// Drops the model instance for `pair`.
    ///
    /// Requests already holding the model finish normally.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::ModelNotFound`] if no instance is running.
    pub fn stop(&self, pair: &LabelPair) -> Result<()> {
        let mut models = self.models.write();
        match models.remove(pair) {
            Some(_) => {
                info!(event = "model_stop", label_pair = %pair, running = models.len());
                Ok(())
            }
            None => Err(StrokeForgeError::ModelNotFound(pair.key())),
        }
    }

    /// Registers one more game for `pair`, starting its model if needed.
    ///
    /// Returns the number of active games afterwards.
    pub fn acquire(&self, pair: &LabelPair) -> Result<usize> {
        loop {
            if let Some(entry) = self.models.write().get_mut(pair) {
                entry.active_games += 1;
                return Ok(entry.active_games);
            }
            self.start(pair)?;
        }
    }

    /// Unregisters one game for `pair`; the model stops with its last game.
    ///
    /// Returns the number of active games left.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::ModelNotFound`] if no instance is running.
    pub fn release(&self, pair: &LabelPair) -> Result<usize> {
        let mut models = self.models.write();
        let entry = models
            .get_mut(pair)
            .ok_or_else(|| StrokeForgeError::ModelNotFound(pair.key()))?;
        entry.active_games = entry.active_games.saturating_sub(1);
        let remaining = entry.active_games;
        if remaining == 0 {
            models.remove(pair);
            info!(event = "model_stop", label_pair = %pair, running = models.len());
        }
        Ok(remaining)
    }

    /// Reconciles running instances with a snapshot of active games.
    ///
    /// Pairs with a positive count run with that count; every other
    /// instance is stopped.
    ///
    /// # Errors
    ///
    /// Propagates the first loader error. Stops have been applied by then.
    pub fn scale<I>(&self, active_games: I) -> Result<()>
    where
        I: IntoIterator<Item = (LabelPair, usize)>,
    {
        let wanted: HashMap<LabelPair, usize> = active_games
            .into_iter()
            .filter(|(_, games)| *games > 0)
            .collect();

        {
            let mut models = self.models.write();
            let stale: Vec<LabelPair> = models
                .keys()
                .filter(|pair| !wanted.contains_key(*pair))
                .cloned()
                .collect();
            for pair in stale {
                models.remove(&pair);
                info!(event = "model_stop", label_pair = %pair, running = models.len());
            }
        }

        for (pair, games) in wanted {
            self.start(&pair)?;
            if let Some(entry) = self.models.write().get_mut(&pair) {
                entry.active_games = games;
            }
        }
        Ok(())
    }

    pub fn is_running(&self, pair: &LabelPair) -> bool {
        self.models.read().contains_key(pair)
    }

    /// Active games registered for `pair`, if its model is running.
    pub fn active_games(&self, pair: &LabelPair) -> Option<usize> {
        self.models.read().get(pair).map(|e| e.active_games)
    }

    /// Running label pairs in sorted order.
    pub fn running_pairs(&self) -> Vec<LabelPair> {
        let mut pairs: Vec<LabelPair> = self.models.read().keys().cloned().collect();
        pairs.sort();
        pairs
    }

    /// Probability of `target_class` for `canvas`.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::ModelNotFound`] if `pair` is not running
    /// and [`StrokeForgeError::InvalidInput`] if the canvas or class does
    /// not fit the model.
    pub fn score(&self, pair: &LabelPair, canvas: &Canvas, target_class: usize) -> Result<f64> {
        let model = self.model(pair)?;
        let mut model = lock(&model, pair);
        model.check_input(std::slice::from_ref(canvas), Some(target_class))?;
        let outputs = model.forward(std::slice::from_ref(canvas))?;
        outputs
            .first()
            .map(|o| o.probabilities[target_class])
            .ok_or_else(|| StrokeForgeError::InvalidInput("model returned no output".to_string()))
    }

    /// Raw scores and class probabilities for every canvas.
    pub fn infer(&self, pair: &LabelPair, canvases: &[Canvas]) -> Result<Vec<ModelOutput>> {
        let model = self.model(pair)?;
        let mut model = lock(&model, pair);
        model.forward(canvases)
    }

    /// Searches for the stroke that most raises `target_class`.
    ///
    /// Holds the pair's model for the whole search.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::ModelNotFound`] if `pair` is not running,
    /// [`StrokeForgeError::Config`] for a non-positive width or length and
    /// [`StrokeForgeError::InvalidInput`] if the query does not fit the model.
    pub fn find_stroke(&self, pair: &LabelPair, query: &StrokeQuery) -> Result<FoundStroke> {
        self.search(pair, query, None, |_| {})
    }

    /// Like [`find_stroke`](Self::find_stroke), stopping early when
    /// `cancel` fires.
    pub fn find_stroke_cancellable(
        &self,
        pair: &LabelPair,
        query: &StrokeQuery,
        cancel: CancellationToken,
    ) -> Result<FoundStroke> {
        self.search(pair, query, Some(cancel), |_| {})
    }

    /// Like [`find_stroke`](Self::find_stroke), streaming one
    /// [`SearchProgress`] per step through `sender`.
    pub fn find_stroke_with_progress(
        &self,
        pair: &LabelPair,
        query: &StrokeQuery,
        cancel: Option<CancellationToken>,
        sender: mpsc::UnboundedSender<SearchProgress>,
    ) -> Result<FoundStroke> {
        self.search(pair, query, cancel, |progress| {
            let _ = sender.send(progress.clone());
        })
    }

    /// [`score`](Self::score) on the blocking thread pool.
    pub async fn score_async(
        self: Arc<Self>,
        pair: LabelPair,
        canvas: Canvas,
        target_class: usize,
    ) -> Result<f64> {
        run_blocking(move || self.score(&pair, &canvas, target_class)).await
    }

    /// [`find_stroke`](Self::find_stroke) on the blocking thread pool.
    pub async fn find_stroke_async(
        self: Arc<Self>,
        pair: LabelPair,
        query: StrokeQuery,
        cancel: Option<CancellationToken>,
    ) -> Result<FoundStroke> {
        run_blocking(move || self.search(&pair, &query, cancel, |_| {})).await
    }

    fn search<F>(
        &self,
        pair: &LabelPair,
        query: &StrokeQuery,
        cancel: Option<CancellationToken>,
        on_step: F,
    ) -> Result<FoundStroke>
    where
        F: FnMut(&SearchProgress),
    {
        let search_config = self.config.search_for_width(query.stroke_width)?;
        let model = self.model(pair)?;
        let mut model = lock(&model, pair);

        let search = MultiStartSearch::new(search_config, model.canvas_shape())?;
        let request = StrokeRequest::new(&query.base, query.target_class, query.max_length);
        let result = search.run_with_listener(&mut **model, request, cancel, on_step)?;
        let polyline = result.polyline(
            self.config.polyline_points,
            search.config().arc_length_resolution,
        )?;
        Ok(FoundStroke { polyline, result })
    }

    fn model(&self, pair: &LabelPair) -> Result<SharedModel> {
        self.models
            .read()
            .get(pair)
            .map(|e| Arc::clone(&e.model))
            .ok_or_else(|| StrokeForgeError::ModelNotFound(pair.key()))
    }
}

fn lock<'a>(
    model: &'a SharedModel,
    pair: &LabelPair,
) -> parking_lot::MutexGuard<'a, Box<dyn ScoreModel>> {
    let start = Instant::now();
    let guard = model.lock();
    debug!(
        label_pair = %pair,
        waited_ms = start.elapsed().as_millis() as u64,
        "acquired model lock"
    );
    guard
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StrokeForgeError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests;
