//! Multi-start grid search.
//!
//! The canvas is split into a `G × G` grid and one candidate is seeded per
//! cell, its control points placed uniformly at random inside that cell.
//! All `G²` candidates then run through one batched episode and the
//! selection policy picks the winner.
//!
//! Logging levels:
//! - **INFO**: search start/end with candidate count, best score and timing
//! - **DEBUG**: individual steps with best and mean score
//! - **TRACE**: per-candidate projection details

use rand::Rng;
use strokeforge_config::SearchConfig;
use strokeforge_core::{Canvas, CanvasShape, Point, Result, StrokeForgeError};
use strokeforge_raster::CurveRasterizer;
use strokeforge_scoring::ScoreModel;
use tokio::sync::mpsc;
use tracing::info;

use crate::candidate::StrokeCandidate;
use crate::episode::ConstrainedStrokeOptimizer;
use crate::progress::SearchProgress;
use crate::projection::StrokeProjection;
use crate::result::SearchResult;
use crate::schedule::RenderSchedule;
use crate::scope::SearchScope;
use crate::termination::{
    CancellationToken, ExternalTermination, OrTermination, StepCountTermination, TimeTermination,
};

/// What to search for.
#[derive(Debug, Clone, Copy)]
pub struct StrokeRequest<'a> {
    /// Canvas the stroke is drawn onto.
    pub base: &'a Canvas,
    /// Class whose probability the stroke should maximize.
    pub target_class: usize,
    /// Maximum arc length in pixels.
    pub max_length: f64,
}

impl<'a> StrokeRequest<'a> {
    pub fn new(base: &'a Canvas, target_class: usize, max_length: f64) -> Self {
        Self {
            base,
            target_class,
            max_length,
        }
    }
}

/// Seeds a grid of candidates and optimizes them together.
///
/// # Example
///
/// ```
/// use strokeforge_config::SearchConfig;
/// use strokeforge_core::{Canvas, CanvasShape};
/// use strokeforge_scoring::LinearSoftmaxModel;
/// use strokeforge_solver::{MultiStartSearch, StrokeRequest};
///
/// let shape = CanvasShape::square(16);
/// let mut model = LinearSoftmaxModel::from_fn(shape, 2, |class, _, _| {
///     if class == 0 { 0.05 } else { 0.0 }
/// }).unwrap();
///
/// let config = SearchConfig::new().with_grid_size(2).with_steps(5).with_random_seed(1);
/// let search = MultiStartSearch::new(config, shape).unwrap();
/// let base = Canvas::new(shape);
/// let result = search.run(&mut model, StrokeRequest::new(&base, 0, 8.0)).unwrap();
///
/// assert!(result.winning_index < 4);
/// assert_eq!(result.polyline(20, 20).unwrap().len(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct MultiStartSearch {
    config: SearchConfig,
    shape: CanvasShape,
    rasterizer: CurveRasterizer,
}

impl MultiStartSearch {
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] if the configuration fails
    /// validation or the canvas shape is empty.
    pub fn new(config: SearchConfig, shape: CanvasShape) -> Result<Self> {
        config.validate()?;
        let rasterizer = CurveRasterizer::new(shape, config.sample_count)?
            .with_sample_mode(config.sample_method.into())
            .with_resolution(config.arc_length_resolution)?;
        Ok(Self {
            config,
            shape,
            rasterizer,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn shape(&self) -> CanvasShape {
        self.shape
    }

    /// One candidate per grid cell, row-major.
    ///
    /// Candidate `row * G + column` has every control point inside cell
    /// `(row, column)`, starting at the widest, softest style.
    pub fn seed_candidates<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<StrokeCandidate> {
        let grid = self.config.grid_size;
        let cell = 1.0 / grid as f64;
        let style = RenderSchedule::from_config(&self.config).style_for(0.0);

        let mut candidates = Vec::with_capacity(self.config.candidate_count());
        for row in 0..grid {
            for column in 0..grid {
                let points = (0..self.config.num_control_points)
                    .map(|_| {
                        let x: f64 = rng.random();
                        let y: f64 = rng.random();
                        Point::new((x + column as f64) * cell, (y + row as f64) * cell)
                    })
                    .collect();
                candidates.push(StrokeCandidate::new(points, style));
            }
        }
        candidates
    }

    /// Runs a full search under the configured budget.
    pub fn run<M>(&self, model: &mut M, request: StrokeRequest<'_>) -> Result<SearchResult>
    where
        M: ScoreModel + ?Sized,
    {
        self.run_with_listener(model, request, None, |_| {})
    }

    /// Runs a search that also stops when `cancel` fires, streaming a
    /// progress snapshot per step through `sender`.
    ///
    /// A closed receiver does not stop the search.
    pub fn run_with_channel<M>(
        &self,
        model: &mut M,
        request: StrokeRequest<'_>,
        cancel: Option<CancellationToken>,
        sender: mpsc::UnboundedSender<SearchProgress>,
    ) -> Result<SearchResult>
    where
        M: ScoreModel + ?Sized,
    {
        self.run_with_listener(model, request, cancel, |progress| {
            let _ = sender.send(progress.clone());
        })
    }

    /// Runs a search, calling `on_step` after every step.
    ///
    /// The search stops at the step budget, the time limit, or when
    /// `cancel` fires, whichever comes first; it always completes at least
    /// one step and returns its selected candidate.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] for a non-positive `max_length`,
    /// [`StrokeForgeError::InvalidInput`] if the base canvas or target class
    /// does not fit the model, and propagates model errors.
    pub fn run_with_listener<M, F>(
        &self,
        model: &mut M,
        request: StrokeRequest<'_>,
        cancel: Option<CancellationToken>,
        on_step: F,
    ) -> Result<SearchResult>
    where
        M: ScoreModel + ?Sized,
        F: FnMut(&SearchProgress),
    {
        let StrokeRequest {
            base,
            target_class,
            max_length,
        } = request;
        if base.shape() != self.shape {
            return Err(StrokeForgeError::InvalidInput(format!(
                "base canvas is {}x{}, search is configured for {}x{}",
                base.height(),
                base.width(),
                self.shape.height,
                self.shape.width
            )));
        }
        model.check_input(std::slice::from_ref(base), Some(target_class))?;

        let projection =
            StrokeProjection::new(self.shape, max_length, self.config.arc_length_resolution)?;
        let optimizer = ConstrainedStrokeOptimizer::new(
            self.rasterizer.clone(),
            RenderSchedule::from_config(&self.config),
            projection,
            self.config.optimizer.clone(),
            self.config.selection,
        );
        let termination = OrTermination::new((
            StepCountTermination::new(self.config.termination.step_count_limit),
            self.config.time_limit().map(TimeTermination::new),
            cancel.map(ExternalTermination::new),
        ));

        let mut scope = SearchScope::from_seed(self.config.random_seed);
        let candidates = self.seed_candidates(scope.rng());
        let seeds: Vec<Vec<Point>> = candidates
            .iter()
            .map(|c| c.control_points.clone())
            .collect();

        info!(
            event = "search_start",
            candidates = candidates.len(),
            control_points = self.config.num_control_points,
            step_limit = self.config.termination.step_count_limit,
            target_class,
            max_length,
        );
        scope.start_search();

        let outcome = optimizer.run(
            model,
            base,
            target_class,
            candidates,
            &mut scope,
            &termination,
            on_step,
        )?;

        let selected = outcome.selected;
        info!(
            event = "search_end",
            best_score = selected.score,
            winning_index = selected.index,
            steps = outcome.statistics.step_count,
            elapsed_ms = outcome.statistics.duration.as_millis() as u64,
        );

        Ok(SearchResult {
            score: selected.score,
            seed_points: seeds[selected.index].clone(),
            control_points: selected.control_points,
            winning_index: selected.index,
            step: selected.step,
            statistics: outcome.statistics,
        })
    }
}

#[cfg(test)]
mod tests;
