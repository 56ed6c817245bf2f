//! One optimization episode over a batch of candidate strokes.
//!
//! Each step renders every candidate onto the base canvas, scores the
//! composites, pulls the scores towards 1 under a squared-error loss,
//! back-propagates through the model and the rasterizer, applies one
//! optimizer update and projects the candidates back onto the feasible
//! set. Steps are strictly sequential; candidates within a step are
//! independent.

use rayon::prelude::*;
use strokeforge_config::{OptimizerConfig, SelectionPolicy};
use strokeforge_core::{Canvas, Point, Result, StrokeForgeError};
use strokeforge_raster::CurveRasterizer;
use strokeforge_scoring::{mse_loss, ScoreModel};
use tracing::debug;

use crate::candidate::{flatten, unflatten, StrokeCandidate};
use crate::optimizer::{build_optimizer, Optimizer};
use crate::progress::SearchProgress;
use crate::projection::StrokeProjection;
use crate::schedule::RenderSchedule;
use crate::scope::SearchScope;
use crate::statistics::{SearchStatistics, StatisticsCollector};
use crate::termination::Termination;

/// Score every candidate is pulled towards.
pub const TARGET_SCORE: f64 = 1.0;

/// Candidate chosen by the selection policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCandidate {
    pub index: usize,
    pub score: f64,
    /// Control points that were rendered to produce `score`.
    pub control_points: Vec<Point>,
    /// 1-based step.
    pub step: u64,
}

/// Result of [`ConstrainedStrokeOptimizer::run`].
#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    pub selected: SelectedCandidate,
    /// Candidates as they stand after the last projection.
    pub candidates: Vec<StrokeCandidate>,
    pub statistics: SearchStatistics,
}

/// Scores and gradients of one step.
#[derive(Debug)]
struct StepReport {
    rendered: Vec<Vec<Point>>,
    scores: Vec<f64>,
    loss: f64,
}

/// Projected-gradient optimizer for a batch of strokes.
#[derive(Debug, Clone)]
pub struct ConstrainedStrokeOptimizer {
    rasterizer: CurveRasterizer,
    schedule: RenderSchedule,
    projection: StrokeProjection,
    optimizer: OptimizerConfig,
    selection: SelectionPolicy,
}

impl ConstrainedStrokeOptimizer {
    pub fn new(
        rasterizer: CurveRasterizer,
        schedule: RenderSchedule,
        projection: StrokeProjection,
        optimizer: OptimizerConfig,
        selection: SelectionPolicy,
    ) -> Self {
        Self {
            rasterizer,
            schedule,
            projection,
            optimizer,
            selection,
        }
    }

    pub fn projection(&self) -> &StrokeProjection {
        &self.projection
    }

    /// Runs steps until `termination` fires, always at least one.
    ///
    /// Candidates are projected before the first step so every rendered
    /// stroke is feasible. `on_step` sees a snapshot after every step.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::InvalidInput`] for an empty batch or a
    /// base canvas whose shape differs from the rasterizer's, and
    /// propagates model errors.
    #[allow(clippy::too_many_arguments)]
    pub fn run<M, T, F>(
        &self,
        model: &mut M,
        base: &Canvas,
        target_class: usize,
        mut candidates: Vec<StrokeCandidate>,
        scope: &mut SearchScope,
        termination: &T,
        mut on_step: F,
    ) -> Result<EpisodeOutcome>
    where
        M: ScoreModel + ?Sized,
        T: Termination,
        F: FnMut(&SearchProgress),
    {
        if candidates.is_empty() {
            return Err(StrokeForgeError::InvalidInput(
                "an episode needs at least one candidate".to_string(),
            ));
        }
        if base.shape() != self.rasterizer.shape() {
            return Err(StrokeForgeError::InvalidInput(format!(
                "base canvas is {}x{}, rasterizer renders {}x{}",
                base.height(),
                base.width(),
                self.rasterizer.shape().height,
                self.rasterizer.shape().width
            )));
        }

        for candidate in &mut candidates {
            self.projection
                .project(&mut candidate.control_points, scope.rng())?;
        }

        let parameter_count = flatten(&candidates).len();
        let mut optimizer = build_optimizer(&self.optimizer, parameter_count);
        let mut collector = StatisticsCollector::new(candidates.len());
        let mut selected: Option<SelectedCandidate> = None;

        loop {
            let report = self.step(
                model,
                base,
                target_class,
                &mut candidates,
                optimizer.as_mut(),
                scope,
            )?;
            let step = scope.increment_step_count();

            let (best_index, best_score) = argmax(&report.scores);
            let mean_score = report.scores.iter().sum::<f64>() / report.scores.len() as f64;
            collector.record_step(best_score, mean_score, report.loss);

            let replace = match (self.selection, &selected) {
                (SelectionPolicy::FinalStep, _) | (_, None) => true,
                (SelectionPolicy::BestEver, Some(current)) => best_score > current.score,
            };
            if replace {
                selected = Some(SelectedCandidate {
                    index: best_index,
                    score: best_score,
                    control_points: report.rendered[best_index].clone(),
                    step,
                });
            }

            debug!(
                event = "step",
                step,
                best_index,
                best_score,
                mean_score,
                loss = report.loss,
                optimizer = optimizer.name(),
            );
            on_step(&SearchProgress {
                step,
                best_index,
                best_score,
                mean_score,
                loss: report.loss,
                elapsed: collector.elapsed(),
            });

            if termination.is_terminated(scope) {
                break;
            }
        }

        let selected = selected.ok_or_else(|| {
            StrokeForgeError::InvalidInput("episode finished without a step".to_string())
        })?;
        Ok(EpisodeOutcome {
            selected,
            candidates,
            statistics: collector.into_statistics(),
        })
    }

    fn step<M>(
        &self,
        model: &mut M,
        base: &Canvas,
        target_class: usize,
        candidates: &mut [StrokeCandidate],
        optimizer: &mut dyn Optimizer,
        scope: &mut SearchScope,
    ) -> Result<StepReport>
    where
        M: ScoreModel + ?Sized,
    {
        // Schedule from the previous step's score.
        for candidate in candidates.iter_mut() {
            candidate.style = self.schedule.style_for(candidate.score);
        }
        let rendered: Vec<Vec<Point>> = candidates
            .iter()
            .map(|c| c.control_points.clone())
            .collect();
        let styles: Vec<_> = candidates.iter().map(|c| c.style).collect();
        let batch = self.rasterizer.render(&rendered, &styles)?;

        let composites = batch
            .strokes()
            .par_iter()
            .map(|stroke| base.composite(stroke.intensity()))
            .collect::<Result<Vec<_>>>()?;
        let outputs = model.score_with_gradient(&composites, target_class)?;
        let scores: Vec<f64> = outputs.iter().map(|o| o.score).collect();
        let loss = mse_loss(&scores, TARGET_SCORE);

        // ∂L/∂ink: chain the loss through the score and the compositing clamp.
        let intensity_gradients: Vec<Vec<f64>> = outputs
            .par_iter()
            .zip(batch.strokes().par_iter())
            .zip(loss.score_gradients.par_iter())
            .map(|((output, stroke), &dl_ds)| {
                base.as_slice()
                    .iter()
                    .zip(stroke.intensity())
                    .zip(&output.gradient)
                    .map(|((b, ink), ds_dx)| {
                        if b + ink < 1.0 {
                            dl_ds * ds_dx
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();
        let gradients = self.rasterizer.backward(&batch, &intensity_gradients)?;

        let mut params = flatten(candidates);
        let grads: Vec<f64> = gradients
            .iter()
            .flat_map(|g| g.control_points.iter().flat_map(|p| [p.x, p.y]))
            .collect();
        optimizer.step(&mut params, &grads);
        unflatten(candidates, &params);

        for (candidate, score) in candidates.iter_mut().zip(&scores) {
            self.projection
                .project(&mut candidate.control_points, scope.rng())?;
            candidate.score = *score;
        }

        Ok(StepReport {
            rendered,
            scores,
            loss: loss.loss,
        })
    }
}

/// Index and value of the largest score; the first wins ties.
fn argmax(scores: &[f64]) -> (usize, f64) {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, s)| {
            if s > best.1 {
                (i, s)
            } else {
                best
            }
        })
}
