//! Per-step progress snapshots.

use std::time::Duration;

/// Summary of one completed search step.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchProgress {
    /// 1-based step number.
    pub step: u64,
    /// Index of the best candidate of this step.
    pub best_index: usize,
    /// Best target-class probability of this step.
    pub best_score: f64,
    pub mean_score: f64,
    pub loss: f64,
    pub elapsed: Duration,
}
