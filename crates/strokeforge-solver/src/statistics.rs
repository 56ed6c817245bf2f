//! Search statistics collection.
//!
//! Tracks step counts, timing and the progression of the best score
//! during a search.

use std::time::{Duration, Instant};

/// Record of a best-score improvement.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreImprovement {
    /// Time since the search started.
    pub time_offset: Duration,
    /// Step (1-based) at which the improvement was seen.
    pub step: u64,
    pub score: f64,
}

/// Complete statistics for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStatistics {
    pub candidate_count: usize,
    pub step_count: u64,
    pub duration: Duration,
    /// Best-so-far improvements, in order.
    pub score_history: Vec<ScoreImprovement>,
    /// Mean candidate score of the last step.
    pub final_mean_score: f64,
    /// Loss of the last step.
    pub final_loss: f64,
}

impl SearchStatistics {
    /// Best score ever observed (last in history, or None).
    pub fn best_score(&self) -> Option<f64> {
        self.score_history.last().map(|s| s.score)
    }

    pub fn improvement_count(&self) -> usize {
        self.score_history.len()
    }

    /// Average time per step.
    pub fn avg_time_per_step(&self) -> Duration {
        if self.step_count == 0 {
            Duration::ZERO
        } else {
            self.duration / self.step_count as u32
        }
    }
}

/// Collector for search statistics.
///
/// Owned by the running search; call `into_statistics()` when it ends.
#[derive(Debug)]
pub struct StatisticsCollector {
    start_time: Instant,
    candidate_count: usize,
    step_count: u64,
    score_history: Vec<ScoreImprovement>,
    last_mean_score: f64,
    last_loss: f64,
}

impl StatisticsCollector {
    /// Creates a collector; the start time is recorded now.
    pub fn new(candidate_count: usize) -> Self {
        Self {
            start_time: Instant::now(),
            candidate_count,
            step_count: 0,
            score_history: Vec::new(),
            last_mean_score: 0.0,
            last_loss: 0.0,
        }
    }

    /// Records one completed step and its best score.
    ///
    /// Appends to the score history when `best_score` beats every earlier
    /// step.
    pub fn record_step(&mut self, best_score: f64, mean_score: f64, loss: f64) {
        self.step_count += 1;
        self.last_mean_score = mean_score;
        self.last_loss = loss;
        let improved = self
            .score_history
            .last()
            .map_or(true, |last| best_score > last.score);
        if improved {
            self.score_history.push(ScoreImprovement {
                time_offset: self.start_time.elapsed(),
                step: self.step_count,
                score: best_score,
            });
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn current_step_count(&self) -> u64 {
        self.step_count
    }

    pub fn into_statistics(self) -> SearchStatistics {
        SearchStatistics {
            candidate_count: self.candidate_count,
            step_count: self.step_count,
            duration: self.start_time.elapsed(),
            score_history: self.score_history,
            final_mean_score: self.last_mean_score,
            final_loss: self.last_loss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_keeps_only_improvements() {
        let mut collector = StatisticsCollector::new(4);
        collector.record_step(0.2, 0.1, 0.8);
        collector.record_step(0.1, 0.1, 0.8);
        collector.record_step(0.5, 0.3, 0.5);
        collector.record_step(0.5, 0.3, 0.5);

        let stats = collector.into_statistics();
        assert_eq!(stats.candidate_count, 4);
        assert_eq!(stats.step_count, 4);
        assert_eq!(stats.improvement_count(), 2);
        assert_eq!(stats.best_score(), Some(0.5));
        assert_eq!(stats.score_history[1].step, 3);
        assert_eq!(stats.final_mean_score, 0.3);
        assert_eq!(stats.final_loss, 0.5);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = StatisticsCollector::new(1).into_statistics();
        assert_eq!(stats.best_score(), None);
        assert_eq!(stats.avg_time_per_step(), Duration::ZERO);
    }
}
