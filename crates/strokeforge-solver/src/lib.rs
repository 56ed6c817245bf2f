//! StrokeForge Solver Engine
//!
//! This crate provides the stroke search:
//! - [`MultiStartSearch`] - grid seeding, budgets and winner selection
//! - [`ConstrainedStrokeOptimizer`] - the projected-gradient episode
//! - Optimizers (SGD, Adam, Adamax)
//! - Projection onto the length and endpoint constraints
//! - The score-driven width / anti-aliasing schedule
//! - Termination conditions and cancellation
//! - Statistics and progress reporting

pub mod candidate;
pub mod episode;
pub mod optimizer;
pub mod progress;
pub mod projection;
pub mod result;
pub mod schedule;
pub mod scope;
pub mod search;
pub mod statistics;
pub mod termination;

pub use candidate::{centroid, StrokeCandidate};
pub use episode::{ConstrainedStrokeOptimizer, EpisodeOutcome, SelectedCandidate, TARGET_SCORE};
pub use optimizer::{build_optimizer, Adam, Adamax, Optimizer, Sgd};
pub use progress::SearchProgress;
pub use projection::{ProjectionOutcome, StrokeProjection, LENGTH_TOLERANCE};
pub use result::SearchResult;
pub use schedule::RenderSchedule;
pub use scope::SearchScope;
pub use search::{MultiStartSearch, StrokeRequest};
pub use statistics::{ScoreImprovement, SearchStatistics, StatisticsCollector};
pub use termination::{
    CancellationToken, ExternalTermination, OrTermination, StepCountTermination, Termination,
    TimeTermination,
};
