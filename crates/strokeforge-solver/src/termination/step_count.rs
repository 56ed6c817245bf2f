//! Optimization step budget.

use super::Termination;
use crate::scope::SearchScope;

/// Stops after `limit` optimization steps over the whole candidate batch.
///
/// # Example
///
/// ```
/// use strokeforge_solver::termination::{StepCountTermination, Termination};
/// use strokeforge_solver::SearchScope;
///
/// let budget = StepCountTermination::new(2);
/// let mut scope = SearchScope::with_seed(3);
///
/// scope.increment_step_count();
/// assert!(!budget.is_terminated(&scope));
/// scope.increment_step_count();
/// assert!(budget.is_terminated(&scope));
/// ```
#[derive(Debug, Clone)]
pub struct StepCountTermination {
    limit: u64,
}

impl StepCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Termination for StepCountTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.total_step_count() >= self.limit
    }
}
