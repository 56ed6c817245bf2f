//! Wall-clock budget.

use std::time::Duration;

use super::Termination;
use crate::scope::SearchScope;

/// Stops once the search has run for `limit`.
///
/// The clock starts at [`SearchScope::start_search`]; a scope that was never
/// started has spent no time.
///
/// # Example
///
/// ```
/// use std::thread;
/// use std::time::Duration;
/// use strokeforge_solver::termination::{Termination, TimeTermination};
/// use strokeforge_solver::SearchScope;
///
/// let budget = TimeTermination::millis(5);
/// let mut scope = SearchScope::with_seed(1);
/// assert!(!budget.is_terminated(&scope));
///
/// scope.start_search();
/// thread::sleep(Duration::from_millis(10));
/// assert!(budget.is_terminated(&scope));
/// ```
#[derive(Debug, Clone)]
pub struct TimeTermination {
    limit: Duration,
}

impl TimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl Termination for TimeTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.elapsed().is_some_and(|spent| spent >= self.limit)
    }
}
