//! External termination via a shared cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::Termination;
use crate::scope::SearchScope;

/// Shared flag a caller sets to stop a running search.
///
/// Clones share the flag. A cancelled search still returns the best
/// candidate it found so far.
///
/// # Example
///
/// ```
/// use strokeforge_solver::termination::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Terminates once its token is cancelled.
#[derive(Debug, Clone)]
pub struct ExternalTermination {
    token: CancellationToken,
}

impl ExternalTermination {
    /// Creates a termination that checks the given token.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Termination for ExternalTermination {
    fn is_terminated(&self, _scope: &SearchScope) -> bool {
        self.token.is_cancelled()
    }
}
