//! Budgets combined with OR: the search stops at the first one spent.

use super::Termination;
use crate::scope::SearchScope;

/// Stops as soon as any member of the tuple does.
///
/// Members may be `Option`s, so a budget that was not configured simply
/// never fires.
///
/// # Examples
///
/// ```
/// use strokeforge_solver::termination::{
///     CancellationToken, ExternalTermination, OrTermination, StepCountTermination, Termination,
///     TimeTermination,
/// };
/// use strokeforge_solver::SearchScope;
///
/// let token = CancellationToken::new();
/// let budget = OrTermination::new((
///     StepCountTermination::new(250),
///     None::<TimeTermination>,
///     Some(ExternalTermination::new(token.clone())),
/// ));
///
/// let mut scope = SearchScope::with_seed(7);
/// scope.start_search();
/// scope.increment_step_count();
/// assert!(!budget.is_terminated(&scope));
///
/// // A caller cancel ends the search long before step 250.
/// token.cancel();
/// assert!(budget.is_terminated(&scope));
/// ```
#[derive(Debug)]
pub struct OrTermination<T>(pub T);

impl<T> OrTermination<T> {
    pub fn new(budgets: T) -> Self {
        Self(budgets)
    }
}

macro_rules! impl_or_termination {
    ($($idx:tt: $T:ident),+) => {
        impl<$($T),+> Termination for OrTermination<($($T,)+)>
        where
            $($T: Termination,)+
        {
            fn is_terminated(&self, scope: &SearchScope) -> bool {
                $((self.0).$idx.is_terminated(scope))||+
            }
        }
    };
}

impl_or_termination!(0: T0, 1: T1);
impl_or_termination!(0: T0, 1: T1, 2: T2);
