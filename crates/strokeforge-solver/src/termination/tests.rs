//! Tests for termination conditions.

use std::thread;
use std::time::Duration;

use super::*;

#[test]
fn test_step_count_termination() {
    let mut scope = SearchScope::with_seed(0);
    let term = StepCountTermination::new(3);

    assert!(!term.is_terminated(&scope));
    scope.increment_step_count();
    scope.increment_step_count();
    assert!(!term.is_terminated(&scope));
    scope.increment_step_count();
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_time_termination_needs_started_scope() {
    let mut scope = SearchScope::with_seed(0);
    let term = TimeTermination::millis(0);
    assert!(!term.is_terminated(&scope));

    scope.start_search();
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_time_termination_waits_for_limit() {
    let mut scope = SearchScope::with_seed(0);
    scope.start_search();
    let term = TimeTermination::millis(20);
    assert!(!term.is_terminated(&scope));
    thread::sleep(Duration::from_millis(30));
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_external_termination() {
    let scope = SearchScope::with_seed(0);
    let token = CancellationToken::new();
    let term = ExternalTermination::new(token.clone());

    assert!(!term.is_terminated(&scope));
    token.cancel();
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_cancellation_across_threads() {
    let token = CancellationToken::new();
    let remote = token.clone();
    thread::spawn(move || remote.cancel()).join().unwrap();
    assert!(token.is_cancelled());
}

#[test]
fn test_or_termination() {
    let mut scope = SearchScope::with_seed(0);
    let token = CancellationToken::new();
    let term = OrTermination::new((
        StepCountTermination::new(2),
        ExternalTermination::new(token.clone()),
    ));

    assert!(!term.is_terminated(&scope));
    token.cancel();
    assert!(term.is_terminated(&scope));

    let term = OrTermination::new((
        StepCountTermination::new(1),
        ExternalTermination::new(CancellationToken::new()),
    ));
    scope.increment_step_count();
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_optional_termination() {
    let mut scope = SearchScope::with_seed(0);
    scope.increment_step_count();

    let absent: Option<StepCountTermination> = None;
    assert!(!absent.is_terminated(&scope));
    assert!(Some(StepCountTermination::new(1)).is_terminated(&scope));
}
