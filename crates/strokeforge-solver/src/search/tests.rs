//! Tests for the multi-start grid search.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strokeforge_config::SelectionPolicy;
use strokeforge_core::{BezierCurve, SampleMode};
use strokeforge_test::{blank_canvas, corner_model, quick_config, seeded_config, CORNER_CLASS};

use super::*;
use crate::projection::LENGTH_TOLERANCE;

const SHAPE: CanvasShape = CanvasShape::new(50, 50);

fn curve_centroid(points: &[Point]) -> Point {
    let curve = BezierCurve::new(points.iter().copied(), 20).unwrap();
    crate::candidate::centroid(&curve.sample_uniform(20, SampleMode::Direct))
}

#[test]
fn test_rejects_invalid_config() {
    let err = MultiStartSearch::new(SearchConfig::new().with_grid_size(0), SHAPE).unwrap_err();
    assert!(matches!(err, StrokeForgeError::Config(_)));

    let err = MultiStartSearch::new(SearchConfig::new(), CanvasShape::new(0, 10)).unwrap_err();
    assert!(matches!(err, StrokeForgeError::Config(_)));
}

#[test]
fn test_seeds_lie_in_their_cells() {
    let search = MultiStartSearch::new(SearchConfig::new().with_grid_size(3), SHAPE).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let candidates = search.seed_candidates(&mut rng);
    assert_eq!(candidates.len(), 9);

    for (i, candidate) in candidates.iter().enumerate() {
        let (row, column) = ((i / 3) as f64, (i % 3) as f64);
        assert_eq!(candidate.control_points.len(), 4);
        assert_eq!(candidate.score, 0.0);
        assert_eq!(candidate.style.width, 10.0);
        for p in &candidate.control_points {
            assert!(p.x >= column / 3.0 && p.x < (column + 1.0) / 3.0, "{i}: {p:?}");
            assert!(p.y >= row / 3.0 && p.y < (row + 1.0) / 3.0, "{i}: {p:?}");
        }
    }
}

#[test]
fn test_seeded_search_is_deterministic() {
    let search = MultiStartSearch::new(seeded_config(7).with_steps(15), SHAPE).unwrap();
    let base = blank_canvas(SHAPE);
    let run = || {
        let mut model = corner_model(SHAPE);
        search
            .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 15.0))
            .unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.winning_index, second.winning_index);
    assert_eq!(first.score, second.score);
    assert_eq!(first.control_points, second.control_points);
    assert_eq!(first.seed_points, second.seed_points);
    assert_eq!(
        first.statistics.final_mean_score,
        second.statistics.final_mean_score
    );
}

#[test]
fn test_different_seeds_differ() {
    let base = blank_canvas(SHAPE);
    let run = |seed| {
        let search = MultiStartSearch::new(quick_config(seed), SHAPE).unwrap();
        let mut model = corner_model(SHAPE);
        search
            .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 15.0))
            .unwrap()
    };
    assert_ne!(run(1).seed_points, run(2).seed_points);
}

#[test]
fn test_winner_moves_towards_the_rewarded_corner() {
    let base = blank_canvas(SHAPE);
    let mut improved = 0;
    for seed in 0..5 {
        let config = seeded_config(seed)
            .with_grid_size(3)
            .with_control_points(4)
            .with_steps(50);
        let search = MultiStartSearch::new(config, SHAPE).unwrap();
        let mut model = corner_model(SHAPE);
        let result = search
            .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 15.0))
            .unwrap();

        let start = curve_centroid(&result.seed_points).length();
        let end = curve_centroid(&result.control_points).length();
        if end < start {
            improved += 1;
        }
    }
    assert!(improved >= 3, "only {improved} of 5 searches moved towards the corner");
}

#[test]
fn test_result_respects_constraints() {
    let search = MultiStartSearch::new(quick_config(3), SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let result = search
        .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 10.0))
        .unwrap();

    let projection = StrokeProjection::new(SHAPE, 10.0, 20).unwrap();
    let length = projection.pixel_length(&result.control_points).unwrap();
    assert!(length <= 10.0 * (1.0 + LENGTH_TOLERANCE));
    assert!(result.control_points[0].is_in_unit_square());
    assert!(result.control_points[3].is_in_unit_square());

    let polyline = result.polyline(20, 20).unwrap();
    assert_eq!(polyline.len(), 20);
    assert!(polyline.iter().all(|p| p.is_in_unit_square()));
}

#[test]
fn test_final_step_policy_reports_last_step() {
    let search = MultiStartSearch::new(quick_config(5), SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let result = search
        .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 15.0))
        .unwrap();
    assert_eq!(result.statistics.step_count, 10);
    assert_eq!(result.step, 10);
    assert_eq!(result.statistics.candidate_count, 4);
}

#[test]
fn test_best_ever_policy_reports_best_score() {
    let config = quick_config(5).with_selection(SelectionPolicy::BestEver);
    let search = MultiStartSearch::new(config, SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let result = search
        .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 15.0))
        .unwrap();
    assert_eq!(Some(result.score), result.statistics.best_score());
}

#[test]
fn test_progress_is_streamed_per_step() {
    let search = MultiStartSearch::new(quick_config(9), SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let result = search
        .run_with_channel(
            &mut model,
            StrokeRequest::new(&base, CORNER_CLASS, 15.0),
            None,
            sender,
        )
        .unwrap();

    let mut steps = Vec::new();
    while let Ok(progress) = receiver.try_recv() {
        assert!((0.0..=1.0).contains(&progress.best_score));
        steps.push(progress.step);
    }
    assert_eq!(steps, (1..=10).collect::<Vec<u64>>());
    assert_eq!(result.statistics.step_count, 10);
}

#[test]
fn test_closed_receiver_does_not_stop_the_search() {
    let search = MultiStartSearch::new(quick_config(9), SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let (sender, receiver) = mpsc::unbounded_channel();
    drop(receiver);

    let result = search
        .run_with_channel(
            &mut model,
            StrokeRequest::new(&base, CORNER_CLASS, 15.0),
            None,
            sender,
        )
        .unwrap();
    assert_eq!(result.statistics.step_count, 10);
}

#[test]
fn test_cancelled_search_returns_after_one_step() {
    let search = MultiStartSearch::new(seeded_config(1).with_steps(1_000), SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let token = CancellationToken::new();
    token.cancel();

    let result = search
        .run_with_listener(
            &mut model,
            StrokeRequest::new(&base, CORNER_CLASS, 15.0),
            Some(token),
            |_| {},
        )
        .unwrap();
    assert_eq!(result.statistics.step_count, 1);
    assert!(result.winning_index < 9);
}

#[test]
fn test_cancel_mid_search() {
    let search = MultiStartSearch::new(seeded_config(1).with_steps(1_000), SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let token = CancellationToken::new();
    let handle = token.clone();

    let result = search
        .run_with_listener(
            &mut model,
            StrokeRequest::new(&base, CORNER_CLASS, 15.0),
            Some(token),
            |progress| {
                if progress.step == 3 {
                    handle.cancel();
                }
            },
        )
        .unwrap();
    assert_eq!(result.statistics.step_count, 3);
}

#[test]
fn test_time_limit_stops_the_search() {
    let config = seeded_config(1)
        .with_steps(1_000_000)
        .with_termination_millis(20);
    let search = MultiStartSearch::new(config, SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let result = search
        .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 15.0))
        .unwrap();
    assert!(result.statistics.step_count >= 1);
    assert!(result.statistics.step_count < 1_000_000);
}

#[test]
fn test_huge_time_limit_leaves_the_step_budget_in_charge() {
    let mut config = seeded_config(1).with_steps(4);
    config.termination.seconds_spent_limit = Some(18_446_744_073_709_552);
    let search = MultiStartSearch::new(config, SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);
    let result = search
        .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 15.0))
        .unwrap();
    assert_eq!(result.statistics.step_count, 4);
}

#[test]
fn test_rejects_overflowing_time_limit() {
    let mut config = seeded_config(1);
    config.termination.seconds_spent_limit = Some(u64::MAX);
    config.termination.millis_spent_limit = Some(1000);
    let err = MultiStartSearch::new(config, SHAPE).unwrap_err();
    assert!(matches!(err, StrokeForgeError::Config(_)));
}

#[test]
fn test_rejects_invalid_requests() {
    let search = MultiStartSearch::new(quick_config(1), SHAPE).unwrap();
    let mut model = corner_model(SHAPE);
    let base = blank_canvas(SHAPE);

    let err = search
        .run(&mut model, StrokeRequest::new(&base, CORNER_CLASS, 0.0))
        .unwrap_err();
    assert!(matches!(err, StrokeForgeError::Config(_)));

    let err = search
        .run(&mut model, StrokeRequest::new(&base, 2, 15.0))
        .unwrap_err();
    assert!(matches!(err, StrokeForgeError::InvalidInput(_)));

    let small = blank_canvas(CanvasShape::square(10));
    let err = search
        .run(&mut model, StrokeRequest::new(&small, CORNER_CLASS, 15.0))
        .unwrap_err();
    assert!(matches!(err, StrokeForgeError::InvalidInput(_)));
}

#[test]
fn test_runs_on_boxed_models() {
    let search = MultiStartSearch::new(quick_config(2), SHAPE).unwrap();
    let mut model: Box<dyn ScoreModel> = Box::new(corner_model(SHAPE));
    let base = blank_canvas(SHAPE);
    let result = search
        .run(
            model.as_mut(),
            StrokeRequest::new(&base, CORNER_CLASS, 15.0),
        )
        .unwrap();
    assert!(result.score > 0.0 && result.score < 1.0);
}
