//! Tests for the inference service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use strokeforge_config::SearchConfig;
use strokeforge_core::CanvasShape;
use strokeforge_test::{blank_canvas, corner_model, CORNER_CLASS};

use super::*;
use crate::loader::FnModelLoader;

const SHAPE: CanvasShape = CanvasShape::new(24, 24);

fn config() -> ServiceConfig {
    ServiceConfig::new().with_search(
        SearchConfig::new()
            .with_grid_size(2)
            .with_steps(5)
            .with_random_seed(3),
    )
}

fn service_with_counter() -> (InferenceService, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let loader = FnModelLoader::new(move |_: &LabelPair| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(corner_model(SHAPE)) as Box<dyn ScoreModel>)
    });
    (InferenceService::new(config(), loader).unwrap(), loads)
}

fn service() -> InferenceService {
    service_with_counter().0
}

fn pair() -> LabelPair {
    LabelPair::new("cat", "dog")
}

fn query() -> StrokeQuery {
    StrokeQuery::new(blank_canvas(SHAPE), CORNER_CLASS, 2.0, 10.0)
}

#[test]
fn test_rejects_invalid_config() {
    let loader = FnModelLoader::new(|_: &LabelPair| {
        Ok(Box::new(corner_model(SHAPE)) as Box<dyn ScoreModel>)
    });
    let err = InferenceService::new(config().with_polyline_points(1), loader).unwrap_err();
    assert!(matches!(err, StrokeForgeError::Config(_)));
}

#[test]
fn test_start_is_idempotent() {
    let (service, loads) = service_with_counter();
    assert!(service.start(&pair()).unwrap());
    assert!(!service.start(&LabelPair::new("dog", "cat")).unwrap());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(service.active_games(&pair()), Some(0));

    service.stop(&pair()).unwrap();
    assert!(!service.is_running(&pair()));
    assert!(service.stop(&pair()).unwrap_err().is_not_found());
}

#[test]
fn test_requests_for_unknown_pairs_are_not_found() {
    let service = service();
    let canvas = blank_canvas(SHAPE);

    let err = service.score(&pair(), &canvas, CORNER_CLASS).unwrap_err();
    assert!(matches!(&err, StrokeForgeError::ModelNotFound(key) if key == "cat-dog"));
    let err = service.infer(&pair(), &[canvas]).unwrap_err();
    assert!(err.is_not_found());
    let err = service.find_stroke(&pair(), &query()).unwrap_err();
    assert!(err.is_not_found());
    assert!(service.release(&pair()).unwrap_err().is_not_found());

    // Recoverable by starting the instance.
    service.start(&pair()).unwrap();
    let canvas = blank_canvas(SHAPE);
    assert!(service.score(&pair(), &canvas, CORNER_CLASS).is_ok());
}

#[test]
fn test_reference_counting() {
    let (service, loads) = service_with_counter();
    assert_eq!(service.acquire(&pair()).unwrap(), 1);
    assert_eq!(service.acquire(&pair()).unwrap(), 2);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    assert_eq!(service.release(&pair()).unwrap(), 1);
    assert!(service.is_running(&pair()));
    assert_eq!(service.release(&pair()).unwrap(), 0);
    assert!(!service.is_running(&pair()));

    assert_eq!(service.acquire(&pair()).unwrap(), 1);
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_scale_reconciles_running_models() {
    let (service, loads) = service_with_counter();
    let sea = LabelPair::new("fish", "boat");
    let sky = LabelPair::new("bird", "plane");
    service.start(&pair()).unwrap();

    service
        .scale([(sea.clone(), 2), (sky.clone(), 0), (pair(), 1)])
        .unwrap();
    assert_eq!(service.running_pairs(), vec![sea.clone(), pair()]);
    assert_eq!(service.active_games(&sea), Some(2));
    assert_eq!(service.active_games(&pair()), Some(1));
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    service.scale([(sky.clone(), 1)]).unwrap();
    assert_eq!(service.running_pairs(), vec![sky]);

    service.scale(Vec::new()).unwrap();
    assert!(service.running_pairs().is_empty());
}

#[test]
fn test_load_failure_registers_nothing() {
    let loader = FnModelLoader::new(|pair: &LabelPair| {
        Err(StrokeForgeError::ModelLoad(format!("no weights for {pair}")))
    });
    let service = InferenceService::new(config(), loader).unwrap();
    let err = service.acquire(&pair()).unwrap_err();
    assert!(matches!(err, StrokeForgeError::ModelLoad(_)));
    assert!(!service.is_running(&pair()));
    assert!(service.scale([(pair(), 1)]).is_err());
}

#[test]
fn test_score_matches_inference() {
    let service = service();
    service.start(&pair()).unwrap();
    let canvas = Canvas::from_fn(SHAPE, |y, x| if x + y < 6 { 1.0 } else { 0.0 });

    let score = service.score(&pair(), &canvas, CORNER_CLASS).unwrap();
    let outputs = service.infer(&pair(), &[blank_canvas(SHAPE), canvas]).unwrap();
    assert_eq!(outputs.len(), 2);
    let inferred = outputs[1].probabilities[CORNER_CLASS];
    assert!((inferred - score).abs() < 1e-12);
    assert!(score > outputs[0].probabilities[CORNER_CLASS]);
    for output in &outputs {
        let total: f64 = output.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(output.raw_scores.len(), 2);
    }
}

#[test]
fn test_score_rejects_bad_input() {
    let service = service();
    service.start(&pair()).unwrap();
    let err = service.score(&pair(), &blank_canvas(SHAPE), 2).unwrap_err();
    assert!(matches!(err, StrokeForgeError::InvalidInput(_)));
    let err = service
        .score(&pair(), &blank_canvas(CanvasShape::square(5)), CORNER_CLASS)
        .unwrap_err();
    assert!(matches!(err, StrokeForgeError::InvalidInput(_)));
}

#[test]
fn test_find_stroke_returns_polyline() {
    let service = service();
    service.acquire(&pair()).unwrap();

    let stroke = service.find_stroke(&pair(), &query()).unwrap();
    assert_eq!(stroke.polyline.len(), 20);
    assert!(stroke.polyline.iter().all(|p| p.is_in_unit_square()));
    assert!(stroke.score() > 0.0 && stroke.score() < 1.0);
    assert_eq!(stroke.result.statistics.step_count, 5);
    assert_eq!(stroke.result.statistics.candidate_count, 4);
}

#[test]
fn test_find_stroke_rejects_bad_queries() {
    let service = service();
    service.start(&pair()).unwrap();

    let mut bad_width = query();
    bad_width.stroke_width = 0.0;
    let err = service.find_stroke(&pair(), &bad_width).unwrap_err();
    assert!(matches!(err, StrokeForgeError::Config(_)));

    let mut bad_length = query();
    bad_length.max_length = -1.0;
    let err = service.find_stroke(&pair(), &bad_length).unwrap_err();
    assert!(matches!(err, StrokeForgeError::Config(_)));

    let mut bad_class = query();
    bad_class.target_class = 9;
    let err = service.find_stroke(&pair(), &bad_class).unwrap_err();
    assert!(matches!(err, StrokeForgeError::InvalidInput(_)));
}

#[test]
fn test_progress_and_cancellation() {
    let service = service();
    service.start(&pair()).unwrap();

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let stroke = service
        .find_stroke_with_progress(&pair(), &query(), None, sender)
        .unwrap();
    let mut steps = 0;
    while let Ok(progress) = receiver.try_recv() {
        steps += 1;
        assert_eq!(progress.step, steps);
    }
    assert_eq!(steps, stroke.result.statistics.step_count);

    let token = CancellationToken::new();
    token.cancel();
    let stroke = service
        .find_stroke_cancellable(&pair(), &query(), token)
        .unwrap();
    assert_eq!(stroke.result.statistics.step_count, 1);
    assert_eq!(stroke.polyline.len(), 20);
}

#[test]
fn test_concurrent_requests_share_one_model() {
    let (service, loads) = service_with_counter();
    service.start(&pair()).unwrap();
    let canvas = blank_canvas(SHAPE);

    let expected = service.score(&pair(), &canvas, CORNER_CLASS).unwrap();
    thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| service.score(&pair(), &canvas, CORNER_CLASS).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stopping_does_not_interrupt_running_search() {
    let service = Arc::new(InferenceService::new(
        ServiceConfig::new().with_search(SearchConfig::new().with_grid_size(2).with_steps(100_000)),
        FnModelLoader::new(|_: &LabelPair| {
            Ok(Box::new(corner_model(SHAPE)) as Box<dyn ScoreModel>)
        }),
    )
    .unwrap());
    service.start(&pair()).unwrap();
    let token = CancellationToken::new();
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let search = {
        let service = Arc::clone(&service);
        let token = token.clone();
        thread::spawn(move || {
            service.find_stroke_with_progress(&pair(), &query(), Some(token), sender)
        })
    };

    // The search holds the model once it reports a step.
    assert!(receiver.blocking_recv().is_some());
    service.stop(&pair()).unwrap();
    assert!(!service.is_running(&pair()));
    token.cancel();

    let stroke = search.join().unwrap().unwrap();
    assert_eq!(stroke.polyline.len(), 20);
    assert!(stroke.result.statistics.step_count < 100_000);
}

#[tokio::test]
async fn test_async_wrappers() {
    let service = Arc::new(service());
    service.acquire(&pair()).unwrap();

    let score = Arc::clone(&service)
        .score_async(pair(), blank_canvas(SHAPE), CORNER_CLASS)
        .await
        .unwrap();
    assert!(score > 0.0 && score < 1.0);

    let stroke = Arc::clone(&service)
        .find_stroke_async(pair(), query(), None)
        .await
        .unwrap();
    assert_eq!(stroke.polyline.len(), 20);

    let err = Arc::clone(&service)
        .score_async(LabelPair::new("x", "y"), blank_canvas(SHAPE), 0)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_async_searches_for_different_pairs_run_together() {
    let service = Arc::new(service());
    let other = LabelPair::new("sun", "moon");
    service.acquire(&pair()).unwrap();
    service.acquire(&other).unwrap();

    let (a, b) = tokio::join!(
        Arc::clone(&service).find_stroke_async(pair(), query(), None),
        Arc::clone(&service).find_stroke_async(other, query(), None),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    // Same seed, same model: identical results.
    assert_eq!(a.result.control_points, b.result.control_points);
}
