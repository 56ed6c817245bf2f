//! Colorful console output for search and service events.
//!
//! Provides a custom `tracing` layer that formats StrokeForge events with
//! colors. Enabled by the `console` feature.

use std::io::{self, Write};
use std::sync::OnceLock;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "strokeforge_solver=info,strokeforge_service=info";

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. Does
/// nothing if another global subscriber is already installed.
pub fn init() {
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(StrokeConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats StrokeForge events with colors.
pub struct StrokeConsoleLayer;

impl<S: Subscriber> Layer<S> for StrokeConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();

        if !target.starts_with("strokeforge_") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(*metadata.level(), &visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    message: Option<String>,
    label_pair: Option<String>,
    candidates: Option<u64>,
    control_points: Option<u64>,
    step_limit: Option<u64>,
    target_class: Option<u64>,
    max_length: Option<f64>,
    step: Option<u64>,
    steps: Option<u64>,
    winning_index: Option<u64>,
    best_score: Option<f64>,
    mean_score: Option<f64>,
    elapsed_ms: Option<u64>,
    running: Option<u64>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        match field.name() {
            "message" => self.message = Some(s),
            "event" => self.event = Some(s.trim_matches('"').to_string()),
            "label_pair" => self.label_pair = Some(s.trim_matches('"').to_string()),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "label_pair" => self.label_pair = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "candidates" => self.candidates = Some(value),
            "control_points" => self.control_points = Some(value),
            "step_limit" => self.step_limit = Some(value),
            "target_class" => self.target_class = Some(value),
            "step" => self.step = Some(value),
            "steps" => self.steps = Some(value),
            "winning_index" => self.winning_index = Some(value),
            "elapsed_ms" => self.elapsed_ms = Some(value),
            "running" => self.running = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "max_length" => self.max_length = Some(value),
            "best_score" => self.best_score = Some(value),
            "mean_score" => self.mean_score = Some(value),
            _ => {}
        }
    }
}

fn format_event(level: Level, v: &EventVisitor) -> String {
    match v.event.as_deref() {
        Some("search_start") => format_search_start(v),
        Some("search_end") => format_search_end(v),
        Some("step") => format_step(v),
        Some("model_start") => format_model(v, "started"),
        Some("model_stop") => format_model(v, "stopped"),
        _ if level <= Level::INFO => v
            .message
            .as_deref()
            .map(|m| format!("{} {} {}", timestamp().bright_black(), level_tag(level), m))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn format_search_start(v: &EventVisitor) -> String {
    format!(
        "{} {} {} candidates ({}), control points ({}), step limit ({}), target class ({}), max length ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Search]".bright_cyan(),
        v.candidates.unwrap_or(0).bright_yellow(),
        v.control_points.unwrap_or(0).bright_yellow(),
        v.step_limit
            .unwrap_or(0)
            .to_formatted_string(&Locale::en)
            .bright_yellow(),
        v.target_class.unwrap_or(0).bright_yellow(),
        format!("{:.1}px", v.max_length.unwrap_or(0.0)).bright_magenta()
    )
}

fn format_search_end(v: &EventVisitor) -> String {
    format!(
        "{} {} {} Search ended: best score ({}), winning cell ({}), time spent ({}), step total ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Search]".bright_cyan(),
        format_score(v.best_score),
        v.winning_index.unwrap_or(0).yellow(),
        format_duration_ms(v.elapsed_ms.unwrap_or(0)).yellow(),
        v.steps
            .unwrap_or(0)
            .to_formatted_string(&Locale::en)
            .white()
    )
}

fn format_step(v: &EventVisitor) -> String {
    format!(
        "    {} Step {:>7} | best {} | mean {}",
        "->".bright_blue(),
        v.step.unwrap_or(0).to_formatted_string(&Locale::en).white(),
        format_score(v.best_score),
        format_score(v.mean_score)
    )
}

fn format_model(v: &EventVisitor, what: &str) -> String {
    format!(
        "{} {} {} model {} {}, running ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Service]".bright_cyan(),
        v.label_pair.as_deref().unwrap_or("?").white().bold(),
        what,
        v.running.unwrap_or(0).yellow()
    )
}

fn level_tag(level: Level) -> String {
    match level {
        Level::ERROR => "ERROR".bright_red().to_string(),
        Level::WARN => "WARN".yellow().to_string(),
        _ => "INFO".bright_green().to_string(),
    }
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Probabilities: green above one half, yellow below.
fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) if s >= 0.5 => format!("{:.4}", s).bright_green().to_string(),
        Some(s) => format!("{:.4}", s).yellow().to_string(),
        None => "N/A".white().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_unknown_debug_events_are_dropped() {
        let visitor = EventVisitor {
            message: Some("scratch".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_event(Level::DEBUG, &visitor).is_empty());
        assert!(format_event(Level::INFO, &visitor).contains("scratch"));
    }

    #[test]
    fn test_step_line_mentions_scores() {
        let visitor = EventVisitor {
            event: Some("step".to_string()),
            step: Some(1234),
            best_score: Some(0.75),
            mean_score: Some(0.25),
            ..EventVisitor::default()
        };
        let line = format_event(Level::DEBUG, &visitor);
        assert!(line.contains("1,234"));
        assert!(line.contains("0.7500"));
        assert!(line.contains("0.2500"));
    }
}
