//! Configuration system for StrokeForge.
//!
//! Load search configuration from TOML or YAML to control the grid, the
//! rendering schedule, the optimizer and termination without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use strokeforge_config::{OptimizerKind, SearchConfig};
//! use std::time::Duration;
//!
//! let config = SearchConfig::from_toml_str(r#"
//!     grid_size = 4
//!     selection = "best_ever"
//!
//!     [optimizer]
//!     type = "adam"
//!     learning_rate = 0.01
//!
//!     [termination]
//!     step_count_limit = 200
//!     seconds_spent_limit = 2
//! "#).unwrap();
//!
//! assert_eq!(config.grid_size, 4);
//! assert_eq!(config.optimizer.kind, OptimizerKind::Adam);
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(2)));
//! assert_eq!(config.num_control_points, 4); // default
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use strokeforge_config::SearchConfig;
//!
//! let config = SearchConfig::load("search.toml").unwrap_or_default();
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strokeforge_core::{SampleMode, StrokeForgeError};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for StrokeForgeError {
    fn from(err: ConfigError) -> Self {
        StrokeForgeError::Config(err.to_string())
    }
}

fn read_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

fn read_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn require_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

/// Parameters of one multi-start stroke search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SearchConfig {
    /// Cells per side of the seeding grid; `grid_size²` candidates run.
    pub grid_size: usize,

    /// Control points per candidate curve.
    pub num_control_points: usize,

    /// Width used while a candidate scores poorly.
    pub max_width: f64,

    /// Width approached as a candidate's score reaches 1.
    pub min_width: f64,

    /// Anti-aliasing factor used while a candidate scores poorly (soft).
    pub max_aa: f64,

    /// Anti-aliasing factor approached as the score reaches 1 (sharp).
    pub min_aa: f64,

    /// Points sampled along each curve when rendering.
    pub sample_count: usize,

    /// Entries in the arc-length table used by projection.
    pub arc_length_resolution: usize,

    /// How the rasterizer places its samples along the curve.
    pub sample_method: SampleMethod,

    /// Which step's result the search returns.
    pub selection: SelectionPolicy,

    /// Random seed for reproducible searches.
    pub random_seed: Option<u64>,

    pub optimizer: OptimizerConfig,

    pub termination: TerminationConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            grid_size: 3,
            num_control_points: 4,
            max_width: 10.0,
            min_width: 3.5,
            max_aa: 0.35,
            min_aa: 0.9,
            sample_count: 15,
            arc_length_resolution: 20,
            sample_method: SampleMethod::default(),
            selection: SelectionPolicy::default(),
            random_seed: None,
            optimizer: OptimizerConfig::default(),
            termination: TerminationConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_yaml(path)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the grid size.
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Sets the number of control points per candidate.
    pub fn with_control_points(mut self, count: usize) -> Self {
        self.num_control_points = count;
        self
    }

    /// Sets the width range of the rendering schedule.
    pub fn with_widths(mut self, min_width: f64, max_width: f64) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }

    /// Sets the anti-aliasing range of the rendering schedule.
    pub fn with_aa_factors(mut self, min_aa: f64, max_aa: f64) -> Self {
        self.min_aa = min_aa;
        self.max_aa = max_aa;
        self
    }

    /// Sets the step budget.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.termination.step_count_limit = steps;
        self
    }

    /// Sets the termination time limit.
    pub fn with_termination_millis(mut self, millis: u64) -> Self {
        self.termination.millis_spent_limit = Some(millis);
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_sample_method(mut self, method: SampleMethod) -> Self {
        self.sample_method = method;
        self
    }

    /// Number of candidates the grid seeds.
    pub fn candidate_count(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Returns the termination time limit, if configured.
    pub fn time_limit(&self) -> Option<Duration> {
        self.termination.time_limit()
    }

    /// Checks every knob, failing on the first invalid value.
    ///
    /// # Examples
    ///
    /// ```
    /// use strokeforge_config::SearchConfig;
    ///
    /// assert!(SearchConfig::new().validate().is_ok());
    /// assert!(SearchConfig::new().with_grid_size(0).validate().is_err());
    /// assert!(SearchConfig::new().with_widths(0.0, 4.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(invalid("grid_size must be at least 1"));
        }
        if self.num_control_points == 0 {
            return Err(invalid("num_control_points must be at least 1"));
        }
        require_positive("max_width", self.max_width)?;
        require_positive("min_width", self.min_width)?;
        require_positive("max_aa", self.max_aa)?;
        require_positive("min_aa", self.min_aa)?;
        if self.sample_count < 3 {
            return Err(invalid(format!(
                "sample_count must be at least 3, got {}",
                self.sample_count
            )));
        }
        if self.arc_length_resolution < 2 {
            return Err(invalid(format!(
                "arc_length_resolution must be at least 2, got {}",
                self.arc_length_resolution
            )));
        }
        self.optimizer.validate()?;
        self.termination.validate()
    }
}

/// Where along the curve the rasterizer places its samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMethod {
    /// Uniform in the curve parameter.
    #[default]
    UniformT,

    /// Uniform in arc length.
    UniformArcLength,
}

impl From<SampleMethod> for SampleMode {
    fn from(method: SampleMethod) -> Self {
        match method {
            SampleMethod::UniformT => SampleMode::Direct,
            SampleMethod::UniformArcLength => SampleMode::ArcLength,
        }
    }
}

/// Which candidate the search reports once it terminates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// The best candidate of the last step.
    #[default]
    FinalStep,

    /// The best candidate seen at any step.
    BestEver,
}

/// Gradient optimizer kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    /// Plain stochastic gradient descent.
    Sgd,

    /// Adam.
    Adam,

    /// Adam with an infinity-norm second moment.
    #[default]
    Adamax,
}

/// Optimizer configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OptimizerConfig {
    #[serde(rename = "type")]
    pub kind: OptimizerKind,

    pub learning_rate: f64,

    /// First moment decay (Adam, Adamax).
    pub beta1: f64,

    /// Second moment decay (Adam, Adamax).
    pub beta2: f64,

    pub epsilon: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            kind: OptimizerKind::Adamax,
            learning_rate: 0.03,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl OptimizerConfig {
    /// Default betas and epsilon for `kind` with the given learning rate.
    pub fn new(kind: OptimizerKind, learning_rate: f64) -> Self {
        Self {
            kind,
            learning_rate,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("learning_rate", self.learning_rate)?;
        require_positive("epsilon", self.epsilon)?;
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(invalid(format!("{name} must lie in [0, 1), got {beta}")));
            }
        }
        Ok(())
    }
}

/// Termination configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TerminationConfig {
    /// Maximum number of optimizer steps.
    pub step_count_limit: u64,

    /// Maximum seconds to spend searching.
    pub seconds_spent_limit: Option<u64>,

    /// Maximum milliseconds to spend searching.
    pub millis_spent_limit: Option<u64>,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            step_count_limit: 125,
            seconds_spent_limit: None,
            millis_spent_limit: None,
        }
    }
}

impl TerminationConfig {
    /// Returns the time limit as a Duration, if any.
    ///
    /// Seconds and milliseconds add up. The sum saturates at
    /// [`Duration::MAX`]; [`validate`](Self::validate) rejects such limits.
    pub fn time_limit(&self) -> Option<Duration> {
        let limit = Duration::from_secs(self.seconds_spent_limit.unwrap_or(0))
            .saturating_add(Duration::from_millis(self.millis_spent_limit.unwrap_or(0)));
        (!limit.is_zero()).then_some(limit)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_count_limit == 0 {
            return Err(invalid("step_count_limit must be at least 1"));
        }
        let seconds = Duration::from_secs(self.seconds_spent_limit.unwrap_or(0));
        let millis = Duration::from_millis(self.millis_spent_limit.unwrap_or(0));
        if seconds.checked_add(millis).is_none() {
            return Err(invalid(
                "seconds_spent_limit plus millis_spent_limit overflows the time limit",
            ));
        }
        Ok(())
    }
}

/// Configuration of the inference service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ServiceConfig {
    /// Search parameters; widths are overridden per call.
    pub search: SearchConfig,

    /// A requested stroke width `w` searches widths from `w` up to
    /// `w * width_multiplier`.
    pub width_multiplier: f64,

    /// Points in the returned polyline.
    pub polyline_points: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            width_multiplier: 4.0,
            polyline_points: 20,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_yaml(path)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_polyline_points(mut self, points: usize) -> Self {
        self.polyline_points = points;
        self
    }

    /// Search configuration for one request with the given stroke width.
    ///
    /// # Examples
    ///
    /// ```
    /// use strokeforge_config::ServiceConfig;
    ///
    /// let search = ServiceConfig::new().search_for_width(2.5).unwrap();
    /// assert_eq!(search.min_width, 2.5);
    /// assert_eq!(search.max_width, 10.0);
    /// ```
    pub fn search_for_width(&self, stroke_width: f64) -> Result<SearchConfig, ConfigError> {
        require_positive("stroke_width", stroke_width)?;
        let search = self
            .search
            .clone()
            .with_widths(stroke_width, stroke_width * self.width_multiplier);
        search.validate()?;
        Ok(search)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("width_multiplier", self.width_multiplier)?;
        if self.polyline_points < 2 {
            return Err(invalid(format!(
                "polyline_points must be at least 2, got {}",
                self.polyline_points
            )));
        }
        self.search.validate()
    }
}
