//! Score-driven rendering schedule.
//!
//! Poorly scoring candidates render wide and soft, which widens the basin
//! their gradient sees; as a candidate's score approaches 1 it renders
//! thin and sharp for refinement.

use strokeforge_config::SearchConfig;
use strokeforge_core::lerp;
use strokeforge_raster::StrokeStyle;

/// Width and anti-aliasing ranges interpolated by score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSchedule {
    pub max_width: f64,
    pub min_width: f64,
    pub max_aa: f64,
    pub min_aa: f64,
}

impl RenderSchedule {
    pub fn new(max_width: f64, min_width: f64, max_aa: f64, min_aa: f64) -> Self {
        Self {
            max_width,
            min_width,
            max_aa,
            min_aa,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.max_width,
            config.min_width,
            config.max_aa,
            config.min_aa,
        )
    }

    /// Style for a candidate whose previous step scored `score`.
    ///
    /// Scores outside `[0, 1]` are clamped.
    pub fn style_for(&self, score: f64) -> StrokeStyle {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        };
        StrokeStyle::new(
            lerp(self.max_width, self.min_width, score),
            lerp(self.max_aa, self.min_aa, score),
        )
    }
}
