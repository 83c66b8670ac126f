use crate::error::{Error, Result};
use crate::palette::{self, Rgb, DEFAULT_PALETTE};
use crate::treemap::TileStrategy;
use crate::weight::SizeMode;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sides {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Sides {
    pub const ZERO: Sides = Sides {
        top: 0.0,
        left: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    fn is_valid(&self) -> bool {
        [self.top, self.left, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Startup settings. Every field has a default, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Space around the treemap; the title sits in the top margin.
    pub margin: Sides,
    /// Reserved around the children of every group node.
    pub group_padding: Sides,
    /// Gap between sibling cells.
    pub inner_padding: f64,
    pub size_mode: SizeMode,
    pub tiling: TileStrategy,
    pub tick_interval_ms: u64,
    /// Transition duration as a fraction of the tick interval.
    pub transition_ratio: f64,
    pub palette: Vec<String>,
    /// chrono format string for the slice title.
    pub date_format: String,
    pub draw_domain_labels: bool,
    pub split_package_names: bool,
    pub draw_border: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: 1280.0,
            canvas_height: 800.0,
            margin: Sides {
                top: 70.0,
                left: 20.0,
                right: 20.0,
                bottom: 20.0,
            },
            group_padding: Sides {
                top: 20.0,
                left: 5.0,
                right: 1.0,
                bottom: 1.0,
            },
            inner_padding: 1.0,
            size_mode: SizeMode::default(),
            tiling: TileStrategy::Resquarify,
            tick_interval_ms: 300,
            transition_ratio: 0.75,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            date_format: "%b '%y".to_string(),
            draw_domain_labels: true,
            split_package_names: true,
            draw_border: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// A config with no margins or padding, sized to `width` x `height`.
    pub fn unpadded(width: f64, height: f64) -> Self {
        Self {
            canvas_width: width,
            canvas_height: height,
            margin: Sides::ZERO,
            group_padding: Sides::ZERO,
            inner_padding: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));
        if !(self.canvas_width.is_finite() && self.canvas_width > 0.0)
            || !(self.canvas_height.is_finite() && self.canvas_height > 0.0)
        {
            return invalid("canvas size must be positive");
        }
        if !self.margin.is_valid() || !self.group_padding.is_valid() {
            return invalid("margins and padding must be non-negative");
        }
        if self.margin.left + self.margin.right >= self.canvas_width
            || self.margin.top + self.margin.bottom >= self.canvas_height
        {
            return invalid("margins leave no room for the treemap");
        }
        if !(self.inner_padding.is_finite() && self.inner_padding >= 0.0) {
            return invalid("inner_padding must be non-negative");
        }
        let floor = self.size_mode.floor();
        if !(floor.is_finite() && floor > 0.0) {
            return invalid("size floor must be positive");
        }
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive");
        }
        if !(self.transition_ratio.is_finite() && self.transition_ratio >= 0.0) {
            return invalid("transition_ratio must be non-negative");
        }
        if self.palette.is_empty() {
            return invalid("palette must not be empty");
        }
        palette::normalize_all(&self.palette)?;
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidConfig(format!(
                "invalid date format {:?}",
                self.date_format
            )));
        }
        Ok(())
    }

    pub fn palette_rgb(&self) -> Result<Vec<Rgb>> {
        palette::normalize_all(&self.palette)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis((self.tick_interval_ms as f64 * self.transition_ratio).round() as u64)
    }
}
