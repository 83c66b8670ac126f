use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside a [`crate::hierarchy::Hierarchy`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl Default for NodeId {
    fn default() -> Self {
        NodeId(0)
    }
}

/// One package observation, as read from a slice of the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub domain: String,
    pub package: String,
    #[serde(rename = "fileCount", default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<f64>,
    /// Explicit label-size weight; the package label length stands in when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    pub when: DateTime<FixedOffset>,
}

impl Item {
    pub fn identity(&self) -> Identity {
        Identity::new(&self.domain, &self.package)
    }
}

/// One time-stamped snapshot.
pub type Slice = Vec<Item>;

/// Ordered slices; index 0 is the most recent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub slices: Vec<Slice>,
}

impl Series {
    pub fn new(slices: Vec<Slice>) -> Self {
        Self { slices }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    /// Every domain of the series in first-seen order, slice 0 first.
    pub fn domains(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for item in self.slices.iter().flatten() {
            if seen.insert(item.domain.as_str()) {
                out.push(item.domain.as_str());
            }
        }
        out
    }
}

/// Stable cross-frame key of a rendered leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    pub domain: String,
    pub package: String,
}

impl Identity {
    pub fn new(domain: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            package: package.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.package)
    }
}

/// Axis-aligned rectangle, `x1 >= x0` and `y1 >= y0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Zero-size rectangle at this rectangle's center; enter/exit animations
    /// grow from and shrink toward it.
    pub fn collapsed(&self) -> Rect {
        let (cx, cy) = self.center();
        Rect::new(cx, cy, cx, cy)
    }

    pub fn is_valid(&self) -> bool {
        self.x1 >= self.x0 && self.y1 >= self.y0
    }

    pub fn round(&self) -> Rect {
        Rect::new(self.x0.round(), self.y0.round(), self.x1.round(), self.y1.round())
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, to: &Rect, t: f64) -> Rect {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Rect::new(
            mix(self.x0, to.x0),
            mix(self.y0, to.y0),
            mix(self.x1, to.x1),
            mix(self.y1, to.y1),
        )
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.y1.min(other.y1) - self.y0.max(other.y0);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}

/// Externally visible unit of rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLeaf {
    pub identity: Identity,
    pub rect: Rect,
    pub weight: f64,
}

impl LayoutLeaf {
    pub fn domain(&self) -> &str {
        &self.identity.domain
    }
}
