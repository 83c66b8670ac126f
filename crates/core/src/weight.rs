use crate::error::{Error, Result};
use crate::model::Item;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_FILE_COUNT_FLOOR: f64 = 44.0;
pub const DEFAULT_LABEL_LENGTH_FLOOR: f64 = 1.0;

/// Where a package's raw weight comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizeMode {
    FileCount { floor: f64 },
    LabelLength { floor: f64 },
}

impl Default for SizeMode {
    fn default() -> Self {
        SizeMode::FileCount {
            floor: DEFAULT_FILE_COUNT_FLOOR,
        }
    }
}

impl SizeMode {
    pub fn floor(&self) -> f64 {
        match *self {
            SizeMode::FileCount { floor } | SizeMode::LabelLength { floor } => floor,
        }
    }

    pub fn raw_weight(&self, item: &Item) -> f64 {
        match self {
            SizeMode::FileCount { floor } => item.file_count.unwrap_or(*floor),
            SizeMode::LabelLength { .. } => item
                .size
                .unwrap_or_else(|| item.package.chars().count() as f64),
        }
    }

    pub fn effective_weight(&self, item: &Item) -> Result<f64> {
        let weight = apply_floor(self.raw_weight(item), self.floor());
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::NonPositiveWeight {
                domain: item.domain.clone(),
                package: item.package.clone(),
                weight,
            });
        }
        Ok(weight)
    }
}

/// `max(raw, floor)`, keeping NaN visible so the caller can reject it.
pub fn apply_floor(raw: f64, floor: f64) -> f64 {
    if raw.is_nan() {
        raw
    } else {
        raw.max(floor)
    }
}

/// Sibling order for domains: session order index first.
pub fn compare_domains(a: (usize, &str), b: (usize, &str)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1))
}

/// Sibling order for packages inside one domain.
pub fn compare_packages(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}
