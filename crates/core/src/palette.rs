use crate::error::{Error, Result};
use crate::model::Series;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_PALETTE: [&str; 30] = [
    "#624584", "#7d27a5", "#9b2246", "#65501f", "#993e00", "#0159bc", "#8a5000", "#cf0071",
    "#c84a00", "#8a57e0", "#c645c9", "#f02f45", "#9c8050", "#789000", "#ff4b74", "#588bff",
    "#b09900", "#a698ff", "#59c237", "#57b9ff", "#ffa87b", "#ffae4b", "#ffa8e1", "#9ad496",
    "#91d877", "#d4bcf4", "#bdd052", "#96d946", "#e9bf90", "#eac250",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Parses `#rgb` or `#rrggbb` into its stable [`Rgb`] form.
pub fn normalize(color: &str) -> Result<Rgb> {
    let invalid = || Error::InvalidColor(color.to_string());
    let hex = color.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
            Ok(Rgb {
                r: expand(0)?,
                g: expand(1)?,
                b: expand(2)?,
            })
        }
        6 => Ok(Rgb {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
        }),
        _ => Err(invalid()),
    }
}

pub fn normalize_all(colors: &[String]) -> Result<Vec<Rgb>> {
    colors.iter().map(|c| normalize(c)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub color: Rgb,
    pub order_index: usize,
}

/// Session-scoped domain → (color, order) scale. Entries are only ever added.
#[derive(Debug, Clone)]
pub struct PaletteStore {
    palette: Vec<Rgb>,
    assigned: HashMap<String, Assignment>,
}

impl PaletteStore {
    pub fn new(palette: Vec<Rgb>) -> Result<Self> {
        if palette.is_empty() {
            return Err(Error::InvalidConfig("palette must not be empty".into()));
        }
        Ok(Self {
            palette,
            assigned: HashMap::new(),
        })
    }

    pub fn assign(&mut self, domain: &str) -> Assignment {
        if let Some(existing) = self.assigned.get(domain) {
            return *existing;
        }
        let order_index = self.assigned.len();
        // Colors repeat once the palette runs out.
        let color = self.palette[order_index % self.palette.len()];
        let assignment = Assignment { color, order_index };
        self.assigned.insert(domain.to_string(), assignment);
        tracing::debug!(domain, order_index, %color, "assigned domain color");
        assignment
    }

    pub fn get(&self, domain: &str) -> Option<Assignment> {
        self.assigned.get(domain).copied()
    }

    /// Registers every domain of the series up front, slice 0 first.
    pub fn prime(&mut self, series: &Series) {
        for domain in series.domains() {
            self.assign(domain);
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

impl Default for PaletteStore {
    fn default() -> Self {
        let palette = DEFAULT_PALETTE
            .iter()
            .filter_map(|c| normalize(c).ok())
            .collect();
        Self {
            palette,
            assigned: HashMap::new(),
        }
    }
}
