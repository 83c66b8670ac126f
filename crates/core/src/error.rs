use crate::model::Rect;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("slice {index} has no items")]
    EmptySlice { index: usize },

    #[error("slice {index} is out of range for a series of {len}")]
    SliceOutOfRange { index: usize, len: usize },

    #[error("series has no slices")]
    EmptySeries,

    #[error("package {package:?} appears twice in domain {domain:?}")]
    DuplicateIdentity { domain: String, package: String },

    #[error("package {package:?} in domain {domain:?} resolved to non-positive weight {weight}")]
    NonPositiveWeight {
        domain: String,
        package: String,
        weight: f64,
    },

    #[error("layout produced an inverted rectangle for {node}: {rect:?}")]
    InvalidGeometry { node: String, rect: Rect },

    #[error("invalid color {0:?}")]
    InvalidColor(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("data source: {0}")]
    Source(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
