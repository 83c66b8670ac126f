pub mod config;
pub mod ease;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod logging;
pub mod model;
pub mod palette;
pub mod playback;
pub mod source;
pub mod transition;
pub mod treemap;
pub mod weight;

pub use config::*;
pub use error::{Error, Result};
pub use model::*;
pub use playback::*;
