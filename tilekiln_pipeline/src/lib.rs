//! Turns a set of georeferenced raster sources into a PMTiles v3 tile
//! pyramid: render the maximum zoom level directly, derive every level
//! below it by downsampling, and stream the result to a writer.

pub mod config;
pub mod downsample;
pub mod generator;
pub mod render;
pub mod source_cache;
pub mod stats;

pub use config::GeneratorConfig;
pub use generator::PyramidGenerator;
pub use stats::{GeneratorStats, GeneratorStatsSnapshot};
