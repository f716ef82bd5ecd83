pub mod geo_keys;
pub mod ifd;
pub mod reader;
pub mod source;
pub mod tags;

pub use reader::{CogReader, DecodedTile, TiledGeoTiffReader};
pub use source::{SourceDescriptor, SourceId, TileSource};
