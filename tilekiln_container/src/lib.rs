//! PMTiles v3 archive writing and the disk-spilling tile store that feeds
//! it between pyramid levels.

pub mod pmtiles;
pub mod store;

pub use pmtiles::{Directory, EntriesV3, EntryV3, HeaderV3, PMTilesCompression, PMTilesType, PMTilesWriter};
pub use store::TileStore;
