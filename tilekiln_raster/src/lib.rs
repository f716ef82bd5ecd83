//! The `TileData` payload type, the nodata-aware resampling kernel library,
//! and the tile encoder set (PNG/JPEG/WebP/Terrarium).

pub mod encoder;
pub mod resample;
mod tile_data;

pub use tile_data::TileData;
