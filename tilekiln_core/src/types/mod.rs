mod blob;
mod byte_range;
mod geo_bbox;
mod tile_compression;
mod tile_coord3;
mod tile_hilbert_index;

pub use blob::Blob;
pub use byte_range::ByteRange;
pub use geo_bbox::GeoBBox;
pub use tile_compression::TileCompression;
pub use tile_coord3::{TileCoord3, TileId};
pub use tile_hilbert_index::HilbertIndex;
