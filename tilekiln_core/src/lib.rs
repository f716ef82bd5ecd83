//! Shared coordinate math, Hilbert tile ordering, projections and byte/JSON
//! plumbing used by every other TileKiln crate.

pub mod json;
pub mod projection;
pub mod types;
pub mod utils;

pub use concurrency::ConcurrencyLimits;

mod concurrency;

pub use types::{
	Blob, ByteRange, GeoBBox, HilbertIndex, TileCompression, TileCoord3, TileId,
};
pub use projection::Projection;
pub use utils::compression::{compress_gzip, decompress_gzip};
pub use utils::tilemath;
