use anyhow::{bail, Result};

/// The compression applied to a tile's encoded bytes, as stored in the
/// PMTiles header's `tile_compression` / `internal_compression` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileCompression {
	#[default]
	Uncompressed,
	Gzip,
}

impl TileCompression {
	#[must_use]
	pub fn as_byte(self) -> u8 {
		match self {
			TileCompression::Uncompressed => 1,
			TileCompression::Gzip => 2,
		}
	}

	pub fn from_byte(value: u8) -> Result<Self> {
		Ok(match value {
			1 => TileCompression::Uncompressed,
			2 => TileCompression::Gzip,
			other => bail!("unsupported PMTiles compression byte {other}"),
		})
	}
}
