use anyhow::{bail, Result};
use tilekiln_core::TileCompression;

/// The PMTiles v3 file format's compression byte, kept distinct from
/// [`TileCompression`] because the wire format reserves values (Brotli,
/// Zstd) this crate has no codec for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PMTilesCompression {
	Unknown = 0x0,
	None = 0x1,
	Gzip = 0x2,
	Brotli = 0x3,
	Zstd = 0x4,
}

impl PMTilesCompression {
	pub fn from_u8(value: u8) -> Result<Self> {
		Ok(match value {
			0 => PMTilesCompression::Unknown,
			1 => PMTilesCompression::None,
			2 => PMTilesCompression::Gzip,
			3 => PMTilesCompression::Brotli,
			4 => PMTilesCompression::Zstd,
			_ => bail!("unknown PMTiles compression byte {value}"),
		})
	}

	pub fn from_value(value: TileCompression) -> Self {
		match value {
			TileCompression::Uncompressed => PMTilesCompression::None,
			TileCompression::Gzip => PMTilesCompression::Gzip,
		}
	}

	pub fn as_value(&self) -> Result<TileCompression> {
		Ok(match self {
			PMTilesCompression::None => TileCompression::Uncompressed,
			PMTilesCompression::Gzip => TileCompression::Gzip,
			other => bail!("{other:?} compression is not supported"),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_through_u8() {
		for c in [PMTilesCompression::Unknown, PMTilesCompression::None, PMTilesCompression::Gzip] {
			assert_eq!(PMTilesCompression::from_u8(c as u8).unwrap(), c);
		}
	}

	#[test]
	fn rejects_unsupported_wire_values() {
		assert!(PMTilesCompression::from_u8(5).is_err());
		assert!(PMTilesCompression::Brotli.as_value().is_err());
		assert!(PMTilesCompression::Zstd.as_value().is_err());
	}

	#[test]
	fn maps_to_and_from_tile_compression() {
		assert_eq!(PMTilesCompression::from_value(TileCompression::Gzip), PMTilesCompression::Gzip);
		assert_eq!(PMTilesCompression::Gzip.as_value().unwrap(), TileCompression::Gzip);
	}
}
