use anyhow::{bail, Result};
use tilekiln_raster::encoder::Format;

/// The PMTiles v3 file format's tile-type byte.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PMTilesType {
	Unknown = 0x0,
	Mvt = 0x1,
	Png = 0x2,
	Jpeg = 0x3,
	WebP = 0x4,
	Avif = 0x5,
}

impl PMTilesType {
	pub fn from_u8(value: u8) -> Result<Self> {
		Ok(match value {
			0 => PMTilesType::Unknown,
			1 => PMTilesType::Mvt,
			2 => PMTilesType::Png,
			3 => PMTilesType::Jpeg,
			4 => PMTilesType::WebP,
			5 => PMTilesType::Avif,
			_ => bail!("unknown PMTiles tile type byte {value}"),
		})
	}

	/// Terrarium tiles are wire-compatible PNGs; the elevation encoding is
	/// invisible at the container layer.
	pub fn from_format(value: Format) -> Self {
		match value {
			Format::Png | Format::Terrarium => PMTilesType::Png,
			Format::Jpeg { .. } => PMTilesType::Jpeg,
			Format::WebP { .. } => PMTilesType::WebP,
		}
	}
}
