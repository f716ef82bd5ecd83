//! Tile encoders: each wraps an `image` codec (or a bespoke elevation
//! encoding) behind a single `encode`/`decode` pair so the pyramid
//! generator and the PMTiles writer never need to know which format is in
//! use.

mod jpeg;
mod png;
mod webp;

pub mod terrarium;

use anyhow::Result;
use tilekiln_core::Blob;

use crate::TileData;

/// One supported output tile format.
pub trait TileEncoder: Send + Sync {
	fn encode(&self, tile: &TileData) -> Result<Blob>;
	fn decode(&self, blob: &Blob) -> Result<TileData>;
}

/// The tile formats the CLI's `--format` flag can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
	Png,
	Jpeg { quality: u8 },
	WebP { quality: Option<u8> },
	Terrarium,
}

impl Format {
	#[must_use]
	pub fn encoder(self) -> Box<dyn TileEncoder + Send + Sync> {
		match self {
			Format::Png => Box::new(png::PngTileEncoder),
			Format::Jpeg { quality } => Box::new(jpeg::JpegTileEncoder { quality }),
			Format::WebP { quality } => Box::new(webp::WebPTileEncoder { quality }),
			Format::Terrarium => Box::new(terrarium::TerrariumTileEncoder),
		}
	}

	/// Whether this format can represent transparency; used by the
	/// generator to decide whether nodata edges should be preserved as
	/// alpha or must be filled with a background color first.
	#[must_use]
	pub fn supports_alpha(self) -> bool {
		!matches!(self, Format::Jpeg { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn jpeg_has_no_alpha_support() {
		assert!(!Format::Jpeg { quality: 80 }.supports_alpha());
		assert!(Format::Png.supports_alpha());
		assert!(Format::WebP { quality: None }.supports_alpha());
		assert!(Format::Terrarium.supports_alpha());
	}
}
