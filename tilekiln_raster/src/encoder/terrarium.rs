use anyhow::{anyhow, Result};
use image::{load_from_memory_with_format, ImageFormat};
use tilekiln_core::Blob;
use tilekiln_derive::context;

use super::png;
use super::TileEncoder;
use crate::TileData;

/// Mapzen Terrarium elevation encoding: elevation in meters is packed into
/// the R/G/B channels (`height = R*256 + G + B/256 - 32768`) by the
/// renderer before it ever reaches this encoder, so at this layer a
/// Terrarium tile is just an always-opaque lossless PNG — any alpha the
/// caller set is discarded rather than carried through, since a fractional
/// elevation byte cannot be meaningfully blended against transparency.
pub struct TerrariumTileEncoder;

impl TileEncoder for TerrariumTileEncoder {
	#[context("encoding {}x{} tile as Terrarium PNG", tile.size(), tile.size())]
	fn encode(&self, tile: &TileData) -> Result<Blob> {
		let opaque = force_opaque(tile);
		png::PngTileEncoder.encode(&opaque)
	}

	#[context("decoding Terrarium tile ({} bytes)", blob.len())]
	fn decode(&self, blob: &Blob) -> Result<TileData> {
		let image = load_from_memory_with_format(blob.as_slice(), ImageFormat::Png)
			.map_err(|e| anyhow!("failed to decode Terrarium tile: {e}"))?
			.into_rgba8();
		let size = image.width();
		anyhow::ensure!(image.width() == image.height(), "Terrarium tile is not square");
		Ok(TileData::from_rgba(image.as_raw(), size))
	}
}

/// Decodes a Terrarium-encoded RGB triple into elevation meters.
#[must_use]
pub fn decode_elevation(rgb: [u8; 3]) -> f64 {
	f64::from(rgb[0]) * 256.0 + f64::from(rgb[1]) + f64::from(rgb[2]) / 256.0 - 32_768.0
}

/// Encodes an elevation in meters into the Terrarium RGB triple.
#[must_use]
pub fn encode_elevation(meters: f64) -> [u8; 3] {
	let value = ((meters + 32_768.0) * 256.0).round().clamp(0.0, 16_777_215.0) as u32;
	[(value >> 16) as u8, (value >> 8) as u8, value as u8]
}

fn force_opaque(tile: &TileData) -> TileData {
	let mut pixels = tile.to_rgba();
	for px in pixels.chunks_exact_mut(4) {
		px[3] = 255;
	}
	TileData::from_rgba(&pixels, tile.size())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn elevation_round_trips_within_quantization_error() {
		for meters in [-10_000.0, -1.0, 0.0, 1234.5, 8848.0] {
			let rgb = encode_elevation(meters);
			let decoded = decode_elevation(rgb);
			assert!((decoded - meters).abs() < 1.0 / 256.0 + 1e-9);
		}
	}

	#[test]
	fn discards_alpha_on_encode() {
		let tile = TileData::from_rgba(&[10, 20, 30, 0].repeat(16), 4);
		let encoder = TerrariumTileEncoder;
		let decoded = encoder.decode(&encoder.encode(&tile).unwrap()).unwrap();
		for px in decoded.to_rgba().chunks_exact(4) {
			assert_eq!(px[3], 255);
		}
	}
}
