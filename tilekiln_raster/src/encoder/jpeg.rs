use anyhow::{anyhow, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{load_from_memory_with_format, ImageFormat};
use tilekiln_core::Blob;
use tilekiln_derive::context;

use super::TileEncoder;
use crate::TileData;

/// Lossy JPEG. JPEG has no alpha channel, so nodata pixels are composited
/// onto opaque white before encoding rather than silently dropped — a
/// transparent source pixel should read as "bright", not "black".
pub struct JpegTileEncoder {
	pub quality: u8,
}

impl TileEncoder for JpegTileEncoder {
	#[context("encoding {}x{} tile as JPEG (q={})", tile.size(), tile.size(), self.quality)]
	fn encode(&self, tile: &TileData) -> Result<Blob> {
		let size = tile.size();
		let rgba = tile.to_rgba();
		let rgb: Vec<u8> = rgba
			.chunks_exact(4)
			.flat_map(|px| composite_over_white(px))
			.collect();

		let mut buffer = Vec::new();
		JpegEncoder::new_with_quality(&mut buffer, self.quality).encode(&rgb, size, size, image::ExtendedColorType::Rgb8)?;
		Ok(Blob::from(buffer))
	}

	#[context("decoding JPEG tile ({} bytes)", blob.len())]
	fn decode(&self, blob: &Blob) -> Result<TileData> {
		let image = load_from_memory_with_format(blob.as_slice(), ImageFormat::Jpeg)
			.map_err(|e| anyhow!("failed to decode JPEG tile: {e}"))?
			.into_rgba8();
		let size = image.width();
		anyhow::ensure!(image.width() == image.height(), "JPEG tile is not square");
		Ok(TileData::from_rgba(image.as_raw(), size))
	}
}

fn composite_over_white(px: &[u8]) -> [u8; 3] {
	let alpha = f64::from(px[3]) / 255.0;
	let blend = |channel: u8| (f64::from(channel) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
	[blend(px[0]), blend(px[1]), blend(px[2])]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn opaque_tiles_round_trip_approximately() {
		let tile = TileData::from_rgba(&[100, 150, 200, 255].repeat(16), 4);
		let encoder = JpegTileEncoder { quality: 90 };
		let decoded = encoder.decode(&encoder.encode(&tile).unwrap()).unwrap();
		for (a, b) in tile.to_rgba().iter().zip(decoded.to_rgba().iter()) {
			assert!((i16::from(*a) - i16::from(*b)).abs() < 20);
		}
	}

	#[test]
	fn fully_transparent_pixels_composite_to_white() {
		let tile = TileData::from_rgba(&[0, 0, 0, 0].repeat(16), 4);
		let encoder = JpegTileEncoder { quality: 90 };
		let decoded = encoder.decode(&encoder.encode(&tile).unwrap()).unwrap();
		for px in decoded.to_rgba().chunks_exact(4) {
			assert!(px[0] > 230 && px[1] > 230 && px[2] > 230);
		}
	}
}
