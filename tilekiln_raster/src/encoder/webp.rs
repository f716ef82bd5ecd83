use anyhow::{anyhow, Result};
use image::codecs::webp::WebPEncoder;
use image::{load_from_memory_with_format, ImageFormat};
use tilekiln_core::Blob;
use tilekiln_derive::context;

use super::TileEncoder;
use crate::TileData;

/// WebP. `quality = None` or `>= 100` selects lossless (the `image` crate's
/// native encoder); any other value selects lossy encoding via `libwebp`.
pub struct WebPTileEncoder {
	pub quality: Option<u8>,
}

impl TileEncoder for WebPTileEncoder {
	#[context("encoding {}x{} tile as WebP (q={:?})", tile.size(), tile.size(), self.quality)]
	fn encode(&self, tile: &TileData) -> Result<Blob> {
		let size = tile.size();
		let rgba = tile.to_rgba();

		match self.quality {
			None | Some(100..) => {
				let mut buffer = Vec::new();
				WebPEncoder::new_lossless(&mut buffer).encode(&rgba, size, size, image::ExtendedColorType::Rgba8)?;
				Ok(Blob::from(buffer))
			}
			Some(quality) => {
				let buffer = image::RgbaImage::from_raw(size, size, rgba).ok_or_else(|| anyhow!("tile buffer size mismatch"))?;
				let image = image::DynamicImage::ImageRgba8(buffer);
				let encoder = webp::Encoder::from_image(&image).map_err(|e| anyhow!("{e}"))?;
				let encoded = encoder
					.encode_simple(false, f32::from(quality))
					.map_err(|e| anyhow!("{e:?}"))?;
				Ok(Blob::from(encoded.to_vec()))
			}
		}
	}

	#[context("decoding WebP tile ({} bytes)", blob.len())]
	fn decode(&self, blob: &Blob) -> Result<TileData> {
		let image = load_from_memory_with_format(blob.as_slice(), ImageFormat::WebP)
			.map_err(|e| anyhow!("failed to decode WebP tile: {e}"))?
			.into_rgba8();
		let size = image.width();
		anyhow::ensure!(image.width() == image.height(), "WebP tile is not square");
		Ok(TileData::from_rgba(image.as_raw(), size))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lossless_round_trips_exactly() {
		let pixels: Vec<u8> = (0..16).flat_map(|i| [i as u8 * 16, 0, 255 - i as u8 * 16, 255]).collect();
		let tile = TileData::from_rgba(&pixels, 4);
		let encoder = WebPTileEncoder { quality: None };
		let decoded = encoder.decode(&encoder.encode(&tile).unwrap()).unwrap();
		assert_eq!(decoded.to_rgba(), tile.to_rgba());
	}

	#[test]
	fn lossy_round_trips_approximately() {
		let pixels: Vec<u8> = (0..16).flat_map(|i| [i as u8 * 16, 0, 255 - i as u8 * 16, 255]).collect();
		let tile = TileData::from_rgba(&pixels, 4);
		let encoder = WebPTileEncoder { quality: Some(80) };
		let decoded = encoder.decode(&encoder.encode(&tile).unwrap()).unwrap();
		assert_eq!(decoded.to_rgba().len(), tile.to_rgba().len());
	}
}
