use anyhow::{anyhow, Result};
use image::codecs::png::{self, CompressionType, FilterType};
use image::{load_from_memory_with_format, ImageEncoder, ImageFormat};
use tilekiln_core::Blob;
use tilekiln_derive::context;

use super::TileEncoder;
use crate::TileData;

/// Lossless PNG, the default tile format. Always uses best compression —
/// pyramid builds are throughput-bound by rendering and I/O, not by the
/// PNG encoder, so there is no reason to trade size for encode speed here.
pub struct PngTileEncoder;

impl TileEncoder for PngTileEncoder {
	#[context("encoding {}x{} tile as PNG", tile.size(), tile.size())]
	fn encode(&self, tile: &TileData) -> Result<Blob> {
		let size = tile.size();
		let pixels = tile.to_rgba();

		let mut buffer = Vec::new();
		png::PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive).write_image(
			&pixels,
			size,
			size,
			image::ExtendedColorType::Rgba8,
		)?;
		Ok(Blob::from(buffer))
	}

	#[context("decoding PNG tile ({} bytes)", blob.len())]
	fn decode(&self, blob: &Blob) -> Result<TileData> {
		let image = load_from_memory_with_format(blob.as_slice(), ImageFormat::Png)
			.map_err(|e| anyhow!("failed to decode PNG tile: {e}"))?
			.into_rgba8();
		let size = image.width();
		anyhow::ensure!(image.width() == image.height(), "PNG tile is not square");
		Ok(TileData::from_rgba(image.as_raw(), size))
	}
}
