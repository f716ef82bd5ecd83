/// A decoded, un-encoded tile payload.
///
/// Most tiles rendered from a single source image (ocean, nodata fill,
/// cloud mask) are a single flat color or a single gray level; storing
/// those as one pixel instead of `size * size * 4` bytes is what makes the
/// disk-spilling store's in-memory path cheap for the common case. A tile
/// only pays for a full RGBA buffer once it actually has per-pixel detail.
#[derive(Debug, Clone, PartialEq)]
pub enum TileData {
	/// Every pixel is the same RGBA color.
	Uniform { color: [u8; 4], size: u32 },
	/// Every pixel has R == G == B and A == 255 (fully opaque), stored as a
	/// single gray byte per pixel with alpha implied.
	Gray { pixels: Vec<u8>, size: u32 },
	/// Arbitrary per-pixel RGBA content, `size * size * 4` bytes, row-major.
	Full { pixels: Vec<u8>, size: u32 },
}

impl TileData {
	/// Builds the most compact representation for a fully-decoded RGBA
	/// buffer, checking uniformity first (cheapest and most common: ocean,
	/// nodata, solid fill) and gray second.
	#[must_use]
	pub fn from_rgba(pixels: &[u8], size: u32) -> Self {
		assert_eq!(pixels.len(), size as usize * size as usize * 4, "pixel buffer does not match size");

		if let Some(color) = uniform_color(pixels) {
			return TileData::Uniform { color, size };
		}

		if is_grayscale(pixels) {
			let gray = pixels.chunks_exact(4).map(|px| px[0]).collect();
			return TileData::Gray { pixels: gray, size };
		}

		TileData::Full {
			pixels: pixels.to_vec(),
			size,
		}
	}

	#[must_use]
	pub fn size(&self) -> u32 {
		match self {
			TileData::Uniform { size, .. } | TileData::Gray { size, .. } | TileData::Full { size, .. } => *size,
		}
	}

	/// Materializes this tile as a full row-major RGBA buffer, regardless
	/// of which compact representation it is stored as.
	#[must_use]
	pub fn to_rgba(&self) -> Vec<u8> {
		match self {
			TileData::Uniform { color, size } => color.repeat(*size as usize * *size as usize),
			TileData::Gray { pixels, size } => {
				let mut out = Vec::with_capacity(*size as usize * *size as usize * 4);
				for &gray in pixels {
					out.extend_from_slice(&[gray, gray, gray, 255]);
				}
				out
			}
			TileData::Full { pixels, .. } => pixels.clone(),
		}
	}

	#[must_use]
	pub fn is_uniform(&self) -> bool {
		matches!(self, TileData::Uniform { .. })
	}

	/// A transparent tile of the given size, the canonical "no data here" payload.
	#[must_use]
	pub fn empty(size: u32) -> Self {
		TileData::Uniform {
			color: [0, 0, 0, 0],
			size,
		}
	}
}

fn uniform_color(pixels: &[u8]) -> Option<[u8; 4]> {
	let first: [u8; 4] = pixels.get(0..4)?.try_into().ok()?;
	pixels
		.chunks_exact(4)
		.all(|px| px == first)
		.then_some(first)
}

fn is_grayscale(pixels: &[u8]) -> bool {
	pixels.chunks_exact(4).all(|px| px[0] == px[1] && px[1] == px[2] && px[3] == 255)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_uniform_tiles() {
		let pixels = [10, 20, 30, 255].repeat(4);
		let tile = TileData::from_rgba(&pixels, 2);
		assert_eq!(tile, TileData::Uniform { color: [10, 20, 30, 255], size: 2 });
	}

	#[test]
	fn detects_grayscale_tiles() {
		let mut pixels = Vec::new();
		for gray in [0u8, 64, 128, 255] {
			pixels.extend_from_slice(&[gray, gray, gray, 255]);
		}
		let tile = TileData::from_rgba(&pixels, 2);
		assert!(matches!(tile, TileData::Gray { .. }));
	}

	#[test]
	fn grayscale_with_partial_transparency_is_not_classified_as_gray() {
		let mut pixels = Vec::new();
		for (gray, alpha) in [(10u8, 255u8), (20, 128), (30, 255), (40, 255)] {
			pixels.extend_from_slice(&[gray, gray, gray, alpha]);
		}
		let tile = TileData::from_rgba(&pixels, 2);
		assert!(matches!(tile, TileData::Full { .. }));
	}

	#[test]
	fn falls_back_to_full_for_color_tiles() {
		let mut pixels = Vec::new();
		pixels.extend_from_slice(&[255, 0, 0, 255]);
		pixels.extend_from_slice(&[0, 255, 0, 255]);
		pixels.extend_from_slice(&[0, 0, 255, 255]);
		pixels.extend_from_slice(&[255, 255, 0, 255]);
		let tile = TileData::from_rgba(&pixels, 2);
		assert!(matches!(tile, TileData::Full { .. }));
	}

	#[test]
	fn to_rgba_round_trips_each_representation() {
		for pixels in [
			[10, 20, 30, 255].repeat(9),
			(0..9).flat_map(|i| [i as u8, i as u8, i as u8, 255]).collect(),
		] {
			let tile = TileData::from_rgba(&pixels, 3);
			assert_eq!(tile.to_rgba(), pixels);
		}
	}

	#[test]
	fn empty_tile_is_fully_transparent() {
		let tile = TileData::empty(4);
		assert_eq!(tile, TileData::Uniform { color: [0, 0, 0, 0], size: 4 });
	}
}
