//! Composes the four child tiles at zoom `z + 1` into one output tile at
//! zoom `z`. Children are ordered the same way `TileCoord3::children`
//! returns them: top-left, top-right, bottom-left, bottom-right.

use std::collections::HashMap;

use tilekiln_raster::encoder::terrarium::{decode_elevation, encode_elevation};
use tilekiln_raster::resample::nodata::{weighted_average_float, weighted_average_rgba};
use tilekiln_raster::resample::Kernel;
use tilekiln_raster::TileData;

/// Downsamples four already-rendered RGBA children into one tile.
#[must_use]
pub fn downsample_tile(children: &[TileData; 4], kernel: Kernel, tile_size: u32) -> TileData {
	if let Some(color) = uniform_if_identical(children) {
		return TileData::Uniform { color, size: tile_size };
	}

	let buffers = [children[0].to_rgba(), children[1].to_rgba(), children[2].to_rgba(), children[3].to_rgba()];
	let mut pixels = vec![0u8; tile_size as usize * tile_size as usize * 4];

	for oy in 0..tile_size {
		for ox in 0..tile_size {
			let block = combined_block(&buffers, tile_size, ox, oy);
			let pixel = match kernel {
				Kernel::Nearest => nearest_rgba(block),
				Kernel::Mode => mode_rgba(block),
				_ => weighted_average_rgba(&block.map(|px| (Some(px), 0.25))).unwrap_or([0, 0, 0, 0]),
			};
			let i = (oy as usize * tile_size as usize + ox as usize) * 4;
			pixels[i..i + 4].copy_from_slice(&pixel);
		}
	}

	TileData::from_rgba(&pixels, tile_size)
}

/// Downsamples four Terrarium-encoded children, decoding each to elevation,
/// blending in float space, and re-encoding — never averaging raw RGB bytes,
/// which would corrupt the packed elevation value.
#[must_use]
pub fn downsample_tile_elevation(children: &[TileData; 4], kernel: Kernel, tile_size: u32) -> TileData {
	let buffers = [children[0].to_rgba(), children[1].to_rgba(), children[2].to_rgba(), children[3].to_rgba()];
	let mut pixels = vec![0u8; tile_size as usize * tile_size as usize * 4];
	let mut any = false;

	for oy in 0..tile_size {
		for ox in 0..tile_size {
			let block = combined_block(&buffers, tile_size, ox, oy).map(|px| (px[3] > 0).then(|| decode_elevation([px[0], px[1], px[2]])));

			let elevation = match kernel {
				Kernel::Mode | Kernel::Nearest => block.into_iter().find_map(|v| v),
				_ => weighted_average_float(&block.map(|v| (v.map(|e| e as f32), 0.25))).map(f64::from),
			};

			let i = (oy as usize * tile_size as usize + ox as usize) * 4;
			if let Some(elevation) = elevation {
				pixels[i..i + 3].copy_from_slice(&encode_elevation(elevation));
				pixels[i + 3] = 255;
				any = true;
			}
		}
	}

	if !any {
		return TileData::empty(tile_size);
	}
	TileData::from_rgba(&pixels, tile_size)
}

fn uniform_if_identical(children: &[TileData; 4]) -> Option<[u8; 4]> {
	let TileData::Uniform { color, .. } = &children[0] else {
		return None;
	};
	children.iter().all(|c| matches!(c, TileData::Uniform { color: other, .. } if other == color)).then_some(*color)
}

/// The 2x2 block of RGBA pixels in the combined (2x tile_size) grid that
/// output pixel `(ox, oy)` downsamples from, in `[TL, TR, BL, BR]` order.
fn combined_block(buffers: &[Vec<u8>; 4], tile_size: u32, ox: u32, oy: u32) -> [[u8; 4]; 4] {
	let (cx, cy) = (2 * ox, 2 * oy);
	[(cx, cy), (cx + 1, cy), (cx, cy + 1), (cx + 1, cy + 1)].map(|(x, y)| combined_pixel(buffers, tile_size, x, y))
}

fn combined_pixel(buffers: &[Vec<u8>; 4], tile_size: u32, cx: u32, cy: u32) -> [u8; 4] {
	let col = cx / tile_size;
	let row = cy / tile_size;
	let child = &buffers[(row * 2 + col) as usize];
	let (local_x, local_y) = (cx % tile_size, cy % tile_size);
	let idx = (local_y as usize * tile_size as usize + local_x as usize) * 4;
	[child[idx], child[idx + 1], child[idx + 2], child[idx + 3]]
}

fn nearest_rgba(block: [[u8; 4]; 4]) -> [u8; 4] {
	block.into_iter().find(|px| px[3] > 0).unwrap_or([0, 0, 0, 0])
}

fn mode_rgba(block: [[u8; 4]; 4]) -> [u8; 4] {
	let mut counts: HashMap<[u8; 4], (u32, usize)> = HashMap::new();
	for (order, px) in block.into_iter().enumerate() {
		let entry = counts.entry(px).or_insert((0, order));
		entry.0 += 1;
	}
	counts.into_iter().max_by_key(|(_, (count, first_seen))| (*count, std::cmp::Reverse(*first_seen))).map_or([0, 0, 0, 0], |(px, _)| px)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn solid(color: [u8; 4], size: u32) -> TileData {
		TileData::from_rgba(&color.repeat(size as usize * size as usize), size)
	}

	#[test]
	fn four_identical_uniform_children_stay_uniform() {
		let children = [solid([1, 2, 3, 255], 2), solid([1, 2, 3, 255], 2), solid([1, 2, 3, 255], 2), solid([1, 2, 3, 255], 2)];
		let out = downsample_tile(&children, Kernel::Bilinear, 2);
		assert_eq!(out, TileData::Uniform { color: [1, 2, 3, 255], size: 2 });
	}

	#[test]
	fn mismatched_children_fall_back_to_per_pixel_blend() {
		let children = [solid([255, 0, 0, 255], 2), solid([0, 255, 0, 255], 2), solid([0, 0, 255, 255], 2), solid([255, 255, 0, 255], 2)];
		let out = downsample_tile(&children, Kernel::Bilinear, 2);
		assert!(!out.is_uniform());
		let pixels = out.to_rgba();
		// Top-left output pixel draws entirely from the top-left child.
		assert_eq!(&pixels[0..4], &[255, 0, 0, 255]);
	}

	#[test]
	fn nearest_skips_transparent_quadrants() {
		let children = [TileData::empty(2), solid([9, 9, 9, 255], 2), TileData::empty(2), TileData::empty(2)];
		let out = downsample_tile(&children, Kernel::Nearest, 2);
		let pixels = out.to_rgba();
		// Top-right quadrant is the only opaque source for the top-right output pixel.
		assert_eq!(&pixels[4..8], &[9, 9, 9, 255]);
	}

	#[test]
	fn elevation_children_average_in_float_space_not_raw_bytes() {
		let a = encode_elevation(100.0);
		let b = encode_elevation(300.0);
		let tile_a = TileData::from_rgba(&[a[0], a[1], a[2], 255].repeat(4), 2);
		let tile_b = TileData::from_rgba(&[b[0], b[1], b[2], 255].repeat(4), 2);
		let children = [tile_a.clone(), tile_b.clone(), tile_a, tile_b];
		let out = downsample_tile_elevation(&children, Kernel::Bilinear, 2);
		let pixels = out.to_rgba();
		let elevation = decode_elevation([pixels[0], pixels[1], pixels[2]]);
		assert!((elevation - 200.0).abs() < 1.0);
	}

	#[test]
	fn all_transparent_elevation_children_yield_an_empty_tile() {
		let children = [TileData::empty(2), TileData::empty(2), TileData::empty(2), TileData::empty(2)];
		let out = downsample_tile_elevation(&children, Kernel::Bilinear, 2);
		assert_eq!(out, TileData::empty(2));
	}
}
