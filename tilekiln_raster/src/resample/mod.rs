//! The resampling kernel library: reduces a window of source pixels into a
//! single output pixel, weighting nodata out of the blend rather than
//! letting it bleed into the result.

pub mod kernel;
pub mod nodata;
pub mod source;

pub use kernel::Kernel;

use crate::TileData;
use std::collections::HashMap;

/// Anything that can answer "what's at source pixel `(x, y)`?" — implemented
/// by the COG reader's tile cache in the pyramid generator, and by a plain
/// in-memory buffer in tests.
pub trait PixelSource {
	/// `None` means the pixel is outside the source raster or is a declared
	/// nodata value.
	fn sample(&mut self, x: i64, y: i64) -> Option<[u8; 4]>;
}

/// Resamples a `size x size` output tile from `source`, where output pixel
/// `(ox, oy)`'s footprint is centered on source coordinate
/// `src_origin + (ox + 0.5, oy + 0.5) * src_scale`.
#[must_use]
pub fn resample_tile(
	source: &mut impl PixelSource,
	kernel: Kernel,
	size: u32,
	src_origin: (f64, f64),
	src_scale: f64,
) -> TileData {
	let mut pixels = vec![0u8; size as usize * size as usize * 4];

	for oy in 0..size {
		for ox in 0..size {
			let sx = src_origin.0 + (f64::from(ox) + 0.5) * src_scale;
			let sy = src_origin.1 + (f64::from(oy) + 0.5) * src_scale;
			let pixel = resample_pixel(source, kernel, sx, sy);
			let i = (oy as usize * size as usize + ox as usize) * 4;
			pixels[i..i + 4].copy_from_slice(&pixel);
		}
	}

	TileData::from_rgba(&pixels, size)
}

/// Resamples the single output pixel centered on source coordinate `(sx, sy)`.
#[must_use]
pub fn resample_pixel(source: &mut impl PixelSource, kernel: Kernel, sx: f64, sy: f64) -> [u8; 4] {
	if kernel == Kernel::Mode {
		return mode_pixel(source, sx, sy);
	}

	let radius = kernel.radius() as i64;
	let base_x = sx.floor() as i64 - (radius - 1).max(0);
	let base_y = sy.floor() as i64 - (radius - 1).max(0);
	let frac_x = sx - sx.floor();
	let frac_y = sy - sy.floor();

	let weights_x = kernel.weights_1d(frac_x);
	let weights_y = kernel.weights_1d(frac_y);

	let mut samples = Vec::with_capacity(weights_x.len() * weights_y.len());
	for (j, wy) in weights_y.iter().enumerate() {
		for (i, wx) in weights_x.iter().enumerate() {
			let px = source.sample(base_x + i as i64, base_y + j as i64);
			samples.push((px, wx * wy));
		}
	}

	nodata::weighted_average_rgba(&samples).unwrap_or([0, 0, 0, 0])
}

fn mode_pixel(source: &mut impl PixelSource, sx: f64, sy: f64) -> [u8; 4] {
	let radius = Kernel::Mode.radius() as i64;
	let base_x = sx.floor() as i64 - radius + 1;
	let base_y = sy.floor() as i64 - radius + 1;
	let span = 2 * radius;

	let mut counts: HashMap<[u8; 4], (u32, usize)> = HashMap::new();
	let mut order = 0usize;
	for j in 0..span {
		for i in 0..span {
			if let Some(px) = source.sample(base_x + i, base_y + j) {
				let entry = counts.entry(px).or_insert((0, order));
				entry.0 += 1;
				order += 1;
			}
		}
	}

	counts
		.into_iter()
		.max_by_key(|(_, (count, first_seen))| (*count, std::cmp::Reverse(*first_seen)))
		.map_or([0, 0, 0, 0], |(px, _)| px)
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Grid {
		size: i64,
		pixels: Vec<[u8; 4]>,
	}

	impl PixelSource for Grid {
		fn sample(&mut self, x: i64, y: i64) -> Option<[u8; 4]> {
			if x < 0 || y < 0 || x >= self.size || y >= self.size {
				return None;
			}
			Some(self.pixels[(y * self.size + x) as usize])
		}
	}

	#[test]
	fn nearest_picks_the_exact_pixel() {
		let mut grid = Grid {
			size: 2,
			pixels: vec![[10, 0, 0, 255], [20, 0, 0, 255], [30, 0, 0, 255], [40, 0, 0, 255]],
		};
		let pixel = resample_pixel(&mut grid, Kernel::Nearest, 1.5, 1.5);
		assert_eq!(pixel, [40, 0, 0, 255]);
	}

	#[test]
	fn bilinear_averages_the_four_neighbors() {
		let mut grid = Grid {
			size: 2,
			pixels: vec![[0, 0, 0, 255], [100, 0, 0, 255], [0, 0, 0, 255], [100, 0, 0, 255]],
		};
		// Centered exactly between all four source pixels.
		let pixel = resample_pixel(&mut grid, Kernel::Bilinear, 0.5, 0.5);
		assert_eq!(pixel[0], 50);
	}

	#[test]
	fn mode_picks_the_most_common_value() {
		let mut grid = Grid {
			size: 2,
			pixels: vec![[1, 0, 0, 255], [1, 0, 0, 255], [1, 0, 0, 255], [9, 0, 0, 255]],
		};
		let pixel = resample_pixel(&mut grid, Kernel::Mode, 0.5, 0.5);
		assert_eq!(pixel, [1, 0, 0, 255]);
	}

	#[test]
	fn a_tile_resamples_entirely_from_nodata_to_transparent() {
		struct AllNodata;
		impl PixelSource for AllNodata {
			fn sample(&mut self, _x: i64, _y: i64) -> Option<[u8; 4]> {
				None
			}
		}
		let tile = resample_tile(&mut AllNodata, Kernel::Bilinear, 4, (0.0, 0.0), 1.0);
		assert_eq!(tile, TileData::empty(4));
	}

	#[test]
	fn fetch_count_stays_bounded_regardless_of_kernel_footprint() {
		use source::TileFetchCache;
		let mut loads = 0;
		let mut cache = TileFetchCache::new(|key: &(i64, i64)| {
			loads += 1;
			Some(*key)
		});
		// A lanczos footprint touches many pixels but only up to 4 *tiles*.
		for (x, y) in [(-1, -1), (0, -1), (-1, 0), (0, 0)] {
			cache.get(&(x.div_euclid(256), y.div_euclid(256)));
		}
		assert!(cache.fetch_count() <= 4);
	}
}
