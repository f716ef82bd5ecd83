//! Renders one output tile at the maximum zoom level directly from COG
//! sources: for every output pixel, find which source (if any) covers its
//! geographic location, then resample a kernel footprint out of that
//! source's pixel grid.

use std::sync::Arc;

use anyhow::Result;
use tilekiln_cog::reader::DecodedTile;
use tilekiln_cog::source::{SourceDescriptor, TileSource};
use tilekiln_core::{tilemath, Projection, TileCoord3};
use tilekiln_raster::encoder::terrarium;
use tilekiln_raster::resample::nodata::weighted_average_float;
use tilekiln_raster::resample::source::TileFetchCache;
use tilekiln_raster::resample::{resample_pixel, Kernel, PixelSource};
use tilekiln_raster::TileData;

use crate::source_cache::SourceTileCache;

/// Renders the 8-bit RGBA path: every pixel is looked up in whichever
/// selected source covers it, first match wins.
pub fn render_tile_rgba(descriptors: &[SourceDescriptor], sources: &[TileSource], cache: &SourceTileCache, output: TileCoord3, tile_size: u32, kernel: Kernel) -> Result<TileData> {
	let mut pixels = vec![0u8; tile_size as usize * tile_size as usize * 4];
	let (lons, lats) = precompute_lon_lat(output, tile_size);
	let mut any_opaque = false;

	for oy in 0..tile_size {
		for ox in 0..tile_size {
			let (lon, lat) = (lons[ox as usize], lats[oy as usize]);
			let Some((descriptor, tile_source, sx, sy)) = locate_source(descriptors, sources, lon, lat) else {
				continue;
			};
			let mut adapter = CogPixelSource::new(descriptor, tile_source, cache);
			let pixel = resample_pixel(&mut adapter, kernel, sx, sy);
			if pixel[3] > 0 {
				any_opaque = true;
			}
			let i = (oy as usize * tile_size as usize + ox as usize) * 4;
			pixels[i..i + 4].copy_from_slice(&pixel);
		}
	}

	if !any_opaque {
		return Ok(TileData::empty(tile_size));
	}
	Ok(TileData::from_rgba(&pixels, tile_size))
}

/// Renders the float/elevation path: identical source selection, but each
/// sample is a single elevation value blended in float space and then
/// packed into the Terrarium RGB encoding.
pub fn render_tile_elevation(descriptors: &[SourceDescriptor], sources: &[TileSource], cache: &SourceTileCache, output: TileCoord3, tile_size: u32, kernel: Kernel) -> Result<TileData> {
	let mut pixels = vec![0u8; tile_size as usize * tile_size as usize * 4];
	let (lons, lats) = precompute_lon_lat(output, tile_size);
	let mut any = false;

	for oy in 0..tile_size {
		for ox in 0..tile_size {
			let (lon, lat) = (lons[ox as usize], lats[oy as usize]);
			let Some((descriptor, tile_source, sx, sy)) = locate_source(descriptors, sources, lon, lat) else {
				continue;
			};
			let nodata = descriptor.reader.nodata().and_then(|s| s.parse::<f64>().ok());
			let mut adapter = CogElevationSource::new(descriptor, tile_source, cache, nodata);
			let Some(elevation) = sample_elevation(&mut adapter, kernel, sx, sy) else {
				continue;
			};
			let rgb = terrarium::encode_elevation(f64::from(elevation));
			let i = (oy as usize * tile_size as usize + ox as usize) * 4;
			pixels[i..i + 3].copy_from_slice(&rgb);
			pixels[i + 3] = 255;
			any = true;
		}
	}

	if !any {
		return Ok(TileData::empty(tile_size));
	}
	Ok(TileData::from_rgba(&pixels, tile_size))
}

/// Longitude per column and latitude per row for `output`, each computed
/// once rather than per pixel (`tile_size` columns + rows instead of
/// `tile_size^2` points).
fn precompute_lon_lat(output: TileCoord3, tile_size: u32) -> (Vec<f64>, Vec<f64>) {
	let (px0, py0) = tilemath::tile_pixel_coords(output.x, output.y, tile_size);
	let lons = (0..tile_size)
		.map(|ox| tilemath::pixel_to_lon_lat(px0 + f64::from(ox) + 0.5, py0, output.level, tile_size).0)
		.collect();
	let lats = (0..tile_size)
		.map(|oy| tilemath::pixel_to_lon_lat(px0, py0 + f64::from(oy) + 0.5, output.level, tile_size).1)
		.collect();
	(lons, lats)
}

/// Finds the first selected source whose native-CRS bounds contain
/// `(lon, lat)` and whose pixel coordinates (at that source's chosen IFD
/// level) fall within its raster, returning the source's pixel-space
/// position of the point.
fn locate_source<'a>(descriptors: &'a [SourceDescriptor], sources: &'a [TileSource], lon: f64, lat: f64) -> Option<(&'a SourceDescriptor, &'a TileSource, f64, f64)> {
	for tile_source in sources {
		let descriptor = descriptors.iter().find(|d| d.id == tile_source.source_id)?;
		let projection = Projection::from_epsg(descriptor.epsg).ok()?;
		let (nx, ny) = projection.from_lon_lat(lon, lat);
		if nx < descriptor.bounds.min_lon() || nx > descriptor.bounds.max_lon() || ny < descriptor.bounds.min_lat() || ny > descriptor.bounds.max_lat() {
			continue;
		}

		let (pixel_size_x, pixel_size_y) = tile_source.pixel_size;
		if pixel_size_x <= 0.0 || pixel_size_y <= 0.0 {
			continue;
		}
		let sx = (nx - descriptor.bounds.min_lon()) / pixel_size_x;
		let sy = (descriptor.bounds.max_lat() - ny) / pixel_size_y;
		let (width, height) = tile_source.image_dims;
		if sx < 0.0 || sy < 0.0 || sx >= f64::from(width) || sy >= f64::from(height) {
			continue;
		}
		return Some((descriptor, tile_source, sx, sy));
	}
	None
}

/// A fetch cache bounded to this output pixel's footprint: up to four
/// distinct `(col, row)` source tiles regardless of how many taps a wide
/// kernel (Lanczos-3's 6x6) samples from within them.
type DecodedTileCache<'a> = TileFetchCache<(u32, u32), Arc<DecodedTile>, Box<dyn FnMut(&(u32, u32)) -> Option<Arc<DecodedTile>> + 'a>>;

fn decoded_tile_cache<'a>(source_id: tilekiln_cog::source::SourceId, reader: &'a (dyn tilekiln_cog::reader::CogReader + Send + Sync), ifd_level: usize, cache: &'a SourceTileCache) -> DecodedTileCache<'a> {
	TileFetchCache::new(Box::new(move |&(col, row): &(u32, u32)| cache.get_or_read(source_id, reader, ifd_level, col, row).ok()))
}

struct CogPixelSource<'a> {
	tile_source: &'a TileSource,
	fetch: DecodedTileCache<'a>,
}

impl<'a> CogPixelSource<'a> {
	fn new(descriptor: &'a SourceDescriptor, tile_source: &'a TileSource, cache: &'a SourceTileCache) -> Self {
		let fetch = decoded_tile_cache(descriptor.id, descriptor.reader.as_ref(), tile_source.ifd_level, cache);
		CogPixelSource { tile_source, fetch }
	}
}

impl PixelSource for CogPixelSource<'_> {
	fn sample(&mut self, x: i64, y: i64) -> Option<[u8; 4]> {
		let (col, row) = tile_index(self.tile_source, x, y)?;
		let tile = self.fetch.get(&(col, row))?;
		let (local_x, local_y) = local_pixel(self.tile_source, x, y)?;
		decode_rgba_pixel(&tile, local_x, local_y)
	}
}

struct CogElevationSource<'a> {
	tile_source: &'a TileSource,
	fetch: DecodedTileCache<'a>,
	nodata: Option<f64>,
}

impl<'a> CogElevationSource<'a> {
	fn new(descriptor: &'a SourceDescriptor, tile_source: &'a TileSource, cache: &'a SourceTileCache, nodata: Option<f64>) -> Self {
		let fetch = decoded_tile_cache(descriptor.id, descriptor.reader.as_ref(), tile_source.ifd_level, cache);
		CogElevationSource { tile_source, fetch, nodata }
	}

	fn sample(&mut self, x: i64, y: i64) -> Option<f32> {
		let (col, row) = tile_index(self.tile_source, x, y)?;
		let tile = self.fetch.get(&(col, row))?;
		let (local_x, local_y) = local_pixel(self.tile_source, x, y)?;
		decode_float_pixel(&tile, local_x, local_y, self.nodata)
	}
}

fn tile_index(tile_source: &TileSource, x: i64, y: i64) -> Option<(u32, u32)> {
	let (width, height) = tile_source.image_dims;
	if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
		return None;
	}
	let (tile_w, tile_h) = tile_source.tile_dims;
	Some((x as u32 / tile_w, y as u32 / tile_h))
}

fn local_pixel(tile_source: &TileSource, x: i64, y: i64) -> Option<(usize, usize)> {
	let (tile_w, tile_h) = tile_source.tile_dims;
	if x < 0 || y < 0 {
		return None;
	}
	Some(((x as u32 % tile_w) as usize, (y as u32 % tile_h) as usize))
}

fn decode_rgba_pixel(tile: &DecodedTile, x: usize, y: usize) -> Option<[u8; 4]> {
	if x >= tile.width as usize || y >= tile.height as usize {
		return None;
	}
	let bands = tile.bands as usize;
	let idx = (y * tile.width as usize + x) * bands;
	let sample = |band: usize| tile.pixels.get(idx + band).copied().unwrap_or(0);
	match bands {
		1 => {
			let v = sample(0);
			Some([v, v, v, 255])
		}
		3 => Some([sample(0), sample(1), sample(2), 255]),
		4 => {
			let pixel = [sample(0), sample(1), sample(2), sample(3)];
			(pixel[3] > 0).then_some(pixel)
		}
		_ => None,
	}
}

fn decode_float_pixel(tile: &DecodedTile, x: usize, y: usize, nodata: Option<f64>) -> Option<f32> {
	if x >= tile.width as usize || y >= tile.height as usize || !tile.is_float || tile.bits_per_sample != 32 {
		return None;
	}
	let stride = tile.bands as usize * 4;
	let idx = (y * tile.width as usize + x) * stride;
	let bytes: [u8; 4] = tile.pixels.get(idx..idx + 4)?.try_into().ok()?;
	let value = f32::from_le_bytes(bytes);
	if value.is_nan() {
		return None;
	}
	if let Some(nd) = nodata {
		if (f64::from(value) - nd).abs() < 1e-6 {
			return None;
		}
	}
	Some(value)
}

/// Blends a kernel footprint of elevation samples the same way
/// `resample_pixel` blends RGBA ones; `Mode` has no sensible vote over
/// continuous elevation so it falls back to a direct nearest-neighbor pick.
fn sample_elevation(source: &mut CogElevationSource, kernel: Kernel, sx: f64, sy: f64) -> Option<f32> {
	if kernel == Kernel::Mode {
		return source.sample(sx.round() as i64, sy.round() as i64);
	}

	let radius = kernel.radius() as i64;
	let base_x = sx.floor() as i64 - (radius - 1).max(0);
	let base_y = sy.floor() as i64 - (radius - 1).max(0);
	let weights_x = kernel.weights_1d(sx - sx.floor());
	let weights_y = kernel.weights_1d(sy - sy.floor());

	let mut samples = Vec::with_capacity(weights_x.len() * weights_y.len());
	for (j, wy) in weights_y.iter().enumerate() {
		for (i, wx) in weights_x.iter().enumerate() {
			let value = source.sample(base_x + i as i64, base_y + j as i64);
			samples.push((value, wx * wy));
		}
	}
	weighted_average_float(&samples)
}
