//! Web-Mercator tile/pixel math shared by the renderer and the coordinate
//! model. All functions here assume the standard EPSG:3857 slippy-map grid
//! with square tiles of `tile_size` pixels per side.

use std::f64::consts::PI;

const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.685_578_5;

/// Converts a geographic point into fractional tile coordinates at `level`.
#[must_use]
pub fn lon_lat_to_tile(lon: f64, lat: f64, level: u8) -> (f64, f64) {
	let n = f64::from(1u32 << level);
	let x = (lon + 180.0) / 360.0 * n;
	let lat_rad = lat.to_radians();
	let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;
	(x, y)
}

/// Converts a pixel position within the global raster at `level` (tile size
/// `tile_size`) back into geographic coordinates.
#[must_use]
pub fn pixel_to_lon_lat(px: f64, py: f64, level: u8, tile_size: u32) -> (f64, f64) {
	let n = f64::from(1u32 << level) * f64::from(tile_size);
	let lon = px / n * 360.0 - 180.0;
	let unit = PI * (1.0 - 2.0 * py / n);
	let lat = unit.sinh().atan().to_degrees();
	(lon, lat)
}

/// The pixel coordinates, within the global raster at `level`, of the
/// top-left corner of tile `(x, y)`.
#[must_use]
pub fn tile_pixel_coords(x: u32, y: u32, tile_size: u32) -> (f64, f64) {
	(f64::from(x) * f64::from(tile_size), f64::from(y) * f64::from(tile_size))
}

/// Ground resolution, in meters per pixel, at the given latitude and zoom
/// level for a grid with `tile_size`-pixel tiles.
#[must_use]
pub fn resolution_at_lat(lat: f64, level: u8, tile_size: u32) -> f64 {
	let n = f64::from(1u32 << level) * f64::from(tile_size);
	lat.to_radians().cos() * EARTH_CIRCUMFERENCE_M / n
}

/// The smallest zoom level whose ground resolution is at or finer than
/// `target_m_per_px`, at the equator (the grid's tightest resolution for a
/// given level).
#[must_use]
pub fn max_zoom_for_resolution(target_m_per_px: f64, tile_size: u32) -> u8 {
	for level in 0..=24u8 {
		if resolution_at_lat(0.0, level, tile_size) <= target_m_per_px {
			return level;
		}
	}
	24
}

/// Approximate ground size, in meters, of one source pixel given its
/// angular size in degrees at latitude `lat`.
#[must_use]
pub fn pixel_size_in_ground_meters(pixel_size_deg: f64, lat: f64) -> f64 {
	let meters_per_degree = EARTH_CIRCUMFERENCE_M / 360.0 * lat.to_radians().cos();
	pixel_size_deg * meters_per_degree
}
