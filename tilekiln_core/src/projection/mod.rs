//! Source coordinate reference systems a COG raster can be read in. Each
//! variant converts between its native projected coordinates and WGS84
//! longitude/latitude, which is the only system the tile grid itself
//! understands.

use anyhow::{bail, Result};

mod lv95;
mod web_mercator;

/// A closed set of the coordinate reference systems this crate knows how to
/// reproject from — deliberately not a `dyn Trait` extension point, since
/// every other PMTiles-facing enum in this codebase (tile type, compression)
/// is a fixed, exhaustively-matched set rather than an open trait object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
	/// EPSG:4326 — coordinates are already longitude/latitude.
	Identity,
	/// EPSG:3857 — spherical Mercator, the tile grid's own projection.
	WebMercator,
	/// EPSG:2056 — Swiss CH1903+ / LV95, via swisstopo's published
	/// approximate polynomial (accurate to ~1m, sufficient for tile
	/// rendering though not for surveying).
	Lv95,
}

impl Projection {
	pub fn from_epsg(code: u16) -> Result<Self> {
		Ok(match code {
			4326 => Projection::Identity,
			3857 | 900_913 => Projection::WebMercator,
			2056 => Projection::Lv95,
			other => bail!("unsupported source EPSG code {other}"),
		})
	}

	/// Converts a point in this projection's native units into WGS84 degrees.
	#[must_use]
	pub fn to_lon_lat(&self, x: f64, y: f64) -> (f64, f64) {
		match self {
			Projection::Identity => (x, y),
			Projection::WebMercator => web_mercator::to_lon_lat(x, y),
			Projection::Lv95 => lv95::to_lon_lat(x, y),
		}
	}

	/// Converts a WGS84 point into this projection's native units.
	#[must_use]
	pub fn from_lon_lat(&self, lon: f64, lat: f64) -> (f64, f64) {
		match self {
			Projection::Identity => (lon, lat),
			Projection::WebMercator => web_mercator::from_lon_lat(lon, lat),
			Projection::Lv95 => lv95::from_lon_lat(lon, lat),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identity_passes_coordinates_through() {
		assert_eq!(Projection::Identity.to_lon_lat(8.5, 47.3), (8.5, 47.3));
	}

	#[test]
	fn from_epsg_recognizes_known_codes() {
		assert_eq!(Projection::from_epsg(4326).unwrap(), Projection::Identity);
		assert_eq!(Projection::from_epsg(3857).unwrap(), Projection::WebMercator);
		assert_eq!(Projection::from_epsg(2056).unwrap(), Projection::Lv95);
		assert!(Projection::from_epsg(1).is_err());
	}

	#[test]
	fn web_mercator_round_trips() {
		let proj = Projection::WebMercator;
		let (x, y) = proj.from_lon_lat(8.5, 47.3);
		let (lon, lat) = proj.to_lon_lat(x, y);
		assert!((lon - 8.5).abs() < 1e-9);
		assert!((lat - 47.3).abs() < 1e-9);
	}

	#[test]
	fn lv95_round_trips_within_a_meter() {
		let proj = Projection::Lv95;
		// Bern, roughly.
		let (lon0, lat0) = (7.4474, 46.9480);
		let (e, n) = proj.from_lon_lat(lon0, lat0);
		let (lon, lat) = proj.to_lon_lat(e, n);
		assert!((lon - lon0).abs() < 1e-4);
		assert!((lat - lat0).abs() < 1e-4);
	}
}
