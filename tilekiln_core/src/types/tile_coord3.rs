use anyhow::{bail, Result};
use std::cmp::Ordering;

use super::geo_bbox::GeoBBox;
use super::HilbertIndex;

/// The globally-unique `u64` a PMTiles directory addresses tiles by.
pub type TileId = u64;

/// A tile coordinate in XYZ slippy-map convention: `x`/`y` grow eastward and
/// southward from the top-left of the zoom level, `level` is the zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord3 {
	pub x: u32,
	pub y: u32,
	pub level: u8,
}

impl TileCoord3 {
	pub fn new(x: u32, y: u32, level: u8) -> Result<Self> {
		let n = 1u32
			.checked_shl(u32::from(level))
			.unwrap_or(u32::MAX);
		if x >= n || y >= n {
			bail!("tile ({x}, {y}) is out of bounds for zoom level {level}");
		}
		Ok(TileCoord3 { x, y, level })
	}

	#[must_use]
	pub fn get_tile_id(&self) -> Result<TileId> {
		self.get_hilbert_index()
	}

	/// The four tiles in the next-higher zoom level that, when downsampled
	/// 2x2, compose this tile.
	#[must_use]
	pub fn children(&self) -> [TileCoord3; 4] {
		let level = self.level + 1;
		let x = self.x * 2;
		let y = self.y * 2;
		[
			TileCoord3 { x, y, level },
			TileCoord3 { x: x + 1, y, level },
			TileCoord3 { x, y: y + 1, level },
			TileCoord3 { x: x + 1, y: y + 1, level },
		]
	}

	/// The tile in the next-lower zoom level this tile is a quadrant of.
	#[must_use]
	pub fn parent(&self) -> Option<TileCoord3> {
		if self.level == 0 {
			return None;
		}
		Some(TileCoord3 {
			x: self.x / 2,
			y: self.y / 2,
			level: self.level - 1,
		})
	}

	/// This tile's geographic bounds under the standard web-Mercator (EPSG:3857) grid.
	#[must_use]
	pub fn as_geo_bbox(&self) -> GeoBBox {
		let n = f64::from(1u32 << self.level);
		let lon = |x: f64| x / n * 360.0 - 180.0;
		let lat = |y: f64| {
			let unit = std::f64::consts::PI * (1.0 - 2.0 * y / n);
			unit.sinh().atan().to_degrees()
		};
		GeoBBox::new(
			lon(f64::from(self.x)),
			lat(f64::from(self.y) + 1.0),
			lon(f64::from(self.x) + 1.0),
			lat(f64::from(self.y)),
		)
	}
}

impl PartialOrd for TileCoord3 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for TileCoord3 {
	fn cmp(&self, other: &Self) -> Ordering {
		self.level
			.cmp(&other.level)
			.then_with(|| self.get_hilbert_index().unwrap_or(0).cmp(&other.get_hilbert_index().unwrap_or(0)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_coordinates_outside_the_grid() {
		assert!(TileCoord3::new(1, 0, 0).is_err());
		assert!(TileCoord3::new(4, 4, 2).is_err());
		assert!(TileCoord3::new(3, 3, 2).is_ok());
	}

	#[test]
	fn children_subdivide_into_the_next_zoom() {
		let coord = TileCoord3::new(1, 2, 3).unwrap();
		let kids = coord.children();
		assert_eq!(kids[0], TileCoord3::new(2, 4, 4).unwrap());
		assert_eq!(kids[3], TileCoord3::new(3, 5, 4).unwrap());
		for child in kids {
			assert_eq!(child.parent().unwrap(), coord);
		}
	}

	#[test]
	fn root_tile_has_no_parent() {
		assert!(TileCoord3::new(0, 0, 0).unwrap().parent().is_none());
	}

	#[test]
	fn root_tile_covers_the_whole_world() {
		let bbox = TileCoord3::new(0, 0, 0).unwrap().as_geo_bbox();
		assert!((bbox.min_lon() - -180.0).abs() < 1e-9);
		assert!((bbox.max_lon() - 180.0).abs() < 1e-9);
		assert!(bbox.min_lat() < -85.0);
		assert!(bbox.max_lat() > 85.0);
	}

	#[test]
	fn ordering_groups_by_zoom_then_hilbert_index() {
		let a = TileCoord3::new(0, 0, 0).unwrap();
		let b = TileCoord3::new(0, 0, 1).unwrap();
		let c = TileCoord3::new(1, 1, 1).unwrap();
		assert!(a < b);
		assert!(b < c);
	}
}
