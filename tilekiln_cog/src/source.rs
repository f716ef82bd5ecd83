use std::path::PathBuf;
use std::sync::Arc;

use tilekiln_core::{GeoBBox, Projection, TileCoord3};

use crate::reader::CogReader;

/// Identity token for a source raster, used as a cache key by whatever
/// holds a set of `SourceDescriptor`s across output tiles.
pub type SourceId = u64;

/// Everything the generator needs to know about one input raster, computed
/// once at startup and held for the lifetime of the run.
pub struct SourceDescriptor {
	pub id: SourceId,
	pub path: PathBuf,
	pub reader: Arc<dyn CogReader + Send + Sync>,
	pub bounds: GeoBBox,
	pub epsg: u16,
}

impl SourceDescriptor {
	pub fn new(id: SourceId, path: PathBuf, reader: Arc<dyn CogReader + Send + Sync>) -> Self {
		let bounds = reader.crs_bounds();
		let epsg = reader.epsg();
		Self { id, path, reader, bounds, epsg }
	}
}

/// A transient, per-output-tile projection of the sources that overlap it:
/// which IFD level to read, at what pixel size, and the source-tile grid
/// that level implies. Recomputed once per output tile, never per pixel.
pub struct TileSource {
	pub source_id: SourceId,
	pub ifd_level: usize,
	pub pixel_size: (f64, f64),
	pub image_dims: (u32, u32),
	pub tile_dims: (u32, u32),
}

impl TileSource {
	/// Builds the per-tile source list for `output`, keeping only sources
	/// whose bounds overlap the output tile's geographic extent and
	/// choosing, for each, the IFD level whose resolution best matches the
	/// tile's target ground resolution.
	///
	/// `source.bounds` is in that source's own native CRS, not WGS84 — each
	/// source's four corners are projected to WGS84 before the overlap
	/// check, since sources may mix EPSG codes.
	pub fn select(sources: &[SourceDescriptor], output: TileCoord3, target_m_per_px: f64) -> Vec<TileSource> {
		let output_bounds = output.as_geo_bbox();
		sources
			.iter()
			.filter(|source| source_wgs84_bounds(source).intersects(&output_bounds))
			.map(|source| {
				let level = source.reader.best_ifd_for_resolution(target_m_per_px);
				TileSource {
					source_id: source.id,
					ifd_level: level,
					pixel_size: source.reader.pixel_size(level),
					image_dims: source.reader.image_dims(level),
					tile_dims: (256, 256),
				}
			})
			.collect()
	}
}

/// Projects a source's native-CRS bounds (as recorded in `crs_bounds`) into
/// WGS84 by reprojecting all four corners and taking their envelope, per the
/// corner-projection convention the renderer itself uses.
fn source_wgs84_bounds(source: &SourceDescriptor) -> GeoBBox {
	let Ok(projection) = Projection::from_epsg(source.epsg) else {
		return source.bounds;
	};
	let (x0, y0, x1, y1) = (source.bounds.min_lon(), source.bounds.min_lat(), source.bounds.max_lon(), source.bounds.max_lat());
	let mut bbox: Option<GeoBBox> = None;
	for (x, y) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
		let (lon, lat) = projection.to_lon_lat(x, y);
		let corner = GeoBBox::new(lon, lat, lon, lat);
		match &mut bbox {
			Some(b) => b.extend(&corner),
			None => bbox = Some(corner),
		}
	}
	bbox.unwrap_or(source.bounds)
}
