use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tilekiln_cog::reader::{CogReader, TiledGeoTiffReader};
use tilekiln_cog::source::SourceDescriptor;
use tilekiln_core::{tilemath, GeoBBox, Projection};

/// Everything derived from the opened input sources before the pyramid
/// generator is built: the descriptor list itself, the WGS84 envelope
/// they cover, the finest zoom level none of them need upsampling past,
/// and whether every source is floating-point (driving the `terrarium`
/// format auto-switch).
pub struct OpenedSources {
	pub descriptors: Vec<SourceDescriptor>,
	pub bounds: GeoBBox,
	pub native_max_zoom: u8,
	pub all_float: bool,
}

/// Resolves `inputs` (files or directories) to a flat list of raster
/// paths, collecting every missing-or-unreadable entry before returning
/// so the caller can report them all together, matching the "collect all
/// input errors before opening any" error-handling contract.
pub fn discover_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
	let mut paths = Vec::new();
	let mut missing = Vec::new();

	for input in inputs {
		if !input.exists() {
			missing.push(input.display().to_string());
			continue;
		}
		if input.is_dir() {
			let mut matches = collect_tiffs(input)?;
			matches.sort();
			paths.extend(matches);
		} else {
			paths.push(input.clone());
		}
	}

	if !missing.is_empty() {
		bail!("input path(s) not found: {}", missing.join(", "));
	}
	if paths.is_empty() {
		bail!("no GeoTIFF/COG inputs found among the given paths");
	}
	Ok(paths)
}

fn collect_tiffs(dir: &Path) -> Result<Vec<PathBuf>> {
	let mut out = Vec::new();
	for entry in std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))? {
		let entry = entry?;
		let path = entry.path();
		let is_tiff = path.extension().and_then(|e| e.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"));
		if path.is_file() && is_tiff {
			out.push(path);
		}
	}
	Ok(out)
}

/// Opens every path as a `TiledGeoTiffReader`, building the source
/// descriptor list and deriving the bounds/zoom defaults the CLI falls
/// back to when `--min-zoom`/`--max-zoom` are not given.
pub fn open_sources(paths: &[PathBuf], tile_size: u32) -> Result<OpenedSources> {
	let mut descriptors = Vec::with_capacity(paths.len());
	let mut bounds: Option<GeoBBox> = None;
	let mut finest_m_per_px = f64::MAX;
	let mut all_float = true;

	for (id, path) in paths.iter().enumerate() {
		let reader = TiledGeoTiffReader::open(path)?;
		all_float &= reader.is_float();

		let wgs84 = source_wgs84_bounds(&reader)?;
		match &mut bounds {
			Some(b) => b.extend(&wgs84),
			None => bounds = Some(wgs84),
		}

		let center_lat = wgs84.center().1;
		let (px, py) = reader.pixel_size(0);
		let m_per_px = pixel_size_to_meters(px.abs().min(py.abs()), reader.epsg(), center_lat);
		finest_m_per_px = finest_m_per_px.min(m_per_px);

		descriptors.push(SourceDescriptor::new(id as u64, path.clone(), Arc::new(reader)));
	}

	let bounds = bounds.unwrap_or(GeoBBox::new(-180.0, -85.051_128_78, 180.0, 85.051_128_78));
	let native_max_zoom = tilemath::max_zoom_for_resolution(finest_m_per_px, tile_size);

	Ok(OpenedSources { descriptors, bounds, native_max_zoom, all_float })
}

fn pixel_size_to_meters(pixel_size: f64, epsg: u16, lat: f64) -> f64 {
	if epsg == 4326 {
		tilemath::pixel_size_in_ground_meters(pixel_size, lat)
	} else {
		pixel_size
	}
}

/// Projects a reader's native-CRS bounds into WGS84 by reprojecting all
/// four corners and taking their envelope, mirroring the same
/// corner-projection convention `tilekiln_cog::source::TileSource::select`
/// uses once rendering starts.
fn source_wgs84_bounds(reader: &TiledGeoTiffReader) -> Result<GeoBBox> {
	let projection = Projection::from_epsg(reader.epsg())?;
	let native = reader.crs_bounds();
	let (x0, y0, x1, y1) = (native.min_lon(), native.min_lat(), native.max_lon(), native.max_lat());

	let mut bbox: Option<GeoBBox> = None;
	for (x, y) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
		let (lon, lat) = projection.to_lon_lat(x, y);
		let corner = GeoBBox::new(lon, lat, lon, lat);
		match &mut bbox {
			Some(b) => b.extend(&corner),
			None => bbox = Some(corner),
		}
	}
	Ok(bbox.unwrap_or(native))
}
