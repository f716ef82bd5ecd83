use std::fs::File;
use std::path::Path;

use anyhow::{bail, ensure, Result};
use memmap2::Mmap;
use tilekiln_core::GeoBBox;
use tilekiln_derive::context;

use crate::geo_keys;
use crate::ifd::{self, Ifd};
use crate::tags::{compression, planar_config, sample_format, tag};

/// One decoded tile read from a source raster: raw samples plus the band
/// layout needed to interpret them.
#[derive(Debug, Clone)]
pub struct DecodedTile {
	pub pixels: Vec<u8>,
	pub width: u32,
	pub height: u32,
	pub bands: u16,
	pub bits_per_sample: u16,
	pub is_float: bool,
}

/// Read access to one georeferenced raster, exposing its overview levels
/// as a flat index and its tiles by `(level, col, row)`.
pub trait CogReader {
	fn read_tile(&self, level: usize, col: u32, row: u32) -> Result<DecodedTile>;
	fn crs_bounds(&self) -> GeoBBox;
	fn epsg(&self) -> u16;
	fn pixel_size(&self, level: usize) -> (f64, f64);
	fn image_dims(&self, level: usize) -> (u32, u32);
	fn best_ifd_for_resolution(&self, target_m_per_px: f64) -> usize;
    fn nodata(&self) -> Option<&str>;
	fn is_float(&self) -> bool;
}

struct Level {
	width: u32,
	height: u32,
	tile_width: u32,
	tile_length: u32,
	tile_offsets: Vec<u32>,
	tile_byte_counts: Vec<u32>,
	bands: u16,
	bits_per_sample: u16,
	sample_format: u16,
	pixel_size_x: f64,
	pixel_size_y: f64,
	origin_x: f64,
	origin_y: f64,
}

/// A minimal reader for uncompressed, tiled (not strip-based) GeoTIFFs,
/// memory-mapped for the lifetime of the reader. Does not decode LZW,
/// Deflate, or JPEG-in-TIFF payloads, and rejects BigTIFF.
pub struct TiledGeoTiffReader {
	_mmap: Mmap,
	data: &'static [u8],
	levels: Vec<Level>,
	epsg: u16,
	nodata: Option<String>,
}

impl TiledGeoTiffReader {
	#[context("opening GeoTIFF {}", path.as_ref().display())]
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let file = File::open(path.as_ref())?;
		// SAFETY: the mapping is kept alive for the lifetime of `self` via
		// `_mmap`, and the reader never outlives the file it was opened from.
		let mmap = unsafe { Mmap::map(&file)? };
		// The borrow checker has no way to see that `data` borrows from a
		// field of the very struct it's packed into; extending it to
		// `'static` is sound because `_mmap` is dropped only when `self` is.
		let data: &'static [u8] = unsafe { std::slice::from_raw_parts(mmap.as_ptr(), mmap.len()) };

		let ifds = ifd::parse_all_ifds(data)?;
		let mut levels = Vec::with_capacity(ifds.len());
		let mut epsg = None;
		let mut nodata = None;

		for ifd in ifds {
			let compression_tag = ifd.scalar_u32(tag::COMPRESSION).unwrap_or(1);
			ensure!(
				compression_tag as u16 == compression::NONE,
				"IFD uses compression scheme {compression_tag}, only uncompressed TIFFs are supported"
			);

			let planar = ifd.scalar_u32(tag::PLANAR_CONFIGURATION).unwrap_or(1);
			ensure!(
				planar as u16 == planar_config::CHUNKY,
				"planar (non-interleaved) band layout is not supported"
			);

			let tile_offsets = ifd.array_u32(tag::TILE_OFFSETS, data)?;
			ensure!(!tile_offsets.is_empty(), "IFD is strip-based, not tiled; only tiled GeoTIFFs are supported");
			let tile_byte_counts = ifd.array_u32(tag::TILE_BYTE_COUNTS, data)?;

			let width = ifd.scalar_u32(tag::IMAGE_WIDTH).unwrap_or(0);
			let height = ifd.scalar_u32(tag::IMAGE_LENGTH).unwrap_or(0);
			let tile_width = ifd.scalar_u32(tag::TILE_WIDTH).unwrap_or(0);
			let tile_length = ifd.scalar_u32(tag::TILE_LENGTH).unwrap_or(0);
			let bands = ifd.scalar_u32(tag::SAMPLES_PER_PIXEL).unwrap_or(1) as u16;
			let bits_per_sample = ifd.scalar_u32(tag::BITS_PER_SAMPLE).unwrap_or(8) as u16;
			let fmt = ifd.scalar_u32(tag::SAMPLE_FORMAT).unwrap_or(u32::from(sample_format::UNSIGNED)) as u16;

			let pixel_scale = ifd.array_f64(tag::MODEL_PIXEL_SCALE_TAG, data)?;
			let tiepoint = ifd.array_f64(tag::MODEL_TIEPOINT_TAG, data)?;
			let (pixel_size_x, pixel_size_y) = match pixel_scale.as_slice() {
				[sx, sy, ..] => (*sx, *sy),
				_ => (1.0, 1.0),
			};
			let (origin_x, origin_y) = match tiepoint.as_slice() {
				[_, _, _, x, y, ..] => (*x, *y),
				_ => (0.0, 0.0),
			};

			if epsg.is_none() {
				epsg = geo_keys::read_epsg(&ifd, data)?;
			}
			if nodata.is_none() {
				nodata = read_ascii_tag(&ifd, data, tag::GDAL_NODATA);
			}

			levels.push(Level {
				width,
				height,
				tile_width,
				tile_length,
				tile_offsets,
				tile_byte_counts,
				bands,
				bits_per_sample,
				sample_format: fmt,
				pixel_size_x,
				pixel_size_y,
				origin_x,
				origin_y,
			});
		}

		// Largest (full-resolution) image first, consistent with how
		// `best_ifd_for_resolution` picks by ascending ground resolution.
		levels.sort_by(|a, b| (b.width, b.height).cmp(&(a.width, a.height)));

		let Some(epsg) = epsg else {
			bail!("GeoTIFF has no GeoKeyDirectoryTag EPSG code");
		};

		Ok(Self {
			_mmap: mmap,
			data,
			levels,
			epsg,
			nodata,
		})
	}

	fn level(&self, level: usize) -> &Level {
		&self.levels[level]
	}
}

fn read_ascii_tag(ifd: &Ifd, data: &[u8], tag: u16) -> Option<String> {
	let raw = ifd.array_u32(tag, data).ok()?;
	if raw.is_empty() {
		return None;
	}
	let bytes: Vec<u8> = raw.iter().map(|&b| b as u8).collect();
	let text = String::from_utf8_lossy(&bytes);
	let trimmed = text.trim_end_matches('\0').trim();
	(!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl CogReader for TiledGeoTiffReader {
	#[context("reading tile ({col},{row}) at level {level}")]
	fn read_tile(&self, level: usize, col: u32, row: u32) -> Result<DecodedTile> {
		let lvl = self.level(level);
		let tiles_across = lvl.width.div_ceil(lvl.tile_width);
		let tiles_down = lvl.height.div_ceil(lvl.tile_length);
		ensure!(col < tiles_across && row < tiles_down, "tile ({col},{row}) out of bounds for level {level}");

		let index = (row * tiles_across + col) as usize;
		let offset = *lvl
			.tile_offsets
			.get(index)
			.ok_or_else(|| anyhow::anyhow!("tile index {index} has no offset entry"))? as usize;
		let byte_count = *lvl.tile_byte_counts.get(index).unwrap_or(&0) as usize;
		ensure!(offset + byte_count <= self.data.len(), "tile data runs past end of file");

		Ok(DecodedTile {
			pixels: self.data[offset..offset + byte_count].to_vec(),
			width: lvl.tile_width,
			height: lvl.tile_length,
			bands: lvl.bands,
			bits_per_sample: lvl.bits_per_sample,
			is_float: lvl.sample_format == sample_format::IEEEFP,
		})
	}

	fn crs_bounds(&self) -> GeoBBox {
		let lvl = self.level(0);
		let min_x = lvl.origin_x;
		let max_y = lvl.origin_y;
		let max_x = min_x + f64::from(lvl.width) * lvl.pixel_size_x;
		let min_y = max_y - f64::from(lvl.height) * lvl.pixel_size_y;
		GeoBBox::new(min_x, min_y, max_x, max_y)
	}

	fn epsg(&self) -> u16 {
		self.epsg
	}

	fn pixel_size(&self, level: usize) -> (f64, f64) {
		let lvl = self.level(level);
		(lvl.pixel_size_x, lvl.pixel_size_y)
	}

	fn image_dims(&self, level: usize) -> (u32, u32) {
		let lvl = self.level(level);
		(lvl.width, lvl.height)
	}

	fn best_ifd_for_resolution(&self, target_m_per_px: f64) -> usize {
		// Levels are sorted finest-first; pick the coarsest level whose
		// pixel size is still <= the target, falling back to the finest.
		self.levels
			.iter()
			.enumerate()
			.rev()
			.find(|(_, lvl)| lvl.pixel_size_x <= target_m_per_px)
			.map_or(0, |(i, _)| i)
	}

	fn nodata(&self) -> Option<&str> {
		self.nodata.as_deref()
	}

	fn is_float(&self) -> bool {
		self.levels.first().is_some_and(|lvl| lvl.sample_format == sample_format::IEEEFP)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tags::field_type;
	use std::io::Write;

	fn le_entry(out: &mut Vec<u8>, tag: u16, field_type: u16, count: u32, value_bytes: [u8; 4]) {
		out.extend_from_slice(&tag.to_le_bytes());
		out.extend_from_slice(&field_type.to_le_bytes());
		out.extend_from_slice(&count.to_le_bytes());
		out.extend_from_slice(&value_bytes);
	}

    fn build_tiled_geotiff(tile_width: u32, tile_length: u32, pixel: &[u8]) -> Vec<u8> {
		let mut data = vec![0u8; 8];
		data[0..2].copy_from_slice(b"II");
		data[2..4].copy_from_slice(&42u16.to_le_bytes());
		data[4..8].copy_from_slice(&8u32.to_le_bytes());

		// External data laid out after the IFD; we'll patch offsets once known.
		let pixel_scale: [f64; 3] = [1.0, 1.0, 0.0];
		let tiepoint: [f64; 6] = [0.0, 0.0, 0.0, 500_000.0, 6_000_000.0, 0.0];
		let geo_keys: [u16; 8] = [1, 1, 0, 1, geo_key_projected(), 0, 1, 3857];

		const NUM_ENTRIES: u32 = 13;
		let mut extra = Vec::new();
		let pixel_scale_off = 8 + 2 + NUM_ENTRIES * 12 + 4 + extra.len() as u32;
		for v in pixel_scale {
			extra.extend_from_slice(&v.to_le_bytes());
		}
		let tiepoint_off = pixel_scale_off + (pixel_scale.len() * 8) as u32;
		for v in tiepoint {
			extra.extend_from_slice(&v.to_le_bytes());
		}
		let geo_keys_off = tiepoint_off + (tiepoint.len() * 8) as u32;
		for v in geo_keys {
			extra.extend_from_slice(&v.to_le_bytes());
		}
		let tile_data_off = geo_keys_off + (geo_keys.len() * 2) as u32;
		extra.extend_from_slice(pixel);

		let mut ifd_bytes = Vec::new();
		le_entry(&mut ifd_bytes, tag::IMAGE_WIDTH, field_type::LONG, 1, tile_width.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::IMAGE_LENGTH, field_type::LONG, 1, tile_length.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::TILE_WIDTH, field_type::LONG, 1, tile_width.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::TILE_LENGTH, field_type::LONG, 1, tile_length.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::COMPRESSION, field_type::SHORT, 1, 1u32.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::SAMPLES_PER_PIXEL, field_type::SHORT, 1, 4u32.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::BITS_PER_SAMPLE, field_type::SHORT, 1, 8u32.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::PLANAR_CONFIGURATION, field_type::SHORT, 1, 1u32.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::TILE_OFFSETS, field_type::LONG, 1, tile_data_off.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::TILE_BYTE_COUNTS, field_type::LONG, 1, (pixel.len() as u32).to_le_bytes());
		le_entry(&mut ifd_bytes, tag::MODEL_PIXEL_SCALE_TAG, field_type::DOUBLE, 3, pixel_scale_off.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::MODEL_TIEPOINT_TAG, field_type::DOUBLE, 6, tiepoint_off.to_le_bytes());
		le_entry(&mut ifd_bytes, tag::GEO_KEY_DIRECTORY_TAG, field_type::SHORT, geo_keys.len() as u32, geo_keys_off.to_le_bytes());

		let count = (ifd_bytes.len() / 12) as u16;
		assert_eq!(u32::from(count), NUM_ENTRIES);
		data.extend_from_slice(&count.to_le_bytes());
		data.extend_from_slice(&ifd_bytes);
		data.extend_from_slice(&0u32.to_le_bytes());
		data.extend_from_slice(&extra);
		data
	}

	fn geo_key_projected() -> u16 {
		crate::tags::geo_key::PROJECTED_CS_TYPE
	}

	#[test]
	fn reads_a_single_tile_and_georeferencing() {
		let pixel = vec![10u8, 20, 30, 255].repeat(4); // 2x2 RGBA tile
		let bytes = build_tiled_geotiff(2, 2, &pixel);

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("test.tif");
		std::fs::File::create(&path).unwrap().write_all(&bytes).unwrap();

		let reader = TiledGeoTiffReader::open(&path).unwrap();
		assert_eq!(reader.epsg(), 3857);
		assert_eq!(reader.image_dims(0), (2, 2));
		assert_eq!(reader.pixel_size(0), (1.0, 1.0));

		let tile = reader.read_tile(0, 0, 0).unwrap();
		assert_eq!(tile.pixels, pixel);
		assert_eq!(tile.bands, 4);
		assert!(!tile.is_float);
	}

	#[test]
	fn out_of_bounds_tile_request_errors() {
		let pixel = vec![0u8; 16];
		let bytes = build_tiled_geotiff(2, 2, &pixel);
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("test.tif");
		std::fs::File::create(&path).unwrap().write_all(&bytes).unwrap();

		let reader = TiledGeoTiffReader::open(&path).unwrap();
		assert!(reader.read_tile(0, 5, 5).is_err());
	}
}
