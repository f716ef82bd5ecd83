use anyhow::{ensure, Result};
use tilekiln_core::{Blob, ByteRange, GeoBBox};

use super::blob_io::{BlobReader, BlobWriter};
use super::tile_compression::PMTilesCompression;
use super::tile_type::PMTilesType;

/// The 127-byte PMTiles v3 header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderV3 {
	pub root_dir: ByteRange,
	pub metadata: ByteRange,
	pub leaf_dirs: ByteRange,
	pub tile_data: ByteRange,
	pub addressed_tiles_count: u64,
	pub tile_entries_count: u64,
	pub tile_contents_count: u64,
	pub clustered: bool,
	pub internal_compression: PMTilesCompression,
	pub tile_compression: PMTilesCompression,
	pub tile_type: PMTilesType,
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub min_lon_e7: i32,
	pub min_lat_e7: i32,
	pub max_lon_e7: i32,
	pub max_lat_e7: i32,
	pub center_zoom: u8,
	pub center_lon_e7: i32,
	pub center_lat_e7: i32,
}

impl HeaderV3 {
	#[must_use]
	pub const LEN: u64 = 127;

	#[must_use]
	pub fn new(bounds: GeoBBox, min_zoom: u8, max_zoom: u8, tile_type: PMTilesType, tile_compression: PMTilesCompression) -> Self {
		let center = bounds.center();
		Self {
			root_dir: ByteRange::new(0, 0),
			metadata: ByteRange::new(0, 0),
			leaf_dirs: ByteRange::new(0, 0),
			tile_data: ByteRange::new(0, 0),
			addressed_tiles_count: 0,
			tile_entries_count: 0,
			tile_contents_count: 0,
			clustered: false,
			internal_compression: PMTilesCompression::Gzip,
			tile_compression,
			tile_type,
			min_zoom,
			max_zoom,
			min_lon_e7: (bounds.min_lon() * 1e7) as i32,
			min_lat_e7: (bounds.min_lat() * 1e7) as i32,
			max_lon_e7: (bounds.max_lon() * 1e7) as i32,
			max_lat_e7: (bounds.max_lat() * 1e7) as i32,
			center_zoom: min_zoom + (max_zoom - min_zoom) / 2,
			center_lon_e7: (center.0 * 1e7) as i32,
			center_lat_e7: (center.1 * 1e7) as i32,
		}
	}

	pub fn serialize(&self) -> Result<Blob> {
		let mut writer = BlobWriter::new();
		writer.write_slice(b"PMTiles")?;
		writer.write_u8(3)?;

		writer.write_u64(self.root_dir.offset)?;
		writer.write_u64(self.root_dir.length)?;
		writer.write_u64(self.metadata.offset)?;
		writer.write_u64(self.metadata.length)?;
		writer.write_u64(self.leaf_dirs.offset)?;
		writer.write_u64(self.leaf_dirs.length)?;
		writer.write_u64(self.tile_data.offset)?;
		writer.write_u64(self.tile_data.length)?;
		writer.write_u64(self.addressed_tiles_count)?;
		writer.write_u64(self.tile_entries_count)?;
		writer.write_u64(self.tile_contents_count)?;

		writer.write_u8(u8::from(self.clustered))?;
		writer.write_u8(self.internal_compression as u8)?;
		writer.write_u8(self.tile_compression as u8)?;
		writer.write_u8(self.tile_type as u8)?;
		writer.write_u8(self.min_zoom)?;
		writer.write_u8(self.max_zoom)?;
		writer.write_i32(self.min_lon_e7)?;
		writer.write_i32(self.min_lat_e7)?;
		writer.write_i32(self.max_lon_e7)?;
		writer.write_i32(self.max_lat_e7)?;
		writer.write_u8(self.center_zoom)?;
		writer.write_i32(self.center_lon_e7)?;
		writer.write_i32(self.center_lat_e7)?;

		Ok(writer.into_blob())
	}

	pub fn deserialize(blob: &Blob) -> Result<Self> {
		let buffer = blob.as_slice();
		ensure!(buffer.len() == Self::LEN as usize, "PMTiles header must be exactly 127 bytes");
		ensure!(&buffer[0..7] == b"PMTiles", "missing PMTiles magic number");
		ensure!(buffer[7] == 3, "unsupported PMTiles version, only v3 is supported");

		let mut reader = BlobReader::new(buffer);
		reader.set_position(8);

		Ok(Self {
			root_dir: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			metadata: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			leaf_dirs: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			tile_data: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			addressed_tiles_count: reader.read_u64()?,
			tile_entries_count: reader.read_u64()?,
			tile_contents_count: reader.read_u64()?,
			clustered: reader.read_u8()? == 1,
			internal_compression: PMTilesCompression::from_u8(reader.read_u8()?)?,
			tile_compression: PMTilesCompression::from_u8(reader.read_u8()?)?,
			tile_type: PMTilesType::from_u8(reader.read_u8()?)?,
			min_zoom: reader.read_u8()?,
			max_zoom: reader.read_u8()?,
			min_lon_e7: reader.read_i32()?,
			min_lat_e7: reader.read_i32()?,
			max_lon_e7: reader.read_i32()?,
			max_lat_e7: reader.read_i32()?,
			center_zoom: reader.read_u8()?,
			center_lon_e7: reader.read_i32()?,
			center_lat_e7: reader.read_i32()?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_serialization_round_trips() {
		let header = HeaderV3 {
			root_dir: ByteRange::new(123_456_789, 987_654_321),
			metadata: ByteRange::new(111_111_111, 222_222_222),
			leaf_dirs: ByteRange::new(333_333_333, 444_444_444),
			tile_data: ByteRange::new(555_555_555, 666_666_666),
			addressed_tiles_count: 777_777_777,
			tile_entries_count: 888_888_888,
			tile_contents_count: 999_999_999,
			clustered: true,
			internal_compression: PMTilesCompression::None,
			tile_compression: PMTilesCompression::Gzip,
			tile_type: PMTilesType::Jpeg,
			min_zoom: 4,
			max_zoom: 12,
			min_lon_e7: 6_000_000,
			min_lat_e7: 7_000_000,
			max_lon_e7: 8_000_000,
			max_lat_e7: 9_000_000,
			center_zoom: 8,
			center_lon_e7: 11_000_000,
			center_lat_e7: 12_000_000,
		};

		let serialized = header.serialize().unwrap();
		assert_eq!(serialized.len() as u64, HeaderV3::LEN);
		let deserialized = HeaderV3::deserialize(&serialized).unwrap();
		assert_eq!(header, deserialized);
	}

	#[test]
	fn rejects_bad_magic_or_version() {
		let mut bytes = vec![0u8; 127];
		bytes[0..7].copy_from_slice(b"PMTiles");
		bytes[7] = 2; // wrong version
		assert!(HeaderV3::deserialize(&Blob::from(bytes)).is_err());
	}

	#[test]
	fn new_derives_bounds_and_center_from_geo_bbox() {
		let bounds = GeoBBox::new(0.0, 0.0, 10.0, 20.0);
		let header = HeaderV3::new(bounds, 0, 10, PMTilesType::Png, PMTilesCompression::Gzip);
		assert_eq!(header.min_lon_e7, 0);
		assert_eq!(header.max_lat_e7, 200_000_000);
		assert_eq!(header.center_lon_e7, 50_000_000);
	}
}
