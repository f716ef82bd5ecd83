//! TIFF and GeoTIFF tag/type constants this reader understands. Only the
//! subset needed to locate tiled, uncompressed raster data and its
//! georeferencing is kept — this is deliberately not a general TIFF tag
//! registry.

pub mod field_type {
	pub const BYTE: u16 = 1;
	pub const ASCII: u16 = 2;
	pub const SHORT: u16 = 3;
	pub const LONG: u16 = 4;
	pub const RATIONAL: u16 = 5;
	pub const DOUBLE: u16 = 12;
}

pub mod tag {
	pub const IMAGE_WIDTH: u16 = 256;
	pub const IMAGE_LENGTH: u16 = 257;
	pub const BITS_PER_SAMPLE: u16 = 258;
	pub const COMPRESSION: u16 = 259;
	pub const SAMPLES_PER_PIXEL: u16 = 277;
	pub const PLANAR_CONFIGURATION: u16 = 284;
	pub const SAMPLE_FORMAT: u16 = 339;

	pub const TILE_WIDTH: u16 = 322;
	pub const TILE_LENGTH: u16 = 323;
	pub const TILE_OFFSETS: u16 = 324;
	pub const TILE_BYTE_COUNTS: u16 = 325;

	pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
	pub const MODEL_TIEPOINT_TAG: u16 = 33922;
	pub const GEO_KEY_DIRECTORY_TAG: u16 = 34735;

	pub const GDAL_NODATA: u16 = 42113;
}

pub mod compression {
	pub const NONE: u16 = 1;
}

pub mod planar_config {
	pub const CHUNKY: u16 = 1;
}

pub mod sample_format {
	pub const UNSIGNED: u16 = 1;
	pub const IEEEFP: u16 = 3;
}

/// GeoKey ids inside the `GeoKeyDirectoryTag` this reader looks for.
pub mod geo_key {
	pub const GEOGRAPHIC_TYPE: u16 = 2048;
	pub const PROJECTED_CS_TYPE: u16 = 3072;
}
