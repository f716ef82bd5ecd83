use tilekiln_core::GeoBBox;
use tilekiln_raster::encoder::Format;
use tilekiln_raster::resample::Kernel;

/// Everything the generator needs to produce one archive, built by the CLI
/// from parsed flags and handed down by `Arc` rather than read from a
/// global — mirrors the teacher's `WriterConfig` pattern.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub bounds: GeoBBox,
	pub tile_size: u32,
	pub format: Format,
	pub resampling: Kernel,
	pub concurrency: usize,
	/// `0` disables spilling (pure in-memory store).
	pub mem_limit_bytes: u64,
	/// RGBA color painted behind transparent pixels from missing children
	/// during downsampling. `None` keeps them transparent.
	pub fill_color: Option<[u8; 4]>,
}

impl GeneratorConfig {
	#[must_use]
	pub fn batch_size(&self) -> usize {
		32
	}
}
