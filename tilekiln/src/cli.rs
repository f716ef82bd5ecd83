use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tilekiln_raster::encoder::Format;
use tilekiln_raster::resample::Kernel;

/// Converts GeoTIFF/COG raster sources into a single self-contained
/// PMTiles v3 tile pyramid.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	/// Input GeoTIFF/COG files, or directories to scan for `.tif`/`.tiff` files
	#[arg(required = true, value_name = "INPUT")]
	pub inputs: Vec<PathBuf>,

	/// Output PMTiles archive
	#[arg(value_name = "OUTPUT")]
	pub output: PathBuf,

	/// Output tile format; `terrarium` is selected automatically when every
	/// source is floating-point unless this flag overrides it
	#[arg(long, value_enum, display_order = 1)]
	pub format: Option<FormatArg>,

	/// JPEG/WebP quality, 1-100
	#[arg(long, value_parser = clap::value_parser!(u8).range(1..=100), default_value_t = 85, display_order = 1)]
	pub quality: u8,

	/// Minimum zoom level to generate; defaults to 0
	#[arg(long, value_name = "int", display_order = 2)]
	pub min_zoom: Option<u8>,

	/// Maximum zoom level to generate; defaults to the finest zoom at which
	/// no source is upsampled
	#[arg(long, value_name = "int", display_order = 2)]
	pub max_zoom: Option<u8>,

	/// Tile edge length in pixels
	#[arg(long, default_value_t = 256, display_order = 2)]
	pub tile_size: u32,

	/// Number of concurrent render/downsample workers; defaults to the
	/// number of logical CPUs
	#[arg(long, display_order = 3)]
	pub concurrency: Option<usize>,

	/// Resampling kernel used both for rendering the maximum zoom level and
	/// for downsampling every level below it
	#[arg(long, value_enum, default_value_t = ResamplingArg::Bicubic, display_order = 3)]
	pub resampling: ResamplingArg,

	/// Cap the in-flight tile store's memory use; `0` lets the store spill
	/// to disk once the detected-RAM-derived default is exceeded
	#[arg(long, value_name = "MB", display_order = 4)]
	pub mem_limit_mb: Option<u64>,

	/// Never spill to disk; the tile store between zoom levels stays
	/// entirely in memory regardless of `--mem-limit-mb`
	#[arg(long, display_order = 4)]
	pub no_spill: bool,

	/// Color painted behind transparent pixels left by missing tiles during
	/// downsampling, as `#RRGGBB` or `#RRGGBBAA`; omitted pixels stay
	/// transparent
	#[arg(long, value_name = "#RRGGBB[AA]", display_order = 5)]
	pub fill_color: Option<String>,

	/// Attribution string recorded in the archive's metadata
	#[arg(long, display_order = 5)]
	pub attribution: Option<String>,

	#[command(flatten)]
	pub verbose: Verbosity<InfoLevel>,
}

/// The tile formats selectable from the command line; `Jpeg`/`WebP` carry
/// `--quality` once resolved into `tilekiln_raster::encoder::Format`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
	Jpeg,
	Png,
	WebP,
	Terrarium,
}

impl FormatArg {
	#[must_use]
	pub fn resolve(self, quality: u8) -> Format {
		match self {
			FormatArg::Jpeg => Format::Jpeg { quality },
			FormatArg::Png => Format::Png,
			FormatArg::WebP => Format::WebP { quality: Some(quality) },
			FormatArg::Terrarium => Format::Terrarium,
		}
	}
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResamplingArg {
	Nearest,
	Bilinear,
	Bicubic,
	Lanczos,
	Mode,
}

impl From<ResamplingArg> for Kernel {
	fn from(value: ResamplingArg) -> Self {
		match value {
			ResamplingArg::Nearest => Kernel::Nearest,
			ResamplingArg::Bilinear => Kernel::Bilinear,
			ResamplingArg::Bicubic => Kernel::Bicubic,
			ResamplingArg::Lanczos => Kernel::Lanczos3,
			ResamplingArg::Mode => Kernel::Mode,
		}
	}
}
