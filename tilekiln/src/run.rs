use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use log::info;
use tilekiln_container::{PMTilesCompression, PMTilesType, PMTilesWriter};
use tilekiln_core::{ConcurrencyLimits, TileCompression};
use tilekiln_pipeline::{GeneratorConfig, PyramidGenerator};
use tilekiln_raster::encoder::Format;

use crate::cli::Cli;
use crate::{color, mem, metadata, sources};

/// Parses the CLI's flags into a `GeneratorConfig`, opens the inputs and
/// output, and drives a full pyramid generation run to completion.
pub fn run(cli: Cli) -> Result<()> {
	let paths = sources::discover_paths(&cli.inputs)?;
	info!("opening {} input source(s)", paths.len());
	let opened = sources::open_sources(&paths, cli.tile_size)?;

	let format = resolve_format(&cli, opened.all_float);
	let min_zoom = cli.min_zoom.unwrap_or(0);
	let max_zoom = cli.max_zoom.unwrap_or(opened.native_max_zoom);
	anyhow::ensure!(min_zoom <= max_zoom, "--min-zoom ({min_zoom}) must not exceed --max-zoom ({max_zoom})");

	let fill_color = cli.fill_color.as_deref().map(color::parse_fill_color).transpose()?;
	let mem_limit_bytes = mem::resolve_mem_limit_bytes(cli.mem_limit_mb, cli.no_spill);
	let concurrency = ConcurrencyLimits::new(cli.concurrency).workers;

	let config = GeneratorConfig {
		min_zoom,
		max_zoom,
		bounds: opened.bounds,
		tile_size: cli.tile_size,
		format,
		resampling: cli.resampling.into(),
		concurrency,
		mem_limit_bytes,
		fill_color,
	};

	let metadata = metadata::build(config.bounds, config.min_zoom, config.max_zoom, cli.attribution.as_deref());
	let out = BufWriter::new(File::create(&cli.output).with_context(|| format!("creating output file {}", cli.output.display()))?);
	let writer = PMTilesWriter::create(
		out,
		config.bounds,
		config.min_zoom,
		config.max_zoom,
		PMTilesType::from_format(config.format),
		PMTilesCompression::from_value(TileCompression::Uncompressed),
		&metadata,
	)?;

	info!("generating zoom {}..={} ({} workers, format {:?})", config.min_zoom, config.max_zoom, config.concurrency, config.format);

	let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("starting async runtime")?;
	let generator = PyramidGenerator::new(config, opened.descriptors, writer);
	let (mut out, snapshot) = runtime.block_on(generator.run(runtime.handle().clone()))?;
	out.flush().context("flushing output PMTiles archive")?;

	info!(
		"wrote {} tiles ({} uniform, {} empty, {} bytes) to {}",
		snapshot.tiles,
		snapshot.uniform_tiles,
		snapshot.empty_tiles,
		snapshot.bytes_written,
		cli.output.display()
	);

	Ok(())
}

fn resolve_format(cli: &Cli, all_float: bool) -> Format {
	match cli.format {
		Some(arg) => arg.resolve(cli.quality),
		None if all_float => Format::Terrarium,
		None => Format::Jpeg { quality: cli.quality },
	}
}
