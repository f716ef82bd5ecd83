use anyhow::{Context, Result};
use flate2::bufread::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Read;

/// Gzips `data` at the best-compression level, matching the PMTiles spec's
/// internal-compression expectation for directory and metadata blocks.
pub fn compress_gzip(data: &[u8]) -> Result<Vec<u8>> {
	let mut encoder = GzEncoder::new(data, Compression::best());
	let mut out = Vec::new();
	encoder.read_to_end(&mut out).context("gzip compression failed")?;
	Ok(out)
}

pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
	let mut decoder = GzDecoder::new(data);
	let mut out = Vec::new();
	decoder.read_to_end(&mut out).context("gzip decompression failed")?;
	Ok(out)
}
