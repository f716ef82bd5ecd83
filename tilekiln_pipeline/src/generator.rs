//! The top-down pyramid driver: renders the maximum zoom level directly
//! from sources, then derives every lower level by downsampling the level
//! above it, streaming every tile to the PMTiles writer as it is produced.

use std::io::{Seek, Write};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinSet;

use tilekiln_cog::source::{SourceDescriptor, TileSource};
use tilekiln_container::{PMTilesWriter, TileStore};
use tilekiln_core::{tilemath, Blob, TileCoord3};
use tilekiln_raster::encoder::{Format, TileEncoder};
use tilekiln_raster::TileData;

use crate::config::GeneratorConfig;
use crate::downsample::{downsample_tile, downsample_tile_elevation};
use crate::render::{render_tile_elevation, render_tile_rgba};
use crate::source_cache::SourceTileCache;
use crate::stats::{GeneratorStats, GeneratorStatsSnapshot};

/// Drives one full pyramid generation run. Owns the sources, the PMTiles
/// writer, and the shared decoded-source-tile cache for the lifetime of
/// the run; the `TileStore` between zoom levels is created and swapped
/// internally as each level completes.
pub struct PyramidGenerator<W: Write + Seek + Send + 'static> {
	config: Arc<GeneratorConfig>,
	sources: Arc<Vec<SourceDescriptor>>,
	source_cache: Arc<SourceTileCache>,
	writer: Arc<SyncMutex<PMTilesWriter<W>>>,
	stats: Arc<GeneratorStats>,
}

impl<W: Write + Seek + Send + 'static> PyramidGenerator<W> {
	#[must_use]
	pub fn new(config: GeneratorConfig, sources: Vec<SourceDescriptor>, writer: PMTilesWriter<W>) -> Self {
		let concurrency = config.concurrency.max(1);
		Self {
			source_cache: Arc::new(SourceTileCache::new(concurrency)),
			config: Arc::new(config),
			sources: Arc::new(sources),
			writer: Arc::new(SyncMutex::new(writer)),
			stats: Arc::new(GeneratorStats::default()),
		}
	}

	/// Runs every zoom level from `max_zoom` down to `min_zoom`, finalizes
	/// the PMTiles writer, and hands back the underlying output plus
	/// accumulated tile counters. `runtime` hosts each level's
	/// disk-spilling store's background I/O task.
	pub async fn run(self, runtime: tokio::runtime::Handle) -> Result<(W, GeneratorStatsSnapshot)> {
		let encoder: Arc<dyn TileEncoder + Send + Sync> = self.config.format.encoder().into();
		let mut store: Option<Arc<TileStore>> = None;

		for level in (self.config.min_zoom..=self.config.max_zoom).rev() {
			let tiles = self.tiles_at_level(level);
			info!("zoom {level}: {} tiles to produce", tiles.len());
			if tiles.is_empty() {
				store = None;
				continue;
			}

			let next_store = if level > self.config.min_zoom {
				Some(Arc::new(TileStore::new(self.config.format, self.config.mem_limit_bytes, None, &runtime)))
			} else {
				None
			};

			self.run_level(level, &tiles, store.clone(), next_store.clone(), &encoder).await?;

			if let Some(mut finished) = store.take().and_then(|s| Arc::try_unwrap(s).ok()) {
				finished.close();
			}
			store = next_store;
		}

		drop(store);
		let snapshot = self.stats.snapshot();
		let writer = Arc::try_unwrap(self.writer)
			.map_err(|_| anyhow!("pyramid writer still has outstanding references after every worker finished"))?
			.into_inner();
		let out = writer.finalize(snapshot.tiles)?;
		Ok((out, snapshot))
	}

	/// Every tile coordinate at `level` whose bounds overlap the configured
	/// output bounds, sorted by Hilbert index (ascending tile id) so workers
	/// consume — and the PMTiles writer receives — tiles in clustered order.
	fn tiles_at_level(&self, level: u8) -> Vec<TileCoord3> {
		let bounds = self.config.bounds;
		let (min_tx, min_ty) = tilemath::lon_lat_to_tile(bounds.min_lon(), bounds.max_lat(), level);
		let (max_tx, max_ty) = tilemath::lon_lat_to_tile(bounds.max_lon(), bounds.min_lat(), level);
		let n = 1u32 << level;
		let clamp = |v: f64| (v.floor().max(0.0) as u32).min(n - 1);

		let mut keyed = Vec::new();
		for y in clamp(min_ty)..=clamp(max_ty) {
			for x in clamp(min_tx)..=clamp(max_tx) {
				if let Ok(coord) = TileCoord3::new(x, y, level) {
					let id = coord.get_tile_id().unwrap_or(u64::MAX);
					keyed.push((id, coord));
				}
			}
		}
		keyed.sort_by_key(|(id, _)| *id);
		keyed.into_iter().map(|(_, coord)| coord).collect()
	}

	/// Renders or downsamples every tile at `level`, fanning the work out
	/// across `config.concurrency` workers fed by a bounded channel of
	/// fixed-size tile batches. The first worker error aborts the level:
	/// peers finish their in-flight batch and the channel is dropped so no
	/// further batches are dispatched.
	async fn run_level(&self, level: u8, tiles: &[TileCoord3], store: Option<Arc<TileStore>>, next_store: Option<Arc<TileStore>>, encoder: &Arc<dyn TileEncoder + Send + Sync>) -> Result<()> {
		let (batch_tx, batch_rx) = mpsc::channel::<Vec<TileCoord3>>(4);
		let batch_rx = Arc::new(AsyncMutex::new(batch_rx));
		let (err_tx, mut err_rx) = mpsc::channel::<anyhow::Error>(1);

		let mut workers = JoinSet::new();
		for _ in 0..self.config.concurrency.max(1) {
			let batch_rx = Arc::clone(&batch_rx);
			let err_tx = err_tx.clone();
			let config = Arc::clone(&self.config);
			let sources = Arc::clone(&self.sources);
			let cache = Arc::clone(&self.source_cache);
			let writer = Arc::clone(&self.writer);
			let stats = Arc::clone(&self.stats);
			let store = store.clone();
			let next_store = next_store.clone();
			let encoder = Arc::clone(encoder);
			let min_zoom = config.min_zoom;

			workers.spawn(async move {
				loop {
					let batch = {
						let mut rx = batch_rx.lock().await;
						rx.recv().await
					};
					let Some(batch) = batch else { break };

					for coord in batch {
						match process_tile(&config, &sources, &cache, store.as_deref(), coord, &encoder) {
							Ok(Some((tile_data, encoded))) => {
								if let Err(e) = writer.lock().add_tile(coord, &encoded) {
									let _ = err_tx.try_send(e);
									return;
								}
								stats.record_tile(tile_data.is_uniform(), encoded.len());
								if level > min_zoom {
									if let Some(next) = &next_store {
										next.put(coord, tile_data, encoded);
									}
								}
							}
							Ok(None) => stats.record_empty(),
							Err(e) => {
								let _ = err_tx.try_send(e);
								return;
							}
						}
					}
				}
			});
		}
		drop(err_tx);

		for batch in tiles.chunks(self.config.batch_size()) {
			if batch_tx.send(batch.to_vec()).await.is_err() {
				break;
			}
		}
		drop(batch_tx);

		while let Some(result) = workers.join_next().await {
			result.context("pyramid worker task panicked")?;
		}

		if let Ok(err) = err_rx.try_recv() {
			warn!("zoom {level}: aborting after worker error: {err:#}");
			return Err(err);
		}
		Ok(())
	}
}

/// Renders (at max zoom) or downsamples (below it) one output tile,
/// returning its decoded payload and encoded bytes, or `None` if the tile
/// has no content to write (no overlapping source, or fully transparent).
fn process_tile(config: &GeneratorConfig, sources: &[SourceDescriptor], cache: &SourceTileCache, store: Option<&TileStore>, coord: TileCoord3, encoder: &Arc<dyn TileEncoder + Send + Sync>) -> Result<Option<(TileData, Blob)>> {
	let tile_data = match store {
		Some(store) => {
			let children = fetch_children(store, config, coord)?;
			if matches!(config.format, Format::Terrarium) {
				downsample_tile_elevation(&children, config.resampling, config.tile_size)
			} else {
				downsample_tile(&children, config.resampling, config.tile_size)
			}
		}
		None => {
			let lat = coord.as_geo_bbox().center().1;
			let target_m_per_px = tilemath::resolution_at_lat(lat, coord.level, config.tile_size);
			let tile_sources = TileSource::select(sources, coord, target_m_per_px);
			if tile_sources.is_empty() {
				return Ok(None);
			}
			if matches!(config.format, Format::Terrarium) {
				render_tile_elevation(sources, &tile_sources, cache, coord, config.tile_size, config.resampling)?
			} else {
				render_tile_rgba(sources, &tile_sources, cache, coord, config.tile_size, config.resampling)?
			}
		}
	};

	if is_fully_transparent(&tile_data) {
		return Ok(None);
	}

	let encoded = encoder.encode(&tile_data)?;
	Ok(Some((tile_data, encoded)))
}

/// Fetches this tile's four children from `store`, substituting a
/// transparent (or `fill_color`) tile for any that are missing.
fn fetch_children(store: &TileStore, config: &GeneratorConfig, coord: TileCoord3) -> Result<[TileData; 4]> {
	let mut out = Vec::with_capacity(4);
	for child in coord.children() {
		let tile = store.get(child)?.unwrap_or_else(|| match config.fill_color {
			Some(color) => TileData::Uniform { color, size: config.tile_size },
			None => TileData::empty(config.tile_size),
		});
		out.push(tile);
	}
	out.try_into().map_err(|_| anyhow!("expected exactly four children for tile {coord:?}"))
}

fn is_fully_transparent(tile: &TileData) -> bool {
	matches!(tile, TileData::Uniform { color, .. } if color[3] == 0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;
	use tilekiln_container::{PMTilesCompression, PMTilesType};
	use tilekiln_core::GeoBBox;
	use tilekiln_raster::resample::Kernel;

	fn config() -> GeneratorConfig {
		GeneratorConfig {
			min_zoom: 0,
			max_zoom: 0,
			bounds: GeoBBox::new(-180.0, -85.0, 180.0, 85.0),
			tile_size: 2,
			format: Format::Png,
			resampling: Kernel::Nearest,
			concurrency: 2,
			mem_limit_bytes: 0,
			fill_color: None,
		}
	}

	fn writer() -> PMTilesWriter<Cursor<Vec<u8>>> {
		PMTilesWriter::create(Cursor::new(Vec::new()), GeoBBox::new(-180.0, -85.0, 180.0, 85.0), 0, 0, PMTilesType::Png, PMTilesCompression::None, &Blob::from(b"{}".to_vec())).unwrap()
	}

	#[tokio::test]
	async fn an_empty_source_list_produces_no_tiles() {
		let generator = PyramidGenerator::new(config(), Vec::new(), writer());
		let rt = tokio::runtime::Handle::current();
		let (_out, snapshot) = generator.run(rt).await.unwrap();
		assert_eq!(snapshot.tiles, 0);
	}
}
