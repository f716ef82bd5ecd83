use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::Mutex;
use tilekiln_cog::reader::{CogReader, DecodedTile};
use tilekiln_cog::source::SourceId;

/// Key identifying one decoded source tile: which source, which IFD level,
/// which tile column/row within that level.
type CacheKey = (SourceId, usize, u32, u32);

/// Shared, bounded cache of decoded source tiles, read by every render
/// worker. Mirrors spec's "256 x concurrency" default capacity: a worker's
/// per-output-tile footprint touches at most four source tiles, so this
/// only needs to outlive a handful of in-flight tiles' worth of reuse, not
/// the whole source raster.
///
/// One mutex guards the whole cache; it is held only for the duration of a
/// map lookup/insert, never across the (possibly slow) memory-mapped read
/// and decode that happens on a miss.
pub struct SourceTileCache {
	inner: Mutex<lru::LruCache<CacheKey, Arc<DecodedTile>>>,
}

impl SourceTileCache {
	#[must_use]
	pub fn new(concurrency: usize) -> Self {
		let capacity = NonZeroUsize::new(256 * concurrency.max(1)).unwrap();
		Self { inner: Mutex::new(lru::LruCache::new(capacity)) }
	}

	/// Fetches the decoded tile at `(level, col, row)` from `source`,
	/// consulting the cache first and decoding (then caching) on a miss.
	pub fn get_or_read(&self, source_id: SourceId, reader: &(dyn CogReader + Send + Sync), level: usize, col: u32, row: u32) -> anyhow::Result<Arc<DecodedTile>> {
		let key = (source_id, level, col, row);
		if let Some(hit) = self.inner.lock().get(&key) {
			return Ok(Arc::clone(hit));
		}
		let tile = Arc::new(reader.read_tile(level, col, row)?);
		self.inner.lock().put(key, Arc::clone(&tile));
		Ok(tile)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::Result;
	use tilekiln_core::GeoBBox;

	struct CountingReader {
		reads: std::sync::atomic::AtomicUsize,
	}

	impl CogReader for CountingReader {
		fn read_tile(&self, _level: usize, _col: u32, _row: u32) -> Result<DecodedTile> {
			self.reads.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
			Ok(DecodedTile { pixels: vec![1, 2, 3, 4], width: 1, height: 1, bands: 4, bits_per_sample: 8, is_float: false })
		}
		fn crs_bounds(&self) -> GeoBBox {
			GeoBBox::new(0.0, 0.0, 1.0, 1.0)
		}
		fn epsg(&self) -> u16 {
			4326
		}
		fn pixel_size(&self, _level: usize) -> (f64, f64) {
			(1.0, 1.0)
		}
		fn image_dims(&self, _level: usize) -> (u32, u32) {
			(1, 1)
		}
		fn best_ifd_for_resolution(&self, _target_m_per_px: f64) -> usize {
			0
		}
		fn nodata(&self) -> Option<&str> {
			None
		}
		fn is_float(&self) -> bool {
			false
		}
	}

	#[test]
	fn repeated_lookups_hit_the_cache() {
		let cache = SourceTileCache::new(1);
		let reader = CountingReader { reads: std::sync::atomic::AtomicUsize::new(0) };
		for _ in 0..5 {
			cache.get_or_read(1, &reader, 0, 0, 0).unwrap();
		}
		assert_eq!(reader.reads.load(std::sync::atomic::Ordering::Relaxed), 1);
	}

	#[test]
	fn distinct_keys_each_trigger_a_read() {
		let cache = SourceTileCache::new(1);
		let reader = CountingReader { reads: std::sync::atomic::AtomicUsize::new(0) };
		cache.get_or_read(1, &reader, 0, 0, 0).unwrap();
		cache.get_or_read(1, &reader, 0, 1, 0).unwrap();
		cache.get_or_read(2, &reader, 0, 0, 0).unwrap();
		assert_eq!(reader.reads.load(std::sync::atomic::Ordering::Relaxed), 3);
	}
}
