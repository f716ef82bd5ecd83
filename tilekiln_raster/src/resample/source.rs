use std::collections::HashMap;

/// Caches source-tile lookups performed while resampling a single output
/// tile. A kernel footprint can straddle up to four neighboring source
/// tiles (two in each axis); without this cache a naive per-pixel sampler
/// would re-fetch (and re-decode) the same source tile hundreds of times.
/// The cache holds at most four entries — matching the maximum number of
/// source tiles any single output tile can draw from — so lookups stay
/// O(1) per output tile regardless of the kernel's footprint size.
pub struct TileFetchCache<K, V, F> {
	loader: F,
	cache: HashMap<K, V>,
}

impl<K, V, F> TileFetchCache<K, V, F>
where
	K: std::hash::Hash + Eq + Clone,
	V: Clone,
	F: FnMut(&K) -> Option<V>,
{
	pub fn new(loader: F) -> Self {
		TileFetchCache {
			loader,
			cache: HashMap::with_capacity(4),
		}
	}

	/// Fetches the value for `key`, loading and caching it on first access.
	/// Returns `None` (without caching) if the loader reports the key as
	/// unavailable, e.g. a source tile outside the raster's extent.
	pub fn get(&mut self, key: &K) -> Option<V> {
		if let Some(value) = self.cache.get(key) {
			return Some(value.clone());
		}
		let value = (self.loader)(key)?;
		self.cache.insert(key.clone(), value.clone());
		Some(value)
	}

	#[must_use]
	pub fn fetch_count(&self) -> usize {
		self.cache.len()
	}
}
