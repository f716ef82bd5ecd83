use std::sync::atomic::{AtomicU64, Ordering};

/// Per-tile counters accumulated across every worker and zoom level.
/// Cheap to share (`Arc<GeneratorStats>`) since every update is a single
/// atomic add — no locking on the hot path.
#[derive(Debug, Default)]
pub struct GeneratorStats {
	tiles: AtomicU64,
	empty_tiles: AtomicU64,
	uniform_tiles: AtomicU64,
	bytes_written: AtomicU64,
}

impl GeneratorStats {
	pub fn record_empty(&self) {
		self.empty_tiles.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_tile(&self, uniform: bool, encoded_bytes: usize) {
		self.tiles.fetch_add(1, Ordering::Relaxed);
		if uniform {
			self.uniform_tiles.fetch_add(1, Ordering::Relaxed);
		}
		self.bytes_written.fetch_add(encoded_bytes as u64, Ordering::Relaxed);
	}

	#[must_use]
	pub fn snapshot(&self) -> GeneratorStatsSnapshot {
		GeneratorStatsSnapshot {
			tiles: self.tiles.load(Ordering::Relaxed),
			empty_tiles: self.empty_tiles.load(Ordering::Relaxed),
			uniform_tiles: self.uniform_tiles.load(Ordering::Relaxed),
			bytes_written: self.bytes_written.load(Ordering::Relaxed),
		}
	}
}

/// An immutable point-in-time read of `GeneratorStats`, returned once the
/// generator finishes so the CLI can print a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneratorStatsSnapshot {
	pub tiles: u64,
	pub empty_tiles: u64,
	pub uniform_tiles: u64,
	pub bytes_written: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accumulates_across_calls() {
		let stats = GeneratorStats::default();
		stats.record_tile(false, 100);
		stats.record_tile(true, 4);
		stats.record_empty();

		let snap = stats.snapshot();
		assert_eq!(snap.tiles, 2);
		assert_eq!(snap.uniform_tiles, 1);
		assert_eq!(snap.empty_tiles, 1);
		assert_eq!(snap.bytes_written, 104);
	}
}
