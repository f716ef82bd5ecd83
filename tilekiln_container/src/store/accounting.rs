use std::sync::atomic::{AtomicI64, Ordering};

/// Constant-overhead accounting per resident entry, separate from the
/// variable encoded-byte count so eviction can be driven by the same
/// counter the store reports to callers.
const UNIFORM_OVERHEAD_BYTES: i64 = 32;
const INDEX_OVERHEAD_BYTES: i64 = 24;

/// Two atomic counters tracking the store's current memory footprint:
/// encoded tile bytes still resident, and fixed per-entry overhead for
/// uniform tiles and disk-index records. Their sum is what `memory_usage`
/// reports and what back-pressure compares against `memory_limit_bytes`.
#[derive(Debug, Default)]
pub struct MemoryAccounting {
	encoded_bytes: AtomicI64,
	overhead_bytes: AtomicI64,
}

impl MemoryAccounting {
	pub fn add_encoded(&self, bytes: usize) {
		self.encoded_bytes.fetch_add(bytes as i64, Ordering::Relaxed);
	}

	pub fn remove_encoded(&self, bytes: usize) {
		self.encoded_bytes.fetch_sub(bytes as i64, Ordering::Relaxed);
	}

	pub fn add_uniform(&self) {
		self.overhead_bytes.fetch_add(UNIFORM_OVERHEAD_BYTES, Ordering::Relaxed);
	}

	pub fn add_index(&self) {
		self.overhead_bytes.fetch_add(INDEX_OVERHEAD_BYTES, Ordering::Relaxed);
	}

	#[must_use]
	pub fn usage(&self) -> u64 {
		let total = self.encoded_bytes.load(Ordering::Relaxed) + self.overhead_bytes.load(Ordering::Relaxed);
		total.max(0) as u64
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sums_encoded_and_overhead_bytes() {
		let acc = MemoryAccounting::default();
		acc.add_encoded(1000);
		acc.add_uniform();
		acc.add_index();
		assert_eq!(acc.usage(), 1000 + UNIFORM_OVERHEAD_BYTES as u64 + INDEX_OVERHEAD_BYTES as u64);
	}

	#[test]
	fn remove_encoded_reduces_usage() {
		let acc = MemoryAccounting::default();
		acc.add_encoded(1000);
		acc.remove_encoded(600);
		assert_eq!(acc.usage(), 400);
	}
}
