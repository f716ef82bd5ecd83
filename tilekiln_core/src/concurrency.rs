/// Bounds on how much parallelism the pyramid generator and writer are
/// allowed to use, derived from the number of logical CPUs unless the
/// caller pins an explicit value.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimits {
	/// Number of worker tasks rendering or downsampling tiles concurrently.
	pub workers: usize,
	/// Number of in-flight batches the generator is allowed to queue ahead
	/// of the worker pool before it blocks the producer.
	pub queue_depth: usize,
}

impl ConcurrencyLimits {
	#[must_use]
	pub fn new(workers: Option<usize>) -> Self {
		let workers = workers.unwrap_or_else(num_cpus::get).max(1);
		Self {
			workers,
			queue_depth: workers * 4,
		}
	}
}

impl Default for ConcurrencyLimits {
	fn default() -> Self {
		Self::new(None)
	}
}
