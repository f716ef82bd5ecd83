use sysinfo::System;

/// Fraction of detected physical RAM the auto limit uses when neither
/// `--mem-limit-mb` nor `--no-spill` was given.
const AUTO_LIMIT_FRACTION: f64 = 0.9;

/// Resolves the tile store's `memory_limit_bytes`: an explicit
/// `--mem-limit-mb` wins outright, `--no-spill` forces pure in-memory mode
/// (`0`), and otherwise the limit defaults to 90% of detected physical RAM.
/// If RAM can't be detected, spilling is disabled rather than guessed.
#[must_use]
pub fn resolve_mem_limit_bytes(mem_limit_mb: Option<u64>, no_spill: bool) -> u64 {
	if no_spill {
		return 0;
	}
	if let Some(mb) = mem_limit_mb {
		return mb * 1_000_000;
	}
	auto_limit_bytes().unwrap_or(0)
}

fn auto_limit_bytes() -> Option<u64> {
	let mut system = System::new();
	system.refresh_memory();
	let total = system.total_memory();
	if total == 0 {
		return None;
	}
	#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
	Some((total as f64 * AUTO_LIMIT_FRACTION) as u64)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn no_spill_overrides_everything() {
		assert_eq!(resolve_mem_limit_bytes(Some(4096), true), 0);
	}

	#[test]
	fn explicit_mb_is_converted_to_bytes() {
		assert_eq!(resolve_mem_limit_bytes(Some(512), false), 512_000_000);
	}

	#[test]
	fn auto_limit_is_a_fraction_of_detected_ram() {
		let limit = resolve_mem_limit_bytes(None, false);
		// Either RAM was undetectable (spilling disabled) or some positive
		// fraction of it was chosen; either way it must never exceed total RAM.
		let mut system = System::new();
		system.refresh_memory();
		assert!(limit <= system.total_memory());
	}
}
