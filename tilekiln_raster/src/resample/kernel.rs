use std::sync::OnceLock;

/// A resampling kernel. Each variant names the 1-D footprint radius (in
/// source pixels either side of the sample point) that its weight function
/// is nonzero over; the 2-D footprint applied to a source image is the
/// outer product of two 1-D passes with this radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
	/// 1x1 footprint: picks the nearest source pixel, no blending.
	Nearest,
	/// 2x2 footprint: linear interpolation between the four neighbors.
	Bilinear,
	/// 4x4 footprint: Catmull-Rom cubic convolution, a = -0.5.
	Bicubic,
	/// 6x6 footprint: windowed sinc, 3-pixel lobe.
	Lanczos3,
	/// Footprint matches whichever kernel drives the vote; picks the most
	/// frequent value among the sampled source pixels rather than blending
	/// them — the right choice for categorical (e.g. land-cover class) data.
	Mode,
}

impl Kernel {
	/// Radius, in source pixels, that this kernel's footprint extends to
	/// either side of the sample point. `0` for `Mode`, which has no fixed
	/// geometric footprint of its own (callers pick one, typically 1).
	#[must_use]
	pub fn radius(self) -> u32 {
		match self {
			Kernel::Nearest => 0,
			Kernel::Bilinear => 1,
			Kernel::Bicubic => 2,
			Kernel::Lanczos3 => 3,
			Kernel::Mode => 1,
		}
	}

	/// 1-D weights for the `2*radius` taps covering a sample point at
	/// fractional offset `frac` (`0.0..1.0`) from the first tap's center.
	#[must_use]
	pub fn weights_1d(self, frac: f64) -> Vec<f64> {
		match self {
			Kernel::Nearest => vec![1.0],
			Kernel::Bilinear => vec![1.0 - frac, frac],
			Kernel::Bicubic => bicubic_lut().sample(frac),
			Kernel::Lanczos3 => lanczos3_lut().sample(frac),
			Kernel::Mode => vec![1.0; 2],
		}
	}
}

/// A precomputed table of weight vectors over 1024 evenly spaced fractional
/// offsets, so a resample pass looks up its taps instead of evaluating the
/// kernel's closed form (cubic or sinc terms) once per output pixel.
struct WeightLut {
	taps: usize,
	table: Vec<Vec<f64>>,
}

const LUT_RESOLUTION: usize = 1024;

impl WeightLut {
	fn build(taps: usize, weight_fn: impl Fn(f64) -> f64) -> Self {
		let radius = taps as i32 / 2;
		let table = (0..LUT_RESOLUTION)
			.map(|i| {
				let frac = i as f64 / LUT_RESOLUTION as f64;
				let mut weights: Vec<f64> = (0..taps)
					.map(|tap| {
						let x = frac - f64::from(tap as i32 - (radius - 1));
						weight_fn(x)
					})
					.collect();
				let sum: f64 = weights.iter().sum();
				if sum.abs() > 1e-12 {
					for w in &mut weights {
						*w /= sum;
					}
				}
				weights
			})
			.collect();
		WeightLut { taps, table }
	}

	/// Linearly interpolates between the two table rows bracketing `frac`,
	/// rather than snapping to the nearest precomputed bucket.
	fn sample(&self, frac: f64) -> Vec<f64> {
		let scaled = frac.clamp(0.0, 0.999_999) * LUT_RESOLUTION as f64;
		let index = (scaled as usize).min(LUT_RESOLUTION - 1);
		let next = (index + 1).min(LUT_RESOLUTION - 1);
		let t = scaled - index as f64;
		debug_assert_eq!(self.table[index].len(), self.taps);
		self.table[index].iter().zip(&self.table[next]).map(|(a, b)| a + (b - a) * t).collect()
	}
}

fn bicubic_lut() -> &'static WeightLut {
	static LUT: OnceLock<WeightLut> = OnceLock::new();
	LUT.get_or_init(|| WeightLut::build(4, catmull_rom))
}

fn lanczos3_lut() -> &'static WeightLut {
	static LUT: OnceLock<WeightLut> = OnceLock::new();
	LUT.get_or_init(|| WeightLut::build(6, |x| lanczos(x, 3.0)))
}

/// Catmull-Rom cubic convolution kernel with `a = -0.5`.
fn catmull_rom(x: f64) -> f64 {
	const A: f64 = -0.5;
	let ax = x.abs();
	if ax <= 1.0 {
		(A + 2.0) * ax.powi(3) - (A + 3.0) * ax.powi(2) + 1.0
	} else if ax < 2.0 {
		A * ax.powi(3) - 5.0 * A * ax.powi(2) + 8.0 * A * ax - 4.0 * A
	} else {
		0.0
	}
}

fn sinc(x: f64) -> f64 {
	if x.abs() < 1e-12 {
		1.0
	} else {
		let px = std::f64::consts::PI * x;
		px.sin() / px
	}
}

/// Windowed-sinc kernel with a lobe count of `a` (3 for Lanczos-3).
fn lanczos(x: f64, a: f64) -> f64 {
	if x.abs() < a {
		sinc(x) * sinc(x / a)
	} else {
		0.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nearest_has_a_single_unit_weight() {
		assert_eq!(Kernel::Nearest.weights_1d(0.3), vec![1.0]);
	}

	#[test]
	fn bilinear_weights_sum_to_one_and_interpolate() {
		let w = Kernel::Bilinear.weights_1d(0.25);
		assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
		assert!((w[0] - 0.75).abs() < 1e-12);
		assert!((w[1] - 0.25).abs() < 1e-12);
	}

	#[test]
	fn bicubic_weights_have_four_taps_and_sum_to_one() {
		for frac in [0.0, 0.1, 0.5, 0.9] {
			let w = Kernel::Bicubic.weights_1d(frac);
			assert_eq!(w.len(), 4);
			assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9, "frac={frac} sum={}", w.iter().sum::<f64>());
		}
	}

	#[test]
	fn lanczos3_weights_have_six_taps_and_sum_to_one() {
		for frac in [0.0, 0.2, 0.5, 0.8] {
			let w = Kernel::Lanczos3.weights_1d(frac);
			assert_eq!(w.len(), 6);
			assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
		}
	}

	#[test]
	fn weight_lut_interpolates_between_adjacent_buckets() {
		let lut = bicubic_lut();
		let bucket = 1.0 / LUT_RESOLUTION as f64;
		let midpoint = lut.sample(bucket * 0.5);
		let lower = &lut.table[0];
		let upper = &lut.table[1];
		for i in 0..lower.len() {
			let expected = (lower[i] + upper[i]) / 2.0;
			assert!((midpoint[i] - expected).abs() < 1e-9, "tap {i}: {} vs {expected}", midpoint[i]);
		}
	}

	#[test]
	fn radii_match_the_documented_footprints() {
		assert_eq!(Kernel::Nearest.radius(), 0);
		assert_eq!(Kernel::Bilinear.radius(), 1);
		assert_eq!(Kernel::Bicubic.radius(), 2);
		assert_eq!(Kernel::Lanczos3.radius(), 3);
	}
}
