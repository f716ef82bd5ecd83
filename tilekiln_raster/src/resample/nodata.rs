//! Nodata-aware weighted averaging.
//!
//! Plain weighted averages leak nodata into the output: a single
//! fully-transparent or `NaN` sample in a footprint should be excluded and
//! the remaining weights renormalized, not blended in as if it were real
//! data. The alpha channel itself is the one exception on the 8-bit path —
//! it is interpolated unweighted-by-itself (every sample, including
//! zero-alpha ones, contributes with its original weight) so a tile's
//! transparency gracefully fades rather than snapping to opaque the moment
//! any contributing pixel has data.

/// Blends `samples` (each a `(pixel, weight)` pair, `None` meaning nodata)
/// into a single RGBA pixel. Returns `None` if every sample was nodata.
#[must_use]
pub fn weighted_average_rgba(samples: &[(Option<[u8; 4]>, f64)]) -> Option<[u8; 4]> {
	let alpha_weight_sum: f64 = samples.iter().map(|(_, w)| w).sum();
	if alpha_weight_sum <= 0.0 {
		return None;
	}
	let alpha: f64 = samples
		.iter()
		.map(|(px, w)| f64::from(px.map_or(0, |p| p[3])) * w)
		.sum::<f64>()
		/ alpha_weight_sum;

	let opaque: Vec<([u8; 4], f64)> = samples
		.iter()
		.filter_map(|(px, w)| px.filter(|p| p[3] > 0).map(|p| (p, *w)))
		.collect();
	if opaque.is_empty() {
		return None;
	}
	let weight_sum: f64 = opaque.iter().map(|(_, w)| w).sum();
	if weight_sum <= 0.0 {
		return None;
	}

	let mut channel = [0f64; 3];
	for (px, w) in &opaque {
		for c in 0..3 {
			channel[c] += f64::from(px[c]) * w;
		}
	}
	for c in &mut channel {
		*c /= weight_sum;
	}

	Some([
		channel[0].round().clamp(0.0, 255.0) as u8,
		channel[1].round().clamp(0.0, 255.0) as u8,
		channel[2].round().clamp(0.0, 255.0) as u8,
		alpha.round().clamp(0.0, 255.0) as u8,
	])
}

/// Blends `samples` (each a `(value, weight)` pair, `None`/`NaN` meaning
/// nodata) into a single float value. Returns `None` if every sample was
/// nodata, signaling the caller should fall back to a nearest-neighbor pick.
#[must_use]
pub fn weighted_average_float(samples: &[(Option<f32>, f64)]) -> Option<f32> {
	let valid: Vec<(f32, f64)> = samples
		.iter()
		.filter_map(|(v, w)| v.filter(|v| !v.is_nan()).map(|v| (v, *w)))
		.collect();
	if valid.is_empty() {
		return None;
	}
	let weight_sum: f64 = valid.iter().map(|(_, w)| w).sum();
	if weight_sum <= 0.0 {
		return None;
	}
	let sum: f64 = valid.iter().map(|(v, w)| f64::from(*v) * w).sum();
	Some((sum / weight_sum) as f32)
}
