//! Swiss CH1903+ / LV95 (EPSG:2056) conversion via swisstopo's published
//! approximate polynomial. Accurate to roughly a meter within Switzerland —
//! adequate for placing raster tiles, not for survey-grade work.

/// Converts WGS84 longitude/latitude (degrees) into LV95 easting/northing (meters).
pub(super) fn from_lon_lat(lon: f64, lat: f64) -> (f64, f64) {
	let phi_s = (lat * 3600.0 - 169_028.66) / 10_000.0;
	let lambda_s = (lon * 3600.0 - 26_782.5) / 10_000.0;

	let e = 2_600_072.37 + 211_455.93 * lambda_s
		- 10_938.51 * lambda_s * phi_s
		- 0.36 * lambda_s * phi_s * phi_s
		- 44.54 * lambda_s.powi(3);

	let n = 1_200_147.07 + 308_807.95 * phi_s + 3_745.25 * lambda_s * lambda_s
		+ 76.63 * phi_s * phi_s
		- 194.56 * lambda_s * lambda_s * phi_s
		+ 119.79 * phi_s.powi(3);

	(e, n)
}

/// Converts LV95 easting/northing (meters) into WGS84 longitude/latitude (degrees).
pub(super) fn to_lon_lat(e: f64, n: f64) -> (f64, f64) {
	let y = (e - 2_600_000.0) / 1_000_000.0;
	let x = (n - 1_200_000.0) / 1_000_000.0;

	let lambda_s = 2.677_924_0 + 4.728_982 * y + 0.791_484 * y * x + 0.130_6 * y * x * x - 0.043_6 * y.powi(3);
	let phi_s = 16.902_389_2 + 3.238_272 * x
		- 0.270_978 * y * y
		- 0.002_528 * x * x
		- 0.044_7 * y * y * x
		- 0.014_0 * x.powi(3);

	let lon = lambda_s * 100.0 / 36.0;
	let lat = phi_s * 100.0 / 36.0;
	(lon, lat)
}
