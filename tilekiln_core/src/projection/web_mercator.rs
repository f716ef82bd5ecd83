use std::f64::consts::PI;

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// EPSG:3857 spherical Mercator, in meters from the origin at (0°, 0°).
pub(super) fn from_lon_lat(lon: f64, lat: f64) -> (f64, f64) {
	let x = lon.to_radians() * EARTH_RADIUS_M;
	let y = (lat.to_radians() / 2.0 + PI / 4.0).tan().ln() * EARTH_RADIUS_M;
	(x, y)
}

pub(super) fn to_lon_lat(x: f64, y: f64) -> (f64, f64) {
	let lon = (x / EARTH_RADIUS_M).to_degrees();
	let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
	(lon, lat)
}
