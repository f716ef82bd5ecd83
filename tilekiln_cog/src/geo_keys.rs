use anyhow::Result;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::ifd::Ifd;
use crate::tags::{geo_key, tag};

/// Reads the EPSG code out of a `GeoKeyDirectoryTag`, preferring the
/// projected CS type key and falling back to the geographic type key.
///
/// The directory is itself laid out like a miniature TIFF IFD: a 4-`u16`
/// header (`version, major, minor, num_keys`) followed by `num_keys` rows of
/// `(key_id, tiff_tag_location, count, value_or_offset)`. Only the common
/// case — the EPSG code stored inline (`tiff_tag_location == 0`) — is
/// decoded; keys stored out-of-line in `GeoDoubleParamsTag`/`GeoAsciiParamsTag`
/// are outside what this minimal reader needs.
pub fn read_epsg(ifd: &Ifd, data: &[u8]) -> Result<Option<u16>> {
	let raw = ifd.array_u32(tag::GEO_KEY_DIRECTORY_TAG, data)?;
	if raw.len() < 4 {
		return Ok(None);
	}

	let mut projected = None;
	let mut geographic = None;
	for row in raw[4..].chunks_exact(4) {
		let [key_id, location, _count, value] = row else { unreachable!() };
		if *location != 0 {
			continue;
		}
		match *key_id {
			id if id == geo_key::PROJECTED_CS_TYPE => projected = Some(*value as u16),
			id if id == geo_key::GEOGRAPHIC_TYPE => geographic = Some(*value as u16),
			_ => {}
		}
	}

	Ok(projected.or(geographic).filter(|&code| code != 0 && code != 32767))
}

/// Re-reads raw bytes with the IFD's own byte order — used for the rare
/// tag that array_u32/array_f64 doesn't directly model.
pub fn read_u32(ifd: &Ifd, slot: &[u8]) -> u32 {
	if ifd.little_endian {
		LittleEndian::read_u32(slot)
	} else {
		BigEndian::read_u32(slot)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ifd::{Ifd, IfdEntry};

	fn geo_key_ifd(rows: &[(u16, u16, u16, u16)]) -> (Ifd, Vec<u8>) {
		let mut data = vec![0u8; 16]; // leading padding so offset 16 is safe
		let dir_offset = data.len() as u32;
		let mut dir = vec![1u16, 1, 0, rows.len() as u16];
		for &(key_id, location, count, value) in rows {
			dir.extend_from_slice(&[key_id, location, count, value]);
		}
		for v in dir {
			data.extend_from_slice(&v.to_le_bytes());
		}

		let entry = IfdEntry {
			tag: tag::GEO_KEY_DIRECTORY_TAG,
			field_type: crate::tags::field_type::SHORT,
			count: (4 + rows.len() * 4) as u32,
			value_slot: dir_offset.to_le_bytes(),
		};
		(
			Ifd {
				entries: vec![entry],
				little_endian: true,
			},
			data,
		)
	}

	#[test]
	fn prefers_projected_over_geographic_cs_type() {
		let (ifd, data) = geo_key_ifd(&[
			(geo_key::GEOGRAPHIC_TYPE, 0, 1, 4326),
			(geo_key::PROJECTED_CS_TYPE, 0, 1, 3857),
		]);
		assert_eq!(read_epsg(&ifd, &data).unwrap(), Some(3857));
	}

	#[test]
	fn falls_back_to_geographic_cs_type() {
		let (ifd, data) = geo_key_ifd(&[(geo_key::GEOGRAPHIC_TYPE, 0, 1, 4326)]);
		assert_eq!(read_epsg(&ifd, &data).unwrap(), Some(4326));
	}

	#[test]
	fn treats_undefined_code_as_absent() {
		let (ifd, data) = geo_key_ifd(&[(geo_key::PROJECTED_CS_TYPE, 0, 1, 32767)]);
		assert_eq!(read_epsg(&ifd, &data).unwrap(), None);
	}
}
