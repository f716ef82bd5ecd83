use anyhow::{bail, ensure, Context, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::tags::field_type;

/// One parsed directory entry: `(tag, field type, count, raw 4-byte value/offset slot)`.
#[derive(Debug, Clone, Copy)]
pub struct IfdEntry {
	pub tag: u16,
	pub field_type: u16,
	pub count: u32,
	pub value_slot: [u8; 4],
}

/// A single image file directory, i.e. one resolution level of a COG's overview pyramid.
#[derive(Debug, Clone)]
pub struct Ifd {
	pub entries: Vec<IfdEntry>,
	pub little_endian: bool,
}

impl Ifd {
	fn entry(&self, tag: u16) -> Option<&IfdEntry> {
		self.entries.iter().find(|e| e.tag == tag)
	}

	fn read_u16(&self, slot: &[u8]) -> u16 {
		if self.little_endian {
			LittleEndian::read_u16(slot)
		} else {
			BigEndian::read_u16(slot)
		}
	}

	fn read_u32(&self, slot: &[u8]) -> u32 {
		if self.little_endian {
			LittleEndian::read_u32(slot)
		} else {
			BigEndian::read_u32(slot)
		}
	}

	/// A scalar value stored inline in the entry's 4-byte value slot (BYTE/SHORT/LONG only).
	pub fn scalar_u32(&self, tag: u16) -> Option<u32> {
		let entry = self.entry(tag)?;
		Some(match entry.field_type {
			field_type::BYTE => u32::from(entry.value_slot[0]),
			field_type::SHORT => u32::from(self.read_u16(&entry.value_slot[0..2])),
			field_type::LONG => self.read_u32(&entry.value_slot),
			_ => return None,
		})
	}

	/// An array value: SHORT/LONG entries whose payload may be inline (<=4 bytes) or
	/// stored at an external file offset.
	pub fn array_u32(&self, tag: u16, data: &[u8]) -> Result<Vec<u32>> {
		let Some(entry) = self.entry(tag) else {
			return Ok(Vec::new());
		};
		let elem_size: usize = match entry.field_type {
			field_type::SHORT => 2,
			field_type::LONG => 4,
			other => bail!("tag {tag} has unsupported array field type {other}"),
		};
		let total_bytes = elem_size * entry.count as usize;
		let bytes: &[u8] = if total_bytes <= 4 {
			&entry.value_slot[..total_bytes]
		} else {
			let offset = self.read_u32(&entry.value_slot) as usize;
			ensure!(offset + total_bytes <= data.len(), "tag {tag} array runs past end of file");
			&data[offset..offset + total_bytes]
		};

		Ok(bytes
			.chunks_exact(elem_size)
			.map(|chunk| {
				if elem_size == 2 {
					u32::from(self.read_u16(chunk))
				} else {
					self.read_u32(chunk)
				}
			})
			.collect())
	}

	/// A DOUBLE (f64) array, used for `ModelPixelScaleTag`/`ModelTiepointTag`.
	pub fn array_f64(&self, tag: u16, data: &[u8]) -> Result<Vec<f64>> {
		let Some(entry) = self.entry(tag) else {
			return Ok(Vec::new());
		};
		ensure!(entry.field_type == field_type::DOUBLE, "tag {tag} is not a DOUBLE array");
		let total_bytes = 8 * entry.count as usize;
		let offset = self.read_u32(&entry.value_slot) as usize;
		ensure!(offset + total_bytes <= data.len(), "tag {tag} array runs past end of file");
		let bytes = &data[offset..offset + total_bytes];
		Ok(bytes
			.chunks_exact(8)
			.map(|chunk| {
				if self.little_endian {
					LittleEndian::read_f64(chunk)
				} else {
					BigEndian::read_f64(chunk)
				}
			})
			.collect())
	}
}

/// Parses the 8-byte TIFF header, returning byte order and the first IFD's file offset.
pub fn parse_header(data: &[u8]) -> Result<(bool, u32)> {
	ensure!(data.len() >= 8, "file too small to be a TIFF");
	let little_endian = match &data[0..2] {
		[0x49, 0x49] => true,
		[0x4D, 0x4D] => false,
		other => bail!("not a TIFF file (bad byte-order marker {other:?})"),
	};
	let magic = if little_endian {
		LittleEndian::read_u16(&data[2..4])
	} else {
		BigEndian::read_u16(&data[2..4])
	};
	ensure!(magic == 42, "unsupported TIFF magic number {magic} (BigTIFF is not supported)");
	let offset = if little_endian {
		LittleEndian::read_u32(&data[4..8])
	} else {
		BigEndian::read_u32(&data[4..8])
	};
	Ok((little_endian, offset))
}

/// Parses the IFD at `offset`, returning it plus the file offset of the next IFD (0 if none).
pub fn parse_ifd(data: &[u8], offset: u32, little_endian: bool) -> Result<(Ifd, u32)> {
	let offset = offset as usize;
	ensure!(offset + 2 <= data.len(), "IFD offset out of bounds");
	let count = if little_endian {
		LittleEndian::read_u16(&data[offset..offset + 2])
	} else {
		BigEndian::read_u16(&data[offset..offset + 2])
	} as usize;

	let entries_start = offset + 2;
	let entry_size = 12;
	ensure!(
		entries_start + count * entry_size + 4 <= data.len(),
		"IFD entry table runs past end of file"
	);

	let mut entries = Vec::with_capacity(count);
	for i in 0..count {
		let base = entries_start + i * entry_size;
		let entry = &data[base..base + entry_size];
		let read_u16 = |s: &[u8]| if little_endian { LittleEndian::read_u16(s) } else { BigEndian::read_u16(s) };
		let read_u32 = |s: &[u8]| if little_endian { LittleEndian::read_u32(s) } else { BigEndian::read_u32(s) };
		entries.push(IfdEntry {
			tag: read_u16(&entry[0..2]),
			field_type: read_u16(&entry[2..4]),
			count: read_u32(&entry[4..8]),
			value_slot: entry[8..12].try_into().unwrap(),
		});
	}

	let next_offset_pos = entries_start + count * entry_size;
	let next_ifd_offset = if little_endian {
		LittleEndian::read_u32(&data[next_offset_pos..next_offset_pos + 4])
	} else {
		BigEndian::read_u32(&data[next_offset_pos..next_offset_pos + 4])
	};

	Ok((Ifd { entries, little_endian }, next_ifd_offset))
}

/// Walks the IFD chain starting at the header's first offset.
pub fn parse_all_ifds(data: &[u8]) -> Result<Vec<Ifd>> {
	let (little_endian, mut offset) = parse_header(data).context("parsing TIFF header")?;
	let mut ifds = Vec::new();
	while offset != 0 {
		let (ifd, next) = parse_ifd(data, offset, little_endian).context("parsing IFD")?;
		ifds.push(ifd);
		offset = next;
	}
	ensure!(!ifds.is_empty(), "TIFF file has no image file directories");
	Ok(ifds)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn little_endian_entry(tag: u16, field_type: u16, count: u32, value: u32) -> [u8; 12] {
		let mut out = [0u8; 12];
		out[0..2].copy_from_slice(&tag.to_le_bytes());
		out[2..4].copy_from_slice(&field_type.to_le_bytes());
		out[4..8].copy_from_slice(&count.to_le_bytes());
		out[8..12].copy_from_slice(&value.to_le_bytes());
		out
	}

	fn build_minimal_tiff(width: u32, height: u32) -> Vec<u8> {
		let mut data = vec![0u8; 8];
		data[0..2].copy_from_slice(b"II");
		data[2..4].copy_from_slice(&42u16.to_le_bytes());
		data[4..8].copy_from_slice(&8u32.to_le_bytes());

		let entries = [
			little_endian_entry(crate::tags::tag::IMAGE_WIDTH, field_type::LONG, 1, width),
			little_endian_entry(crate::tags::tag::IMAGE_LENGTH, field_type::LONG, 1, height),
		];
		data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
		for entry in entries {
			data.extend_from_slice(&entry);
		}
		data.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
		data
	}

	#[test]
	fn parses_header_byte_order_and_offset() {
		let data = build_minimal_tiff(4, 4);
		let (little_endian, offset) = parse_header(&data).unwrap();
		assert!(little_endian);
		assert_eq!(offset, 8);
	}

	#[test]
	fn parses_scalar_entries() {
		let data = build_minimal_tiff(512, 256);
		let (ifd, next) = parse_ifd(&data, 8, true).unwrap();
		assert_eq!(next, 0);
		assert_eq!(ifd.scalar_u32(crate::tags::tag::IMAGE_WIDTH), Some(512));
		assert_eq!(ifd.scalar_u32(crate::tags::tag::IMAGE_LENGTH), Some(256));
	}

	#[test]
	fn rejects_non_tiff_data() {
		assert!(parse_header(b"not a tiff file").is_err());
	}
}
