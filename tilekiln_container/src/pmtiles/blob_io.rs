use anyhow::{bail, Result};
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

use tilekiln_core::Blob;

/// A little-endian cursor with uvarint support, used for the fixed-size
/// header fields and the variable-length directory entry arrays.
pub struct BlobWriter {
	cursor: Cursor<Vec<u8>>,
}

impl Default for BlobWriter {
	fn default() -> Self {
		Self::new()
	}
}

impl BlobWriter {
	pub fn new() -> Self {
		Self { cursor: Cursor::new(Vec::new()) }
	}

	pub fn write_varint(&mut self, mut value: u64) -> Result<()> {
		while value >= 0x80 {
			self.cursor.write_all(&[(value as u8 & 0x7F) | 0x80])?;
			value >>= 7;
		}
		self.cursor.write_all(&[value as u8])?;
		Ok(())
	}

	pub fn write_u8(&mut self, value: u8) -> Result<()> {
		Ok(self.cursor.write_u8(value)?)
	}

	pub fn write_i32(&mut self, value: i32) -> Result<()> {
		Ok(self.cursor.write_i32::<LE>(value)?)
	}

	pub fn write_u64(&mut self, value: u64) -> Result<()> {
		Ok(self.cursor.write_u64::<LE>(value)?)
	}

	pub fn write_slice(&mut self, buf: &[u8]) -> Result<usize> {
		Ok(self.cursor.write(buf)?)
	}

	pub fn into_blob(self) -> Blob {
		Blob::from(self.cursor.into_inner())
	}
}

pub struct BlobReader<'a> {
	cursor: Cursor<&'a [u8]>,
}

impl<'a> BlobReader<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		Self { cursor: Cursor::new(data) }
	}

	pub fn read_varint(&mut self) -> Result<u64> {
		let mut value = 0u64;
		let mut shift = 0u32;
		loop {
			let byte = self.cursor.read_u8()?;
			value |= (u64::from(byte) & 0x7F) << shift;
			if byte & 0x80 == 0 {
				break;
			}
			shift += 7;
			if shift >= 70 {
				bail!("varint too long");
			}
		}
		Ok(value)
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.cursor.read_u8()?)
	}

	pub fn read_i32(&mut self) -> Result<i32> {
		Ok(self.cursor.read_i32::<LE>()?)
	}

	pub fn read_u64(&mut self) -> Result<u64> {
		Ok(self.cursor.read_u64::<LE>()?)
	}

	pub fn set_position(&mut self, pos: u64) {
		self.cursor.set_position(pos);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn varint_round_trips_small_and_large_values() {
		for value in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
			let mut writer = BlobWriter::new();
			writer.write_varint(value).unwrap();
			let blob = writer.into_blob();
			let mut reader = BlobReader::new(blob.as_slice());
			assert_eq!(reader.read_varint().unwrap(), value);
		}
	}
}
