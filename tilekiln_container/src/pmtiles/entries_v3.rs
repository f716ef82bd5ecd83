use anyhow::Result;
use tilekiln_core::{compress_gzip, decompress_gzip, Blob};

use super::blob_io::{BlobReader, BlobWriter};
use super::directory::Directory;
use super::entry_v3::{find_tile, EntryV3};

/// An ordered, tile-id-sorted collection of directory entries, with the
/// uvarint delta encoding and root/leaf splitting PMTiles v3 directories use.
#[derive(Debug, Default, PartialEq)]
pub struct EntriesV3 {
	entries: Vec<EntryV3>,
}

impl EntriesV3 {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, entry: EntryV3) {
		self.entries.push(entry);
	}

	/// Overwrites the entry at `index`, used to extend an open run's
	/// length in place while streaming tiles.
	pub fn set(&mut self, index: usize, entry: EntryV3) {
		self.entries[index] = entry;
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[must_use]
	pub fn as_slice(&self) -> &[EntryV3] {
		&self.entries
	}

	#[must_use]
	pub fn find_tile(&self, tile_id: u64) -> Option<EntryV3> {
		find_tile(&self.entries, tile_id)
	}

    pub fn sort_by_tile_id(&mut self) {
		self.entries.sort_by_key(|e| e.tile_id);
	}

	/// Serializes this slice of entries as a gzip-compressed, uvarint-delta
	/// encoded directory blob: entry count, tile-id deltas, run lengths,
	/// lengths, then offsets (0 meaning "immediately after the previous
	/// entry", avoiding repeating contiguous offsets).
	pub fn serialize(&self) -> Result<Blob> {
		serialize_entries(&self.entries)
	}

	pub fn deserialize(blob: &Blob) -> Result<Self> {
		let data = decompress_gzip(blob.as_slice())?;
		let mut reader = BlobReader::new(data.as_slice());

		let num_entries = reader.read_varint()? as usize;
		let mut entries = Vec::with_capacity(num_entries);
		let mut last_id = 0u64;
		for _ in 0..num_entries {
			last_id += reader.read_varint()?;
			entries.push(EntryV3::new(last_id, 0, 0, 0));
		}
		for entry in &mut entries {
			entry.run_length = reader.read_varint()? as u32;
		}
		for entry in &mut entries {
			entry.length = reader.read_varint()? as u32;
		}
		for i in 0..num_entries {
			let raw = reader.read_varint()?;
			entries[i].offset = if i > 0 && raw == 0 {
				entries[i - 1].offset + u64::from(entries[i - 1].length)
			} else {
				raw - 1
			};
		}

		Ok(Self { entries })
	}

	/// Splits entries into a root directory plus zero or more leaf
	/// directories so the root fits within `target_root_len` bytes once
	/// compressed, following go-pmtiles' iterative leaf-size search.
	pub fn as_directory(&self, target_root_len: usize) -> Result<Directory> {
		if self.entries.len() < 16384 {
			let root_bytes = self.serialize()?;
			if root_bytes.len() <= target_root_len {
				return Ok(Directory { root_bytes, leaves_bytes: Blob::new(Vec::new()) });
			}
		}

		let mut leaf_size = (self.entries.len() / 3500).max(4096);
		loop {
			let directory = self.build_roots_leaves(leaf_size)?;
			if directory.root_bytes.len() <= target_root_len {
				return Ok(directory);
			}
			leaf_size += leaf_size / 5; // *= 1.2, matching go-pmtiles
		}
	}

	fn build_roots_leaves(&self, leaf_size: usize) -> Result<Directory> {
		let mut root_entries = Vec::new();
		let mut leaves_bytes = Vec::new();

		for chunk in self.entries.chunks(leaf_size) {
			let serialized = serialize_entries(chunk)?;
			root_entries.push(EntryV3::new(chunk[0].tile_id, leaves_bytes.len() as u64, serialized.len() as u32, 0));
			leaves_bytes.extend_from_slice(serialized.as_slice());
		}

		let root_bytes = serialize_entries(&root_entries)?;
		Ok(Directory { root_bytes, leaves_bytes: Blob::from(leaves_bytes) })
	}
}

fn serialize_entries(entries: &[EntryV3]) -> Result<Blob> {
	let mut writer = BlobWriter::new();

	writer.write_varint(entries.len() as u64)?;

	let mut last_id = 0u64;
	for entry in entries {
		writer.write_varint(entry.tile_id - last_id)?;
		last_id = entry.tile_id;
	}
	for entry in entries {
		writer.write_varint(u64::from(entry.run_length))?;
	}
	for entry in entries {
		writer.write_varint(u64::from(entry.length))?;
	}
	for (i, entry) in entries.iter().enumerate() {
		let contiguous = i > 0 && entry.offset == entries[i - 1].offset + u64::from(entries[i - 1].length);
		writer.write_varint(if contiguous { 0 } else { entry.offset + 1 })?;
	}

	Ok(Blob::from(compress_gzip(writer.into_blob().as_slice())?))
}
