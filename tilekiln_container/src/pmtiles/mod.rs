mod blob_io;
mod directory;
mod entries_v3;
mod entry_v3;
mod header_v3;
mod tile_compression;
mod tile_type;
mod writer;

pub use directory::Directory;
pub use entries_v3::EntriesV3;
pub use entry_v3::EntryV3;
pub use header_v3::HeaderV3;
pub use tile_compression::PMTilesCompression;
pub use tile_type::PMTilesType;
pub use writer::PMTilesWriter;
