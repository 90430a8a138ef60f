//! Constants of the archive format and of the records.

/// Magic bytes, carried in the file header.
pub const OBACKUP_MAGIC: [u8; 3] = [0x0B, 0xAC, 0x4F];

/// Skippable frame nibble of the file header.
pub const FILE_HEADER_NIBBLE: u8 = 0x0;

/// Skippable frame nibble of an entry header.
pub const ENTRY_HEADER_NIBBLE: u8 = 0x1;

/// Gzip magic, which starts every legacy single-stream backup.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Permission bits given to every member.
pub const MEMBER_MODE: u32 = 0o644;

/// Size of the chunks handed to the data callback.
pub const DATA_CHUNK_SIZE: usize = 16 * 1024;

/// Default zstd compression level of members.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Application version recorded in the Openbook properties.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
