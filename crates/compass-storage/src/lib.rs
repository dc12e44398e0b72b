//! Durable spike archives for the compass simulator
//!
//! A run is persisted as a small fixed header (magic, version, compression,
//! payload length, CRC32) followed by a bincode payload holding the time
//! axis and the per-cluster firing step indices.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod error;
pub mod schemas;

// Format and backend
pub mod archive;
pub mod file;

// Re-export essential types
pub use archive::{decode, encode, ArchiveHeader, Compression, SpikeArchive, CSPK_HEADER_LEN, CSPK_VERSION};
pub use error::{Result, StorageError};
pub use file::{read_archive, write_archive};

/// Storage crate version for compatibility checking
pub const STORAGE_VERSION: u32 = 1;

/// Magic numbers for all binary formats
pub mod magic {
    /// Spike archive magic number: "CSPK"
    pub const CSPK: [u8; 4] = [0x43, 0x53, 0x50, 0x4B];
}
