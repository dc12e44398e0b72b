//! Error types for the storage layer

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Ways reading or writing a spike archive can fail
#[derive(Error, Debug)]
pub enum StorageError {
    /// Leading bytes are not the archive magic
    #[error("not a spike archive: magic {found:?}, expected {expected:?}")]
    InvalidMagic {
        /// Archive magic
        expected: [u8; 4],
        /// First four bytes of the input
        found: [u8; 4],
    },

    /// Archive written by a newer or unknown format revision
    #[error("archive format version {version} cannot be read (this build reads {supported})")]
    UnsupportedVersion {
        /// Version in the header
        version: u32,
        /// Version this build writes and reads
        supported: u32,
    },

    /// Payload does not match the CRC32 in the header
    #[error("archive payload is corrupt: header crc {expected:08x}, payload crc {computed:08x}")]
    ChecksumMismatch {
        /// CRC32 stored in the header
        expected: u32,
        /// CRC32 of the payload as read
        computed: u32,
    },

    /// Truncated header or payload, or inconsistent firing data
    #[error("malformed archive: {reason}")]
    InvalidFormat {
        /// What is malformed
        reason: String,
    },

    /// Archive file could not be opened, read or written
    #[error("archive file: {source}")]
    Io {
        #[from]
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// LZ4 payload could not be packed or unpacked
    #[error("payload compression: {reason}")]
    Compression {
        /// Codec failure or unknown codec
        reason: String,
    },

    /// Firing data could not be encoded or decoded with bincode
    #[error("payload encoding: {reason}")]
    Serialization {
        /// bincode failure
        reason: String,
    },
}

impl StorageError {
    /// Malformed archive
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Codec failure
    pub fn compression(reason: impl Into<String>) -> Self {
        Self::Compression {
            reason: reason.into(),
        }
    }

    /// bincode failure
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
