//! CSPK (spike archive) format implementation
//!
//! Layout, all integers little-endian:
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0  | 4 | magic `"CSPK"` |
//! | 4  | 4 | version |
//! | 8  | 1 | compression |
//! | 9  | 3 | reserved |
//! | 12 | 8 | payload length |
//! | 20 | 4 | CRC32 of the payload |
//! | 24 | n | bincode payload, optionally LZ4 block compressed |

use crate::{
    error::{Result, StorageError},
    magic,
    schemas::{calculate_checksum, validate_checksum, validate_magic, Reader},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current archive schema version
pub const CSPK_VERSION: u32 = 1;

/// Size of the fixed header in bytes
pub const CSPK_HEADER_LEN: usize = 24;

/// Payload compression of an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Raw bincode
    #[default]
    None,
    /// LZ4 block compression with a prepended size
    Lz4,
}

impl Compression {
    /// On-disk code
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lz4 => 1,
        }
    }

    /// Parse an on-disk code
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Lz4),
            other => Err(StorageError::compression(format!("unknown compression code {}", other))),
        }
    }

    fn compress(self, data: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data),
            #[cfg(feature = "compression")]
            Self::Lz4 => Ok(lz4_flex::compress_prepend_size(&data)),
            #[cfg(not(feature = "compression"))]
            Self::Lz4 => Err(StorageError::compression("built without lz4 support")),
        }
    }

    fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            #[cfg(feature = "compression")]
            Self::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| StorageError::compression(e.to_string())),
            #[cfg(not(feature = "compression"))]
            Self::Lz4 => Err(StorageError::compression("built without lz4 support")),
        }
    }
}

/// Fixed header preceding the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Magic number "CSPK"
    pub magic: [u8; 4],
    /// Schema version (current: 1)
    pub version: u32,
    /// Payload compression
    pub compression: Compression,
    /// Stored payload length in bytes
    pub payload_len: u64,
    /// CRC32 of the stored payload
    pub checksum: u32,
}

impl ArchiveHeader {
    /// Header for a stored payload
    pub fn for_payload(payload: &[u8], compression: Compression) -> Self {
        Self {
            magic: magic::CSPK,
            version: CSPK_VERSION,
            compression,
            payload_len: payload.len() as u64,
            checksum: calculate_checksum(payload),
        }
    }

    /// Serialize to the fixed layout
    pub fn to_bytes(&self) -> [u8; CSPK_HEADER_LEN] {
        let mut out = [0u8; CSPK_HEADER_LEN];
        out[0..4].copy_from_slice(&self.magic);
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out[8] = self.compression.code();
        out[12..20].copy_from_slice(&self.payload_len.to_le_bytes());
        out[20..24].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }

    /// Parse and validate a header
    pub fn parse(data: &[u8]) -> Result<Self> {
        validate_magic(data, magic::CSPK)?;
        let mut reader = Reader::new(data);
        let magic = reader.array::<4>()?;
        let version = reader.u32()?;
        if version != CSPK_VERSION {
            return Err(StorageError::UnsupportedVersion {
                version,
                supported: CSPK_VERSION,
            });
        }
        let compression = Compression::from_code(reader.u8()?)?;
        reader.take(3)?;
        let payload_len = reader.u64()?;
        let checksum = reader.u32()?;
        Ok(Self {
            magic,
            version,
            compression,
            payload_len,
            checksum,
        })
    }
}

/// Spike rasters of one run: the time axis plus, per cluster, the step
/// indices at which any of its units fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeArchive {
    /// Simulation time of step 0 (s)
    pub start_time: f64,
    /// Step size (s)
    pub dt: f64,
    /// Simulation time of every executed step
    pub time_axis: Vec<f64>,
    /// Firing step indices per cluster, increasing
    pub firing: BTreeMap<String, Vec<u64>>,
    /// Units per cluster
    pub sizes: BTreeMap<String, usize>,
}

impl SpikeArchive {
    /// Number of steps covered
    pub fn num_steps(&self) -> usize {
        self.time_axis.len()
    }

    /// Firing step indices of one cluster
    pub fn firing_for(&self, cluster: &str) -> Option<&[u64]> {
        self.firing.get(cluster).map(Vec::as_slice)
    }

    /// Firing times of one cluster (s)
    pub fn firing_times(&self, cluster: &str) -> Option<Vec<f64>> {
        self.firing_for(cluster).map(|indices| {
            indices
                .iter()
                .map(|&i| self.start_time + i as f64 * self.dt)
                .collect()
        })
    }

    /// Check that every raster is increasing and inside the time axis
    pub fn validate(&self) -> Result<()> {
        let steps = self.time_axis.len() as u64;
        for (name, indices) in &self.firing {
            if indices.windows(2).any(|w| w[0] >= w[1]) {
                return Err(StorageError::invalid_format(format!(
                    "firing indices of {} are not increasing",
                    name
                )));
            }
            if let Some(&last) = indices.last() {
                if last >= steps {
                    return Err(StorageError::invalid_format(format!(
                        "firing index {} of {} is outside the {}-step time axis",
                        last, name, steps
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Encode an archive into header plus payload
pub fn encode(archive: &SpikeArchive, compression: Compression) -> Result<Vec<u8>> {
    let raw = bincode::serialize(archive)?;
    let raw_len = raw.len();
    let payload = compression.compress(raw)?;
    let header = ArchiveHeader::for_payload(&payload, compression);
    log::debug!(
        "Encoded spike archive: {} clusters, {} payload bytes ({} raw, {:?})",
        archive.firing.len(),
        payload.len(),
        raw_len,
        compression
    );

    let mut out = Vec::with_capacity(CSPK_HEADER_LEN + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode and verify an archive
pub fn decode(data: &[u8]) -> Result<SpikeArchive> {
    let header = ArchiveHeader::parse(data)?;
    let mut reader = Reader::new(data);
    reader.take(CSPK_HEADER_LEN)?;
    let len = usize::try_from(header.payload_len)
        .map_err(|_| StorageError::invalid_format("payload length does not fit in memory"))?;
    let payload = reader.take(len)?;
    if !reader.rest().is_empty() {
        return Err(StorageError::invalid_format(format!(
            "{} trailing bytes after payload",
            reader.rest().len()
        )));
    }
    validate_checksum(payload, header.checksum)?;

    let raw = header.compression.decompress(payload)?;
    let archive: SpikeArchive = bincode::deserialize(&raw)?;
    archive.validate()?;
    Ok(archive)
}
