//! File-backed archive persistence

use crate::{
    archive::{decode, encode, Compression, SpikeArchive},
    error::Result,
};
use std::path::Path;

/// Write `archive` to `path`, replacing any existing file
pub fn write_archive<P: AsRef<Path>>(path: P, archive: &SpikeArchive, compression: Compression) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = encode(archive, compression)?;
    std::fs::write(path, &bytes)?;
    log::info!("Wrote spike archive {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read and verify an archive from `path`
pub fn read_archive<P: AsRef<Path>>(path: P) -> Result<SpikeArchive> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let archive = decode(&bytes)?;
    log::debug!("Read spike archive {} ({} clusters)", path.display(), archive.firing.len());
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;

    #[test]
    fn test_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = read_archive(temp_dir.path().join("absent.cspk")).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[test]
    fn test_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("runs/a/out.cspk");
        let archive = SpikeArchive {
            start_time: 0.0,
            dt: 1e-3,
            time_axis: vec![0.0, 1e-3],
            firing: Default::default(),
            sizes: Default::default(),
        };
        write_archive(&path, &archive, Compression::None).unwrap();
        assert!(path.exists());
    }
}
