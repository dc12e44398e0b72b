use compass_storage::{read_archive, write_archive, Compression, SpikeArchive, StorageError};
use std::collections::BTreeMap;

fn heading_archive() -> SpikeArchive {
    let mut firing = BTreeMap::new();
    let mut sizes = BTreeMap::new();
    for (i, name) in ["EIP0", "PEI0", "PEN0", "REIP"].iter().enumerate() {
        firing.insert(name.to_string(), (0..50).map(|k| k * 37 + i as u64).collect());
        sizes.insert(name.to_string(), 10);
    }
    SpikeArchive {
        start_time: 0.0,
        dt: 1e-4,
        time_axis: (0..2000).map(|i| i as f64 * 1e-4).collect(),
        firing,
        sizes,
    }
}

#[test]
fn test_file_roundtrip_uncompressed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.cspk");
    let archive = heading_archive();
    write_archive(&path, &archive, Compression::None).unwrap();
    assert_eq!(read_archive(&path).unwrap(), archive);
}

#[cfg(feature = "compression")]
#[test]
fn test_file_roundtrip_lz4_is_smaller() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("plain.cspk");
    let packed = dir.path().join("packed.cspk");
    let archive = heading_archive();
    write_archive(&plain, &archive, Compression::None).unwrap();
    write_archive(&packed, &archive, Compression::Lz4).unwrap();

    assert_eq!(read_archive(&packed).unwrap(), archive);
    let plain_len = std::fs::metadata(&plain).unwrap().len();
    let packed_len = std::fs::metadata(&packed).unwrap().len();
    assert!(packed_len < plain_len);
}

#[test]
fn test_corrupted_file_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.cspk");
    write_archive(&path, &heading_archive(), Compression::None).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0x01;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(read_archive(&path), Err(StorageError::ChecksumMismatch { .. })));
}
