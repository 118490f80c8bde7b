//! Binary persistence for the dictionary index and per-word models
//!
//! Two little-endian formats live under the configured model directory:
//!
//! * `index.dat` — magic `NWIX`, format version, entry count, then one
//!   `(ordinal, name_len, name bytes)` record per word.
//! * `<word>.dat` — magic `NWMD`, format version, explicit-entry count,
//!   nominal vector length, acceptance threshold, then one
//!   `(index, value)` record per explicit weight.
//!
//! Structural problems (bad magic, unsupported version, truncation,
//! out-of-range indices) surface as `CorruptFile` errors naming the path.

use crate::errors::{NextwordError, Result};
use crate::vector::SparseVector;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const INDEX_MAGIC: &[u8; 4] = b"NWIX";
const MODEL_MAGIC: &[u8; 4] = b"NWMD";
const FORMAT_VERSION: u32 = 1;

/// File name of the vocabulary index inside the model directory
pub const INDEX_FILE: &str = "index.dat";

/// Path of the vocabulary index under `dir`
pub fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

/// Path of a word's model file under `dir`
pub fn model_path(dir: &Path, word: &str) -> PathBuf {
    dir.join(format!("{word}.dat"))
}

/// Whether a fitted model file exists for `word`
pub fn model_exists(dir: &Path, word: &str) -> bool {
    model_path(dir, word).is_file()
}

fn read_exact(r: &mut impl Read, buf: &mut [u8], path: &Path) -> Result<()> {
    r.read_exact(buf)
        .map_err(|_| NextwordError::corrupt_file(path.display().to_string(), "truncated file"))
}

fn read_u32(r: &mut impl Read, path: &Path) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf, path)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32(r: &mut impl Read, path: &Path) -> Result<i32> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf, path)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f64(r: &mut impl Read, path: &Path) -> Result<f64> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf, path)?;
    Ok(f64::from_le_bytes(buf))
}

fn check_header(r: &mut impl Read, magic: &[u8; 4], path: &Path) -> Result<()> {
    let mut found = [0u8; 4];
    read_exact(r, &mut found, path)?;
    if &found != magic {
        return Err(NextwordError::corrupt_file(
            path.display().to_string(),
            "bad magic",
        ));
    }
    let version = read_u32(r, path)?;
    if version != FORMAT_VERSION {
        return Err(NextwordError::corrupt_file(
            path.display().to_string(),
            format!("unsupported format version {version}"),
        ));
    }
    Ok(())
}

/// Write the vocabulary index
///
/// `entries` supplies `(word, ordinal)` pairs; order is preserved on disk but
/// not significant, since each record carries its own ordinal.
pub fn write_index<'a>(
    dir: &Path,
    entries: impl ExactSizeIterator<Item = (&'a str, u32)>,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = index_path(dir);
    let mut w = BufWriter::new(File::create(&path)?);

    w.write_all(INDEX_MAGIC)?;
    w.write_all(&FORMAT_VERSION.to_le_bytes())?;
    w.write_all(&(entries.len() as i32).to_le_bytes())?;
    for (word, ordinal) in entries {
        w.write_all(&(ordinal as i32).to_le_bytes())?;
        w.write_all(&(word.len() as i32).to_le_bytes())?;
        w.write_all(word.as_bytes())?;
    }
    w.flush()?;
    Ok(())
}

/// Read the vocabulary index back as `(word, ordinal)` pairs
pub fn read_index(dir: &Path) -> Result<Vec<(String, u32)>> {
    let path = index_path(dir);
    let mut r = BufReader::new(File::open(&path)?);
    check_header(&mut r, INDEX_MAGIC, &path)?;

    let count = read_i32(&mut r, &path)?;
    if count < 0 {
        return Err(NextwordError::corrupt_file(
            path.display().to_string(),
            "negative entry count",
        ));
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let ordinal = read_i32(&mut r, &path)?;
        let name_len = read_i32(&mut r, &path)?;
        if ordinal < 0 || name_len < 0 {
            return Err(NextwordError::corrupt_file(
                path.display().to_string(),
                "negative ordinal or name length",
            ));
        }
        let mut name = vec![0u8; name_len as usize];
        read_exact(&mut r, &mut name, &path)?;
        let word = String::from_utf8(name).map_err(|_| {
            NextwordError::corrupt_file(path.display().to_string(), "word is not valid UTF-8")
        })?;
        entries.push((word, ordinal as u32));
    }
    Ok(entries)
}

/// Write one word's fitted weights and threshold
pub fn write_model(dir: &Path, word: &str, weights: &SparseVector, threshold: f64) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = model_path(dir, word);
    let mut w = BufWriter::new(File::create(&path)?);

    w.write_all(MODEL_MAGIC)?;
    w.write_all(&FORMAT_VERSION.to_le_bytes())?;
    w.write_all(&(weights.count_explicit() as i32).to_le_bytes())?;
    w.write_all(&(weights.len() as i32).to_le_bytes())?;
    w.write_all(&threshold.to_le_bytes())?;
    for (i, value) in weights.iter() {
        w.write_all(&(i as i32).to_le_bytes())?;
        w.write_all(&value.to_le_bytes())?;
    }
    w.flush()?;
    Ok(())
}

/// Read one word's fitted weights and threshold
pub fn read_model(dir: &Path, word: &str) -> Result<(SparseVector, f64)> {
    let path = model_path(dir, word);
    let mut r = BufReader::new(File::open(&path)?);
    check_header(&mut r, MODEL_MAGIC, &path)?;

    let explicit = read_i32(&mut r, &path)?;
    let len = read_i32(&mut r, &path)?;
    if explicit < 0 || len < 0 || explicit as i64 > len as i64 {
        return Err(NextwordError::corrupt_file(
            path.display().to_string(),
            "inconsistent entry count or vector length",
        ));
    }
    let threshold = read_f64(&mut r, &path)?;

    let mut weights = SparseVector::new(len as u32);
    for _ in 0..explicit {
        let index = read_i32(&mut r, &path)?;
        let value = read_f64(&mut r, &path)?;
        if index < 0 || index >= len {
            return Err(NextwordError::corrupt_file(
                path.display().to_string(),
                format!("weight index {index} out of range for length {len}"),
            ));
        }
        weights.set(index as u32, value);
    }
    Ok((weights, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_index_roundtrip() {
        let dir = TempDir::new().unwrap();
        let entries = vec![
            ("the".to_string(), 0u32),
            ("quick".to_string(), 1),
            ("fox".to_string(), 3),
        ];
        write_index(dir.path(), entries.iter().map(|(w, o)| (w.as_str(), *o))).unwrap();

        let back = read_index(dir.path()).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn test_model_roundtrip() {
        let dir = TempDir::new().unwrap();
        let weights = SparseVector::from_entries(10, &[(0, 0.5), (7, -1.25)]);
        write_model(dir.path(), "fox", &weights, 0.42).unwrap();

        assert!(model_exists(dir.path(), "fox"));
        assert!(!model_exists(dir.path(), "dog"));

        let (back, threshold) = read_model(dir.path(), "fox").unwrap();
        assert_eq!(back, weights);
        assert_eq!(threshold, 0.42);
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let dir = TempDir::new().unwrap();
        std::fs::write(index_path(dir.path()), b"XXXX\x01\x00\x00\x00").unwrap();
        let err = read_index(dir.path()).unwrap_err();
        assert!(matches!(err, NextwordError::CorruptFile { .. }));
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_truncated_model_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let weights = SparseVector::from_entries(10, &[(0, 0.5), (7, -1.25)]);
        write_model(dir.path(), "fox", &weights, 0.5).unwrap();

        let path = model_path(dir.path(), "fox");
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        let err = read_model(dir.path(), "fox").unwrap_err();
        assert!(matches!(err, NextwordError::CorruptFile { .. }));
    }

    #[test]
    fn test_missing_file_is_io() {
        let dir = TempDir::new().unwrap();
        let err = read_model(dir.path(), "absent").unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_out_of_range_weight_index_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = model_path(dir.path(), "bad");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"NWMD");
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes()); // one entry
        bytes.extend_from_slice(&4i32.to_le_bytes()); // length 4
        bytes.extend_from_slice(&0.5f64.to_le_bytes());
        bytes.extend_from_slice(&9i32.to_le_bytes()); // index 9 >= 4
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        let err = read_model(dir.path(), "bad").unwrap_err();
        assert!(matches!(err, NextwordError::CorruptFile { .. }));
    }
}
