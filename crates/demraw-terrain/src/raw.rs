//! Headerless 16-bit RAW heightmap writer and reader.
//!
//! Layout: `width * height` unsigned 16-bit values, little-endian,
//! row-major from the top row down. Width, height and the elevation range
//! are not stored and must be known to read the file back.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use demraw_core::constants::HEIGHTMAP_SAMPLE_BYTES;
use demraw_core::types::ElevationRange;

use crate::quantize::HeightmapBuffer;

/// Errors raised while writing or reading RAW files.
#[derive(Error, Debug)]
pub enum RawError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Could not move output into place at {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("RAW size mismatch: expected {expected} bytes for {width}x{height}, found {actual}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: u64,
        actual: u64,
    },
}

/// Expected file size in bytes for a `width × height` RAW file.
pub fn expected_file_size(width: usize, height: usize) -> u64 {
    (width as u64) * (height as u64) * HEIGHTMAP_SAMPLE_BYTES as u64
}

/// Write `buffer` to `path`.
///
/// Data goes to a temporary file in the destination directory and is
/// renamed into place only after a successful flush, so a failure never
/// leaves a partial file at `path`. The temporary file is removed on every
/// error path when it is dropped. It is created with the mode a plain
/// `File::create` would use, umask applied, rather than tempfile's 0600.
pub fn write_raw(buffer: &HeightmapBuffer, path: &Path) -> Result<(), RawError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".demraw-").suffix(".raw.tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let tmp = builder.tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        for v in buffer.values() {
            writer.write_all(&v.to_le_bytes())?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RawError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;
    log::debug!(
        "wrote {} bytes to {}",
        expected_file_size(buffer.width(), buffer.height()),
        path.display()
    );
    Ok(())
}

/// Read a RAW file of known dimensions.
pub fn read_raw(path: &Path, width: usize, height: usize) -> Result<Vec<u16>, RawError> {
    let data = std::fs::read(path)?;
    parse_raw(&data, width, height)
}

/// Parse a RAW byte buffer of known dimensions.
pub fn parse_raw(data: &[u8], width: usize, height: usize) -> Result<Vec<u16>, RawError> {
    let expected = expected_file_size(width, height);
    if data.len() as u64 != expected {
        return Err(RawError::SizeMismatch {
            width,
            height,
            expected,
            actual: data.len() as u64,
        });
    }
    Ok(data
        .chunks_exact(HEIGHTMAP_SAMPLE_BYTES)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Reconstruct elevations: `min + value / 65535 * (max - min)`.
pub fn decode_elevations(values: &[u16], range: &ElevationRange) -> Vec<f64> {
    values.iter().map(|&v| range.decode(v)).collect()
}

/// Summary of a decoded RAW file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawStats {
    pub width: usize,
    pub height: usize,
    pub raw_min: u16,
    pub raw_max: u16,
    pub elevation_min: f64,
    pub elevation_max: f64,
    pub elevation_mean: f64,
}

impl RawStats {
    /// Returns `None` for an empty value list.
    pub fn compute(
        values: &[u16],
        width: usize,
        height: usize,
        range: &ElevationRange,
    ) -> Option<Self> {
        let raw_min = *values.iter().min()?;
        let raw_max = *values.iter().max()?;
        let sum: f64 = values.iter().map(|&v| range.decode(v)).sum();
        Some(Self {
            width,
            height,
            raw_min,
            raw_max,
            elevation_min: range.decode(raw_min),
            elevation_max: range.decode(raw_max),
            elevation_mean: sum / values.len() as f64,
        })
    }
}
