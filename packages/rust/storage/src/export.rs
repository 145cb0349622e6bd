//! Output-path defaulting, table splitting, and generic row export.

use std::path::{Path, PathBuf};

use partnerscout_shared::{Result, ScoutError};
use serde::Serialize;
use tracing::info;

use crate::persistence;

/// `<dir>/<base>_updated<ext>` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_updated.{}", ext.to_string_lossy()),
        None => format!("{stem}_updated"),
    };
    input.with_file_name(name)
}

/// Split `input` into `<prefix>_01.csv`, `<prefix>_02.csv`, ... with at most
/// `max_rows` data rows each. Every chunk repeats the header row.
///
/// Rows are copied verbatim; no column is interpreted.
pub fn split_table(input: &Path, prefix: &Path, max_rows: usize) -> Result<Vec<PathBuf>> {
    if max_rows == 0 {
        return Err(ScoutError::validation("max_rows must be at least 1"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(input)
        .map_err(|e| persistence(input, e))?;
    let header = reader.headers().map_err(|e| persistence(input, e))?.clone();
    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| persistence(input, e))?;

    let mut written = Vec::new();
    for (i, chunk) in rows.chunks(max_rows).enumerate() {
        let path = PathBuf::from(format!("{}_{:02}.csv", prefix.display(), i + 1));
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| persistence(&path, e))?;
        writer
            .write_record(&header)
            .map_err(|e| persistence(&path, e))?;
        for row in chunk {
            writer.write_record(row).map_err(|e| persistence(&path, e))?;
        }
        writer.flush().map_err(|e| ScoutError::io(&path, e))?;

        info!(path = %path.display(), rows = chunk.len(), "chunk written");
        written.push(path);
    }
    Ok(written)
}

/// Write serde rows to `path` with a header derived from the first row.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScoutError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| persistence(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| persistence(path, e))?;
    }
    writer.flush().map_err(|e| ScoutError::io(path, e))?;
    Ok(())
}

/// Write a plain grid of string cells under `headers`.
pub fn write_grid(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScoutError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| persistence(path, e))?;
    writer
        .write_record(headers)
        .map_err(|e| persistence(path, e))?;
    for row in rows {
        writer.write_record(row).map_err(|e| persistence(path, e))?;
    }
    writer.flush().map_err(|e| ScoutError::io(path, e))?;
    Ok(())
}
