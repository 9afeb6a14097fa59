//! Tabular output for analysis rows.
//!
//! Rows are any `Serialize` struct with flat fields. The format follows the
//! output path: `.json` writes a pretty JSON array, anything else writes CSV
//! with a header row.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

/// Serializes `rows` into `writer`.
pub fn write_rows_to<W: Write, T: Serialize>(
    writer: W,
    rows: &[T],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(true)
                .from_writer(writer);
            for row in rows {
                wtr.serialize(row).context("Failed to serialize CSV row")?;
            }
            wtr.flush().context("Failed to flush CSV writer")?;
        }
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, rows)
                .context("Failed to serialize JSON rows")?;
            writeln!(writer).context("Failed to write JSON output")?;
        }
    }
    Ok(())
}

/// Writes `rows` to `path`, replacing any existing file.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    let format = OutputFormat::from_path(path);
    let temp_path = path.with_extension("tmp");
    let file = fs::File::create(&temp_path)
        .with_context(|| format!("Failed to create {:?}", temp_path))?;
    write_rows_to(file, rows, format)?;
    fs::rename(&temp_path, path).with_context(|| format!("Failed to write {:?}", path))?;

    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

/// Writes `rows` to `path`, or CSV to stdout when no path is given.
pub fn emit<T: Serialize>(path: Option<&Path>, rows: &[T]) -> Result<()> {
    match path {
        Some(path) => write_rows(path, rows),
        None => write_rows_to(std::io::stdout().lock(), rows, OutputFormat::Csv),
    }
}
