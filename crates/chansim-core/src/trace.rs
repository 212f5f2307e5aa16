//! Snapshot export and import.
//!
//! A snapshot is the per-request state of the batch at one instant, written
//! as a two-column CSV (`seq_len,ch_idx`). Filenames encode the run
//! parameters so a directory of snapshots is self-describing.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to access snapshot file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed snapshot row at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("Snapshot file is missing the seq_len,ch_idx header")]
    MissingHeader,
}

/// Column header every snapshot file starts with.
pub const SNAPSHOT_HEADER: &str = "seq_len,ch_idx";

/// One request in an exported snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub seq_len: u32,
    pub ch_idx: u32,
}

/// The batch state at one simulation instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub rows: Vec<SnapshotRow>,
}

/// Standard snapshot filename for a run.
pub fn snapshot_filename(
    dataset: &str,
    batch_size: u32,
    model_size: u32,
    tensor_parallel: u32,
    pipeline_parallel: u32,
    algorithm: &str,
    index: u32,
) -> String {
    format!(
        "{}-bs{}-ms{}B-tp{}-pp{}-{}-{}.csv",
        dataset, batch_size, model_size, tensor_parallel, pipeline_parallel, algorithm, index,
    )
}

/// Write a snapshot as CSV.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), TraceError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", SNAPSHOT_HEADER)?;
    for row in &snapshot.rows {
        writeln!(writer, "{},{}", row.seq_len, row.ch_idx)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a snapshot CSV back into rows.
pub fn read_snapshot(path: &Path) -> Result<Vec<SnapshotRow>, TraceError> {
    let file = std::fs::File::open(path)?;
    parse_snapshot(BufReader::new(file))
}

/// Parse snapshot CSV from any reader.
pub fn parse_snapshot<R: Read>(reader: BufReader<R>) -> Result<Vec<SnapshotRow>, TraceError> {
    let mut rows = Vec::new();
    let mut header_seen = false;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !header_seen {
            let normalized: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            if normalized != ["seq_len", "ch_idx"] {
                return Err(TraceError::MissingHeader);
            }
            header_seen = true;
            continue;
        }

        let mut fields = trimmed.split(',');
        let seq_len = parse_field(fields.next(), line_no, "seq_len")?;
        let ch_idx = parse_field(fields.next(), line_no, "ch_idx")?;
        rows.push(SnapshotRow { seq_len, ch_idx });
    }

    if !header_seen {
        return Err(TraceError::MissingHeader);
    }
    Ok(rows)
}

fn parse_field(field: Option<&str>, line: usize, what: &str) -> Result<u32, TraceError> {
    let field = field.ok_or_else(|| TraceError::Malformed {
        line,
        reason: format!("missing {} column", what),
    })?;
    field.trim().parse().map_err(|_| TraceError::Malformed {
        line,
        reason: format!("{} is not a number: {:?}", what, field),
    })
}
