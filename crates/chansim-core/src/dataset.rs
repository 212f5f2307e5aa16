//! Dataset ingestion: token-count TSVs into candidate request pools.
//!
//! The expected format is one header row followed by one row per request with
//! tab-separated input and output token counts. Rows with zero output tokens
//! are excluded, since a request that generates nothing never enters a batch.

use crate::request::Request;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed dataset row at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("Dataset contains no usable rows")]
    Empty,
}

/// What a dataset load kept and dropped.
#[derive(Debug, Clone, Copy)]
pub struct DatasetStats {
    pub rows_kept: usize,
    pub rows_excluded: usize,
    pub mean_input_tokens: f64,
    pub mean_output_tokens: f64,
}

/// Load a candidate pool from a token-count TSV on disk.
pub fn load_dataset(path: &Path) -> Result<(Vec<Request>, DatasetStats), DatasetError> {
    let file = std::fs::File::open(path)?;
    parse_dataset(BufReader::new(file))
}

/// Parse a token-count TSV from any reader.
pub fn parse_dataset<R: Read>(
    reader: BufReader<R>,
) -> Result<(Vec<Request>, DatasetStats), DatasetError> {
    let mut candidates = Vec::new();
    let mut rows_excluded = 0usize;
    let mut input_total = 0u64;
    let mut output_total = 0u64;
    let mut header_seen = false;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        let mut fields = trimmed.split('\t');
        let input_tokens = parse_tokens(fields.next(), line_no, "input tokens")?;
        let output_tokens = parse_tokens(fields.next(), line_no, "output tokens")?;
        if output_tokens == 0 {
            rows_excluded += 1;
            continue;
        }
        input_total += input_tokens as u64;
        output_total += output_tokens as u64;
        candidates.push(Request::new(input_tokens, output_tokens));
    }

    if candidates.is_empty() {
        return Err(DatasetError::Empty);
    }
    let rows_kept = candidates.len();
    Ok((
        candidates,
        DatasetStats {
            rows_kept,
            rows_excluded,
            mean_input_tokens: input_total as f64 / rows_kept as f64,
            mean_output_tokens: output_total as f64 / rows_kept as f64,
        },
    ))
}

fn parse_tokens(field: Option<&str>, line: usize, what: &str) -> Result<u32, DatasetError> {
    let field = field.ok_or_else(|| DatasetError::Malformed {
        line,
        reason: format!("missing {} column", what),
    })?;
    field.trim().parse().map_err(|_| DatasetError::Malformed {
        line,
        reason: format!("{} is not a number: {:?}", what, field),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Result<(Vec<Request>, DatasetStats), DatasetError> {
        parse_dataset(BufReader::new(data.as_bytes()))
    }

    #[test]
    fn test_parse_skips_header() {
        let (candidates, stats) = parse("input\toutput\n10\t5\n20\t8\n").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].input_tokens(), 10);
        assert_eq!(candidates[0].output_tokens(), 5);
        assert_eq!(stats.rows_kept, 2);
        assert_eq!(stats.rows_excluded, 0);
    }

    #[test]
    fn test_zero_output_rows_excluded() {
        let (candidates, stats) = parse("input\toutput\n10\t5\n99\t0\n20\t8\n7\t0\n").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(stats.rows_kept, 2);
        assert_eq!(stats.rows_excluded, 2);
    }

    #[test]
    fn test_means() {
        let (_, stats) = parse("input\toutput\n10\t4\n30\t8\n").unwrap();
        assert_eq!(stats.mean_input_tokens, 20.0);
        assert_eq!(stats.mean_output_tokens, 6.0);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let (candidates, _) = parse("input\toutput\n\n10\t5\n\n\n20\t8\n").unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_crlf_tolerated() {
        let (candidates, _) = parse("input\toutput\r\n10\t5\r\n20\t8\r\n").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].input_tokens(), 20);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        match parse("input\toutput\n10\t5\nbogus\t3\n") {
            Err(DatasetError::Malformed { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("input tokens"));
            }
            other => panic!("Expected Malformed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_column_reports_line() {
        match parse("input\toutput\n10\n") {
            Err(DatasetError::Malformed { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("output tokens"));
            }
            other => panic!("Expected Malformed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(matches!(parse("input\toutput\n"), Err(DatasetError::Empty)));
        assert!(matches!(
            parse("input\toutput\n10\t0\n"),
            Err(DatasetError::Empty)
        ));
        assert!(matches!(parse(""), Err(DatasetError::Empty)));
    }
}
