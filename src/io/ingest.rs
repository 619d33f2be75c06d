//! CSV ingest for regression datasets.
//!
//! Turns a numeric CSV into `(X, y)`:
//! - **Header required**; the target column is chosen by name (default: last)
//! - every other column is a feature, in file order
//! - **Row-level validation**: unparsable or non-finite rows are skipped and
//!   reported with their line number
//! - no fitting logic here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use nalgebra::{DMatrix, DVector};

use crate::error::TheilSenError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: design matrix, target and what was skipped.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl Dataset {
    pub fn rows_used(&self) -> usize {
        self.y.len()
    }
}

/// Load a dataset from a CSV file.
pub fn load_dataset(path: &Path, target: Option<&str>) -> Result<Dataset, TheilSenError> {
    let file = File::open(path)
        .map_err(|e| TheilSenError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_dataset(file, target)
}

/// Load a feature-only matrix (e.g. for prediction) with the expected columns.
pub fn load_features(path: &Path, feature_names: &[String]) -> Result<(DMatrix<f64>, Vec<RowError>), TheilSenError> {
    let file = File::open(path)
        .map_err(|e| TheilSenError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let mut reader = csv_reader(file);
    let headers = read_headers(&mut reader)?;

    let mut columns = Vec::with_capacity(feature_names.len());
    for name in feature_names {
        let idx = find_column(&headers, name)
            .ok_or_else(|| TheilSenError::io(format!("Missing feature column '{name}'.")))?;
        columns.push(idx);
    }

    let mut values = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        match result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_fields(&record, &headers, &columns))
        {
            Ok(row) => {
                values.extend(row);
                rows += 1;
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows == 0 {
        return Err(TheilSenError::io("No usable rows in CSV."));
    }
    Ok((
        DMatrix::from_row_slice(rows, feature_names.len(), &values),
        row_errors,
    ))
}

/// Parse a dataset from any reader (used by `load_dataset` and tests).
pub fn read_dataset<R: Read>(source: R, target: Option<&str>) -> Result<Dataset, TheilSenError> {
    let mut reader = csv_reader(source);
    let headers = read_headers(&mut reader)?;
    if headers.len() < 2 {
        return Err(TheilSenError::io(
            "CSV needs at least one feature column and one target column.",
        ));
    }

    let target_idx = match target {
        Some(name) => find_column(&headers, name)
            .ok_or_else(|| TheilSenError::io(format!("Target column '{name}' not found.")))?,
        None => headers.len() - 1,
    };
    let feature_idx: Vec<usize> = (0..headers.len()).filter(|&i| i != target_idx).collect();

    let mut values = Vec::new();
    let mut targets = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = parse_fields(&record, &headers, &feature_idx)
            .and_then(|row| parse_fields(&record, &headers, &[target_idx]).map(|t| (row, t[0])));
        match parsed {
            Ok((row, t)) => {
                values.extend(row);
                targets.push(t);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if targets.is_empty() {
        return Err(TheilSenError::io(format!(
            "No usable rows in CSV ({rows_read} read, {} rejected).",
            row_errors.len()
        )));
    }

    Ok(Dataset {
        x: DMatrix::from_row_slice(targets.len(), feature_idx.len(), &values),
        y: DVector::from_vec(targets),
        feature_names: feature_idx.iter().map(|&i| headers[i].to_string()).collect(),
        target_name: headers[target_idx].to_string(),
        row_errors,
        rows_read,
    })
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<StringRecord, TheilSenError> {
    Ok(reader
        .headers()
        .map_err(|e| TheilSenError::io(format!("Failed to read CSV headers: {e}")))?
        .clone())
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
}

fn parse_fields(record: &StringRecord, headers: &StringRecord, columns: &[usize]) -> Result<Vec<f64>, String> {
    columns
        .iter()
        .map(|&i| {
            let name = headers.get(i).unwrap_or("?");
            let raw = record
                .get(i)
                .ok_or_else(|| format!("missing value for '{name}'"))?;
            let v: f64 = raw
                .parse()
                .map_err(|_| format!("invalid number '{raw}' for '{name}'"))?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(format!("non-finite value for '{name}'"))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_column_is_the_default_target() {
        let csv = "a,b,y\n1,2,3\n4,5,6\n";
        let data = read_dataset(csv.as_bytes(), None).unwrap();
        assert_eq!(data.feature_names, vec!["a", "b"]);
        assert_eq!(data.target_name, "y");
        assert_eq!(data.x, DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 4.0, 5.0]));
        assert_eq!(data.y, DVector::from_row_slice(&[3.0, 6.0]));
    }

    #[test]
    fn named_target_can_sit_anywhere() {
        let csv = "y,x\n10,1\n20,2\n";
        let data = read_dataset(csv.as_bytes(), Some("Y")).unwrap();
        assert_eq!(data.feature_names, vec!["x"]);
        assert_eq!(data.y, DVector::from_row_slice(&[10.0, 20.0]));
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "x,y\n1,2\noops,3\n4,inf\n5\n6,7\n";
        let data = read_dataset(csv.as_bytes(), None).unwrap();
        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used(), 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn missing_target_column_is_an_error() {
        let csv = "x,y\n1,2\n";
        assert!(read_dataset(csv.as_bytes(), Some("z")).is_err());
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let csv = "x,y\nfoo,bar\n";
        assert!(read_dataset(csv.as_bytes(), None).is_err());
    }
}
