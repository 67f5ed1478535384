use crate::comparator::ComparisonResult;
use crate::line_source::{LineRead, TextSource};
use crate::report;
use crate::rewriter::persist_over;
use lcompare_common::{Discrepancy, LCompareError, Result, Side};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// CSV-aware reader layered over [`TextSource`] by composition: the first
/// row is the header, record reads parse data rows into fields.
///
/// The open state is the presence of a parsed header; `restart` repositions
/// to the first data row, not the header.
pub struct CsvSource {
    inner: TextSource,
    header: Option<Vec<String>>,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: TextSource::new(path),
            header: None,
        }
    }

    pub fn open(&mut self) -> Result<()> {
        if self.header.is_some() {
            return Ok(());
        }
        self.inner.open()?;
        self.inner.restart()?;
        let line = self.inner.read_line()?.ok_or_else(|| {
            LCompareError::Csv(format!(
                "{}: missing header row",
                self.inner.path().display()
            ))
        })?;
        self.header = Some(parse_record(&line)?);
        info!("opened CSV {}", self.inner.path().display());
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.header = None;
        self.inner.close()
    }

    pub fn is_open(&self) -> bool {
        self.header.is_some()
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Header titles, available while open.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    fn require_header(&self) -> Result<&[String]> {
        self.header
            .as_deref()
            .ok_or_else(|| LCompareError::NotOpened(self.inner.path().display().to_string()))
    }

    /// Next data row parsed into fields; `trim` strips surrounding
    /// whitespace from each field.
    pub fn read_record(&mut self, trim: bool) -> Result<Option<Vec<String>>> {
        self.require_header()?;
        let line = match self.inner.read_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let mut fields = parse_record(&line)?;
        if trim {
            fields = fields.into_iter().map(|f| f.trim().to_string()).collect();
        }
        Ok(Some(fields))
    }

    /// Repositions to the first data row, just past the header.
    pub fn restart(&mut self) -> Result<()> {
        self.require_header()?;
        self.inner.restart()?;
        self.inner.read_line()?;
        Ok(())
    }

    pub fn finished_reading(&mut self) -> Result<bool> {
        self.require_header()?;
        self.inner.finished_reading()
    }

    /// Appends a data row in the given field order. Rows shorter than the
    /// header are padded with empty fields; longer rows are rejected.
    pub fn add_row(&mut self, mut values: Vec<String>) -> Result<()> {
        let header = self.require_header()?;
        if values.len() > header.len() {
            return Err(LCompareError::InvalidRowLength(format!(
                "row has {} fields but the header has {}",
                values.len(),
                header.len()
            )));
        }
        values.resize(header.len(), String::new());

        let mut content = std::fs::read_to_string(self.path())?;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&serialize_record(&values)?);
        content.push('\n');

        self.replace_contents(&content)?;
        info!("row added to {}", self.path().display());
        Ok(())
    }

    /// Appends a row with values arranged by the header titles they map to.
    /// Unknown titles are rejected; missing ones become empty fields.
    pub fn add_row_map(&mut self, values: HashMap<String, String>) -> Result<()> {
        let header = self.require_header()?;
        if let Some(unknown) = values.keys().find(|key| !header.contains(key)) {
            return Err(LCompareError::InvalidHeaderTitle(format!(
                "{unknown:?} is not a header title"
            )));
        }
        let row = header
            .iter()
            .map(|title| values.get(title).cloned().unwrap_or_default())
            .collect();
        self.add_row(row)
    }

    /// Appends a column. Rows past the end of `values` get an empty field;
    /// more values than data rows is an error.
    pub fn add_column(&mut self, title: &str, values: &[String]) -> Result<()> {
        let header = self.require_header()?;
        if header.iter().any(|t| t == title) {
            return Err(LCompareError::InvalidHeaderTitle(format!(
                "column title {title:?} already exists in header"
            )));
        }

        let content = std::fs::read_to_string(self.path())?;
        let lines: Vec<&str> = content.lines().collect();
        let data_rows = lines.len().saturating_sub(1);
        if values.len() > data_rows {
            return Err(LCompareError::InvalidColumnLength(format!(
                "{} values for {} data rows",
                values.len(),
                data_rows
            )));
        }

        let mut out = String::new();
        for (i, line) in lines.iter().enumerate() {
            let mut fields = parse_record(line)?;
            if i == 0 {
                fields.push(title.to_string());
            } else {
                fields.push(values.get(i - 1).cloned().unwrap_or_default());
            }
            out.push_str(&serialize_record(&fields)?);
            out.push('\n');
        }

        self.replace_contents(&out)?;
        info!("column added to {}", self.path().display());
        Ok(())
    }

    /// Temp-file-then-swap write; the source is reopened afterwards so the
    /// header reflects the new content.
    fn replace_contents(&mut self, content: &str) -> Result<()> {
        let dir = self
            .path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.flush()?;

        let path = self.path().to_path_buf();
        self.close()?;
        persist_over(temp, &path)?;
        self.open()
    }
}

/// Record-wise comparison of two CSV sources with per-field trimming,
/// discrepancies keyed by data-row number. Header rows are compared via the
/// parsed headers, not as raw text.
pub fn compare_records(
    left: &mut CsvSource,
    right: &mut CsvSource,
    case_insensitive: bool,
) -> Result<ComparisonResult> {
    left.open()?;
    right.open()?;
    left.restart()?;
    right.restart()?;

    info!(
        left = %left.path().display(),
        right = %right.path().display(),
        case_insensitive,
        "comparing CSV records"
    );

    let mut discrepancies = Vec::new();

    let left_header = normalize_fields(left.header().unwrap_or(&[]), case_insensitive);
    let right_header = normalize_fields(right.header().unwrap_or(&[]), case_insensitive);
    if left_header != right_header {
        let a = left_header.join(",");
        let b = right_header.join(",");
        let first_diff_offset = report::first_diff_offset(&a, &b);
        discrepancies.push(Discrepancy::LineMismatch {
            line_number: 0,
            left: a,
            right: b,
            first_diff_offset,
        });
    }

    let mut row_number = 1usize;
    let mut left_total = 0usize;
    let mut right_total = 0usize;
    let mut right_exhausted = false;

    while let Some(fields_a) = left.read_record(true)? {
        left_total += 1;
        let fields_b = match right.read_record(true)? {
            Some(fields) => fields,
            None => {
                right_exhausted = true;
                break;
            }
        };
        right_total += 1;

        let a = normalize_fields(&fields_a, case_insensitive);
        let b = normalize_fields(&fields_b, case_insensitive);
        if a != b {
            let line_a = a.join(",");
            let line_b = b.join(",");
            let first_diff_offset = report::first_diff_offset(&line_a, &line_b);
            discrepancies.push(Discrepancy::LineMismatch {
                line_number: row_number,
                left: line_a,
                right: line_b,
                first_diff_offset,
            });
        }
        row_number += 1;
    }

    if right_exhausted {
        while left.read_record(false)?.is_some() {
            left_total += 1;
        }
        discrepancies.push(Discrepancy::LengthMismatch {
            shorter: Side::Right,
            shorter_lines: right_total,
            longer_lines: left_total,
        });
    } else if !right.finished_reading()? {
        while right.read_record(false)?.is_some() {
            right_total += 1;
        }
        discrepancies.push(Discrepancy::LengthMismatch {
            shorter: Side::Left,
            shorter_lines: left_total,
            longer_lines: right_total,
        });
    }

    left.restart()?;
    right.restart()?;

    let equal = discrepancies.is_empty();
    info!(equal, discrepancies = discrepancies.len(), "CSV comparison finished");

    Ok(ComparisonResult {
        equal,
        discrepancies,
        left_lines: left_total,
        right_lines: right_total,
    })
}

fn normalize_fields(fields: &[String], case_insensitive: bool) -> Vec<String> {
    fields
        .iter()
        .map(|field| {
            let field = field.trim();
            if case_insensitive {
                field.to_uppercase()
            } else {
                field.to_string()
            }
        })
        .collect()
}

/// Parses one CSV line into fields, honoring quoting.
fn parse_record(line: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(record) => {
            let record = record.map_err(|e| LCompareError::Csv(e.to_string()))?;
            Ok(record.iter().map(|field| field.to_string()).collect())
        }
        // A blank line parses as a single empty field.
        None => Ok(vec![String::new()]),
    }
}

/// Serializes fields back into one CSV line, quoting where needed.
fn serialize_record(fields: &[String]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(fields)
        .map_err(|e| LCompareError::Csv(e.to_string()))?;
    writer
        .flush()
        .map_err(|e| LCompareError::Csv(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| LCompareError::Csv(e.to_string()))?;
    let line = String::from_utf8(bytes).map_err(|e| LCompareError::Csv(e.to_string()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
