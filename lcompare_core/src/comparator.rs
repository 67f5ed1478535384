use crate::line_source::LineRead;
use crate::report;
use lcompare_common::{Discrepancy, Result, Side};
use std::path::Path;
use tracing::info;

/// Normalization applied to every compared line pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareOptions {
    /// Delete every whitespace character from both lines before comparing.
    pub ignore_whitespace: bool,
    /// Uppercase both lines before comparing.
    pub case_insensitive: bool,
}

/// 1-based line/column window restricting which content is compared.
///
/// Lines outside `[start_line, end_line]` are consumed to keep both readers
/// in lockstep but are never compared. Column clipping follows selection
/// semantics: the first window line drops columns before `start_col`, the
/// last keeps columns up to but excluding `end_col`, middle lines compare
/// whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

/// Outcome of one comparison run. Produced fresh per call; the discrepancy
/// list is never shared state.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub equal: bool,
    pub discrepancies: Vec<Discrepancy>,
    pub left_lines: usize,
    pub right_lines: usize,
}

/// Lockstep line-by-line comparison of two sources. Strict line-index
/// pairing only; there is no alignment or LCS pass.
pub struct LineComparator {
    options: CompareOptions,
    region: Option<Region>,
}

impl LineComparator {
    pub fn new() -> Self {
        Self {
            options: CompareOptions::default(),
            region: None,
        }
    }

    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Compares `left` against `right` line by line and returns the verdict
    /// with every recorded discrepancy. Both sources are opened if needed
    /// and left restarted, ready for reuse.
    pub fn compare(
        &self,
        left: &mut dyn LineRead,
        right: &mut dyn LineRead,
    ) -> Result<ComparisonResult> {
        left.open()?;
        right.open()?;
        left.restart()?;
        right.restart()?;

        info!(
            left = %left.path().display(),
            right = %right.path().display(),
            ignore_whitespace = self.options.ignore_whitespace,
            case_insensitive = self.options.case_insensitive,
            "comparing files"
        );

        let mut discrepancies = Vec::new();
        let mut line_number = 1usize;
        let mut left_total = 0usize;
        let mut right_total = 0usize;
        let mut right_exhausted = false;

        while let Some(line_a) = left.read_line()? {
            left_total += 1;
            let line_b = match right.read_line()? {
                Some(line) => line,
                None => {
                    right_exhausted = true;
                    break;
                }
            };
            right_total += 1;

            if self.in_window(line_number) {
                let a = self.normalize(&line_a, line_number);
                let b = self.normalize(&line_b, line_number);
                if a != b {
                    let first_diff_offset = report::first_diff_offset(&a, &b);
                    discrepancies.push(Discrepancy::LineMismatch {
                        line_number,
                        left: a,
                        right: b,
                        first_diff_offset,
                    });
                }
            }
            line_number += 1;
        }

        if right_exhausted {
            // Drain the rest of the left file so the log can report its length.
            while left.read_line()?.is_some() {
                left_total += 1;
            }
            discrepancies.push(Discrepancy::LengthMismatch {
                shorter: Side::Right,
                shorter_lines: right_total,
                longer_lines: left_total,
            });
        } else if !right.finished_reading()? {
            while right.read_line()?.is_some() {
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
        info!(equal, discrepancies = discrepancies.len(), "comparison finished");

        Ok(ComparisonResult {
            equal,
            discrepancies,
            left_lines: left_total,
            right_lines: right_total,
        })
    }

    /// Like [`LineComparator::compare`], additionally overwriting
    /// `report_path` with the rendered compare log when any discrepancy was
    /// recorded. Equal files leave the report untouched.
    pub fn compare_with_report(
        &self,
        left: &mut dyn LineRead,
        right: &mut dyn LineRead,
        report_path: &Path,
    ) -> Result<ComparisonResult> {
        let result = self.compare(left, right)?;
        if !result.discrepancies.is_empty() {
            report::write_report(report_path, &result.discrepancies)?;
            info!("compare log saved at {}", report_path.display());
        }
        Ok(result)
    }

    fn in_window(&self, line_number: usize) -> bool {
        match self.region {
            None => true,
            Some(r) => line_number >= r.start_line && line_number <= r.end_line,
        }
    }

    fn normalize(&self, line: &str, line_number: usize) -> String {
        let mut value: String = if self.options.ignore_whitespace {
            line.chars().filter(|c| !c.is_whitespace()).collect()
        } else {
            line.to_string()
        };
        if self.options.case_insensitive {
            value = value.to_uppercase();
        }
        if let Some(region) = self.region {
            value = clip_to_window(&value, region, line_number);
        }
        value
    }
}

impl Default for LineComparator {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the column window on the first and last lines of the region.
/// Clips clamp to the line length.
fn clip_to_window(line: &str, region: Region, line_number: usize) -> String {
    let skip = if line_number == region.start_line {
        region.start_col.saturating_sub(1)
    } else {
        0
    };
    let take = if line_number == region.end_line {
        region.end_col.saturating_sub(1).saturating_sub(skip)
    } else {
        usize::MAX
    };
    line.chars().skip(skip).take(take).collect()
}
