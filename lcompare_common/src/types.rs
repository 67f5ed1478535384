use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which of the two compared files a record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// One recorded mismatch between two compared files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// A line pair differs in content. `left` and `right` hold the
    /// normalized forms that were actually compared.
    LineMismatch {
        line_number: usize,
        left: String,
        right: String,
        first_diff_offset: usize,
    },
    /// One file ran out of lines before the other.
    LengthMismatch {
        shorter: Side,
        shorter_lines: usize,
        longer_lines: usize,
    },
}

impl Discrepancy {
    pub fn is_length_mismatch(&self) -> bool {
        matches!(self, Discrepancy::LengthMismatch { .. })
    }
}

/// Counts for a finished comparison.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub line_mismatches: usize,
    pub length_mismatches: usize,
}

impl ComparisonSummary {
    pub fn from_discrepancies(discrepancies: &[Discrepancy]) -> Self {
        let length_mismatches = discrepancies
            .iter()
            .filter(|d| d.is_length_mismatch())
            .count();
        Self {
            total: discrepancies.len(),
            line_mismatches: discrepancies.len() - length_mismatches,
            length_mismatches,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Delete all whitespace from compared lines by default
    #[serde(default)]
    pub ignore_whitespace: bool,

    /// Uppercase compared lines by default
    #[serde(default)]
    pub case_insensitive: bool,

    /// Directory for compare logs written without an explicit path
    #[serde(default)]
    pub report_dir: Option<PathBuf>,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_by_kind() {
        let discrepancies = vec![
            Discrepancy::LineMismatch {
                line_number: 1,
                left: "a".to_string(),
                right: "b".to_string(),
                first_diff_offset: 0,
            },
            Discrepancy::LengthMismatch {
                shorter: Side::Right,
                shorter_lines: 1,
                longer_lines: 3,
            },
        ];

        let summary = ComparisonSummary::from_discrepancies(&discrepancies);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.line_mismatches, 1);
        assert_eq!(summary.length_mismatches, 1);
    }

    #[test]
    fn test_discrepancy_json_tag() {
        let d = Discrepancy::LineMismatch {
            line_number: 7,
            left: "x".to_string(),
            right: "y".to_string(),
            first_diff_offset: 0,
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "line_mismatch");
        assert_eq!(json["line_number"], 7);
    }
}
