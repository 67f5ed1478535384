pub mod line_source;
pub mod csv_source;
pub mod comparator;
pub mod report;
pub mod directive;
pub mod rewriter;

pub use line_source::{LineRead, TextSource};
pub use csv_source::{compare_records, CsvSource};
pub use comparator::{CompareOptions, ComparisonResult, LineComparator, Region};
pub use report::{first_diff_offset, format_discrepancy, render_report, write_report};
pub use directive::{EditDirective, ReplaceMode};
pub use rewriter::LineRewriter;
