use lcompare_common::{Discrepancy, Result, Side};
use std::fs;
use std::path::Path;

/// Number of leading characters two strings share position-for-position.
/// When one string is a prefix of the other, this is the shorter length.
pub fn first_diff_offset(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Renders one discrepancy as a compare-log block. Content mismatches carry
/// a caret line pointing at the first differing column.
pub fn format_discrepancy(discrepancy: &Discrepancy) -> String {
    match discrepancy {
        Discrepancy::LineMismatch {
            line_number,
            left,
            right,
            first_diff_offset,
        } => format!(
            "line {line_number} is not equal in both files\n   File A: {left}\n   File B: {right}\n           {}^",
            " ".repeat(*first_diff_offset)
        ),
        Discrepancy::LengthMismatch {
            shorter,
            shorter_lines,
            longer_lines,
        } => match shorter {
            Side::Right => format!(
                "File B has less lines than File A\n   File B: {shorter_lines} lines\n   File A: {longer_lines} lines"
            ),
            Side::Left => format!(
                "File A has less lines than File B\n   File A: {shorter_lines} lines\n   File B: {longer_lines} lines"
            ),
        },
    }
}

/// Renders the full compare log, one block per discrepancy.
pub fn render_report(discrepancies: &[Discrepancy]) -> String {
    let blocks: Vec<String> = discrepancies.iter().map(format_discrepancy).collect();
    let mut text = blocks.join("\n");
    text.push('\n');
    text
}

/// Overwrites `path` with the rendered compare log.
pub fn write_report(path: &Path, discrepancies: &[Discrepancy]) -> Result<()> {
    fs::write(path, render_report(discrepancies))?;
    Ok(())
}
