use lcompare_common::{LCompareError, Result};
use regex::Regex;
use std::collections::BTreeSet;

/// Separator between the selector and the replacement text.
pub const SEPARATOR: &str = "];[";

/// How the rewriter targets lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Replace every occurrence on the first line that matches, then stop.
    First,
    /// Replace every occurrence on every line.
    All,
    /// Replace whole lines selected by number.
    Lines,
    /// Replace every regex match on every line.
    Regex,
}

impl ReplaceMode {
    /// Numeric selectors accepted alongside the names
    /// (0=first, 1=all, 2=lines, 3=regex).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ReplaceMode::First),
            1 => Some(ReplaceMode::All),
            2 => Some(ReplaceMode::Lines),
            3 => Some(ReplaceMode::Regex),
            _ => None,
        }
    }
}

/// A parsed edit instruction, ready to be applied by the rewriter.
#[derive(Debug, Clone)]
pub enum EditDirective {
    ReplaceFirst {
        target: String,
        replacement: String,
    },
    ReplaceAll {
        target: String,
        replacement: String,
    },
    ReplaceLines {
        lines: BTreeSet<usize>,
        replacement: String,
    },
    ReplaceRegex {
        pattern: Regex,
        replacement: String,
    },
}

impl EditDirective {
    /// Parses `<selector>];[<replacement>` for the given mode. The split
    /// happens at the first separator occurrence; the replacement is
    /// everything after it and may be empty or contain further separators.
    ///
    /// Failures are reported as [`LCompareError::Format`]; no file is
    /// touched by a directive that fails to parse.
    pub fn parse(mode: ReplaceMode, args: &str) -> Result<Self> {
        let split_at = args.find(SEPARATOR).ok_or_else(|| {
            LCompareError::Format(format!(
                "expected arguments in the form selector{SEPARATOR}replacement"
            ))
        })?;
        let selector = &args[..split_at];
        let replacement = args[split_at + SEPARATOR.len()..].to_string();

        match mode {
            ReplaceMode::First | ReplaceMode::All => {
                if selector.is_empty() {
                    return Err(LCompareError::Format(
                        "selector must not be empty".to_string(),
                    ));
                }
                let target = selector.to_string();
                if mode == ReplaceMode::First {
                    Ok(EditDirective::ReplaceFirst {
                        target,
                        replacement,
                    })
                } else {
                    Ok(EditDirective::ReplaceAll {
                        target,
                        replacement,
                    })
                }
            }
            ReplaceMode::Lines => Ok(EditDirective::ReplaceLines {
                lines: parse_line_set(selector)?,
                replacement,
            }),
            ReplaceMode::Regex => {
                if selector.is_empty() {
                    return Err(LCompareError::Format(
                        "selector must not be empty".to_string(),
                    ));
                }
                let pattern = Regex::new(selector).map_err(|e| {
                    LCompareError::Format(format!("invalid pattern {selector:?}: {e}"))
                })?;
                Ok(EditDirective::ReplaceRegex {
                    pattern,
                    replacement,
                })
            }
        }
    }
}

/// Expands a `;`-separated list of 1-based line numbers and inclusive
/// `start-end` ranges, e.g. `1;3-5;9` becomes {1, 3, 4, 5, 9}. Empty tokens
/// (a trailing `;`) are skipped; an inverted range expands to nothing.
fn parse_line_set(selector: &str) -> Result<BTreeSet<usize>> {
    let mut lines = BTreeSet::new();
    for token in selector.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_line_number(start)?;
                let end = parse_line_number(end)?;
                lines.extend(start..=end);
            }
            None => {
                lines.insert(parse_line_number(token)?);
            }
        }
    }
    Ok(lines)
}

fn parse_line_number(token: &str) -> Result<usize> {
    token
        .trim()
        .parse()
        .map_err(|_| LCompareError::Format(format!("invalid line number {token:?}")))
}
