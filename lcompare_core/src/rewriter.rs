use crate::directive::EditDirective;
use crate::line_source::{LineRead, TextSource};
use lcompare_common::{LCompareError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Applies one [`EditDirective`] to every line of a source.
///
/// Output goes to a temp file in the source's directory which then replaces
/// the original in a single rename, so an external reader always sees the
/// file fully old or fully new. The temp file is removed on every failure
/// path.
pub struct LineRewriter;

impl LineRewriter {
    pub fn apply(source: &mut TextSource, directive: &EditDirective) -> Result<()> {
        source.open()?;
        source.restart()?;

        let dir = parent_dir(source.path());
        let mut temp = NamedTempFile::new_in(dir)?;

        let mut line_number = 1usize;
        let mut replaced_once = false;
        while let Some(line) = source.read_line()? {
            let rewritten = rewrite_line(&line, line_number, directive, &mut replaced_once);
            writeln!(temp, "{rewritten}")?;
            line_number += 1;
        }
        temp.flush()?;

        // Release the read handle before swapping the file underneath it.
        source.close()?;
        persist_over(temp, source.path())?;
        info!("rewrote {}", source.path().display());

        // Reopen so subsequent reads see the new content.
        source.open()
    }
}

fn rewrite_line(
    line: &str,
    line_number: usize,
    directive: &EditDirective,
    replaced_once: &mut bool,
) -> String {
    match directive {
        EditDirective::ReplaceFirst {
            target,
            replacement,
        } => {
            if !*replaced_once && line.contains(target.as_str()) {
                *replaced_once = true;
                line.replace(target.as_str(), replacement)
            } else {
                line.to_string()
            }
        }
        EditDirective::ReplaceAll {
            target,
            replacement,
        } => line.replace(target.as_str(), replacement),
        EditDirective::ReplaceLines { lines, replacement } => {
            if lines.contains(&line_number) {
                replacement.clone()
            } else {
                line.to_string()
            }
        }
        EditDirective::ReplaceRegex {
            pattern,
            replacement,
        } => pattern.replace_all(line, replacement.as_str()).into_owned(),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Atomic rename where the platform allows overwriting; delete-then-rename
/// otherwise.
pub(crate) fn persist_over(temp: NamedTempFile, path: &Path) -> Result<()> {
    match temp.persist(path) {
        Ok(_) => Ok(()),
        Err(err) => {
            std::fs::remove_file(path)?;
            err.file
                .persist(path)
                .map_err(|e| LCompareError::Io(e.error))?;
            Ok(())
        }
    }
}
