use lcompare_common::{LCompareError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sequential line access to one text file.
///
/// The open/close lifecycle is explicit: read-type operations fail with
/// [`LCompareError::NotOpened`] on a closed source and never open it behind
/// the caller's back. `open` and `close` are idempotent.
pub trait LineRead {
    fn open(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn is_open(&self) -> bool;
    fn path(&self) -> &Path;

    /// Next line without its terminator, or `None` at end of stream.
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Repositions the cursor to the start, discarding buffered state.
    fn restart(&mut self) -> Result<()>;

    /// True iff the cursor is at end of stream. Does not consume input.
    fn finished_reading(&mut self) -> Result<bool>;
}

/// Plain text file reader backed by a buffered stream.
pub struct TextSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
}

impl TextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: None,
        }
    }

    fn reader_mut(&mut self) -> Result<&mut BufReader<File>> {
        match self.reader.as_mut() {
            Some(reader) => Ok(reader),
            None => Err(LCompareError::NotOpened(self.path.display().to_string())),
        }
    }

    /// Scans forward from the current position and reports whether the
    /// `line_number`-th line read from here contains `needle` as a
    /// substring. Returns false when the stream ends first.
    ///
    /// The reader is consumed as a side effect; callers restart between
    /// independent scans of the same source.
    pub fn find(&mut self, needle: &str, line_number: usize) -> Result<bool> {
        if line_number == 0 {
            return Ok(false);
        }
        let mut index = 1;
        while let Some(line) = self.read_line()? {
            if index == line_number {
                return Ok(line.contains(needle));
            }
            index += 1;
        }
        Ok(false)
    }

    /// True when any remaining line contains `needle`.
    pub fn contains(&mut self, needle: &str) -> Result<bool> {
        while let Some(line) = self.read_line()? {
            if line.contains(needle) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Number of remaining lines containing `needle`.
    pub fn count_matches(&mut self, needle: &str) -> Result<usize> {
        let mut count = 0;
        while let Some(line) = self.read_line()? {
            if line.contains(needle) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Whole-line exact match at the given 1-based line, counted from the
    /// current position.
    pub fn line_equals(&mut self, expected: &str, line_number: usize) -> Result<bool> {
        if line_number == 0 {
            return Ok(false);
        }
        let mut index = 1;
        while let Some(line) = self.read_line()? {
            if index == line_number {
                return Ok(line == expected);
            }
            index += 1;
        }
        Ok(false)
    }

    /// Appends a line to the end of the file. The read handle is released
    /// first so the next open sees the new content.
    pub fn append_line(&mut self, contents: &str) -> Result<()> {
        self.close()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{contents}")?;
        debug!("appended line to {}", self.path.display());
        Ok(())
    }
}

impl LineRead for TextSource {
    fn open(&mut self) -> Result<()> {
        if self.reader.is_some() {
            return Ok(());
        }
        let file = File::open(&self.path)?;
        self.reader = Some(BufReader::new(file));
        debug!("opened {}", self.path.display());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.reader.take().is_some() {
            debug!("closed {}", self.path.display());
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let reader = self.reader_mut()?;
        let mut buf = String::new();
        if reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(Some(buf))
    }

    fn restart(&mut self) -> Result<()> {
        // BufReader::seek drops the buffer along with the position.
        self.reader_mut()?.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn finished_reading(&mut self) -> Result<bool> {
        Ok(self.reader_mut()?.fill_buf()?.is_empty())
    }
}
