//! Atomic CSV file writer
//!
//! Each output file is staged as a temporary file in its destination
//! directory and renamed into place once complete, so an interrupted
//! run never leaves a partially-written CSV behind. Dropping the
//! writer without finishing removes the temporary file.

use crate::error::{EmitError, EmitResult};
use csv::{Terminator, Writer, WriterBuilder};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// CSV writer staging output through a temp file next to the target
#[derive(Debug)]
pub struct CsvFileWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
    rows: u64,
}

impl CsvFileWriter {
    /// Start a file targeting `final_path` and write the header row
    pub fn create(final_path: &Path, header: &[&str]) -> EmitResult<Self> {
        let parent = final_path.parent().ok_or_else(|| EmitError::NoParentDir {
            path: final_path.to_path_buf(),
        })?;

        let temp = NamedTempFile::new_in(parent).map_err(|e| EmitError::TempFileFailed {
            dir: parent.to_path_buf(),
            reason: e.to_string(),
        })?;

        let writer = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .from_writer(BufWriter::new(temp));

        let mut this = Self {
            writer,
            final_path: final_path.to_path_buf(),
            rows: 0,
        };
        this.write_row(header)?;
        this.rows = 0;
        Ok(this)
    }

    /// Append one record
    pub fn write_row<I, S>(&mut self, row: I) -> EmitResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.writer.write_record(row).map_err(|e| EmitError::WriteFailed {
            path: self.final_path.clone(),
            reason: e.to_string(),
        })?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far, header excluded
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush everything and atomically move the file into place.
    /// Returns the final size in bytes.
    pub fn finish(self) -> EmitResult<u64> {
        let path = self.final_path;

        let buf = self.writer.into_inner().map_err(|e| EmitError::WriteFailed {
            path: path.clone(),
            reason: e.error().to_string(),
        })?;

        let temp = buf.into_inner().map_err(|e| EmitError::WriteFailed {
            path: path.clone(),
            reason: e.error().to_string(),
        })?;

        let file = temp.persist(&path).map_err(|e| EmitError::PersistFailed {
            path: path.clone(),
            reason: e.error.to_string(),
        })?;

        let bytes = file
            .metadata()
            .map_err(|e| EmitError::PersistFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?
            .len();

        Ok(bytes)
    }
}
