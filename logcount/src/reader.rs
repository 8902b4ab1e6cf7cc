//! Streams an input file as fixed-size batches of lines.
//!
//! The reader owns the file handle for as long as it lives; dropping it
//! (exhaustion, cancellation or error) closes the file.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::config::EncodingMode;
use crate::errors::{CountError, CountResult};

const BUFFER_CAPACITY: usize = 65536;

/// A bounded group of consecutive lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Lines with their separators removed
    pub lines: Vec<String>,
    /// Byte offset in the source at which this batch ends
    pub end_offset: u64,
}

/// Checks that `path` names an existing, regular, readable file.
///
/// The checks run in that order and the first failure wins. Returns the
/// opened file and its size.
pub fn validate_input(path: &Path) -> CountResult<(File, u64)> {
    if !path.exists() {
        return Err(CountError::file_not_found(path));
    }
    let metadata = path
        .metadata()
        .map_err(|e| CountError::from_open_error(path, e))?;
    if !metadata.is_file() {
        return Err(CountError::not_a_file(path));
    }
    let file = File::open(path).map_err(|e| CountError::from_open_error(path, e))?;
    Ok((file, metadata.len()))
}

/// Lazy, finite, non-restartable sequence of [`Batch`]es over one file
#[derive(Debug)]
pub struct ChunkReader {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    buffer_size: usize,
    encoding_mode: EncodingMode,
    total_bytes: u64,
    bytes_consumed: u64,
    lines_consumed: u64,
    warned_lossy: bool,
    line_buffer: Vec<u8>,
}

impl ChunkReader {
    /// Opens `path` for batched reading.
    ///
    /// Fails with `FileNotFound`, `NotAFile` or `NotReadable`, checked in that order.
    pub fn open(
        path: impl AsRef<Path>,
        buffer_size: usize,
        encoding_mode: EncodingMode,
    ) -> CountResult<Self> {
        let path = path.as_ref();
        if buffer_size == 0 {
            return Err(CountError::config_error("buffer_size must be at least 1"));
        }
        let (file, total_bytes) = validate_input(path)?;
        debug!(
            "Opened {} ({} bytes, {} lines per batch)",
            path.display(),
            total_bytes,
            buffer_size
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(BufReader::with_capacity(BUFFER_CAPACITY, file)),
            buffer_size,
            encoding_mode,
            total_bytes,
            bytes_consumed: 0,
            lines_consumed: 0,
            warned_lossy: false,
            line_buffer: Vec::with_capacity(256),
        })
    }

    /// Size of the file when it was opened
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Raw bytes read so far, separators included
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    pub fn lines_consumed(&self) -> u64 {
        self.lines_consumed
    }

    /// Reads one line, returning `None` at end of file
    fn read_line(&mut self, reader: &mut BufReader<File>) -> CountResult<Option<String>> {
        self.line_buffer.clear();
        let read = reader.read_until(b'\n', &mut self.line_buffer)?;
        if read == 0 {
            return Ok(None);
        }
        self.bytes_consumed += read as u64;
        self.lines_consumed += 1;

        let mut bytes = self.line_buffer.as_slice();
        if let Some(stripped) = bytes.strip_suffix(b"\n") {
            bytes = stripped;
            if let Some(stripped) = bytes.strip_suffix(b"\r") {
                bytes = stripped;
            }
        }

        let line = match self.encoding_mode {
            EncodingMode::FailFast => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| CountError::encoding_error(&self.path, self.lines_consumed))?,
            EncodingMode::Lossy => {
                let cow = String::from_utf8_lossy(bytes);
                if let std::borrow::Cow::Owned(_) = cow {
                    if !self.warned_lossy {
                        warn!(
                            "Invalid UTF-8 replaced in file {} (first at line {})",
                            self.path.display(),
                            self.lines_consumed
                        );
                        self.warned_lossy = true;
                    }
                }
                cow.into_owned()
            }
        };
        Ok(Some(line))
    }

    fn next_batch(&mut self, reader: &mut BufReader<File>) -> CountResult<Option<Batch>> {
        let mut lines = Vec::with_capacity(self.buffer_size);
        while lines.len() < self.buffer_size {
            match self.read_line(reader)? {
                Some(line) => lines.push(line),
                None => break,
            }
        }
        if lines.is_empty() {
            return Ok(None);
        }
        trace!(
            "Read batch of {} lines ending at byte {}",
            lines.len(),
            self.bytes_consumed
        );
        Ok(Some(Batch {
            lines,
            end_offset: self.bytes_consumed,
        }))
    }
}

impl Iterator for ChunkReader {
    type Item = CountResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut reader = self.reader.take()?;
        match self.next_batch(&mut reader) {
            Ok(Some(batch)) => {
                self.reader = Some(reader);
                Some(Ok(batch))
            }
            // End of file: the handle is dropped here
            Ok(None) => {
                debug!(
                    "Finished reading {} ({} lines, {} bytes)",
                    self.path.display(),
                    self.lines_consumed,
                    self.bytes_consumed
                );
                None
            }
            Err(e) => {
                warn!("Read failed for {}: {}", self.path.display(), e);
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for ChunkReader {}
