//! Fortran-style sequential record framing over a byte stream.
//!
//! Every logical payload is bracketed by two 4-byte length markers that must
//! agree; a disagreement is corruption, not recoverable in place. Payloads
//! longer than [`MAX_RECORD_BYTES`] are split into consecutive framed
//! sub-records transparently on both read and write:
//!
//! - a sub-record of exactly `MAX_RECORD_BYTES` announces a continuation,
//! - a shorter sub-record terminates the logical record,
//! - a payload that is an exact non-zero multiple of the limit is closed by
//!   one empty sub-record.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};

use super::error::{ResdataError, Result};

/// Maximum number of payload bytes in a single framed sub-record.
pub const MAX_RECORD_BYTES: usize = 4000;

/// Byte order applied uniformly to every multi-byte field of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Native ECLIPSE convention.
    Big,
    Little,
}

/// A sequential record stream over a file or any `Read`/`Write` + `Seek`
/// backend.
///
/// A `RecordStream` owns its cursor position and is not safe to share across
/// threads without external synchronization. Formatted (human-readable)
/// streams carry no length markers; the byte order flag is irrelevant for
/// them and the record-level calls reject them.
#[derive(Debug)]
pub struct RecordStream<S> {
    stream: S,
    endian: Endian,
    formatted: bool,
}

impl RecordStream<File> {
    /// Open an existing binary file for reading.
    pub fn open_reader(path: impl AsRef<Path>, endian: Endian) -> Result<Self> {
        let path = path.as_ref();
        info!("opening record stream for read: {}", path.display());
        Ok(Self::from_stream(File::open(path)?, endian))
    }

    /// Create (or truncate) a binary file for writing.
    pub fn open_writer(path: impl AsRef<Path>, endian: Endian) -> Result<Self> {
        let path = path.as_ref();
        info!("opening record stream for write: {}", path.display());
        Ok(Self::from_stream(File::create(path)?, endian))
    }

    /// Open an existing binary file for read-modify-write access, as needed
    /// by in-place keyword replacement.
    pub fn open_read_write(path: impl AsRef<Path>, endian: Endian) -> Result<Self> {
        let path = path.as_ref();
        info!("opening record stream for read/write: {}", path.display());
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::from_stream(file, endian))
    }

    /// Open an existing formatted (text) file for reading.
    pub fn open_formatted_reader(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("opening formatted stream for read: {}", path.display());
        Ok(Self::from_formatted(File::open(path)?))
    }

    /// Create (or truncate) a formatted (text) file for writing.
    pub fn open_formatted_writer(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("opening formatted stream for write: {}", path.display());
        Ok(Self::from_formatted(File::create(path)?))
    }
}

impl<S> RecordStream<S> {
    /// Wrap an arbitrary stream as a binary record stream.
    pub fn from_stream(stream: S, endian: Endian) -> Self {
        Self {
            stream,
            endian,
            formatted: false,
        }
    }

    /// Wrap an arbitrary stream as a formatted (text) stream.
    pub fn from_formatted(stream: S) -> Self {
        Self {
            stream,
            // Markers are never produced for formatted streams; the flag
            // only matters for binary ones.
            endian: Endian::Big,
            formatted: true,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    pub(crate) fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn require_binary(&self, op: &str) -> Result<()> {
        if self.formatted {
            return Err(ResdataError::InvalidFormat(format!(
                "{} is only defined for binary streams",
                op
            )));
        }
        Ok(())
    }
}

impl<S: Seek> RecordStream<S> {
    /// Current byte offset from the start of the stream.
    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.stream.stream_position()?)
    }

    /// Reposition to an absolute byte offset.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.stream.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Reposition to the start of the stream.
    pub fn rewind(&mut self) -> Result<()> {
        self.seek(0)
    }
}

impl<S: Read + Seek> RecordStream<S> {
    fn read_marker(&mut self) -> Result<i32> {
        let marker = match self.endian {
            Endian::Big => self.stream.read_i32::<BigEndian>()?,
            Endian::Little => self.stream.read_i32::<LittleEndian>()?,
        };
        Ok(marker)
    }

    /// Read a leading marker, or `None` on a clean end of stream.
    fn read_marker_opt(&mut self) -> Result<Option<i32>> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < 4 {
            let n = self.stream.read(&mut buf[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(ResdataError::InvalidFormat(
                    "stream ended inside a record length marker".to_string(),
                ));
            }
            filled += n;
        }
        let marker = match self.endian {
            Endian::Big => i32::from_be_bytes(buf),
            Endian::Little => i32::from_le_bytes(buf),
        };
        Ok(Some(marker))
    }

    // No sub-record exceeds MAX_RECORD_BYTES, so a larger marker is
    // corruption and must fail before any payload allocation.
    fn check_marker(marker: i32) -> Result<usize> {
        if marker < 0 || marker as usize > MAX_RECORD_BYTES {
            return Err(ResdataError::InvalidFormat(format!(
                "record length marker {} outside 0..={}",
                marker, MAX_RECORD_BYTES
            )));
        }
        Ok(marker as usize)
    }

    fn complete_sub_record(&mut self, leading: i32) -> Result<()> {
        let trailing = self.read_marker()?;
        if trailing != leading {
            return Err(ResdataError::RecordLengthMismatch { leading, trailing });
        }
        Ok(())
    }

    /// Read one framed sub-record into `out`, returning its payload length.
    fn read_sub_record(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let leading = self.read_marker()?;
        let len = Self::check_marker(leading)?;
        let start = out.len();
        out.resize(start + len, 0);
        self.stream.read_exact(&mut out[start..])?;
        self.complete_sub_record(leading)?;
        Ok(len)
    }

    /// Read one logical record, joining split sub-records.
    ///
    /// Fails with an I/O error at end of stream; use [`read_record_opt`]
    /// where a clean EOF is expected.
    ///
    /// [`read_record_opt`]: RecordStream::read_record_opt
    pub fn read_record(&mut self) -> Result<Vec<u8>> {
        match self.read_record_opt()? {
            Some(data) => Ok(data),
            None => Err(ResdataError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "end of stream at record boundary",
            ))),
        }
    }

    /// Read one logical record, or `None` on a clean end of stream.
    pub fn read_record_opt(&mut self) -> Result<Option<Vec<u8>>> {
        self.require_binary("read_record")?;
        let leading = match self.read_marker_opt()? {
            Some(marker) => marker,
            None => return Ok(None),
        };
        let len = Self::check_marker(leading)?;
        let mut data = Vec::with_capacity(len);
        data.resize(len, 0);
        self.stream.read_exact(&mut data)?;
        self.complete_sub_record(leading)?;

        let mut last = len;
        while last == MAX_RECORD_BYTES {
            last = self.read_sub_record(&mut data)?;
        }
        debug!("read record of {} bytes", data.len());
        Ok(Some(data))
    }

    /// Skip one logical record without allocating payload buffers, returning
    /// the number of payload bytes skipped.
    pub fn skip_record(&mut self) -> Result<u64> {
        self.require_binary("skip_record")?;
        let mut total: u64 = 0;
        loop {
            let leading = self.read_marker()?;
            let len = Self::check_marker(leading)?;
            self.stream.seek(SeekFrom::Current(len as i64))?;
            self.complete_sub_record(leading)?;
            total += len as u64;
            if len < MAX_RECORD_BYTES {
                break;
            }
        }
        debug!("skipped record of {} bytes", total);
        Ok(total)
    }
}

impl<S: Write + Seek> RecordStream<S> {
    fn write_marker(&mut self, len: i32) -> Result<()> {
        match self.endian {
            Endian::Big => self.stream.write_i32::<BigEndian>(len)?,
            Endian::Little => self.stream.write_i32::<LittleEndian>(len)?,
        }
        Ok(())
    }

    fn write_sub_record(&mut self, data: &[u8]) -> Result<()> {
        let len = data.len() as i32;
        self.write_marker(len)?;
        self.stream.write_all(data)?;
        self.write_marker(len)?;
        Ok(())
    }

    /// Write one logical record, splitting at [`MAX_RECORD_BYTES`].
    pub fn write_record(&mut self, data: &[u8]) -> Result<()> {
        self.require_binary("write_record")?;
        if data.is_empty() {
            return self.write_sub_record(&[]);
        }
        for chunk in data.chunks(MAX_RECORD_BYTES) {
            self.write_sub_record(chunk)?;
        }
        // An exact multiple of the limit needs an explicit terminator so the
        // reader can tell the logical record has ended.
        if data.len() % MAX_RECORD_BYTES == 0 {
            self.write_sub_record(&[])?;
        }
        debug!("wrote record of {} bytes", data.len());
        Ok(())
    }

    /// Flush buffered bytes to the backend.
    pub fn flush(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }
}
