//! Byte sources the demuxer pulls pages from.
//!
//! The demuxer never touches `std::io` directly; it talks to a [`ByteSource`],
//! which reports whether random access is possible through [`ByteSource::size`].

use std::io::{self, BufReader, Read, Seek, SeekFrom};

use crate::{DemuxError, Result};

/// A readable, optionally seekable stream of bytes.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes, returning 0 at end of source.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Current absolute read position.
    fn tell(&self) -> u64;

    /// Move the read position to `offset`.
    fn seek(&mut self, offset: u64) -> Result<()>;

    /// Total size in bytes, or `None` if the source is not seekable.
    fn size(&self) -> Option<u64>;

    /// Whether [`ByteSource::seek`] supports arbitrary offsets.
    fn is_seekable(&self) -> bool {
        self.size().is_some()
    }

    /// Read as many bytes as possible into `buf`, stopping early only at end of source.
    fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Read a single byte, `None` at end of source.
    fn read_u8(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read_full(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}

/// Buffered seekable source over any `Read + Seek`.
pub struct ReaderSource<R> {
    inner: BufReader<R>,
    pos: u64,
    size: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    /// Wrap a reader, keeping its current position.
    pub fn new(mut reader: R) -> io::Result<Self> {
        let pos = reader.stream_position()?;
        let size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(pos))?;
        Ok(Self {
            inner: BufReader::new(reader),
            pos,
            size,
        })
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        self.pos = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn size(&self) -> Option<u64> {
        Some(self.size)
    }
}

/// Forward-only source over a plain `Read`, such as a pipe.
///
/// Seeking ahead skips bytes; seeking backwards fails with
/// [`DemuxError::NotSeekable`].
pub struct ForwardSource<R> {
    inner: BufReader<R>,
    pos: u64,
}

impl<R: Read> ForwardSource<R> {
    /// Wrap a reader positioned at offset 0.
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            pos: 0,
        }
    }
}

impl<R: Read> ByteSource for ForwardSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        if offset < self.pos {
            return Err(DemuxError::NotSeekable);
        }
        let skipped = io::copy(
            &mut (&mut self.inner).take(offset - self.pos),
            &mut io::sink(),
        )?;
        self.pos += skipped;
        Ok(())
    }

    fn size(&self) -> Option<u64> {
        None
    }
}
