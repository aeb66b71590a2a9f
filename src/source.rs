//! Byte sources that can be peeked at and rewound.
//!
//! Detection must never leave a caller's stream at a different position than
//! it found it, so everything the detector reads goes through a
//! [`ByteSource`] and a scoped [`Rewind`] guard.

use std::io::{self, Read, Seek, SeekFrom};

/// A readable input with optional mark/reset support.
pub trait ByteSource: Read {
    /// Whether [`ByteSource::mark`] and [`ByteSource::reset`] work at all.
    fn supports_mark(&self) -> bool;

    /// Remember the current position. `read_limit` is the number of bytes the
    /// caller may read before calling [`ByteSource::reset`].
    fn mark(&mut self, read_limit: u64) -> io::Result<()>;

    /// Return to the last marked position.
    fn reset(&mut self) -> io::Result<()>;

    /// Total length of the input, when known up front.
    fn total_len(&self) -> Option<u64> {
        None
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn supports_mark(&self) -> bool {
        (**self).supports_mark()
    }

    fn mark(&mut self, read_limit: u64) -> io::Result<()> {
        (**self).mark(read_limit)
    }

    fn reset(&mut self) -> io::Result<()> {
        (**self).reset()
    }

    fn total_len(&self) -> Option<u64> {
        (**self).total_len()
    }
}

/// Seekable input. Marks are positions, resets are seeks.
#[derive(Debug)]
pub struct SeekSource<R> {
    inner: R,
    mark: Option<u64>,
    len: u64,
}

impl<R: Read + Seek> SeekSource<R> {
    /// Wrap `inner`, measuring its length without moving its position.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;

        Ok(Self {
            inner,
            mark: None,
            len,
        })
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for SeekSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Seek> ByteSource for SeekSource<R> {
    fn supports_mark(&self) -> bool {
        true
    }

    fn mark(&mut self, _read_limit: u64) -> io::Result<()> {
        self.mark = Some(self.inner.stream_position()?);
        Ok(())
    }

    fn reset(&mut self) -> io::Result<()> {
        let pos = self
            .mark
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "reset without mark"))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn total_len(&self) -> Option<u64> {
        Some(self.len)
    }
}

/// Non-seekable input with a bounded replay buffer.
///
/// Bytes read after a mark are recorded until `read_limit` is exceeded, at
/// which point the mark is dropped and a reset fails. The total length is
/// unknown, so the detector can only check the magic bytes through it.
#[derive(Debug)]
pub struct BufferedSource<R> {
    inner: R,
    record: Vec<u8>,
    cursor: usize,
    limit: usize,
    marked: bool,
}

impl<R: Read> BufferedSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            record: Vec::new(),
            cursor: 0,
            limit: 0,
            marked: false,
        }
    }
}

impl<R: Read> Read for BufferedSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cursor < self.record.len() {
            let pending = &self.record[self.cursor..];
            let n = pending.len().min(buf.len());
            buf[..n].copy_from_slice(&pending[..n]);
            self.cursor += n;
            return Ok(n);
        }

        let n = self.inner.read(buf)?;

        if self.marked {
            if self.record.len() + n > self.limit {
                self.marked = false;
                self.record.clear();
                self.cursor = 0;
            } else {
                self.record.extend_from_slice(&buf[..n]);
                self.cursor = self.record.len();
            }
        }

        Ok(n)
    }
}

impl<R: Read> ByteSource for BufferedSource<R> {
    fn supports_mark(&self) -> bool {
        true
    }

    fn mark(&mut self, read_limit: u64) -> io::Result<()> {
        // Bytes not yet replayed become the start of the new record.
        self.record.drain(..self.cursor);
        self.cursor = 0;
        self.limit = usize::try_from(read_limit).unwrap_or(usize::MAX);
        self.marked = true;
        Ok(())
    }

    fn reset(&mut self) -> io::Result<()> {
        if !self.marked {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "resetting to invalid mark",
            ));
        }
        self.cursor = 0;
        Ok(())
    }
}

/// Input that can only be read once.
#[derive(Debug)]
pub struct OneShot<R>(pub R);

impl<R: Read> Read for OneShot<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read> ByteSource for OneShot<R> {
    fn supports_mark(&self) -> bool {
        false
    }

    fn mark(&mut self, _read_limit: u64) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn reset(&mut self) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }
}

/// Scoped mark over a [`ByteSource`].
///
/// The source is marked on creation and reset by [`Rewind::finish`]. If the
/// guard is dropped without finishing (early return, `?`, panic) the reset
/// still happens; a failure there can only be logged.
pub struct Rewind<'a, S: ByteSource + ?Sized> {
    source: &'a mut S,
    armed: bool,
}

impl<'a, S: ByteSource + ?Sized> Rewind<'a, S> {
    pub fn new(source: &'a mut S, read_limit: u64) -> io::Result<Self> {
        source.mark(read_limit)?;
        Ok(Self {
            source,
            armed: true,
        })
    }

    /// Reset the source and disarm the guard.
    pub fn finish(mut self) -> io::Result<()> {
        self.armed = false;
        self.source.reset()
    }
}

impl<S: ByteSource + ?Sized> Read for Rewind<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.source.read(buf)
    }
}

impl<S: ByteSource + ?Sized> Drop for Rewind<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.source.reset() {
                tracing::warn!(error = %e, "failed to rewind input after detection");
            }
        }
    }
}
