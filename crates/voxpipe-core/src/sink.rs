//! Audio sink port.
//!
//! The session forwards raw s16le mono bytes, in production order, to a
//! caller-supplied sink. Container framing (WAV, OGG) is the sink's
//! business.

use std::io;

/// Destination for synthesized audio bytes.
pub trait AudioSink {
    /// Accept some prefix of `data`, returning how many bytes were taken.
    ///
    /// Returning `Ok(0)` for a non-empty `data` means the sink is full.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Deliver all of `data`, retrying short writes.
    fn write_all(&mut self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            match self.write(data) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "audio sink accepted no data",
                    ));
                }
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl AudioSink for Vec<u8> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(data);
        Ok(data.len())
    }
}

impl<S: AudioSink + ?Sized> AudioSink for &mut S {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }
}

/// Adapts any `io::Write` (file, stdout) into an audio sink.
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
    written: u64,
}

impl<W: io::Write> WriterSink<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Total bytes accepted so far.
    pub const fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> AudioSink for WriterSink<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(data)?;
        self.written += n as u64;
        Ok(n)
    }
}
