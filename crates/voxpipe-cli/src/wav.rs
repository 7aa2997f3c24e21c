//! WAV file output.

use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use voxpipe_core::AudioSink;

/// Audio sink that frames s16le mono bytes as a WAV file.
///
/// Bytes may arrive split mid-sample; the odd byte is held until its partner
/// arrives.
pub struct WavSink<W: Write + Seek> {
    writer: WavWriter<W>,
    carry: Option<u8>,
    samples: u64,
}

impl WavSink<BufWriter<File>> {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self, hound::Error> {
        Ok(Self {
            writer: WavWriter::create(path, spec(sample_rate))?,
            carry: None,
            samples: 0,
        })
    }
}

impl<W: Write + Seek> WavSink<W> {
    pub fn new(inner: W, sample_rate: u32) -> Result<Self, hound::Error> {
        Ok(Self {
            writer: WavWriter::new(inner, spec(sample_rate))?,
            carry: None,
            samples: 0,
        })
    }

    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// Write the final header lengths. A dangling half sample is dropped.
    pub fn finalize(self) -> Result<(), hound::Error> {
        self.writer.finalize()
    }

    fn push(&mut self, lo: u8, hi: u8) -> io::Result<()> {
        self.writer
            .write_sample(i16::from_le_bytes([lo, hi]))
            .map_err(into_io)?;
        self.samples += 1;
        Ok(())
    }
}

impl<W: Write + Seek> AudioSink for WavSink<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut rest = data;
        if let Some(lo) = self.carry.take() {
            let Some((&hi, tail)) = rest.split_first() else {
                self.carry = Some(lo);
                return Ok(0);
            };
            self.push(lo, hi)?;
            rest = tail;
        }

        let mut pairs = rest.chunks_exact(2);
        for pair in &mut pairs {
            self.push(pair[0], pair[1])?;
        }
        if let [odd] = pairs.remainder() {
            self.carry = Some(*odd);
        }
        Ok(data.len())
    }
}

const fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn into_io(err: hound::Error) -> io::Error {
    match err {
        hound::Error::IoError(e) => e,
        other => io::Error::other(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_mono_16_bit_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut sink = WavSink::create(&path, 16000).unwrap();
        // 1, -2, 300 split across writes at odd offsets.
        sink.write_all(&[0x01]).unwrap();
        sink.write_all(&[0x00, 0xfe, 0xff, 0x2c]).unwrap();
        sink.write_all(&[0x01]).unwrap();
        assert_eq!(sink.samples(), 3);
        sink.finalize().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, [1, -2, 300]);
    }

    #[test]
    fn empty_write_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavSink::create(&dir.path().join("empty.wav"), 22050).unwrap();
        assert_eq!(sink.write(&[]).unwrap(), 0);
        sink.finalize().unwrap();
    }
}
