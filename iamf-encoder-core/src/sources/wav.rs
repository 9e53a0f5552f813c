//! WAV input and output through `hound`.
//!
//! Only integer PCM at 16/24/32 bits is accepted; samples are handed to the
//! encoder as interleaved little-endian bytes at their native width.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::models::error::{EncoderError, Result};
use crate::traits::pcm_source::PcmSource;

/// Streaming PCM source over a WAV file.
pub struct WavSource {
    reader: hound::WavReader<BufReader<File>>,
    spec: hound::WavSpec,
    remaining: u32,
    total: u32,
    path: PathBuf,
}

impl WavSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path).map_err(|e| read_error(path, e))?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int {
            return Err(EncoderError::UnsupportedSource(format!(
                "{}: only integer PCM is supported, found float samples",
                path.display()
            )));
        }
        if ![16, 24, 32].contains(&spec.bits_per_sample) {
            return Err(EncoderError::UnsupportedSource(format!(
                "{}: unsupported bit depth: {}",
                path.display(),
                spec.bits_per_sample
            )));
        }

        let total = reader.duration();
        log::info!(
            "Opened {}: {} Hz, {} ch, {}-bit, {} samples",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            total
        );

        Ok(Self {
            reader,
            spec,
            remaining: total,
            total,
            path: path.to_path_buf(),
        })
    }
}

impl PcmSource for WavSource {
    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn channel_count(&self) -> u32 {
        self.spec.channels as u32
    }

    fn bit_depth(&self) -> u32 {
        self.spec.bits_per_sample as u32
    }

    fn read_samples(&mut self, max_samples: u32, buf: &mut Vec<u8>) -> Result<u32> {
        let channels = self.spec.channels as usize;
        let bits = self.spec.bits_per_sample;
        let wanted = self.remaining.min(max_samples);
        let values = wanted as usize * channels;

        buf.clear();
        buf.reserve(values * (bits / 8) as usize);
        let mut read = 0usize;
        for sample in self.reader.samples::<i32>().take(values) {
            let sample = sample.map_err(|e| read_error(&self.path, e))?;
            push_sample(buf, sample, bits);
            read += 1;
        }

        let samples = (read / channels) as u32;
        buf.truncate(samples as usize * channels * (bits / 8) as usize);
        self.remaining = if read < values { 0 } else { self.remaining - wanted };
        Ok(samples)
    }

    fn total_samples(&self) -> Option<u64> {
        Some(self.total as u64)
    }
}

fn push_sample(buf: &mut Vec<u8>, sample: i32, bits: u16) {
    match bits {
        16 => buf.extend_from_slice(&(sample as i16).to_le_bytes()),
        24 => buf.extend_from_slice(&sample.to_le_bytes()[..3]),
        _ => buf.extend_from_slice(&sample.to_le_bytes()),
    }
}

/// Write interleaved little-endian integer PCM as a WAV file.
pub fn write_wav(path: &Path, sample_rate: u32, channel_count: u32, bit_depth: u32, pcm: &[u8]) -> Result<()> {
    if ![16, 24, 32].contains(&bit_depth) {
        return Err(EncoderError::InvalidArgument(format!("unsupported bit depth: {}", bit_depth)));
    }
    let channels = u16::try_from(channel_count)
        .ok()
        .filter(|&channels| channels > 0)
        .ok_or_else(|| EncoderError::InvalidArgument(format!("unsupported channel count: {}", channel_count)))?;
    let bytes_per_sample = (bit_depth / 8) as usize;
    let block_align = bytes_per_sample * channels as usize;
    if pcm.len() % block_align != 0 {
        return Err(EncoderError::InvalidArgument(format!(
            "{} PCM bytes is not a whole number of {}-byte samples",
            pcm.len(),
            block_align
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bit_depth as u16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| write_error(path, e))?;
    for bytes in pcm.chunks_exact(bytes_per_sample) {
        let sample = match bytes_per_sample {
            2 => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
            // Sign-extend by placing the 24 bits at the top and shifting back down.
            3 => i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8,
            _ => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        };
        writer.write_sample(sample).map_err(|e| write_error(path, e))?;
    }
    writer.finalize().map_err(|e| write_error(path, e))?;

    log::debug!("Wrote {} PCM bytes to {}", pcm.len(), path.display());
    Ok(())
}

fn read_error(path: &Path, e: hound::Error) -> EncoderError {
    match e {
        hound::Error::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            EncoderError::UnsupportedSource(format!("{}: truncated WAV file", path.display()))
        }
        hound::Error::IoError(e) => EncoderError::Io(format!("{}: {}", path.display(), e)),
        other => EncoderError::UnsupportedSource(format!("{}: {}", path.display(), other)),
    }
}

fn write_error(path: &Path, e: hound::Error) -> EncoderError {
    match e {
        hound::Error::IoError(e) => EncoderError::Io(format!("{}: {}", path.display(), e)),
        other => EncoderError::InvalidArgument(format!("{}: {}", path.display(), other)),
    }
}
