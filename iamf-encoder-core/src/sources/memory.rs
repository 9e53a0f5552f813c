use crate::models::error::{EncoderError, Result};
use crate::sources::pcm;
use crate::traits::pcm_source::PcmSource;

/// PCM source over an in-memory interleaved buffer.
#[derive(Debug, Clone)]
pub struct MemorySource {
    pcm: Vec<u8>,
    position: usize,
    sample_rate: u32,
    channel_count: u32,
    bit_depth: u32,
}

impl MemorySource {
    pub fn new(pcm: Vec<u8>, sample_rate: u32, channel_count: u32, bit_depth: u32) -> Result<Self> {
        if ![16, 24, 32].contains(&bit_depth) {
            return Err(EncoderError::InvalidArgument(format!("unsupported bit depth: {}", bit_depth)));
        }
        if channel_count == 0 {
            return Err(EncoderError::InvalidArgument("channel count must be positive".into()));
        }
        let block_align = (channel_count * bit_depth / 8) as usize;
        if pcm.len() % block_align != 0 {
            return Err(EncoderError::InvalidArgument(format!(
                "{} PCM bytes is not a whole number of {}-byte samples",
                pcm.len(),
                block_align
            )));
        }
        Ok(Self {
            pcm,
            position: 0,
            sample_rate,
            channel_count,
            bit_depth,
        })
    }

    /// Build a source from normalized f32 samples, quantized to `bit_depth`.
    pub fn from_f32(samples: &[f32], sample_rate: u32, channel_count: u32, bit_depth: u32) -> Result<Self> {
        Self::new(pcm::f32_to_pcm(samples, bit_depth)?, sample_rate, channel_count, bit_depth)
    }

    fn block_align(&self) -> usize {
        (self.channel_count * self.bit_depth / 8) as usize
    }
}

impl PcmSource for MemorySource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> u32 {
        self.channel_count
    }

    fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    fn read_samples(&mut self, max_samples: u32, buf: &mut Vec<u8>) -> Result<u32> {
        let block_align = self.block_align();
        let available = (self.pcm.len() - self.position) / block_align;
        let samples = available.min(max_samples as usize);
        let end = self.position + samples * block_align;

        buf.clear();
        buf.extend_from_slice(&self.pcm[self.position..end]);
        self.position = end;
        Ok(samples as u32)
    }

    fn total_samples(&self) -> Option<u64> {
        Some((self.pcm.len() / self.block_align()) as u64)
    }
}
