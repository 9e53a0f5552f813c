use crate::models::error::Result;

/// Supplier of interleaved integer PCM for exactly one output channel layout.
///
/// Typically backed by the transcoder's output or a decoded file. The encoder
/// makes no assumption about how the samples were produced.
pub trait PcmSource {
    fn sample_rate(&self) -> u32;

    fn channel_count(&self) -> u32;

    /// Bits per sample of the delivered PCM (16, 24 or 32).
    fn bit_depth(&self) -> u32;

    /// Read up to `max_samples` samples per channel into `buf`, replacing its
    /// contents with little-endian interleaved PCM.
    ///
    /// Returns the number of samples per channel read; `0` at end of stream.
    fn read_samples(&mut self, max_samples: u32, buf: &mut Vec<u8>) -> Result<u32>;

    /// Total samples per channel, when known up front.
    fn total_samples(&self) -> Option<u64> {
        None
    }
}
