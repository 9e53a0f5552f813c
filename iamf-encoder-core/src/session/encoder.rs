use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bitstream::obu::{self, ObuType};
use crate::models::config::{AudioConfig, ElementConfig, MixConfig};
use crate::models::error::{EncoderError, Result};
use crate::models::state::EncoderState;
use crate::models::summary::EncodeSummary;
use crate::session::payloads;
use crate::storage::checksum;
use crate::traits::encoder_delegate::EncoderDelegate;

/// Single-element IAMF encoder session.
///
/// Owns its three configs and the output sink for its whole lifetime.
/// Every OBU is assembled in memory and handed to the sink as one write, so a
/// reader never sees a partial OBU unless the sink itself fails mid-write.
///
/// ```text
/// new → write_header → encode_frame × N → finalize → cleanup
/// ```
///
/// `W` defaults to [`File`] for path-backed sessions; any [`Write`] sink can
/// be used through [`write_header_to`](IamfEncoder::write_header_to).
pub struct IamfEncoder<W: Write = File> {
    audio: AudioConfig,
    mix: MixConfig,
    element: ElementConfig,
    state: EncoderState,
    sink: Option<W>,
    file_path: Option<PathBuf>,
    sequence_number: u32,
    frames_encoded: u64,
    samples_encoded: u64,
    bytes_written: u64,
    summary: Option<EncodeSummary>,
    delegate: Option<Arc<dyn EncoderDelegate>>,
}

impl IamfEncoder {
    /// Create a path-backed session. No I/O happens until
    /// [`write_header`](IamfEncoder::write_header).
    pub fn new(audio: AudioConfig, mix: MixConfig, element: ElementConfig) -> Result<Self> {
        Self::with_configs(audio, mix, element)
    }

    /// Start a builder; configs may be supplied in any order.
    pub fn builder() -> EncoderBuilder {
        EncoderBuilder::default()
    }

    /// Create `output_path` and emit the four header OBUs into it.
    pub fn write_header(&mut self, output_path: &Path) -> Result<()> {
        self.require_initialized("write_header")?;

        let file = match File::create(output_path) {
            Ok(file) => file,
            Err(e) => {
                let err = EncoderError::Io(format!("failed to create {}: {}", output_path.display(), e));
                return Err(self.poison(err));
            }
        };
        self.file_path = Some(output_path.to_path_buf());
        log::info!("writing IAMF stream to {}", output_path.display());
        self.write_header_to(file)
    }
}

impl<W: Write> IamfEncoder<W> {
    /// Validate and take ownership of the session configs.
    pub fn with_configs(audio: AudioConfig, mix: MixConfig, element: ElementConfig) -> Result<Self> {
        audio.validate().map_err(EncoderError::InvalidArgument)?;
        mix.validate().map_err(EncoderError::InvalidArgument)?;
        element.validate().map_err(EncoderError::InvalidArgument)?;
        if element.channel_count() != audio.channel_count {
            return Err(EncoderError::InvalidArgument(format!(
                "element carries {} channels but audio config has {}",
                element.channel_count(),
                audio.channel_count
            )));
        }

        log::info!(
            "IAMF encoder initialized: {} Hz, {} channels, {} bit, {} ms frames, element {} ({})",
            audio.sample_rate,
            audio.channel_count,
            audio.bit_depth,
            audio.frame_duration_ms,
            element.element_id,
            if element.is_scene_based { "scene-based" } else { "channel-based" },
        );

        Ok(Self {
            audio,
            mix,
            element,
            state: EncoderState::Initialized,
            sink: None,
            file_path: None,
            sequence_number: 0,
            frames_encoded: 0,
            samples_encoded: 0,
            bytes_written: 0,
            summary: None,
            delegate: None,
        })
    }

    /// Register the session observer, replacing any previous one.
    pub fn set_delegate(&mut self, delegate: Arc<dyn EncoderDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Take ownership of `sink` and emit, in order: sequence header, codec
    /// config, audio element, mix presentation.
    pub fn write_header_to(&mut self, sink: W) -> Result<()> {
        self.require_initialized("write_header")?;
        self.sink = Some(sink);

        let headers = [
            (ObuType::SequenceHeader, payloads::sequence_header()),
            (ObuType::CodecConfig, payloads::codec_config(&self.audio)),
            (ObuType::AudioElement, payloads::audio_element(&self.element, &self.audio)),
            (ObuType::MixPresentation, payloads::mix_presentation(&self.mix, &self.element)),
        ];
        for (obu_type, payload) in &headers {
            self.emit(*obu_type, &[payload.as_slice()])?;
        }

        self.set_state(EncoderState::HeaderWritten);
        Ok(())
    }

    /// Emit one audio frame OBU carrying `sample_count` samples per channel
    /// of interleaved PCM.
    pub fn encode_frame(&mut self, pcm: &[u8], sample_count: u32) -> Result<()> {
        if !self.state.is_header_written() {
            return Err(EncoderError::InvalidState(format!(
                "encode_frame requires a written header, session is {}",
                self.state.name()
            )));
        }
        if sample_count == 0 {
            return Err(EncoderError::InvalidArgument("frame must carry at least one sample".into()));
        }

        let frame_size = sample_count as u64 * self.audio.block_align() as u64;
        if pcm.len() as u64 != frame_size {
            return Err(EncoderError::InvalidArgument(format!(
                "expected {} PCM bytes for {} samples x {} channels x {} bit, got {}",
                frame_size,
                sample_count,
                self.audio.channel_count,
                self.audio.bit_depth,
                pcm.len()
            )));
        }

        let prefix = payloads::audio_frame_prefix();
        self.emit(ObuType::AudioFrame, &[prefix.as_slice(), pcm])?;

        let sequence_number = self.sequence_number;
        // Sequence numbers are 32-bit on the wire and wrap.
        self.sequence_number = self.sequence_number.wrapping_add(1);
        self.frames_encoded += 1;
        self.samples_encoded += sample_count as u64;

        log::trace!("encoded frame {} ({} samples)", sequence_number, sample_count);
        if self.frames_encoded % 100 == 0 {
            log::debug!("encoded {} IAMF frames", self.frames_encoded);
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_frame_encoded(sequence_number, sample_count);
        }
        Ok(())
    }

    /// Flush and close the sink. A stream with zero audio frames is legal.
    ///
    /// Calling again after success returns the same summary.
    pub fn finalize(&mut self) -> Result<EncodeSummary> {
        if self.state.is_finalized() {
            if let Some(ref summary) = self.summary {
                return Ok(summary.clone());
            }
        }
        if !self.state.is_header_written() {
            return Err(EncoderError::InvalidState(format!(
                "finalize requires a written header, session is {}",
                self.state.name()
            )));
        }

        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.flush() {
                let err = EncoderError::Io(format!("failed to flush stream: {}", e));
                return Err(self.poison(err));
            }
        }

        let checksum = match self.file_path.clone() {
            Some(path) => match checksum::sha256_file(&path) {
                Ok(digest) => Some(digest),
                Err(err) => return Err(self.poison(err)),
            },
            None => None,
        };

        let summary = EncodeSummary {
            file_path: self.file_path.clone(),
            frames_encoded: self.frames_encoded,
            samples_encoded: self.samples_encoded,
            bytes_written: self.bytes_written,
            duration_secs: self.samples_encoded as f64 / self.audio.sample_rate as f64,
            checksum,
        };
        log::info!(
            "IAMF encoding finalized: {} frames, {} bytes, {:.3} s",
            summary.frames_encoded,
            summary.bytes_written,
            summary.duration_secs
        );

        self.summary = Some(summary.clone());
        self.set_state(EncoderState::Finalized);
        if let Some(ref delegate) = self.delegate {
            delegate.on_finished(&summary);
        }
        Ok(summary)
    }

    /// Release the sink and end the session. Safe from any state.
    pub fn cleanup(mut self) {
        if let Some(mut sink) = self.sink.take() {
            log::warn!(
                "cleanup discarding an unfinalized stream after {} frames",
                self.frames_encoded
            );
            let _ = sink.flush();
        }
        self.set_state(EncoderState::Closed);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &EncoderState {
        &self.state
    }

    /// Sequence number the next frame will carry.
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    /// Audio frames written so far.
    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    /// Samples per channel written so far.
    pub fn samples_encoded(&self) -> u64 {
        self.samples_encoded
    }

    /// Bytes handed to the sink, OBU headers included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn audio_config(&self) -> &AudioConfig {
        &self.audio
    }

    pub fn mix_config(&self) -> &MixConfig {
        &self.mix
    }

    pub fn element_config(&self) -> &ElementConfig {
        &self.element
    }

    /// Output path of a path-backed session once the header is written.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Whether the session still owns an open sink.
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    // --- Internal helpers ---

    fn require_initialized(&self, operation: &str) -> Result<()> {
        if self.state.is_initialized() {
            Ok(())
        } else {
            Err(EncoderError::InvalidState(format!(
                "{} requires an initialized session, session is {}",
                operation,
                self.state.name()
            )))
        }
    }

    fn emit(&mut self, obu_type: ObuType, parts: &[&[u8]]) -> Result<()> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| EncoderError::InvalidState("sink is not open".into()))?;
        match obu::emit_parts(sink, obu_type, parts) {
            Ok(written) => {
                self.bytes_written += written as u64;
                Ok(())
            }
            Err(err) if err.is_poisoning() => Err(self.poison(err)),
            Err(err) => Err(err),
        }
    }

    /// Move the session into `Failed`; only cleanup remains valid.
    fn poison(&mut self, err: EncoderError) -> EncoderError {
        log::error!("IAMF encoder session failed: {}", err);
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&err);
        }
        self.set_state(EncoderState::Failed(err.clone()));
        err
    }

    fn set_state(&mut self, new_state: EncoderState) {
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&self.state);
        }
    }
}

/// Collects the three session configs; a missing one is reported by
/// [`build`](EncoderBuilder::build) as `InvalidArgument`.
#[derive(Default)]
pub struct EncoderBuilder {
    audio: Option<AudioConfig>,
    mix: Option<MixConfig>,
    element: Option<ElementConfig>,
    delegate: Option<Arc<dyn EncoderDelegate>>,
}

impl EncoderBuilder {
    pub fn audio_config(mut self, audio: AudioConfig) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn mix_config(mut self, mix: MixConfig) -> Self {
        self.mix = Some(mix);
        self
    }

    pub fn element_config(mut self, element: ElementConfig) -> Self {
        self.element = Some(element);
        self
    }

    pub fn delegate(mut self, delegate: Arc<dyn EncoderDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Build a path-backed session.
    pub fn build(self) -> Result<IamfEncoder> {
        self.build_for_sink()
    }

    /// Build a session for an arbitrary [`Write`] sink.
    pub fn build_for_sink<W: Write>(self) -> Result<IamfEncoder<W>> {
        let audio = self
            .audio
            .ok_or_else(|| EncoderError::InvalidArgument("audio config is required".into()))?;
        let mix = self
            .mix
            .ok_or_else(|| EncoderError::InvalidArgument("mix config is required".into()))?;
        let element = self
            .element
            .ok_or_else(|| EncoderError::InvalidArgument("element config is required".into()))?;

        let mut encoder = IamfEncoder::with_configs(audio, mix, element)?;
        if let Some(delegate) = self.delegate {
            encoder.set_delegate(delegate);
        }
        Ok(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::io;
    use std::rc::Rc;
    use std::sync::Mutex;

    use crate::bitstream::leb128::decode_uleb128;
    use crate::layout::format_table::resolve;

    /// Test sink that keeps its bytes reachable after the session drops it.
    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Accepts `budget` bytes, then fails every write.
    struct FailingSink {
        budget: usize,
        written: Rc<RefCell<usize>>,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut written = self.written.borrow_mut();
            if *written + buf.len() > self.budget {
                return Err(io::Error::other("device out of space"));
            }
            *written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Delegate that records every callback in order.
    #[derive(Default)]
    struct RecordingDelegate {
        events: Mutex<Vec<String>>,
    }

    impl EncoderDelegate for RecordingDelegate {
        fn on_state_changed(&self, state: &EncoderState) {
            self.events.lock().unwrap().push(format!("state:{}", state.name()));
        }

        fn on_frame_encoded(&self, sequence_number: u32, sample_count: u32) {
            self.events
                .lock()
                .unwrap()
                .push(format!("frame:{}:{}", sequence_number, sample_count));
        }

        fn on_error(&self, error: &EncoderError) {
            self.events.lock().unwrap().push(format!("error:{}", error));
        }

        fn on_finished(&self, summary: &EncodeSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finished:{}", summary.frames_encoded));
        }
    }

    fn stereo_encoder<W: Write>() -> IamfEncoder<W> {
        IamfEncoder::with_configs(AudioConfig::default(), MixConfig::default(), resolve("stereo").unwrap()).unwrap()
    }

    /// Split a stream into (type code, payload length) pairs, checking that
    /// every size field matches the bytes that follow.
    fn obu_layout(bytes: &[u8]) -> Vec<(u8, usize)> {
        let mut out = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let obu_type = bytes[pos] >> 3;
            let (size, width) = decode_uleb128(&bytes[pos + 1..]).unwrap();
            let start = pos + 1 + width;
            let end = start + size as usize;
            assert!(end <= bytes.len(), "OBU overruns stream");
            out.push((obu_type, size as usize));
            pos = end;
        }
        out
    }

    #[test]
    fn header_emits_four_obus_in_order() {
        let sink = SharedSink::default();
        let mut encoder = stereo_encoder();
        encoder.write_header_to(sink.clone()).unwrap();

        let layout = obu_layout(&sink.0.borrow());
        let types: Vec<u8> = layout.iter().map(|(t, _)| *t).collect();
        assert_eq!(types, vec![31, 0, 1, 2]);
        assert_eq!(layout[0].1, 6);
        assert_eq!(encoder.bytes_written() as usize, sink.0.borrow().len());
        assert!(encoder.state().is_header_written());
    }

    #[test]
    fn stereo_frame_payload_is_4097_bytes() {
        let sink = SharedSink::default();
        let mut encoder = stereo_encoder();
        encoder.write_header_to(sink.clone()).unwrap();

        let pcm = vec![0x11u8; 1024 * 2 * 2];
        encoder.encode_frame(&pcm, 1024).unwrap();

        let layout = obu_layout(&sink.0.borrow());
        assert_eq!(layout.len(), 5);
        assert_eq!(layout[4], (5, 4097));
        assert_eq!(encoder.sequence_number(), 1);
        assert_eq!(encoder.frames_encoded(), 1);
    }

    #[test]
    fn encode_before_header_is_invalid_state() {
        let mut encoder: IamfEncoder<SharedSink> = stereo_encoder();
        let err = encoder.encode_frame(&[0u8; 4], 1).unwrap_err();
        assert!(matches!(err, EncoderError::InvalidState(_)));
        assert!(!encoder.has_sink());
        assert_eq!(encoder.sequence_number(), 0);
        assert_eq!(encoder.bytes_written(), 0);
    }

    #[test]
    fn header_twice_is_invalid_state() {
        let sink = SharedSink::default();
        let mut encoder = stereo_encoder();
        encoder.write_header_to(sink.clone()).unwrap();
        let before = sink.0.borrow().len();

        let err = encoder.write_header_to(sink.clone()).unwrap_err();
        assert!(matches!(err, EncoderError::InvalidState(_)));
        assert_eq!(sink.0.borrow().len(), before);
    }

    #[test]
    fn mismatched_pcm_length_is_rejected_without_writing() {
        let sink = SharedSink::default();
        let mut encoder = stereo_encoder();
        encoder.write_header_to(sink.clone()).unwrap();
        let before = sink.0.borrow().len();

        let err = encoder.encode_frame(&[0u8; 10], 4).unwrap_err();
        assert!(matches!(err, EncoderError::InvalidArgument(_)));
        let err = encoder.encode_frame(&[], 0).unwrap_err();
        assert!(matches!(err, EncoderError::InvalidArgument(_)));

        assert_eq!(sink.0.borrow().len(), before);
        assert_eq!(encoder.sequence_number(), 0);
        assert!(encoder.state().is_header_written());
    }

    #[test]
    fn sequence_number_counts_successful_frames() {
        let sink = SharedSink::default();
        let mut encoder = stereo_encoder();
        encoder.write_header_to(sink.clone()).unwrap();

        for k in 1..=7u32 {
            encoder.encode_frame(&[0u8; 480 * 4], 480).unwrap();
            assert_eq!(encoder.sequence_number(), k);
        }
        let _ = encoder.encode_frame(&[0u8; 3], 1);
        assert_eq!(encoder.sequence_number(), 7);
        assert_eq!(encoder.samples_encoded(), 7 * 480);
    }

    #[test]
    fn io_failure_poisons_session() {
        let written = Rc::new(RefCell::new(0));
        let mut encoder = stereo_encoder();
        // Enough for the header OBUs, not for a frame.
        encoder
            .write_header_to(FailingSink {
                budget: 100,
                written: Rc::clone(&written),
            })
            .unwrap();

        let err = encoder.encode_frame(&[0u8; 64 * 4], 64).unwrap_err();
        assert!(matches!(err, EncoderError::Io(_)));
        assert!(matches!(encoder.state(), EncoderState::Failed(_)));
        assert_eq!(encoder.sequence_number(), 0);
        assert_eq!(encoder.frames_encoded(), 0);

        let err = encoder.encode_frame(&[0u8; 4], 1).unwrap_err();
        assert!(matches!(err, EncoderError::InvalidState(_)));
        assert!(matches!(encoder.finalize(), Err(EncoderError::InvalidState(_))));

        encoder.cleanup();
    }

    #[test]
    fn io_failure_during_header_poisons_session() {
        let mut encoder = stereo_encoder();
        let err = encoder
            .write_header_to(FailingSink {
                budget: 10,
                written: Rc::new(RefCell::new(0)),
            })
            .unwrap_err();
        assert!(matches!(err, EncoderError::Io(_)));
        assert!(matches!(encoder.state(), EncoderState::Failed(_)));
        assert!(encoder.state().is_terminal());
        assert!(!encoder.state().is_finalized());
    }

    #[test]
    fn finalize_requires_header_and_is_idempotent() {
        let mut encoder: IamfEncoder<SharedSink> = stereo_encoder();
        assert!(matches!(encoder.finalize(), Err(EncoderError::InvalidState(_))));

        encoder.write_header_to(SharedSink::default()).unwrap();
        let first = encoder.finalize().unwrap();
        assert!(!encoder.has_sink());
        assert_eq!(first.frames_encoded, 0);
        assert_eq!(first.checksum, None);

        let second = encoder.finalize().unwrap();
        assert_eq!(first, second);
        assert!(encoder.state().is_finalized());
        assert!(encoder.state().is_terminal());
        assert!(matches!(encoder.encode_frame(&[0u8; 4], 1), Err(EncoderError::InvalidState(_))));
        encoder.cleanup();
    }

    #[test]
    fn delegate_sees_lifecycle_in_order() {
        let delegate = Arc::new(RecordingDelegate::default());
        let mut encoder: IamfEncoder<SharedSink> = stereo_encoder();
        encoder.set_delegate(delegate.clone());

        encoder.write_header_to(SharedSink::default()).unwrap();
        encoder.encode_frame(&[0u8; 8], 2).unwrap();
        encoder.finalize().unwrap();
        encoder.cleanup();

        let events = delegate.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "state:header_written",
                "frame:0:2",
                "state:finalized",
                "finished:1",
                "state:closed",
            ]
        );
    }

    #[test]
    fn builder_reports_missing_config() {
        let err = IamfEncoder::builder()
            .audio_config(AudioConfig::default())
            .element_config(resolve("stereo").unwrap())
            .build()
            .err()
            .unwrap();
        assert_eq!(err, EncoderError::InvalidArgument("mix config is required".into()));
    }

    #[test]
    fn rejects_element_channel_mismatch() {
        let err = IamfEncoder::new(AudioConfig::default(), MixConfig::default(), resolve("5.1").unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, EncoderError::InvalidArgument(_)));
    }

    #[test]
    fn path_backed_session_writes_file_and_checksum() {
        let path = std::env::temp_dir().join("iamf_encoder_test_session.iamf");
        let mut encoder = IamfEncoder::new(AudioConfig::default(), MixConfig::default(), resolve("stereo").unwrap())
            .unwrap();
        encoder.write_header(&path).unwrap();
        encoder.encode_frame(&vec![0u8; 1024 * 4], 1024).unwrap();
        let summary = encoder.finalize().unwrap();
        let encoder_path = encoder.file_path().map(Path::to_path_buf);
        encoder.cleanup();

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len() as u64, summary.bytes_written);
        assert_eq!(summary.checksum.as_deref(), Some(checksum::sha256_bytes(&data).as_str()));
        assert_eq!(summary.file_path.as_deref(), Some(path.as_path()));
        assert_eq!(encoder_path.as_deref(), Some(path.as_path()));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn unopenable_path_is_io_error() {
        let path = std::env::temp_dir()
            .join("iamf_encoder_test_missing_dir")
            .join("nested")
            .join("out.iamf");
        let mut encoder = IamfEncoder::new(AudioConfig::default(), MixConfig::default(), resolve("stereo").unwrap())
            .unwrap();
        let err = encoder.write_header(&path).unwrap_err();
        assert!(matches!(err, EncoderError::Io(_)));
        encoder.cleanup();
    }
}
