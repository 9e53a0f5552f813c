//! End-to-end encode: PCM source → encoder session → `.iamf` file.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::layout::format_table;
use crate::models::config::{AudioConfig, MixConfig};
use crate::models::error::{EncoderError, Result};
use crate::models::summary::{EncodeMetadata, EncodeSummary};
use crate::session::encoder::IamfEncoder;
use crate::storage::metadata;
use crate::traits::encoder_delegate::EncoderDelegate;
use crate::traits::pcm_source::PcmSource;

/// Options for [`encode_source`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOptions {
    /// Write to `{output}.partial` and rename once finalized, so the output
    /// path only ever holds a complete stream.
    pub atomic: bool,

    /// Write a `.metadata.json` sidecar next to the output.
    pub write_metadata: bool,

    /// Overrides the recommended mix presentation.
    pub mix: Option<MixConfig>,

    /// Overrides the recommended frame duration.
    pub frame_duration_ms: Option<u32>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            write_metadata: false,
            mix: None,
            frame_duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub summary: EncodeSummary,
    pub metadata_path: Option<PathBuf>,
}

/// Path used for the in-progress stream of an atomic encode.
pub fn partial_path(output_path: &Path) -> PathBuf {
    let mut name = OsString::from(output_path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

/// Drain `source` into a new IAMF file at `output_path`.
///
/// The source must already deliver the channel layout of `format_name`; the
/// sample rate and bit depth are taken from the source.
pub fn encode_source<S: PcmSource + ?Sized>(
    source: &mut S,
    format_name: &str,
    output_path: &Path,
    options: &WorkflowOptions,
    delegate: Option<Arc<dyn EncoderDelegate>>,
) -> Result<WorkflowResult> {
    let recommended = format_table::recommended_config(format_name)?;
    let expected_channels = recommended.element.channel_count();
    if source.channel_count() != expected_channels {
        return Err(EncoderError::InvalidArgument(format!(
            "source delivers {} channels but format {} expects {}",
            source.channel_count(),
            format_name,
            expected_channels
        )));
    }

    let audio = AudioConfig {
        sample_rate: source.sample_rate(),
        channel_count: expected_channels,
        bit_depth: source.bit_depth(),
        frame_duration_ms: options
            .frame_duration_ms
            .unwrap_or(recommended.audio.frame_duration_ms),
    };
    let mix = options.mix.unwrap_or(recommended.mix);

    let mut builder = IamfEncoder::builder()
        .audio_config(audio)
        .mix_config(mix)
        .element_config(recommended.element);
    if let Some(delegate) = delegate {
        builder = builder.delegate(delegate);
    }
    let mut encoder = builder.build()?;

    let target = if options.atomic {
        partial_path(output_path)
    } else {
        output_path.to_path_buf()
    };

    log::info!(
        "encoding {} source ({} Hz, {} bit) to {}",
        format_name,
        audio.sample_rate,
        audio.bit_depth,
        output_path.display()
    );

    let mut summary = match drain(&mut encoder, source, &target) {
        Ok(summary) => summary,
        Err(err) => {
            encoder.cleanup();
            if options.atomic {
                fs::remove_file(&target).ok();
            }
            return Err(err);
        }
    };
    encoder.cleanup();

    if options.atomic {
        fs::rename(&target, output_path).map_err(|e| {
            fs::remove_file(&target).ok();
            EncoderError::Io(format!("failed to move stream into {}: {}", output_path.display(), e))
        })?;
        summary.file_path = Some(output_path.to_path_buf());
    }

    let metadata_path = if options.write_metadata {
        let record = EncodeMetadata::new(format_name, audio, recommended.element, mix, &summary);
        Some(metadata::write_metadata(&record, output_path)?)
    } else {
        None
    };

    Ok(WorkflowResult { summary, metadata_path })
}

fn drain<S: PcmSource + ?Sized>(encoder: &mut IamfEncoder, source: &mut S, target: &Path) -> Result<EncodeSummary> {
    encoder.write_header(target)?;

    let samples_per_frame = encoder.audio_config().samples_per_frame().max(1);
    let mut buf = Vec::new();
    loop {
        let samples = source.read_samples(samples_per_frame, &mut buf)?;
        if samples == 0 {
            break;
        }
        encoder.encode_frame(&buf, samples)?;
    }

    encoder.finalize()
}
