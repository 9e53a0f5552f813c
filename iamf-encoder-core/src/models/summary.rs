use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::{AudioConfig, ElementConfig, MixConfig};

/// Returned by [`IamfEncoder::finalize`](crate::IamfEncoder::finalize).
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSummary {
    /// `None` when the session wrote to a caller-supplied sink.
    pub file_path: Option<PathBuf>,
    pub frames_encoded: u64,
    pub samples_encoded: u64,
    /// Every byte emitted, OBU headers included.
    pub bytes_written: u64,
    pub duration_secs: f64,
    /// SHA-256 hex digest of the finished file (path-backed sessions only).
    pub checksum: Option<String>,
}

/// Sidecar metadata describing a produced `.iamf` file.
///
/// Serializable for JSON export next to the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub format_name: String,
    pub audio: AudioConfig,
    pub element: ElementConfig,
    pub mix: MixConfig,
    pub frames_encoded: u64,
    pub duration_secs: f64,
    pub bytes_written: u64,
    pub checksum: Option<String>,
}

impl EncodeMetadata {
    pub fn new(
        format_name: &str,
        audio: AudioConfig,
        element: ElementConfig,
        mix: MixConfig,
        summary: &EncodeSummary,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: summary
                .file_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            format_name: format_name.to_string(),
            audio,
            element,
            mix,
            frames_encoded: summary.frames_encoded,
            duration_secs: summary.duration_secs,
            bytes_written: summary.bytes_written,
            checksum: summary.checksum.clone(),
        }
    }
}
