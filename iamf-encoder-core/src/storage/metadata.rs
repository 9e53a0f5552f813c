use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::{EncoderError, Result};
use crate::models::summary::EncodeMetadata;

/// Sidecar path for a stream: `{stream_path}` with extension `metadata.json`.
pub fn metadata_path(stream_path: &Path) -> PathBuf {
    stream_path.with_extension("metadata.json")
}

/// Write encode metadata as a JSON sidecar file next to the stream.
pub fn write_metadata(metadata: &EncodeMetadata, stream_path: &Path) -> Result<PathBuf> {
    let path = metadata_path(stream_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| EncoderError::Io(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json).map_err(|e| EncoderError::Io(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read encode metadata from the JSON sidecar of a stream.
pub fn read_metadata(stream_path: &Path) -> Result<EncodeMetadata> {
    let path = metadata_path(stream_path);
    let json =
        fs::read_to_string(&path).map_err(|e| EncoderError::Io(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| EncoderError::MalformedStream(format!("failed to parse metadata: {}", e)))
}
