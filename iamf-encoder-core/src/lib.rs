//! # iamf-encoder-core
//!
//! Writes interleaved integer PCM into an IAMF (Immersive Audio Model and
//! Formats) container: a sequence of OBUs carrying a sequence header, codec
//! config, audio element and mix presentation, followed by one audio frame per
//! encoded chunk. The codec is uncompressed little-endian PCM (`ipcm`).
//!
//! Also reads such streams back, which the inspector and tests rely on.
//!
//! ## Architecture
//!
//! ```text
//! iamf-encoder-core (this crate)
//! ├── bitstream/   ← LEB128, Q7.8 fixed point, OBU framing, stream reader
//! ├── layout/      ← format-name table, loudspeaker/sound-system codes
//! ├── models/      ← EncoderError, EncoderState, AudioConfig, MixConfig, ElementConfig, summaries
//! ├── session/     ← IamfEncoder (stateful session), payload builders, encode_source workflow
//! ├── sources/     ← PCM sources: WAV files, in-memory buffers
//! ├── storage/     ← SHA-256 checksums, JSON metadata sidecar
//! └── traits/      ← EncoderDelegate, PcmSource
//! ```

pub mod bitstream;
pub mod layout;
pub mod models;
pub mod session;
pub mod sources;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use bitstream::obu::ObuType;
pub use bitstream::reader::{inspect_file, parse_stream, read_file, Obu, ObuReader, ParsedStream, StreamInfo};
pub use layout::codes::{LayoutType, LoudspeakerLayout, SoundSystem};
pub use layout::format_table::{
    channel_count_for, recommended_config, resolve, supported_formats, FormatDescriptor, RecommendedConfig,
};
pub use models::config::{AudioConfig, ElementConfig, MixConfig};
pub use models::error::{EncoderError, Result};
pub use models::state::EncoderState;
pub use models::summary::{EncodeMetadata, EncodeSummary};
pub use session::encoder::{EncoderBuilder, IamfEncoder};
pub use session::workflow::{encode_source, WorkflowOptions, WorkflowResult};
pub use sources::memory::MemorySource;
pub use sources::wav::{write_wav, WavSource};
pub use traits::encoder_delegate::EncoderDelegate;
pub use traits::pcm_source::PcmSource;
