use super::error::EncoderError;

/// Encoder session state machine.
///
/// State transitions:
/// ```text
/// initialized → header_written ⟲ (encode_frame) → finalized → closed
///       ↓              ↓
///     closed     failed (I/O error) → closed
/// ```
///
/// A session value only exists once its configs have been accepted, so the
/// uninitialized state lives in [`EncoderBuilder`](crate::EncoderBuilder).
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderState {
    Initialized,
    HeaderWritten,
    Finalized,
    Closed,
    Failed(EncoderError),
}

impl EncoderState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized)
    }

    pub fn is_header_written(&self) -> bool {
        matches!(self, Self::HeaderWritten)
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// No further encoding is possible from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Closed | Self::Failed(_))
    }

    /// Lowercase name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::HeaderWritten => "header_written",
            Self::Finalized => "finalized",
            Self::Closed => "closed",
            Self::Failed(_) => "failed",
        }
    }
}
