use crate::models::error::EncoderError;
use crate::models::state::EncoderState;
use crate::models::summary::EncodeSummary;

/// Event delegate for encoder session notifications.
///
/// All methods are called synchronously from the thread driving the session,
/// between the sink write and the return of the triggering call.
pub trait EncoderDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &EncoderState);

    /// Called after an audio frame OBU has been fully written.
    fn on_frame_encoded(&self, sequence_number: u32, sample_count: u32);

    /// Called when an operation fails and poisons the session.
    fn on_error(&self, error: &EncoderError);

    /// Called once the stream is finalized and the sink closed.
    fn on_finished(&self, summary: &EncodeSummary);
}
