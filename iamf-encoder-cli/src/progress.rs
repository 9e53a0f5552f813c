use parking_lot::Mutex;

use iamf_encoder_core::{EncodeSummary, EncoderDelegate, EncoderError, EncoderState};

/// Frames between progress log lines.
const REPORT_INTERVAL: u64 = 100;

#[derive(Default)]
struct Progress {
    frames: u64,
    samples: u64,
}

/// Logs encode progress from delegate callbacks.
pub struct ProgressDelegate {
    total_samples: Option<u64>,
    progress: Mutex<Progress>,
}

impl ProgressDelegate {
    pub fn new(total_samples: Option<u64>) -> Self {
        Self {
            total_samples,
            progress: Mutex::new(Progress::default()),
        }
    }
}

impl EncoderDelegate for ProgressDelegate {
    fn on_state_changed(&self, state: &EncoderState) {
        if state.is_terminal() {
            log::info!("encoder {}", state.name());
        } else {
            log::debug!("encoder state: {}", state.name());
        }
    }

    fn on_frame_encoded(&self, sequence_number: u32, sample_count: u32) {
        let mut progress = self.progress.lock();
        progress.frames += 1;
        progress.samples += sample_count as u64;
        if progress.frames % REPORT_INTERVAL != 0 {
            return;
        }
        match self.total_samples {
            Some(total) if total > 0 => log::info!(
                "frame {}: {:.1}% ({} / {} samples)",
                sequence_number,
                progress.samples as f64 * 100.0 / total as f64,
                progress.samples,
                total
            ),
            _ => log::info!("frame {}: {} samples", sequence_number, progress.samples),
        }
    }

    fn on_error(&self, error: &EncoderError) {
        log::error!("encoder failed: {}", error);
    }

    fn on_finished(&self, summary: &EncodeSummary) {
        log::info!(
            "finished: {} frames, {} bytes",
            summary.frames_encoded,
            summary.bytes_written
        );
    }
}
