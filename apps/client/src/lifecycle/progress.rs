//! Progress model — named stage floors plus the simulated processing ramp.
//!
//! The backend returns one atomic response, so mid-flight progress is
//! client-simulated: fixed floors around the request's observable edges and
//! a time-interpolated ramp while the call is outstanding.

use std::time::Duration;

/// Cadence of the simulated-progress clock while the call is in flight.
pub const PROGRESS_TICK: Duration = Duration::from_millis(500);

/// Elapsed time at which the processing ramp reaches its ceiling.
pub const PROCESSING_RAMP: Duration = Duration::from_secs(45);

/// Hard deadline for the backend call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Pause between storing the result and showing 100%, so the bar visibly
/// lands on the pre-complete floor first.
pub const COMPLETE_DELAY: Duration = Duration::from_millis(300);

const PROCESSING_FLOOR: u8 = 20;
const PROCESSING_CEILING: u8 = 80;

/// Ordered checkpoints of one request's lifetime. Each maps to a percentage
/// floor; the emitted value never decreases within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Prepare,
    Send,
    SendComplete,
    Processing,
    ResponseReceived,
    Parsing,
    PreComplete,
    Complete,
}

impl ProgressStage {
    pub const fn floor(self) -> u8 {
        match self {
            ProgressStage::Prepare => 5,
            ProgressStage::Send => 10,
            ProgressStage::SendComplete => 20,
            ProgressStage::Processing => PROCESSING_FLOOR,
            ProgressStage::ResponseReceived => 85,
            ProgressStage::Parsing => 90,
            ProgressStage::PreComplete => 95,
            ProgressStage::Complete => 100,
        }
    }
}

/// Simulated progress during the network wait: floor + (elapsed / ramp) ×
/// span, clamped to the ceiling. Stays strictly below the terminal floors so
/// a late clock tick can never overwrite a post-response value.
pub fn processing_progress(elapsed: Duration) -> u8 {
    let span = (PROCESSING_CEILING - PROCESSING_FLOOR) as f64;
    let ratio = elapsed.as_secs_f64() / PROCESSING_RAMP.as_secs_f64();
    let value = PROCESSING_FLOOR as f64 + ratio * span;
    value.min(PROCESSING_CEILING as f64) as u8
}
