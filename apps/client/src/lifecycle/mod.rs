//! Request lifecycle — owns the form state, the single in-flight backend
//! call, the simulated-progress clock, and the outcome exposed to observers.
//!
//! Flow: validate → submit → progress floors + processing ramp → settle →
//!       decode → staged completion. Failures reset progress to 0 and leave
//!       the session immediately resubmittable.
//!
//! Concurrency discipline: every scheduled continuation (network settle,
//! clock tick, completion delay) is keyed by the session epoch taken at
//! submit time. `submit()` and `clear()` bump the epoch, so a callback from
//! a superseded request observes a mismatch and is discarded without
//! mutating anything.

pub mod progress;

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::errors::{LifecycleError, Notice};
use crate::models::{BackendErrorBody, EmailGenerationResponse};
use crate::transport::{GenerateApi, RawResponse, ResumeFile};

use progress::{ProgressStage, COMPLETE_DELAY, PROGRESS_TICK, REQUEST_TIMEOUT};

/// Resume size cap enforced client-side.
/// NOTE: backend docs state 5 MiB for the same field; 20 MiB matches the
/// current UI behavior. Tracked as a product decision, not a guess.
pub const MAX_RESUME_BYTES: usize = 20 * 1024 * 1024;

/// The only two media types the backend parser accepts.
pub const ACCEPTED_RESUME_TYPES: [&str; 2] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

// ────────────────────────────────────────────────────────────────────────────
// Observable state
// ────────────────────────────────────────────────────────────────────────────

/// Result of the current (or last) request. Exactly one instance is live; a
/// new submission replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GenerationOutcome {
    /// No request submitted yet, or state was cleared.
    #[default]
    Idle,
    Pending,
    Succeeded(Box<EmailGenerationResponse>),
    Failed(LifecycleError),
}

impl GenerationOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, GenerationOutcome::Pending)
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, GenerationOutcome::Succeeded(_))
    }
}

/// Immutable view of the session published to observers on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Request generation counter. Changes exactly when a new request starts
    /// or the session is cleared; consumers use it to cancel stale work.
    pub epoch: u64,
    /// 0–100, monotonically non-decreasing within one request.
    pub progress: u8,
    pub outcome: GenerationOutcome,
    pub is_generating: bool,
}

impl SessionSnapshot {
    fn initial() -> Self {
        SessionSnapshot {
            epoch: 0,
            progress: 0,
            outcome: GenerationOutcome::Idle,
            is_generating: false,
        }
    }
}

struct SessionState {
    job_url: String,
    resume: Option<ResumeFile>,
    progress: u8,
    outcome: GenerationOutcome,
    epoch: u64,
}

impl SessionState {
    fn initial() -> Self {
        SessionState {
            job_url: String::new(),
            resume: None,
            progress: 0,
            outcome: GenerationOutcome::Idle,
            epoch: 0,
        }
    }
}

struct Shared {
    state: Mutex<SessionState>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    notice_tx: mpsc::UnboundedSender<Notice>,
}

impl Shared {
    fn publish(&self, state: &SessionState) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            epoch: state.epoch,
            progress: state.progress,
            outcome: state.outcome.clone(),
            is_generating: state.outcome.is_pending(),
        });
    }

    fn notify(&self, notice: Notice) {
        // The embedder may have dropped the receiver; notices are best-effort.
        let _ = self.notice_tx.send(notice);
    }

    /// Raises progress to the stage floor if this epoch is still the live
    /// pending request. Returns false when the continuation is stale.
    fn advance_stage(&self, epoch: u64, stage: ProgressStage) -> bool {
        let mut state = self.state.lock().expect("session lock poisoned");
        if state.epoch != epoch || !state.outcome.is_pending() {
            return false;
        }
        let floor = stage.floor();
        if floor > state.progress {
            debug!("Progress stage {:?} -> {}%", stage, floor);
            state.progress = floor;
            self.publish(&state);
        }
        true
    }

    /// Terminal failure: progress back to 0, outcome replaced, notice sent.
    /// A stale epoch is discarded with no observable effect.
    fn fail(&self, epoch: u64, error: LifecycleError) {
        let notice = {
            let mut state = self.state.lock().expect("session lock poisoned");
            if state.epoch != epoch || !state.outcome.is_pending() {
                debug!("Discarding stale failure for epoch {epoch}: {error}");
                return;
            }
            warn!("Generation failed: {error}");
            state.progress = 0;
            state.outcome = GenerationOutcome::Failed(error.clone());
            self.publish(&state);
            error.notice()
        };
        self.notify(notice);
    }

    /// Stores the decoded payload at the pre-complete floor. The jump to
    /// 100% happens after [`COMPLETE_DELAY`] in [`finish`](Self::finish).
    fn succeed(&self, epoch: u64, payload: EmailGenerationResponse) -> bool {
        let mut state = self.state.lock().expect("session lock poisoned");
        if state.epoch != epoch || !state.outcome.is_pending() {
            return false;
        }
        state.progress = state.progress.max(ProgressStage::PreComplete.floor());
        state.outcome = GenerationOutcome::Succeeded(Box::new(payload));
        self.publish(&state);
        true
    }

    fn finish(&self, epoch: u64) {
        {
            let mut state = self.state.lock().expect("session lock poisoned");
            if state.epoch != epoch || !state.outcome.is_succeeded() {
                return;
            }
            state.progress = state.progress.max(ProgressStage::Complete.floor());
            self.publish(&state);
        }
        info!("Email generation complete");
        self.notify(Notice::success(
            "Email generated",
            "All agent drafts are in and the final email is ready.",
        ));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

/// Owns one generation session at a time: form fields, outcome, progress.
/// Observers subscribe to [`SessionSnapshot`] updates; the embedding page
/// receives [`Notice`]s on the channel returned by [`new`](Self::new).
pub struct RequestLifecycleController {
    shared: Arc<Shared>,
    api: Arc<dyn GenerateApi>,
}

impl RequestLifecycleController {
    pub fn new(api: Arc<dyn GenerateApi>) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::initial());
        let controller = RequestLifecycleController {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::initial()),
                snapshot_tx,
                notice_tx,
            }),
            api,
        };
        (controller, notice_rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    pub fn is_generating(&self) -> bool {
        self.snapshot().is_generating
    }

    pub fn job_url(&self) -> String {
        self.shared
            .state
            .lock()
            .expect("session lock poisoned")
            .job_url
            .clone()
    }

    pub fn resume(&self) -> Option<ResumeFile> {
        self.shared
            .state
            .lock()
            .expect("session lock poisoned")
            .resume
            .clone()
    }

    pub fn set_job_url(&self, value: impl Into<String>) {
        let mut state = self.shared.state.lock().expect("session lock poisoned");
        state.job_url = value.into();
    }

    /// Attaches a resume file. Rejects anything that is not a PDF/DOCX under
    /// the size cap; rejection leaves the previously attached file in place
    /// and emits a failure notice.
    pub fn set_resume(&self, file: ResumeFile) -> Result<(), LifecycleError> {
        if !ACCEPTED_RESUME_TYPES.contains(&file.content_type.as_str()) {
            let err = LifecycleError::InvalidDocument(format!(
                "Unsupported file type '{}'. Upload a PDF or DOCX resume.",
                file.content_type
            ));
            self.shared.notify(err.notice());
            return Err(err);
        }
        if file.size() > MAX_RESUME_BYTES {
            let err = LifecycleError::InvalidDocument(format!(
                "Resume is larger than the {} MiB limit.",
                MAX_RESUME_BYTES / (1024 * 1024)
            ));
            self.shared.notify(err.notice());
            return Err(err);
        }

        let mut state = self.shared.state.lock().expect("session lock poisoned");
        state.resume = Some(file);
        Ok(())
    }

    /// Starts a generation request. Requires both inputs; `MissingInput` is
    /// surfaced before any network activity. A call while a request is
    /// already pending is ignored — callers are expected to gate on
    /// [`is_generating`](Self::is_generating).
    pub fn submit(&self) -> Result<(), LifecycleError> {
        let (epoch, job_url, resume) = {
            let mut state = self.shared.state.lock().expect("session lock poisoned");
            if state.outcome.is_pending() {
                warn!("submit() called while a request is already in flight; ignoring");
                return Ok(());
            }

            let job_url = state.job_url.trim().to_string();
            let resume = match state.resume.clone() {
                Some(file) if !job_url.is_empty() => file,
                _ => {
                    let err = LifecycleError::MissingInput(
                        "Provide a job posting URL and attach your resume.".to_string(),
                    );
                    self.shared.notify(err.notice());
                    return Err(err);
                }
            };

            state.epoch += 1;
            state.progress = 0;
            state.outcome = GenerationOutcome::Pending;
            self.shared.publish(&state);
            (state.epoch, job_url, resume)
        };

        info!("Starting email generation (epoch {epoch}) for {job_url}");
        let shared = self.shared.clone();
        let api = self.api.clone();
        tokio::spawn(run_generation(shared, api, epoch, job_url, resume));
        Ok(())
    }

    /// Resets everything to initial values. Safe mid-flight: bumping the
    /// epoch turns the in-flight call's eventual settlement into a no-op.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock().expect("session lock poisoned");
        state.epoch += 1;
        state.job_url.clear();
        state.resume = None;
        state.progress = 0;
        state.outcome = GenerationOutcome::Idle;
        self.shared.publish(&state);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-flight task
// ────────────────────────────────────────────────────────────────────────────

async fn run_generation(
    shared: Arc<Shared>,
    api: Arc<dyn GenerateApi>,
    epoch: u64,
    job_url: String,
    resume: ResumeFile,
) {
    if !shared.advance_stage(epoch, ProgressStage::Prepare) {
        return;
    }
    // The multipart payload is the (job_url, resume) pair captured at submit;
    // the transport encodes the form itself.
    if !shared.advance_stage(epoch, ProgressStage::Send) {
        return;
    }

    let call = tokio::time::timeout(REQUEST_TIMEOUT, api.generate_email(&job_url, &resume));

    if !shared.advance_stage(epoch, ProgressStage::SendComplete) {
        return;
    }
    let clock = tokio::spawn(progress_clock(shared.clone(), epoch));

    let settled = call.await;

    // Stop the clock before any terminal floor is applied. A tick already
    // past its await point is harmless: the ramp ceiling (80) sits below
    // every terminal floor and progress only moves up.
    clock.abort();

    match settled {
        Err(_elapsed) => {
            shared.fail(epoch, LifecycleError::Timeout(REQUEST_TIMEOUT.as_secs()));
        }
        Ok(Err(transport_err)) => {
            shared.fail(
                epoch,
                LifecycleError::NetworkFailure(transport_err.to_string()),
            );
        }
        Ok(Ok(raw)) => {
            if !shared.advance_stage(epoch, ProgressStage::ResponseReceived) {
                return;
            }
            if !raw.is_success() {
                shared.fail(epoch, server_error(&raw));
                return;
            }
            if !shared.advance_stage(epoch, ProgressStage::Parsing) {
                return;
            }
            match serde_json::from_slice::<EmailGenerationResponse>(&raw.body) {
                Err(decode_err) => {
                    shared.fail(epoch, LifecycleError::DecodeFailure(decode_err.to_string()));
                }
                Ok(payload) => {
                    debug!(
                        "Decoded response {} with {} drafts",
                        payload.request_id,
                        payload.agent_drafts.len()
                    );
                    if !shared.succeed(epoch, payload) {
                        return;
                    }
                    tokio::time::sleep(COMPLETE_DELAY).await;
                    shared.finish(epoch);
                }
            }
        }
    }
}

/// Maps a non-2xx settle to `ServerError`, preferring the backend's error
/// envelope `detail` when the body carries one.
fn server_error(raw: &RawResponse) -> LifecycleError {
    let detail = serde_json::from_slice::<BackendErrorBody>(&raw.body)
        .map(|body| body.detail)
        .unwrap_or_else(|_| format!("The server returned status {}.", raw.status));
    LifecycleError::ServerError {
        status: raw.status,
        detail,
    }
}

/// Recurring clock that interpolates the processing ramp while the call is
/// outstanding. Exits on its own when the epoch is superseded or the request
/// leaves `Pending`; the spawner additionally aborts it on settle.
async fn progress_clock(shared: Arc<Shared>, epoch: u64) {
    let started = tokio::time::Instant::now();
    let mut ticker = tokio::time::interval(PROGRESS_TICK);
    loop {
        ticker.tick().await;
        let mut state = shared.state.lock().expect("session lock poisoned");
        if state.epoch != epoch || !state.outcome.is_pending() {
            return;
        }
        let simulated = progress::processing_progress(started.elapsed());
        if simulated > state.progress {
            state.progress = simulated;
            shared.publish(&state);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
