//! Staged reveal — derives discrete presentation phases from lifecycle
//! snapshots, with fixed inter-phase delays.
//!
//! The sequencer owns no request state: it watches [`SessionSnapshot`]s and
//! publishes a [`RevealState`] of its own. Transitions are linear (Idle →
//! AgentsVisible → FinalVisible) and strictly forward within one request;
//! an epoch change resets to Idle and cancels any scheduled transition.

use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::debug;

use crate::lifecycle::{GenerationOutcome, SessionSnapshot};
use crate::models::AgentDraft;

/// Settle time before agent placeholders animate in.
pub const AGENTS_REVEAL_DELAY: Duration = Duration::from_millis(300);

/// Delay between a successful outcome and the final-card reveal.
pub const FINAL_REVEAL_DELAY: Duration = Duration::from_millis(600);

/// Presentation phase of the canvas. Forward-only within a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevealPhase {
    #[default]
    Idle,
    AgentsVisible,
    FinalVisible,
}

/// Read model for the presentation layer: the current phase plus the agent
/// drafts (empty until a result exists). Consumers derive "agent still
/// spinning" from `phase == AgentsVisible` and a non-succeeded outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealState {
    pub phase: RevealPhase,
    pub drafts: Vec<AgentDraft>,
}

/// Consumes controller snapshots and drives the reveal phases.
pub struct StagedRevealSequencer {
    rx: watch::Receiver<RevealState>,
    driver: JoinHandle<()>,
}

impl StagedRevealSequencer {
    pub fn spawn(snapshots: watch::Receiver<SessionSnapshot>) -> Self {
        let (tx, rx) = watch::channel(RevealState::default());
        let driver = tokio::spawn(drive(snapshots, tx));
        StagedRevealSequencer { rx, driver }
    }

    pub fn subscribe(&self) -> watch::Receiver<RevealState> {
        self.rx.clone()
    }

    pub fn current(&self) -> RevealState {
        self.rx.borrow().clone()
    }
}

impl Drop for StagedRevealSequencer {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Computes the transition the current (phase, outcome) pair calls for.
/// `(Idle, Succeeded)` still goes through AgentsVisible first — the phases
/// are strictly linear even when the backend settles before the first delay.
fn next_transition(
    phase: RevealPhase,
    outcome: &GenerationOutcome,
) -> Option<(Duration, RevealPhase)> {
    match (phase, outcome) {
        (RevealPhase::Idle, GenerationOutcome::Pending)
        | (RevealPhase::Idle, GenerationOutcome::Succeeded(_)) => {
            Some((AGENTS_REVEAL_DELAY, RevealPhase::AgentsVisible))
        }
        (RevealPhase::AgentsVisible, GenerationOutcome::Succeeded(_)) => {
            Some((FINAL_REVEAL_DELAY, RevealPhase::FinalVisible))
        }
        _ => None,
    }
}

/// Re-arms the scheduled transition. Only a CHANGED target restarts the
/// delay, so routine snapshot updates (progress ticks) never reset a
/// running timer.
fn rearm(
    target: &mut Option<RevealPhase>,
    delay: &mut Pin<Box<Sleep>>,
    phase: RevealPhase,
    outcome: &GenerationOutcome,
) {
    match next_transition(phase, outcome) {
        None => *target = None,
        Some((_, wanted)) if *target == Some(wanted) => {
            // Same target already scheduled; keep the running timer.
        }
        Some((duration, wanted)) => {
            *delay = Box::pin(tokio::time::sleep(duration));
            *target = Some(wanted);
        }
    }
}

async fn drive(mut snapshots: watch::Receiver<SessionSnapshot>, tx: watch::Sender<RevealState>) {
    let initial = snapshots.borrow().clone();
    let mut epoch = initial.epoch;
    let mut outcome = initial.outcome;
    let mut state = RevealState::default();
    let mut target: Option<RevealPhase> = None;
    let mut delay: Pin<Box<Sleep>> = Box::pin(tokio::time::sleep(Duration::ZERO));
    rearm(&mut target, &mut delay, state.phase, &outcome);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    // Controller dropped; nothing left to observe.
                    return;
                }
                let snapshot = snapshots.borrow_and_update().clone();

                if snapshot.epoch != epoch {
                    // New request supersedes everything scheduled so far.
                    debug!("Reveal reset: epoch {} -> {}", epoch, snapshot.epoch);
                    epoch = snapshot.epoch;
                    target = None;
                    state = RevealState::default();
                    tx.send_replace(state.clone());
                }

                if let GenerationOutcome::Succeeded(payload) = &snapshot.outcome {
                    if state.drafts.is_empty() {
                        state.drafts = payload.agent_drafts.clone();
                        tx.send_replace(state.clone());
                    }
                }

                outcome = snapshot.outcome;
                rearm(&mut target, &mut delay, state.phase, &outcome);
            }
            _ = delay.as_mut(), if target.is_some() => {
                let next = target.take().expect("guarded by is_some");
                debug!("Reveal phase {:?} -> {:?}", state.phase, next);
                state.phase = next;
                tx.send_replace(state.clone());
                rearm(&mut target, &mut delay, state.phase, &outcome);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::RESPONSE_FIXTURE;
    use crate::models::EmailGenerationResponse;
    use tokio::time::sleep;

    fn snapshot(epoch: u64, outcome: GenerationOutcome) -> SessionSnapshot {
        let is_generating = outcome.is_pending();
        SessionSnapshot {
            epoch,
            progress: 0,
            outcome,
            is_generating,
        }
    }

    fn succeeded() -> GenerationOutcome {
        let payload: EmailGenerationResponse = serde_json::from_str(RESPONSE_FIXTURE).unwrap();
        GenerationOutcome::Succeeded(Box::new(payload))
    }

    #[tokio::test(start_paused = true)]
    async fn test_agents_visible_fires_after_fixed_delay() {
        let (tx, rx) = watch::channel(snapshot(0, GenerationOutcome::Idle));
        let sequencer = StagedRevealSequencer::spawn(rx);

        tx.send_replace(snapshot(1, GenerationOutcome::Pending));
        sleep(Duration::from_millis(250)).await;
        assert_eq!(sequencer.current().phase, RevealPhase::Idle);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(sequencer.current().phase, RevealPhase::AgentsVisible);
        assert!(sequencer.current().drafts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_reveals_final_after_delay_with_drafts() {
        let (tx, rx) = watch::channel(snapshot(0, GenerationOutcome::Idle));
        let sequencer = StagedRevealSequencer::spawn(rx);

        tx.send_replace(snapshot(1, GenerationOutcome::Pending));
        sleep(Duration::from_millis(400)).await;
        assert_eq!(sequencer.current().phase, RevealPhase::AgentsVisible);

        tx.send_replace(snapshot(1, succeeded()));
        sleep(Duration::from_millis(500)).await;
        let mid = sequencer.current();
        assert_eq!(mid.phase, RevealPhase::AgentsVisible);
        assert_eq!(mid.drafts.len(), 3);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(sequencer.current().phase, RevealPhase::FinalVisible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_never_reaches_final_visible() {
        let (tx, rx) = watch::channel(snapshot(0, GenerationOutcome::Idle));
        let sequencer = StagedRevealSequencer::spawn(rx);

        tx.send_replace(snapshot(1, GenerationOutcome::Pending));
        sleep(Duration::from_millis(400)).await;
        assert_eq!(sequencer.current().phase, RevealPhase::AgentsVisible);

        tx.send_replace(snapshot(
            1,
            GenerationOutcome::Failed(crate::errors::LifecycleError::Timeout(120)),
        ));
        sleep(Duration::from_secs(10)).await;

        let state = sequencer.current();
        assert_eq!(state.phase, RevealPhase::AgentsVisible);
        assert!(state.drafts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_request_cancels_pending_transition() {
        let (tx, rx) = watch::channel(snapshot(0, GenerationOutcome::Idle));
        let sequencer = StagedRevealSequencer::spawn(rx);

        tx.send_replace(snapshot(1, GenerationOutcome::Pending));
        sleep(Duration::from_millis(100)).await;

        // Second request arrives before the first 300 ms delay fires.
        tx.send_replace(snapshot(2, GenerationOutcome::Pending));
        sleep(Duration::from_millis(250)).await; // 350 ms since the first
        assert_eq!(sequencer.current().phase, RevealPhase::Idle);

        sleep(Duration::from_millis(100)).await; // 350 ms since the second
        assert_eq!(sequencer.current().phase, RevealPhase::AgentsVisible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_request_after_success_resets_to_idle() {
        let (tx, rx) = watch::channel(snapshot(0, GenerationOutcome::Idle));
        let sequencer = StagedRevealSequencer::spawn(rx);

        tx.send_replace(snapshot(1, GenerationOutcome::Pending));
        sleep(Duration::from_millis(400)).await;
        tx.send_replace(snapshot(1, succeeded()));
        sleep(Duration::from_millis(700)).await;
        assert_eq!(sequencer.current().phase, RevealPhase::FinalVisible);

        tx.send_replace(snapshot(2, GenerationOutcome::Pending));
        sleep(Duration::from_millis(50)).await;
        let reset = sequencer.current();
        assert_eq!(reset.phase, RevealPhase::Idle);
        assert!(reset.drafts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_updates_do_not_restart_the_delay() {
        let (tx, rx) = watch::channel(snapshot(0, GenerationOutcome::Idle));
        let sequencer = StagedRevealSequencer::spawn(rx);

        tx.send_replace(snapshot(1, GenerationOutcome::Pending));
        // Simulated-progress publications arrive more often than the delay.
        for progress in [5u8, 10, 20] {
            sleep(Duration::from_millis(90)).await;
            tx.send_replace(SessionSnapshot {
                epoch: 1,
                progress,
                outcome: GenerationOutcome::Pending,
                is_generating: true,
            });
        }
        sleep(Duration::from_millis(40)).await; // 310 ms after Pending
        assert_eq!(sequencer.current().phase, RevealPhase::AgentsVisible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_success_still_passes_through_agents_phase() {
        let (tx, rx) = watch::channel(snapshot(0, GenerationOutcome::Idle));
        let sequencer = StagedRevealSequencer::spawn(rx);

        tx.send_replace(snapshot(1, GenerationOutcome::Pending));
        sleep(Duration::from_millis(100)).await;
        tx.send_replace(snapshot(1, succeeded()));

        sleep(Duration::from_millis(150)).await; // 250 ms after Pending
        assert_eq!(sequencer.current().phase, RevealPhase::Idle);

        sleep(Duration::from_millis(100)).await; // past the 300 ms mark
        assert_eq!(sequencer.current().phase, RevealPhase::AgentsVisible);

        sleep(Duration::from_millis(650)).await;
        assert_eq!(sequencer.current().phase, RevealPhase::FinalVisible);
    }
}
