//! Client core for the multi-agent cold-email generator.
//!
//! The backend fans a job posting and resume out to several LLM agents and
//! returns one atomic aggregated response. This crate owns everything with
//! temporal logic on the client side of that call:
//!
//! - [`lifecycle::RequestLifecycleController`] — input validation, the
//!   single in-flight request, simulated progress, timeout, decoding.
//! - [`reveal::StagedRevealSequencer`] — delayed presentation phases derived
//!   from lifecycle snapshots.
//! - [`extract`] — pure normalization of raw model text for display.
//!
//! Rendering, clipboard, and toast delivery live in the embedding page.
//!
//! ```no_run
//! use std::sync::Arc;
//! use coldmail_client::{Config, HttpGenerateApi, RequestLifecycleController, StagedRevealSequencer};
//!
//! # async fn wire_up() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let api = Arc::new(HttpGenerateApi::new(&config));
//! let (controller, _notices) = RequestLifecycleController::new(api);
//! let reveal = StagedRevealSequencer::spawn(controller.subscribe());
//! # let _ = reveal;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod extract;
pub mod lifecycle;
pub mod models;
pub mod reveal;
pub mod transport;

pub use config::Config;
pub use errors::{LifecycleError, Notice, NoticeKind};
pub use extract::{recover_structured_answer, strip_reasoning_markup, StructuredAnswer};
pub use lifecycle::{GenerationOutcome, RequestLifecycleController, SessionSnapshot};
pub use models::{AgentDraft, EmailGenerationResponse, SlotPosition, StageStatus};
pub use reveal::{RevealPhase, RevealState, StagedRevealSequencer};
pub use transport::{GenerateApi, HttpGenerateApi, ResumeFile};
