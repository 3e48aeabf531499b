//! Wire types for the `/generate-email` response payload.
//!
//! These mirror the backend contract exactly; the client consumes them but
//! never constructs them (except in tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Layout slot for an agent card. Purely presentational — carries no
/// ordering semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotPosition {
    Left,
    Center,
    Right,
}

/// Backend-reported stage status, for both individual drafts and the
/// overall response. Read-only signal; the client never computes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Complete,
    Processing,
    Failed,
}

/// Visual styling hints for a card (branch color, slot, icon).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiMetadata {
    /// Hex color code for the branch curve.
    pub color: String,
    pub position: SlotPosition,
    pub emoji: String,
}

/// Per-draft generation metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub word_count: u32,
    pub generation_time_ms: u64,
    pub temperature: f32,
}

/// Aggregator performance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationMetadata {
    pub word_count: u32,
    pub generation_time_ms: u64,
    /// Quality score out of 10.
    pub quality_score: f32,
}

/// Job posting metadata extracted by the backend crawler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Attribution of final email sections to source agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub subject: String,
    pub opening: String,
    pub body: String,
    pub closing: String,
}

/// One agent's generated draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub agent_name: String,
    pub model: String,
    pub draft: String,
    pub status: StageStatus,
    pub metadata: AgentMetadata,
    /// The backend serializes this key misspelled as `ui_metdata`; accept
    /// the corrected spelling too in case it is ever fixed server-side.
    #[serde(rename = "ui_metdata", alias = "ui_metadata")]
    pub ui_metadata: UiMetadata,
}

/// Final synthesized email from the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub final_email: String,
    /// Explanation of synthesis decisions. May itself contain reasoning
    /// markup or a fenced JSON answer — see the `extract` module.
    pub reasoning: String,
    #[serde(default)]
    pub source_breakdown: Option<SourceBreakdown>,
    pub metadata: AggregationMetadata,
    pub ui_metadata: UiMetadata,
}

/// Echo of the original inputs, for transparency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputContext {
    pub resume_text: String,
    pub job_description: String,
    pub job_url: String,
    pub job_metadata: JobMetadata,
}

/// Complete response for one email generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailGenerationResponse {
    pub request_id: Uuid,
    pub status: StageStatus,
    pub created_at: DateTime<Utc>,
    pub inputs: InputContext,
    /// Always exactly three drafts in the current backend.
    pub agent_drafts: Vec<AgentDraft>,
    pub aggregation: AggregationResult,
}

/// Error envelope returned by the backend on 5xx responses. Only `detail`
/// is surfaced to the user.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendErrorBody {
    pub detail: String,
    #[serde(default)]
    pub error_id: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A full backend response fixture, matching the wire format verbatim
    /// (including the `ui_metdata` typo on agent drafts).
    pub(crate) const RESPONSE_FIXTURE: &str = r##"{
        "request_id": "3f0b8a4e-6c2d-4c8e-9a1b-2f3d4e5a6b7c",
        "status": "complete",
        "created_at": "2025-11-02T10:15:30Z",
        "inputs": {
            "resume_text": "Senior engineer, 8 years Rust.",
            "job_description": "We are hiring a platform engineer.",
            "job_url": "https://jobs.example.com/platform-engineer",
            "job_metadata": {
                "title": "Platform Engineer",
                "company": "Example Corp",
                "location": "Remote"
            }
        },
        "agent_drafts": [
            {
                "agent_name": "kimi",
                "model": "moonshotai/kimi-k2-instruct",
                "draft": "Dear hiring team, ...",
                "status": "complete",
                "metadata": {"word_count": 182, "generation_time_ms": 2140, "temperature": 0.7},
                "ui_metdata": {"color": "#FF6B6B", "position": "left", "emoji": "K"}
            },
            {
                "agent_name": "qwen",
                "model": "qwen/qwen3-32b",
                "draft": "Hello, I came across your posting ...",
                "status": "complete",
                "metadata": {"word_count": 164, "generation_time_ms": 1890, "temperature": 0.5},
                "ui_metdata": {"color": "#4ECDC4", "position": "center", "emoji": "Q"}
            },
            {
                "agent_name": "openai_oss",
                "model": "openai/gpt-oss-120b",
                "draft": "Hi, I'm reaching out about ...",
                "status": "complete",
                "metadata": {"word_count": 201, "generation_time_ms": 2410, "temperature": 0.9},
                "ui_metdata": {"color": "#95E1D3", "position": "right", "emoji": "O"}
            }
        ],
        "aggregation": {
            "final_email": "Dear hiring team, I am excited to apply ...",
            "reasoning": "Kimi's opening was the strongest; Qwen contributed the body.",
            "source_breakdown": {
                "subject": "kimi",
                "opening": "kimi",
                "body": "qwen",
                "closing": "openai_oss"
            },
            "metadata": {"word_count": 190, "generation_time_ms": 3120, "quality_score": 8.5},
            "ui_metadata": {"color": "#C0C0C0", "position": "center", "emoji": "D"}
        }
    }"##;

    #[test]
    fn test_full_response_deserializes() {
        let response: EmailGenerationResponse = serde_json::from_str(RESPONSE_FIXTURE).unwrap();
        assert_eq!(response.status, StageStatus::Complete);
        assert_eq!(response.agent_drafts.len(), 3);
        assert_eq!(response.agent_drafts[0].agent_name, "kimi");
        assert_eq!(response.agent_drafts[1].ui_metadata.position, SlotPosition::Center);
        assert_eq!(response.aggregation.metadata.quality_score, 8.5);
        assert_eq!(
            response.aggregation.source_breakdown.as_ref().unwrap().body,
            "qwen"
        );
        assert_eq!(response.inputs.job_metadata.company, "Example Corp");
    }

    #[test]
    fn test_agent_draft_accepts_corrected_ui_metadata_key() {
        let json = r##"{
            "agent_name": "kimi",
            "model": "moonshotai/kimi-k2-instruct",
            "draft": "Hello",
            "status": "processing",
            "metadata": {"word_count": 1, "generation_time_ms": 10, "temperature": 0.7},
            "ui_metadata": {"color": "#FF6B6B", "position": "left", "emoji": "K"}
        }"##;
        let draft: AgentDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.status, StageStatus::Processing);
        assert_eq!(draft.ui_metadata.position, SlotPosition::Left);
    }

    #[test]
    fn test_slot_position_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&SlotPosition::Right).unwrap(), r#""right""#);
        let pos: SlotPosition = serde_json::from_str(r#""center""#).unwrap();
        assert_eq!(pos, SlotPosition::Center);
    }

    #[test]
    fn test_backend_error_body_deserializes() {
        let json = r#"{"detail": "An unexpected error occurred.", "error_id": "err_a1b2c3d4"}"#;
        let body: BackendErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.detail, "An unexpected error occurred.");
        assert_eq!(body.error_id.as_deref(), Some("err_a1b2c3d4"));
    }
}
