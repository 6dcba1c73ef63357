//! Résumé/job relevance analysis
//!
//! Staged pipeline that prefers a verdict from the remote completion
//! service and falls back to a deterministic heuristic verdict on any
//! failure:
//!
//! ```text
//! Started → ContextReady → ServiceCalled | ServiceFailed
//!         → ParsedOk | ParsedAbsent → Completed
//! ```
//!
//! Every path ends in `Completed` with a well-formed [`AnalysisVerdict`].
//! The verdict's `source` tells callers whether the model or the fallback
//! produced it.

pub mod completion;
pub mod context;
pub mod fallback;
pub mod parse;
pub mod pipeline;

pub use completion::{invoke_completion_service, CompletionBackend, CompletionService, HttpCompletionService};
pub use context::{prepare_context, AnalysisContext};
pub use fallback::{match_skills, mock_verdict, SkillMatch};
pub use parse::{parse_response_safe, VerdictData};
pub use pipeline::{build_analysis_result, AnalysisPipeline, PipelineState};

use crate::record::RecordId;
use serde::{Deserialize, Serialize};

/// Where a verdict came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    /// Parsed from the completion service's answer
    Completion,
    /// Heuristic verdict; lower confidence
    Fallback,
}

/// How much weight a caller should give a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Model judgement over the full résumé and job text
    High,
    /// Skill overlap and experience arithmetic only
    Low,
}

impl From<VerdictSource> for Confidence {
    fn from(source: VerdictSource) -> Self {
        match source {
            VerdictSource::Completion => Confidence::High,
            VerdictSource::Fallback => Confidence::Low,
        }
    }
}

/// Final analysis result for one (résumé, job) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisVerdict {
    pub resume_id: RecordId,
    pub job_id: RecordId,
    /// Overall relevance in `0.0..=1.0`
    pub relevance_score: f64,
    /// Same judgement as a percentage, `0.0..=100.0`
    pub job_match_percentage: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub analysis_text: String,
    pub source: VerdictSource,
    pub confidence: Confidence,
    /// Why the fallback was used, when it was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl AnalysisVerdict {
    pub fn is_fallback(&self) -> bool {
        self.source == VerdictSource::Fallback
    }
}
