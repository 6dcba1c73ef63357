//! Completion response parsing
//!
//! Models wrap JSON in prose or code fences often enough that a bad answer
//! is expected, not exceptional: parsing yields `None` instead of an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Structured verdict fields extracted from a completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictData {
    /// `0.0..=1.0`
    pub relevance_score: f64,
    /// `0.0..=100.0`
    pub job_match_percentage: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub analysis_text: String,
}

#[derive(Deserialize)]
struct RawVerdict {
    relevance_score: f64,
    #[serde(default)]
    job_match_percentage: Option<f64>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    analysis_text: String,
}

/// Extract the outermost `{...}` span and decode it.
///
/// `relevance_score` and `analysis_text` are required. A relevance score
/// above 1 is read as a percentage, but only when it agrees with
/// `job_match_percentage` (or that is absent); otherwise the answer is
/// rejected. A missing percentage is derived from the score.
pub fn parse_response_safe(raw: &str) -> Option<VerdictData> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let parsed: RawVerdict = match serde_json::from_str(&raw[start..=end]) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "completion is not a verdict object");
            return None;
        }
    };

    let percentage = match parsed.job_match_percentage {
        Some(p) if p.is_finite() => Some(p.clamp(0.0, 100.0)),
        Some(_) => return None,
        None => None,
    };
    let relevance_score = normalize_score(parsed.relevance_score, percentage)?;
    let job_match_percentage = percentage.unwrap_or(relevance_score * 100.0);

    Some(VerdictData {
        relevance_score,
        job_match_percentage,
        strengths: parsed.strengths,
        weaknesses: parsed.weaknesses,
        recommendations: parsed.recommendations,
        analysis_text: parsed.analysis_text,
    })
}

/// Largest gap, in percentage points, between a percent-scale relevance
/// score and `job_match_percentage` that still counts as agreement.
const SCALE_TOLERANCE: f64 = 10.0;

fn normalize_score(score: f64, percentage: Option<f64>) -> Option<f64> {
    if !score.is_finite() {
        return None;
    }
    if score > 1.0 && score <= 100.0 {
        if let Some(p) = percentage {
            if (score - p).abs() > SCALE_TOLERANCE {
                debug!(score, percentage = p, "relevance score contradicts match percentage");
                return None;
            }
        }
        return Some(score / 100.0);
    }
    Some(score.clamp(0.0, 1.0))
}
