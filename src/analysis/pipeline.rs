//! Analysis pipeline orchestrator
//!
//! Stages are composed with [`chain`] and `map`; nothing inspects an
//! intermediate result. A single [`Fold`] at the end turns a failure into
//! the fallback verdict, so `run_analysis` always answers with a verdict.

use super::completion::{invoke_completion_service, CompletionService};
use super::context::{prepare_context, AnalysisContext};
use super::fallback::{match_skills, mock_verdict, round_to};
use super::parse::parse_response_safe;
use super::{AnalysisVerdict, Confidence, VerdictSource};
use crate::algebra::{chain, Fold};
use crate::error::Result;
use crate::models::{JobDescription, Resume};
use crate::record::Stored;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Progress markers of one pipeline run, as reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Started,
    ContextReady,
    ServiceCalled,
    ServiceFailed,
    ParsedOk,
    ParsedAbsent,
    Completed,
}

const UNPARSEABLE: &str = "completion response could not be parsed";

pub struct AnalysisPipeline<C> {
    service: C,
    timeout: Duration,
}

impl<C: CompletionService> AnalysisPipeline<C> {
    pub fn new(service: C, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    /// Analyze one résumé against one job. Never returns `Err` today; the
    /// `Result` keeps the entry point uniform with the stores.
    pub async fn run_analysis(
        &self,
        resume: &Stored<Resume>,
        job: &Stored<JobDescription>,
    ) -> Result<AnalysisVerdict> {
        debug!(resume = %resume.id, job = %job.id, state = ?PipelineState::Started);

        let context: Result<AnalysisContext> = Ok(prepare_context(resume, job));
        debug!(state = ?PipelineState::ContextReady);

        let verdict = chain(context, |ctx| {
            invoke_completion_service(&self.service, ctx, self.timeout)
        })
        .await
        .map(|(ctx, raw)| {
            debug!(state = ?PipelineState::ServiceCalled, response_len = raw.len());
            let parsed = parse_response_safe(&raw);
            let state = if parsed.is_some() {
                PipelineState::ParsedOk
            } else {
                PipelineState::ParsedAbsent
            };
            debug!(state = ?state);
            ctx.with_parsed(parsed)
        })
        .map(build_analysis_result)
        .fold(
            |verdict| verdict,
            |err| {
                warn!(error = %err, state = ?PipelineState::ServiceFailed, "using fallback verdict");
                mock_verdict(resume, job, &err.to_string())
            },
        );

        info!(
            resume = %verdict.resume_id,
            job = %verdict.job_id,
            score = verdict.relevance_score,
            source = ?verdict.source,
            confidence = ?verdict.confidence,
            state = ?PipelineState::Completed,
            "analysis complete"
        );
        Ok(verdict)
    }
}

/// Final stage: the parsed model verdict, or the heuristic one when parsing
/// came back empty. Skill lists are always computed locally.
pub fn build_analysis_result(context: AnalysisContext) -> AnalysisVerdict {
    let resume = context.resume();
    let job = context.job();
    context
        .parsed()
        .map(|data| {
            let skills = match_skills(&resume.data.skills, &job.data.skills_required);
            AnalysisVerdict {
                resume_id: resume.id.clone(),
                job_id: job.id.clone(),
                relevance_score: round_to(data.relevance_score, 2),
                job_match_percentage: round_to(data.job_match_percentage, 1),
                matched_skills: skills.matched,
                missing_skills: skills.missing,
                strengths: data.strengths.clone(),
                weaknesses: data.weaknesses.clone(),
                recommendations: data.recommendations.clone(),
                analysis_text: data.analysis_text.clone(),
                source: VerdictSource::Completion,
                confidence: Confidence::from(VerdictSource::Completion),
                fallback_reason: None,
            }
        })
        .unwrap_or_else(|| {
            warn!(resume = %resume.id, job = %job.id, "{UNPARSEABLE}");
            mock_verdict(resume, job, UNPARSEABLE)
        })
}
