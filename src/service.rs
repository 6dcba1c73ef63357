//! Matching service: the five collections plus the analysis pipeline
//!
//! Initialize once at startup and share. Every method is a thin
//! composition of store calls and, for `analyze`, one pipeline run.
//!
//! ```rust,ignore
//! let service = MatchService::from_config(CompletionConfig::default());
//! let resume_id = service.create_resume(&resume)?;
//! let job_id = service.create_job(&job)?;
//! let verdict = service.analyze(&resume_id, &job_id).await?;
//! ```

use crate::analysis::{AnalysisPipeline, AnalysisVerdict, CompletionBackend, CompletionService};
use crate::audit::AuditLog;
use crate::config::CompletionConfig;
use crate::hh::map_hh_resume;
use crate::models::{collections, JobDescription, LogEntry, Resume, User};
use crate::record::{RecordId, Stored};
use crate::store::{new_store, StoreHandle};
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

// ============================================================================
// STORES
// ============================================================================

/// One handle per collection, created once.
#[derive(Debug, Clone)]
pub struct Stores {
    pub users: StoreHandle<User>,
    pub resumes: StoreHandle<Resume>,
    pub jobs: StoreHandle<JobDescription>,
    pub analyses: StoreHandle<AnalysisVerdict>,
    pub logs: StoreHandle<LogEntry>,
}

impl Stores {
    pub fn new() -> Self {
        Self {
            users: new_store(collections::USERS),
            resumes: new_store(collections::RESUMES),
            jobs: new_store(collections::JOBS),
            analyses: new_store(collections::ANALYSES),
            logs: new_store(collections::LOGS),
        }
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct MatchService<C> {
    stores: Stores,
    pipeline: AnalysisPipeline<C>,
}

impl MatchService<CompletionBackend> {
    /// HTTP completions when an API key is configured, fallback verdicts otherwise.
    pub fn from_config(config: CompletionConfig) -> Self {
        let timeout = config.timeout;
        Self::new(Stores::new(), CompletionBackend::from_config(config), timeout)
    }
}

impl<C: CompletionService> MatchService<C> {
    pub fn new(stores: Stores, service: C, timeout: std::time::Duration) -> Self {
        Self {
            stores,
            pipeline: AnalysisPipeline::new(service, timeout),
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn audit(&self) -> AuditLog {
        AuditLog::new(self.stores.logs.clone())
    }

    pub fn create_resume(&self, resume: &Resume) -> Result<RecordId> {
        let id = self.stores.resumes.add_item(resume).context("Failed to store résumé")?;
        info!(%id, name = %resume.name, "résumé created");
        Ok(id)
    }

    /// Map an hh.ru export and store it as a résumé.
    pub fn import_hh_resume(&self, hh: &Value) -> Result<RecordId> {
        self.create_resume(&map_hh_resume(hh))
    }

    pub fn create_job(&self, job: &JobDescription) -> Result<RecordId> {
        let id = self.stores.jobs.add_item(job).context("Failed to store job")?;
        info!(%id, title = %job.title, "job created");
        Ok(id)
    }

    pub fn list_resumes(&self) -> Result<Vec<Stored<Resume>>> {
        Ok(self.stores.resumes.read_typed()?)
    }

    pub fn list_jobs(&self) -> Result<Vec<Stored<JobDescription>>> {
        Ok(self.stores.jobs.read_typed()?)
    }

    pub fn list_analyses(&self) -> Result<Vec<Stored<AnalysisVerdict>>> {
        Ok(self.stores.analyses.read_typed()?)
    }

    /// Analyze a stored résumé against a stored job and persist the verdict.
    ///
    /// `None` when either record does not exist.
    pub async fn analyze(
        &self,
        resume_id: &str,
        job_id: &str,
    ) -> Result<Option<Stored<AnalysisVerdict>>> {
        let resume = self.stores.resumes.get_typed(resume_id)?;
        let job = self.stores.jobs.get_typed(job_id)?;
        let (Some(resume), Some(job)) = (resume, job) else {
            info!(%resume_id, %job_id, "analysis skipped: input missing");
            return Ok(None);
        };

        let verdict = self.pipeline.run_analysis(&resume, &job).await?;
        let id = self
            .stores
            .analyses
            .add_item(&verdict)
            .context("Failed to store analysis")?;
        Ok(self.stores.analyses.get_typed(&id)?)
    }
}
