//! resume-match - résumé/job relevance scoring
//!
//! In-memory record stores and a staged analysis pipeline that asks a
//! remote completion service for a verdict and falls back to a
//! deterministic heuristic when the service is down, slow, or answers
//! with something unusable.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use resume_match::{CompletionConfig, MatchService};
//!
//! let service = MatchService::from_config(CompletionConfig::default());
//! let resume_id = service.create_resume(&resume)?;
//! let job_id = service.create_job(&job)?;
//!
//! // Always a verdict; `source` says whether the model produced it
//! let verdict = service.analyze(&resume_id, &job_id).await?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ MatchService                                          │
//! │   Stores: users, resumes, jobs, analyses, logs        │
//! │   AnalysisPipeline                                    │
//! └──────────────┬───────────────────────┬───────────────┘
//!                │                       │
//!                ▼                       ▼
//! ┌──────────────────────────┐ ┌──────────────────────────┐
//! │ Store<T>                 │ │ prepare_context          │
//! │   RwLock<Arc<Vec<Record>>│ │ → completion (timeout)   │
//! │   metadata, predicates   │ │ → parse_response_safe    │
//! └──────────────────────────┘ │ → verdict | mock_verdict │
//!                              └──────────────────────────┘
//! ```

pub mod accounts;
pub mod algebra;
pub mod analysis;
pub mod audit;
pub mod config;
pub mod error;
pub mod hh;
pub mod metadata;
pub mod models;
pub mod predicate;
pub mod record;
pub mod service;
pub mod store;

pub use analysis::{
    AnalysisPipeline, AnalysisVerdict, CompletionBackend, CompletionService, Confidence, VerdictSource,
};
pub use config::CompletionConfig;
pub use error::{Error, Result};
pub use models::{ContactInfo, JobDescription, LogEntry, Resume, Role, User};
pub use record::{Fields, Record, RecordId, Stored};
pub use service::{MatchService, Stores};
pub use store::{new_store, Store, StoreHandle, StoreOperation};
