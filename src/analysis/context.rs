//! Context and prompt preparation
//!
//! Pure and deterministic: the same résumé/job pair always yields the same
//! context text and prompt.

use super::parse::VerdictData;
use crate::models::{JobDescription, Resume};
use crate::record::Stored;

/// Immutable bundle threaded through the pipeline stages. "Updating" it
/// consumes the old bundle and returns a new one.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    resume: Stored<Resume>,
    job: Stored<JobDescription>,
    context_text: String,
    prompt: String,
    parsed: Option<VerdictData>,
}

impl AnalysisContext {
    pub fn resume(&self) -> &Stored<Resume> {
        &self.resume
    }

    pub fn job(&self) -> &Stored<JobDescription> {
        &self.job
    }

    pub fn context_text(&self) -> &str {
        &self.context_text
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn parsed(&self) -> Option<&VerdictData> {
        self.parsed.as_ref()
    }

    pub fn with_parsed(self, parsed: Option<VerdictData>) -> Self {
        Self { parsed, ..self }
    }
}

/// Derive the context text and the analysis prompt.
pub fn prepare_context(resume: &Stored<Resume>, job: &Stored<JobDescription>) -> AnalysisContext {
    let context_text = render_profile(&resume.data, &job.data);
    let prompt = build_prompt(&context_text);
    AnalysisContext {
        resume: resume.clone(),
        job: job.clone(),
        context_text,
        prompt,
        parsed: None,
    }
}

fn render_profile(resume: &Resume, job: &JobDescription) -> String {
    format!(
        r#"RESUME:
Name: {name}
Position: {position}
Experience: {experience} years
Skills: {skills}
Education: {education}
Languages: {languages}

JOB:
Title: {title}
Requirements: {requirements}
Responsibilities: {responsibilities}
Required skills: {skills_required}
Required experience: {experience_required} years"#,
        name = resume.name,
        position = resume.position,
        experience = resume.experience,
        skills = resume.skills.join(", "),
        education = resume.education,
        languages = resume.languages.join(", "),
        title = job.title,
        requirements = job.requirements.join(", "),
        responsibilities = job.responsibilities.join(", "),
        skills_required = job.skills_required.join(", "),
        experience_required = job.experience_required,
    )
}

fn build_prompt(context_text: &str) -> String {
    format!(
        r#"Assess how relevant the candidate's résumé is for the job below.

{context_text}

Respond with a single JSON object in exactly this format:
{{
    "relevance_score": 0.85,
    "strengths": ["strength 1", "strength 2"],
    "weaknesses": ["weakness 1", "weakness 2"],
    "recommendations": ["recommendation 1", "recommendation 2"],
    "job_match_percentage": 85,
    "analysis_text": "Detailed relevance analysis..."
}}

relevance_score is between 0 and 1; job_match_percentage is between 0 and 100.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Stored<Resume>, Stored<JobDescription>) {
        let resume = Resume {
            name: "Anna".into(),
            position: "Backend developer".into(),
            experience: 5,
            skills: vec!["Python".into(), "Django".into()],
            education: "MSc".into(),
            languages: vec!["English".into()],
            ..Default::default()
        };
        let job = JobDescription {
            title: "Senior Python developer".into(),
            skills_required: vec!["Python".into(), "Docker".into()],
            experience_required: 3,
            ..Default::default()
        };
        (Stored::fixture("r1", resume), Stored::fixture("j1", job))
    }

    #[test]
    fn test_context_mentions_both_sides() {
        let (resume, job) = pair();
        let ctx = prepare_context(&resume, &job);

        assert!(ctx.context_text().contains("Skills: Python, Django"));
        assert!(ctx.context_text().contains("Required skills: Python, Docker"));
        assert!(ctx.prompt().contains(ctx.context_text()));
        assert!(ctx.prompt().contains("\"relevance_score\""));
        assert!(ctx.parsed().is_none());
    }

    #[test]
    fn test_prepare_is_deterministic() {
        let (resume, job) = pair();
        let a = prepare_context(&resume, &job);
        let b = prepare_context(&resume, &job);
        assert_eq!(a.prompt(), b.prompt());
        assert_eq!(a.context_text(), b.context_text());
    }

    #[test]
    fn test_with_parsed_returns_new_bundle() {
        let (resume, job) = pair();
        let ctx = prepare_context(&resume, &job);
        let before = ctx.clone();
        let data = VerdictData {
            relevance_score: 0.7,
            job_match_percentage: 70.0,
            strengths: vec![],
            weaknesses: vec![],
            recommendations: vec![],
            analysis_text: "ok".into(),
        };
        let next = ctx.with_parsed(Some(data.clone()));

        assert_eq!(next.parsed(), Some(&data));
        assert!(before.parsed().is_none());
        assert_eq!(next.prompt(), before.prompt());
    }
}
