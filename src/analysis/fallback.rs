//! Deterministic fallback verdict
//!
//! Used whenever the completion service is unavailable, times out, or
//! answers with something that does not parse. Score:
//!
//! ```text
//! skill_ratio      = matched / required          (1.0 when nothing is required)
//! experience_ratio = min(years / required, 1.0)  (1.0 when nothing is required)
//! relevance        = (skill_ratio + experience_ratio) / 2
//! ```

use super::{AnalysisVerdict, Confidence, VerdictSource};
use crate::models::{JobDescription, Resume};
use crate::record::Stored;
use std::collections::HashSet;

/// Required skills split by whether the résumé lists them. Comparison
/// ignores case and surrounding whitespace; names keep the job's spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

impl SkillMatch {
    pub fn required(&self) -> usize {
        self.matched.len() + self.missing.len()
    }

    pub fn ratio(&self) -> f64 {
        match self.required() {
            0 => 1.0,
            n => self.matched.len() as f64 / n as f64,
        }
    }
}

pub fn match_skills(have: &[String], required: &[String]) -> SkillMatch {
    let have: HashSet<String> = have.iter().map(|s| normalize(s)).collect();
    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for skill in required {
        let key = normalize(skill);
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        if have.contains(&key) {
            matched.push(skill.trim().to_string());
        } else {
            missing.push(skill.trim().to_string());
        }
    }

    SkillMatch { matched, missing }
}

fn normalize(skill: &str) -> String {
    skill.trim().to_lowercase()
}

pub fn experience_ratio(years: u32, required: u32) -> f64 {
    if required == 0 {
        return 1.0;
    }
    (years as f64 / required as f64).min(1.0)
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Heuristic verdict for a résumé/job pair. `reason` is recorded on the
/// verdict so callers can see why the model's answer was not used.
pub fn mock_verdict(
    resume: &Stored<Resume>,
    job: &Stored<JobDescription>,
    reason: &str,
) -> AnalysisVerdict {
    let skills = match_skills(&resume.data.skills, &job.data.skills_required);
    let experience = experience_ratio(resume.data.experience, job.data.experience_required);
    let overall = (skills.ratio() + experience) / 2.0;

    let mut weaknesses = Vec::new();
    if !skills.missing.is_empty() {
        weaknesses.push(format!("Missing skills: {}", skills.missing.join(", ")));
    }
    if experience < 1.0 {
        weaknesses.push(format!(
            "Experience below requirement: {} of {} years",
            resume.data.experience, job.data.experience_required
        ));
    }
    weaknesses.push("Soft skills need a separate assessment".to_string());

    let mut recommendations = vec![
        "Run a technical interview".to_string(),
        "Assess the candidate's motivation".to_string(),
    ];
    if !skills.missing.is_empty() {
        recommendations.push(format!("Probe experience with {}", skills.missing.join(", ")));
    }

    AnalysisVerdict {
        resume_id: resume.id.clone(),
        job_id: job.id.clone(),
        relevance_score: round_to(overall, 2),
        job_match_percentage: round_to(overall * 100.0, 1),
        strengths: vec![
            format!("Skill match: {}/{}", skills.matched.len(), skills.required()),
            format!("Work experience: {} years", resume.data.experience),
        ],
        weaknesses,
        recommendations,
        analysis_text: format!(
            "{} has {} of {} required skills and {} years of experience.",
            resume.data.name,
            skills.matched.len(),
            skills.required(),
            resume.data.experience
        ),
        matched_skills: skills.matched,
        missing_skills: skills.missing,
        source: VerdictSource::Fallback,
        confidence: Confidence::from(VerdictSource::Fallback),
        fallback_reason: Some(reason.to_string()),
    }
}
