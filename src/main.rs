//! resume-match CLI
//!
//! Run with: cargo run -- analyze <resume.json> <job.json> [--json]

use anyhow::{Context, Result};
use resume_match::{
    hh, AnalysisVerdict, CompletionConfig, Confidence, JobDescription, MatchService, Resume,
};
use serde::de::DeserializeOwned;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("analyze") => {
            // analyze <resume.json> <job.json> [--json]
            let json_output = args.iter().any(|a| a == "--json");
            let files: Vec<&String> = args[2..].iter().filter(|a| !a.starts_with("--")).collect();
            let [resume_path, job_path] = files.as_slice() else {
                print_usage();
                std::process::exit(2);
            };
            run_analyze(Path::new(resume_path), Path::new(job_path), json_output).await
        }
        Some("hh") => {
            let Some(path) = args.get(2) else {
                print_usage();
                std::process::exit(2);
            };
            let resume = hh::load_hh_file(Path::new(path))?;
            println!("{}", serde_json::to_string_pretty(&resume)?);
            Ok(())
        }
        Some("help") | Some("--help") | Some("-h") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    }
}

fn print_usage() {
    eprintln!("resume-match: score a résumé against a job description");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  analyze <resume.json> <job.json> [--json]   Run one analysis");
    eprintln!("  hh <export.json>                            Map an hh.ru export to a résumé");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  OPENAI_API_KEY             Completion API key (fallback scoring without it)");
    eprintln!("  RESUME_MATCH_API_URL       Chat completions endpoint");
    eprintln!("  RESUME_MATCH_MODEL         Model name");
    eprintln!("  RESUME_MATCH_TIMEOUT_SECS  Completion timeout");
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn run_analyze(resume_path: &Path, job_path: &Path, json_output: bool) -> Result<()> {
    let resume: Resume = read_json(resume_path)?;
    let job: JobDescription = read_json(job_path)?;

    let service = MatchService::from_config(CompletionConfig::default());
    let resume_id = service.create_resume(&resume)?;
    let job_id = service.create_job(&job)?;

    let stored = service
        .analyze(&resume_id, &job_id)
        .await?
        .context("analysis inputs disappeared")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&stored)?);
    } else {
        print_verdict(&resume, &job, &stored.data);
    }
    Ok(())
}

fn print_verdict(resume: &Resume, job: &JobDescription, verdict: &AnalysisVerdict) {
    println!("{} → {}", resume.name, job.title);
    println!(
        "Relevance: {:.2}  ({:.1}% match, {} confidence, {})",
        verdict.relevance_score,
        verdict.job_match_percentage,
        match verdict.confidence {
            Confidence::High => "high",
            Confidence::Low => "low",
        },
        if verdict.is_fallback() { "heuristic" } else { "model" }
    );
    if let Some(reason) = &verdict.fallback_reason {
        println!("  fallback reason: {}", reason);
    }
    println!();
    println!("Matched skills: {}", verdict.matched_skills.join(", "));
    println!("Missing skills: {}", verdict.missing_skills.join(", "));

    for (label, items) in [
        ("Strengths", &verdict.strengths),
        ("Weaknesses", &verdict.weaknesses),
        ("Recommendations", &verdict.recommendations),
    ] {
        println!();
        println!("{}:", label);
        for item in items {
            println!("  - {}", item);
        }
    }
    println!();
    println!("{}", verdict.analysis_text);
}
