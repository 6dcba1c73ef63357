//! Convert hh.ru résumé exports into internal résumé JSON
//!
//! Usage: cargo run --bin import -- <file-or-dir>... > resumes.json
//!
//! Directories are walked recursively for `*.json`. Files that fail to
//! map and entries the walk cannot read are reported on stderr, counted as
//! failures, and skipped.

use anyhow::Result;
use resume_match::hh::load_hh_file;
use resume_match::Resume;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("import", String::as_str);

    if args.len() < 2 {
        eprintln!("Usage: {} <file-or-dir>...", program);
        eprintln!("Example: {} ~/Downloads/hh-export > resumes.json", program);
        std::process::exit(1);
    }

    let mut resumes: Vec<Resume> = Vec::new();
    let mut failed = 0;

    for arg in &args[1..] {
        let root = PathBuf::from(arg);
        if !root.exists() {
            eprintln!("Warning: {} does not exist, skipping", arg);
            continue;
        }

        let (paths, walk_errors) = json_files(&root);
        for e in &walk_errors {
            let at = e.path().map(|p| p.display().to_string()).unwrap_or_else(|| arg.clone());
            eprintln!("  Error walking {}: {}", at, e);
        }
        failed += walk_errors.len();

        for path in paths {
            match load_hh_file(&path) {
                Ok(resume) => resumes.push(resume),
                Err(e) => {
                    eprintln!("  Error in {}: {:#}", path.display(), e);
                    failed += 1;
                }
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&resumes)?);
    eprintln!("Imported {} résumés ({} failed)", resumes.len(), failed);
    Ok(())
}

/// `*.json` files under `root`, in name order, plus every entry the walk
/// could not read.
fn json_files(root: &Path) -> (Vec<PathBuf>, Vec<walkdir::Error>) {
    let mut paths = Vec::new();
    let mut errors = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(e) if e.file_type().is_file() && is_json(e.path()) => paths.push(e.into_path()),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }
    (paths, errors)
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|x| x.to_str()) == Some("json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_walk_finds_nested_json_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("a.json"), "{}").unwrap();

        let (paths, errors) = json_files(dir.path());
        assert!(errors.is_empty());
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.json", "a.json"]);
    }

    #[test]
    fn test_walk_reports_unreadable_root() {
        let dir = tempfile::tempdir().unwrap();
        let (paths, errors) = json_files(&dir.path().join("gone"));
        assert!(paths.is_empty());
        assert_eq!(errors.len(), 1);
    }
}
