//! hh.ru résumé import
//!
//! hh.ru exports are loosely shaped: most fields are optional, some come
//! either as strings or as objects. Mapping never fails; anything missing
//! gets a placeholder.

use crate::models::{ContactInfo, Resume};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

const UNNAMED: &str = "hh.ru candidate";
const NO_POSITION: &str = "Specialist";
const NO_EDUCATION: &str = "Not specified";

/// Non-empty string at `key`.
fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// First present, non-null value among `keys`.
fn first_of<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value.get(*k).filter(|v| !v.is_null()))
}

/// A phone given as a plain string or as `{formatted, number}`.
fn phone_number(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(_) => text(value, "formatted")
            .or_else(|| text(value, "number"))
            .map(str::to_string),
        _ => None,
    }
}

pub fn map_hh_resume(hh: &Value) -> Resume {
    let first = text(hh, "first_name").or_else(|| text(hh, "name")).unwrap_or("");
    let last = text(hh, "last_name").unwrap_or("");
    let full = format!("{first} {last}").trim().to_string();
    let name = if full.is_empty() {
        text(hh, "title").unwrap_or(UNNAMED).to_string()
    } else {
        full
    };

    let position = text(hh, "title")
        .or_else(|| text(hh, "position"))
        .unwrap_or(NO_POSITION)
        .to_string();

    Resume {
        name,
        position,
        experience: experience_years(hh),
        skills: skills(hh),
        education: education(hh),
        languages: languages(hh),
        contact_info: contacts(hh),
    }
}

/// `experience.total` is months, either bare or as `{months}`.
fn experience_years(hh: &Value) -> u32 {
    let total = hh.get("experience").and_then(|e| e.get("total"));
    let months = match total {
        Some(Value::Object(_)) => total.and_then(|t| t.get("months")).and_then(Value::as_i64),
        Some(v) => v.as_i64(),
        None => None,
    };
    months
        .map(|m| (m as f64 / 12.0).round_ties_even().max(0.0) as u32)
        .unwrap_or(0)
}

fn skills(hh: &Value) -> Vec<String> {
    let Some(Value::Array(items)) = first_of(hh, &["key_skills", "skills"]) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|s| match s {
            Value::String(name) => Some(name.clone()),
            Value::Object(_) => s.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

fn education(hh: &Value) -> String {
    hh.get("education")
        .and_then(|e| e.get("level"))
        .and_then(|l| l.get("name"))
        .and_then(Value::as_str)
        .unwrap_or(NO_EDUCATION)
        .to_string()
}

/// `name (level)`, or just `name` when no level is given.
fn languages(hh: &Value) -> Vec<String> {
    let Some(Value::Array(items)) = first_of(hh, &["language", "languages"]) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|l| l.is_object())
        .filter_map(|l| {
            let name = text(l, "name").or_else(|| text(l, "id"))?;
            let level = match l.get("level") {
                Some(level @ Value::Object(_)) => text(level, "name"),
                Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
                _ => None,
            };
            Some(match level {
                Some(level) => format!("{name} ({level})"),
                None => name.to_string(),
            })
        })
        .collect()
}

fn contacts(hh: &Value) -> ContactInfo {
    let contact = first_of(hh, &["contact", "contacts"]).filter(|c| c.is_object());

    let email = contact
        .and_then(|c| text(c, "email"))
        .or_else(|| text(hh, "email"))
        .map(str::to_string);

    let phone = contact
        .and_then(|c| c.get("phone"))
        .and_then(phone_number)
        .or_else(|| {
            hh.get("phones")
                .and_then(Value::as_array)
                .and_then(|phones| phones.first())
                .and_then(phone_number)
        });

    ContactInfo {
        email: email.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
    }
}

/// Read and map one exported résumé file.
pub fn load_hh_file(path: &Path) -> Result<Resume> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let hh: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    anyhow::ensure!(hh.is_object(), "{} is not a JSON object", path.display());

    let resume = map_hh_resume(&hh);
    debug!(path = %path.display(), name = %resume.name, skills = resume.skills.len(), "hh résumé mapped");
    Ok(resume)
}
