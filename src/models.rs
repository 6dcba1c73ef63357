//! Payload shapes for the five collections
//!
//! None of these carry `id` or timestamps: the store assigns those, and
//! [`Stored<T>`](crate::record::Stored) exposes them after decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection names, one store each.
pub mod collections {
    pub const USERS: &str = "users";
    pub const RESUMES: &str = "resumes";
    pub const JOBS: &str = "jobs";
    pub const ANALYSES: &str = "analyses";
    pub const LOGS: &str = "logs";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// A candidate's résumé
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub name: String,
    pub position: String,
    /// Years of work experience
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub contact_info: ContactInfo,
}

/// An open position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub title: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub skills_required: Vec<String>,
    /// Years of experience asked for
    #[serde(default)]
    pub experience_required: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// `salt:sha256hex`, see [`crate::accounts::hash_password`]
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// One handled request, as kept in the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub ts: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub user: Option<String>,
    pub ip: Option<String>,
    pub duration_ms: u64,
}

impl LogEntry {
    pub fn request(method: &str, path: &str, status: u16, duration_ms: u64) -> Self {
        Self {
            ts: Utc::now(),
            method: method.to_string(),
            path: path.to_string(),
            status,
            user: None,
            ip: None,
            duration_ms,
        }
    }

    pub fn by(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn from_ip(mut self, ip: &str) -> Self {
        self.ip = Some(ip.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resume_defaults_missing_lists() {
        let resume: Resume = serde_json::from_value(json!({
            "name": "Ivan",
            "position": "Developer"
        }))
        .unwrap();
        assert_eq!(resume.experience, 0);
        assert!(resume.skills.is_empty());
        assert_eq!(resume.contact_info, ContactInfo::default());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let user = User {
            username: "root".into(),
            password_hash: "s:h".into(),
            role: Role::Admin,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["role"], json!("admin"));
        assert!(user.is_admin());

        let plain: User = serde_json::from_value(json!({"username": "u", "password_hash": "x"})).unwrap();
        assert_eq!(plain.role, Role::User);
    }
}
