//! User accounts: salted password hashes and registration

use crate::models::{Role, User};
use crate::predicate::constraints;
use crate::record::{RecordId, Stored};
use crate::store::Store;
use anyhow::{bail, Context, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

const SALT_LEN: usize = 16;

/// Hash a password as `salt:sha256(password || salt)`, both parts hex.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    format!("{salt}:{}", digest(password, &salt))
}

/// Check `password` against a stored `salt:hash` value. Malformed stored
/// values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once(':') {
        Some((salt, hash)) if !salt.is_empty() => digest(password, salt) == hash,
        _ => false,
    }
}

fn digest(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create a user. Names are unique; the check and insert are atomic.
pub fn register_user(
    users: &Store<User>,
    username: &str,
    password: &str,
    role: Role,
) -> Result<RecordId> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        bail!("username and password are required");
    }

    let user = User {
        username: username.to_string(),
        password_hash: hash_password(password),
        role,
    };
    let added = users
        .add_if_absent(&user, constraints([("username", username)]))
        .context("Failed to store user")?;

    match added {
        Some(id) => {
            info!(%username, ?role, "user registered");
            Ok(id)
        }
        None => bail!("user '{}' already exists", username),
    }
}

/// The user behind a username/password pair, if the pair is valid.
pub fn verify_credentials(
    users: &Store<User>,
    username: &str,
    password: &str,
) -> Result<Option<Stored<User>>> {
    let found = users
        .find_first(|r| r.get("username").and_then(|v| v.as_str()) == Some(username))
        .context("Failed to look up user")?;

    let Some(record) = found else {
        return Ok(None);
    };
    let user: Stored<User> = record.decode()?;
    if verify_password(password, &user.data.password_hash) {
        Ok(Some(user))
    } else {
        warn!(%username, "password rejected");
        Ok(None)
    }
}
