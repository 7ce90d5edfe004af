//! Flat-file user store for the multi-user variant.
//!
//! `users.json` maps username to `salt$digest`, where the digest is
//! `sha256(salt + password)` in lowercase hex. There is no session or
//! token protocol — callers verify credentials per request.
//!
//! Writes go through a temp file renamed over the target, so a crashed or
//! concurrent registration never leaves a half-written store behind.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user already exists: {0}")]
    Duplicate(String),
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("failed to read user store {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("user store {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Handle to the `users.json` store under the user data root.
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(user_root: &Path) -> Self {
        Self {
            path: user_root.join("users.json"),
        }
    }

    /// Register a new user. Fails if the username is already taken.
    pub fn register(&self, username: &str, password: &str) -> Result<(), UserStoreError> {
        if username.trim().is_empty() {
            return Err(UserStoreError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(UserStoreError::EmptyPassword);
        }

        let mut users = self.load()?;
        if users.contains_key(username) {
            return Err(UserStoreError::Duplicate(username.to_string()));
        }

        let salt = Uuid::new_v4().simple().to_string();
        users.insert(username.to_string(), format!("{}${}", salt, digest(&salt, password)));

        self.write_atomic(&users)
    }

    /// Check a username/password pair against the store.
    pub fn verify(&self, username: &str, password: &str) -> Result<bool, UserStoreError> {
        let users = self.load()?;
        let Some(stored) = users.get(username) else {
            return Ok(false);
        };
        let Some((salt, expected)) = stored.split_once('$') else {
            return Ok(false);
        };
        Ok(digest(salt, password) == expected)
    }

    fn load(&self) -> Result<BTreeMap<String, String>, UserStoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| UserStoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        })?;

        let value: Value =
            serde_json::from_str(&content).map_err(|e| UserStoreError::Parse {
                path: self.path.display().to_string(),
                source: e,
            })?;

        let mut users = BTreeMap::new();
        if let Value::Object(map) = value {
            for (name, entry) in map {
                if let Value::String(s) = entry {
                    users.insert(name, s);
                }
            }
        }
        Ok(users)
    }

    /// Write the whole store via temp-file-then-rename. Rename is atomic
    /// on the same filesystem, so readers never observe a partial file.
    fn write_atomic(&self, users: &BTreeMap<String, String>) -> Result<(), UserStoreError> {
        let io_err = |e: std::io::Error| UserStoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut map = Map::new();
        for (name, entry) in users {
            map.insert(name.clone(), Value::String(entry.clone()));
        }
        let json = serde_json::to_string_pretty(&Value::Object(map)).map_err(|e| {
            UserStoreError::Parse {
                path: self.path.display().to_string(),
                source: e,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        Ok(())
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
