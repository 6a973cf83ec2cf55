use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Who is painting. The token is opaque and issued elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    pub nickname: String,
    pub token: Option<String>,
    /// Pixels placed from this client
    pub pixel_count: u64,
}

impl Identity {
    pub fn new(nickname: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            token: Some(token.into()),
            pixel_count: 0,
        }
    }

    /// Bearer token, if a non-blank one is present
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }
}

/// Identity persisted as a JSON file
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means a fresh, signed-out identity
    pub fn load(&self) -> anyhow::Result<Identity> {
        if !self.path.exists() {
            log::debug!("no identity at {}, starting signed out", self.path.display());
            return Ok(Identity::default());
        }

        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read identity {}", self.path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid identity file {}", self.path.display()))
    }

    pub fn save(&self, identity: &Identity) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(identity)?;
        fs::write(&self.path, text).with_context(|| format!("failed to write identity {}", self.path.display()))
    }
}
