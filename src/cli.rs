// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::config::AppConfig;
use crate::identity::Identity;

#[derive(Parser, Debug, Clone)]
#[command(name = "pixel-canvas")]
#[command(about = "Collaborative pixel canvas client", long_about = None)]
pub struct Cli {
    /// JSON configuration file (camelCase keys)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Placement archive served as the board source; implies --offline
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Run against an in-process broker instead of the backend
    #[arg(long)]
    pub offline: bool,

    /// Where the identity is stored between runs
    #[arg(long, default_value = "identity.json")]
    pub identity: PathBuf,

    /// Bearer token, replaces the stored one
    #[arg(long)]
    pub token: Option<String>,

    #[arg(long)]
    pub nickname: Option<String>,

    /// Open the board as of this RFC 3339 timestamp
    #[arg(long)]
    pub history: Option<DateTime<Utc>>,

    /// Initially selected palette index
    #[arg(long, default_value_t = 0)]
    pub color: u8,

    /// Override the seconds between placements
    #[arg(long)]
    pub rate_limit: Option<u32>,
}

impl Cli {
    /// Config file if given, defaults otherwise, then flag overrides
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(seconds) = self.rate_limit {
            config.rate_limit_seconds = seconds;
        }
        Ok(config)
    }

    /// No backend is contacted
    pub fn is_offline(&self) -> bool {
        self.offline || self.archive.is_some()
    }

    /// Apply identity flags on top of the stored identity
    pub fn apply_identity(&self, mut identity: Identity) -> Identity {
        if let Some(token) = &self.token {
            identity.token = Some(token.clone());
        }
        if let Some(nickname) = &self.nickname {
            identity.nickname = nickname.clone();
        }
        identity
    }
}
