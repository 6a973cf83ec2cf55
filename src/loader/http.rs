use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use ureq::Agent;

use super::BoardSource;
use crate::board::BoardSnapshot;
use crate::config::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A full 2000x2000 board is tens of megabytes of JSON
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;

/// Board source served by the canvas backend
///
/// `GET {board_url}` for the live board and `GET {history_url}?timestamp=`
/// for a past one. The token goes out verbatim in `Authorization`.
pub struct HttpBoardSource {
    agent: Agent,
    board_url: String,
    history_url: String,
}

impl HttpBoardSource {
    pub fn new(board_url: impl Into<String>, history_url: impl Into<String>) -> Self {
        let config = Agent::config_builder().timeout_global(Some(REQUEST_TIMEOUT)).build();
        Self {
            agent: Agent::new_with_config(config),
            board_url: board_url.into(),
            history_url: history_url.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.board_url(), config.history_url())
    }

    fn get(&self, url: &str, token: &str, timestamp: Option<&str>) -> anyhow::Result<BoardSnapshot> {
        let mut request = self.agent.get(url).header("Authorization", token);
        if let Some(timestamp) = timestamp {
            request = request.query("timestamp", timestamp);
        }

        let mut response = request.call().with_context(|| format!("GET {url} failed"))?;
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
            .with_context(|| format!("failed to read board from {url}"))?;
        let snapshot: BoardSnapshot =
            serde_json::from_str(&body).with_context(|| format!("unexpected board payload from {url}"))?;
        log::debug!("GET {url}: {} pixels", snapshot.pixels.len());
        Ok(snapshot)
    }
}

impl BoardSource for HttpBoardSource {
    fn fetch_board(&mut self, token: &str) -> anyhow::Result<BoardSnapshot> {
        self.get(&self.board_url, token, None)
    }

    fn fetch_history(&mut self, token: &str, at: DateTime<Utc>) -> anyhow::Result<BoardSnapshot> {
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.get(&self.history_url, token, Some(&timestamp))
    }
}
