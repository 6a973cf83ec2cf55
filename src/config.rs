use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::palette::{Palette, DEFAULT_PALETTE_HEX, MAX_COLORS};
use crate::sync::{ChannelRoutes, TransportSettings};
use crate::viewport::DEFAULT_SCALE;

/// Runtime configuration, read from a camelCase JSON file.
/// Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Seconds between successful placements
    pub rate_limit_seconds: u32,
    pub placement_enabled: bool,
    /// Backend origin, e.g. `https://canvas.example.org`
    pub api_base: String,
    pub board_endpoint: String,
    pub history_endpoint: String,
    /// WebSocket path of the STOMP broker
    pub ws_path: String,
    pub pixel_destination: String,
    pub pixel_topic: String,
    pub reconnect_delay_ms: u64,
    pub heartbeat_ms: u64,
    pub initial_scale: f64,
    pub cooldown_tick_ms: u64,
    /// Palette as hex colors, in index order
    pub palette: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas_width: 2000,
            canvas_height: 2000,
            rate_limit_seconds: 1,
            placement_enabled: true,
            api_base: "http://localhost:8080".to_string(),
            board_endpoint: "/full-board".to_string(),
            history_endpoint: "/board-history".to_string(),
            ws_path: "/ws".to_string(),
            pixel_destination: "/app/pixel".to_string(),
            pixel_topic: "/topic/pixels".to_string(),
            reconnect_delay_ms: 5_000,
            heartbeat_ms: 10_000,
            initial_scale: DEFAULT_SCALE,
            cooldown_tick_ms: 100,
            palette: DEFAULT_PALETTE_HEX.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.canvas_width > 0 && self.canvas_height > 0,
            "canvas must be at least 1x1, got {}x{}",
            self.canvas_width,
            self.canvas_height
        );
        anyhow::ensure!(!self.palette.is_empty(), "palette must not be empty");
        anyhow::ensure!(
            self.api_base.starts_with("http://") || self.api_base.starts_with("https://"),
            "apiBase must be an http(s) URL, got {:?}",
            self.api_base
        );
        anyhow::ensure!(self.palette.len() <= MAX_COLORS, "palette holds at most {MAX_COLORS} colors");
        Ok(())
    }

    pub fn palette(&self) -> Palette {
        let entries: Vec<&str> = self.palette.iter().map(String::as_str).collect();
        Palette::from_hex(&entries)
    }

    pub fn routes(&self) -> ChannelRoutes {
        ChannelRoutes {
            destination: self.pixel_destination.clone(),
            topic: self.pixel_topic.clone(),
        }
    }

    /// Join a path onto `api_base` with exactly one slash between them
    pub fn resolve_url(&self, path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        if path.is_empty() {
            return base.to_string();
        }
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    pub fn board_url(&self) -> String {
        self.resolve_url(&self.board_endpoint)
    }

    pub fn history_url(&self) -> String {
        self.resolve_url(&self.history_endpoint)
    }

    /// Broker endpoint with the scheme switched to ws/wss
    pub fn websocket_url(&self) -> String {
        let url = self.resolve_url(&self.ws_path);
        if let Some(rest) = url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            url
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            heartbeat: Duration::from_millis(self.heartbeat_ms),
        }
    }

    pub fn cooldown_tick(&self) -> Duration {
        Duration::from_millis(self.cooldown_tick_ms.clamp(1, 100))
    }
}
