use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{BoardSnapshot, Pixel, PixelBuffer};
use crate::status::StatusLog;

pub mod http;

pub use http::HttpBoardSource;

/// Where board snapshots come from
pub trait BoardSource {
    /// Current board
    fn fetch_board(&mut self, token: &str) -> anyhow::Result<BoardSnapshot>;

    /// Board as it was at `at`
    fn fetch_history(&mut self, token: &str, at: DateTime<Utc>) -> anyhow::Result<BoardSnapshot>;
}

/// One recorded placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedPlacement {
    pub x: i32,
    pub y: i32,
    pub c: i32,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ArchiveFile {
    #[serde(default)]
    placements: Vec<ArchivedPlacement>,
}

/// Board source backed by a log of timestamped placements
#[derive(Debug, Clone, Default)]
pub struct ArchiveSource {
    /// Sorted by `placed_at`, ties keep insertion order
    placements: Vec<ArchivedPlacement>,
}

impl ArchiveSource {
    pub fn new(mut placements: Vec<ArchivedPlacement>) -> Self {
        placements.sort_by_key(|p| p.placed_at);
        Self { placements }
    }

    /// Read `{"placements": [{x, y, c, placedAt}, ...]}`
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("failed to read archive {}", path.display()))?;
        let file: ArchiveFile =
            serde_json::from_str(&text).with_context(|| format!("invalid archive {}", path.display()))?;
        log::info!("archive {} holds {} placements", path.display(), file.placements.len());
        Ok(Self::new(file.placements))
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Last write per cell among placements at or before `until`
    pub fn snapshot(&self, until: Option<DateTime<Utc>>) -> BoardSnapshot {
        let mut cells: HashMap<(i32, i32), i32> = HashMap::new();
        for placement in &self.placements {
            if until.is_some_and(|t| placement.placed_at > t) {
                break;
            }
            cells.insert((placement.x, placement.y), placement.c);
        }

        let mut pixels: Vec<Pixel> = cells.into_iter().map(|((x, y), c)| Pixel::new(x, y, c)).collect();
        pixels.sort_by_key(|p| (p.y, p.x));
        BoardSnapshot { pixels }
    }
}

impl BoardSource for ArchiveSource {
    fn fetch_board(&mut self, _token: &str) -> anyhow::Result<BoardSnapshot> {
        Ok(self.snapshot(None))
    }

    fn fetch_history(&mut self, _token: &str, at: DateTime<Utc>) -> anyhow::Result<BoardSnapshot> {
        Ok(self.snapshot(Some(at)))
    }
}

/// Read-only view of a past board; active while a timestamp is set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryView {
    pub timestamp: Option<DateTime<Utc>>,
}

impl HistoryView {
    pub fn is_active(&self) -> bool {
        self.timestamp.is_some()
    }
}

/// Fills the pixel buffer from a `BoardSource` and tracks history mode
pub struct BoardLoader {
    source: Box<dyn BoardSource>,
    history: HistoryView,
}

impl BoardLoader {
    pub fn new(source: Box<dyn BoardSource>) -> Self {
        Self {
            source,
            history: HistoryView::default(),
        }
    }

    pub fn history(&self) -> HistoryView {
        self.history
    }

    pub fn is_history_active(&self) -> bool {
        self.history.is_active()
    }

    /// Replace the buffer with the current board. Without a token nothing
    /// is fetched. Returns the number of pixels applied.
    pub fn load_current(
        &mut self,
        token: Option<&str>,
        buffer: &mut PixelBuffer,
        status: &mut StatusLog,
    ) -> Option<usize> {
        let Some(token) = token else {
            log::debug!("no token, board not fetched");
            return None;
        };

        match self.source.fetch_board(token) {
            Ok(snapshot) => {
                let applied = buffer.load_bulk(&snapshot.pixels);
                if applied < snapshot.pixels.len() {
                    log::warn!("{} snapshot pixels out of range", snapshot.pixels.len() - applied);
                }
                status.success(format!("Loaded {applied} pixels."));
                Some(applied)
            }
            Err(e) => {
                log::error!("board fetch failed: {e:#}");
                status.error("Failed to load the board.");
                None
            }
        }
    }

    /// Show the board as of `at` and enter history mode. Timestamps after
    /// `now` are rejected without fetching.
    pub fn load_history(
        &mut self,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
        token: Option<&str>,
        buffer: &mut PixelBuffer,
        status: &mut StatusLog,
    ) -> bool {
        if at > now {
            status.warning("Cannot load history from the future.");
            return false;
        }
        let Some(token) = token else {
            status.warning("Sign in to view history.");
            return false;
        };

        match self.source.fetch_history(token, at) {
            Ok(snapshot) => {
                let applied = buffer.load_bulk(&snapshot.pixels);
                self.history.timestamp = Some(at);
                status.info(format!("Showing {applied} pixels as of {}.", at.to_rfc3339()));
                true
            }
            Err(e) => {
                log::error!("history fetch failed: {e:#}");
                status.error("Failed to load history.");
                false
            }
        }
    }

    /// Leave history mode and reload the current board
    pub fn reset_to_current(
        &mut self,
        token: Option<&str>,
        buffer: &mut PixelBuffer,
        status: &mut StatusLog,
    ) -> Option<usize> {
        self.history = HistoryView::default();
        self.load_current(token, buffer, status)
    }
}
