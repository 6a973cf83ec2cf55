use serde::{Deserialize, Serialize};

/// Board dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSize {
    pub width: u32,
    pub height: u32,
}

impl BoardSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Row-major index of a cell known to be inside the board
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// One placement as it travels on the wire: `{x, y, c}`
///
/// Fields are signed because broadcasts are untrusted and may carry
/// negative or out-of-range values; validity is checked against the
/// board and palette before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
    pub c: i32,
}

impl Pixel {
    pub fn new(x: i32, y: i32, c: i32) -> Self {
        Self { x, y, c }
    }
}

/// Snapshot payload returned by the board endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub pixels: Vec<Pixel>,
}
