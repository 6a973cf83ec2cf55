use bytemuck::{Pod, Zeroable};

/// Color the untouched canvas is painted with
pub const BACKGROUND_HEX: &str = "#ffffff";

/// Colors are stored as `u8` indices
pub const MAX_COLORS: usize = 256;

/// Default palette, referenced by position
pub const DEFAULT_PALETTE_HEX: [&str; 32] = [
    "#6d001a", "#be0039", "#ff4500", "#ffa800", "#ffd635", "#fff8b8", "#00a368", "#00cc78",
    "#7eed56", "#00756f", "#009eaa", "#00ccc0", "#2450a4", "#3690ea", "#51e9f4", "#493ac1",
    "#6a5cff", "#94b3ff", "#811e9f", "#b44ac0", "#e4abff", "#de107f", "#ff3881", "#ff99aa",
    "#6d482f", "#9c6926", "#ffb470", "#000000", "#515252", "#898d90", "#d4d7d9", "#ffffff",
];

/// One RGBA texel, laid out the way raster buffers store it
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or the short `#rgb` form
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();

        match digits.len() {
            3 => {
                let mut it = digits.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::opaque(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Self::opaque(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => None,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Fixed ordered list of selectable colors
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgba>,
    background: u8,
}

impl Palette {
    /// Build a palette from hex strings. Unparseable entries fall back to black
    /// so indices stay stable. The background index is looked up by color,
    /// falling back to index 0 when the palette has no white. Entries past
    /// `MAX_COLORS` are dropped.
    pub fn from_hex(entries: &[&str]) -> Self {
        if entries.len() > MAX_COLORS {
            log::warn!("palette has {} entries, keeping the first {MAX_COLORS}", entries.len());
        }
        let colors: Vec<Rgba> = entries
            .iter()
            .take(MAX_COLORS)
            .map(|hex| {
                Rgba::from_hex(hex).unwrap_or_else(|| {
                    log::warn!("palette entry {hex:?} is not a hex color, using black");
                    Rgba::opaque(0, 0, 0)
                })
            })
            .collect();

        let background_color = Rgba::from_hex(BACKGROUND_HEX);
        let background = colors
            .iter()
            .position(|c| Some(*c) == background_color)
            .unwrap_or(0) as u8;

        Self { colors, background }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, index: u8) -> Option<Rgba> {
        self.colors.get(index as usize).copied()
    }

    /// Index of the designated background color
    pub fn background_index(&self) -> u8 {
        self.background
    }

    pub fn background_color(&self) -> Rgba {
        self.colors.get(self.background as usize).copied().unwrap_or(Rgba::opaque(255, 255, 255))
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_hex(&DEFAULT_PALETTE_HEX)
    }
}
