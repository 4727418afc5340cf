//! Core types for the rasterizer: packed colors and terminal cells

use std::fmt::Write as _;
use serde::{Serialize, Deserialize};

use super::math::Vec3;

/// Packed ARGB color, `0xAARRGGBB`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0x00000000);
    pub const BLACK: Color = Color(0xff000000);
    pub const WHITE: Color = Color(0xffffffff);
    pub const RED: Color = Color(0xffff0000);
    pub const GREEN: Color = Color(0xff00ff00);
    pub const BLUE: Color = Color(0xff0000ff);

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self::with_alpha(r, g, b, 255)
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Build from normalized channels (rounded to 0-255)
    pub fn from_rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::with_alpha(channel(r), channel(g), channel(b), channel(a))
    }

    pub fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn b(self) -> u8 {
        self.0 as u8
    }

    /// Normalized `(r, g, b, a)`
    pub fn to_rgba(self) -> (f32, f32, f32, f32) {
        (
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
            self.a() as f32 / 255.0,
        )
    }

    /// RGB as a vector in 0.0-1.0
    pub fn to_vec3(self) -> Vec3 {
        Vec3::from_rgb(self.0)
    }

    /// Apply shading (multiply RGB by intensity 0.0-1.0), alpha kept
    pub fn shade(self, intensity: f64) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        let rgb = self.to_vec3().scale(i).to_rgb();
        Color((self.0 & 0xff000000) | rgb)
    }

    /// Straight-alpha "over": `src` composited on top of `self`
    pub fn blend(self, src: Color) -> Color {
        let (dr, dg, db, da) = self.to_rgba();
        let (sr, sg, sb, sa) = src.to_rgba();
        let inv = 1.0 - sa;
        Color::from_rgba(
            sr * sa + dr * inv,
            sg * sa + dg * inv,
            sb * sa + db * inv,
            sa + da * inv,
        )
    }

    /// Index into the 6x6x6 cube of the 256-color palette
    pub fn to_ansi256(self) -> u8 {
        let (r, g, b) = (self.r() / 51, self.g() / 51, self.b() / 51);
        16 + 36 * r + 6 * g + b
    }
}

/// Which escape form is used for cell colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// `ESC[38;2;r;g;bm`
    #[default]
    TrueColor,
    /// `ESC[38;5;nm`
    Ansi256,
}

/// One character position on the terminal grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub fg: Color,
    pub bg: Color,
    /// Larger is farther from the camera
    pub depth: f64,
    pub glyph: char,
}

impl Cell {
    /// Depth of a cell no geometry has been drawn into
    pub const FAR_DEPTH: f64 = f64::MAX;

    /// Content of a front buffer the terminal has never received.
    /// Differs from every drawable cell so the first present writes everything.
    pub const UNDRAWN: Cell = Cell {
        fg: Color::TRANSPARENT,
        bg: Color::TRANSPARENT,
        depth: Cell::FAR_DEPTH,
        glyph: '\0',
    };

    pub fn new(fg: Color, bg: Color, glyph: char) -> Self {
        Self {
            fg,
            bg,
            depth: Self::FAR_DEPTH,
            glyph,
        }
    }

    /// Same visible content (depth is not part of the picture)
    pub fn same_appearance(&self, other: &Cell) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.glyph == other.glyph
    }

    /// `src` over `self`: colors blended, glyph replaced, farther depth kept
    pub fn blend(self, src: Cell) -> Cell {
        Cell {
            fg: self.fg.blend(src.fg),
            bg: self.bg.blend(src.bg),
            depth: self.depth.max(src.depth),
            glyph: src.glyph,
        }
    }

    /// Foreground and background escape codes for this cell
    pub fn ansi_color(&self, mode: ColorMode) -> String {
        let mut out = String::with_capacity(40);
        // Writing into a String cannot fail
        let _ = match mode {
            ColorMode::TrueColor => write!(
                out,
                "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m",
                self.fg.r(), self.fg.g(), self.fg.b(),
                self.bg.r(), self.bg.g(), self.bg.b(),
            ),
            ColorMode::Ansi256 => write!(
                out,
                "\x1b[38;5;{}m\x1b[48;5;{}m",
                self.fg.to_ansi256(),
                self.bg.to_ansi256(),
            ),
        };
        out
    }
}

impl Default for Cell {
    /// White on transparent space, infinitely far
    fn default() -> Self {
        Cell::new(Color::WHITE, Color::TRANSPARENT, ' ')
    }
}
