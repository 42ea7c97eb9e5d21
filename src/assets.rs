//! Asset lookup capability and the two contractual descriptor formats:
//! sprite sheets (`frames` array of named pixel rects) and bitmap fonts
//! (per-character normalized UV cells).
//!
//! The stage never fetches anything itself; applications hand it an
//! [`AssetProvider`] at construction and resolve loading/decoding on their
//! own schedule.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ScrimError, ScrimResult};

/// Lookup capability injected into the stage. `None` for an unknown id; the
/// caller (node factory or painter) turns that into a `MissingData` error
/// with context.
pub trait AssetProvider {
    fn get(&self, id: &str) -> Option<&AssetData>;
}

#[derive(Clone, Debug)]
pub enum AssetData {
    Image(ImageData),
    Sheet(SheetData),
    Font(FontData),
    BitmapFont(BitmapFontData),
}

/// Decoded image, premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

impl ImageData {
    /// Decode an encoded image (png/jpeg/webp) and premultiply.
    pub fn decode(bytes: &[u8]) -> ScrimResult<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ScrimError::usage(format!("unsupported or corrupt image: {e}")))?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        let mut rgba8_premul = decoded.into_raw();
        for px in rgba8_premul.chunks_exact_mut(4) {
            let a = u16::from(px[3]) + 1;
            for c in px.iter_mut().take(3) {
                *c = ((u16::from(*c) * a) >> 8) as u8;
            }
        }
        Ok(Self { width, height, rgba8_premul })
    }

    /// Build from raw premultiplied RGBA8 bytes (tests, procedural pages).
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> ScrimResult<Self> {
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(ScrimError::usage("image byte length mismatch"));
        }
        Ok(Self { width, height, rgba8_premul })
    }
}

/// One frame inside a sprite sheet, in page pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Sprite sheet: one page image plus named frames cut from it.
#[derive(Clone, Debug)]
pub struct SheetData {
    pub page: ImageData,
    frames: BTreeMap<String, FrameRect>,
}

impl SheetData {
    /// Parse the sheet descriptor: a JSON object with a `frames` array of
    /// `{filename, frame: {x, y, w, h}}`. Structural holes are missing-data
    /// errors.
    pub fn from_json(descriptor: &str, page: ImageData) -> ScrimResult<Self> {
        #[derive(serde::Deserialize)]
        struct Descriptor {
            frames: Vec<Entry>,
        }
        #[derive(serde::Deserialize)]
        struct Entry {
            filename: String,
            frame: FrameRect,
        }

        let parsed: Descriptor = serde_json::from_str(descriptor)
            .map_err(|e| ScrimError::missing_data(format!("sheet descriptor: {e}")))?;
        let mut frames = BTreeMap::new();
        for e in parsed.frames {
            let fr = e.frame;
            let x_fits = fr.x.checked_add(fr.w).is_some_and(|x| x <= page.width);
            let y_fits = fr.y.checked_add(fr.h).is_some_and(|y| y <= page.height);
            if !x_fits || !y_fits {
                return Err(ScrimError::missing_data(format!(
                    "frame '{}' exceeds the {}x{} page",
                    e.filename, page.width, page.height
                )));
            }
            frames.insert(e.filename, fr);
        }
        Ok(Self { page, frames })
    }

    pub fn frame(&self, name: &str) -> ScrimResult<FrameRect> {
        self.frames.get(name).copied().ok_or_else(|| {
            ScrimError::missing_data(format!("sheet has no frame named '{name}'"))
        })
    }
}

/// Vector font for `Text` nodes.
#[derive(Clone)]
pub struct FontData {
    pub font: Arc<fontdue::Font>,
}

impl std::fmt::Debug for FontData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontData").finish_non_exhaustive()
    }
}

impl FontData {
    pub fn from_bytes(bytes: &[u8]) -> ScrimResult<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| ScrimError::usage(format!("unsupported font data: {e}")))?;
        Ok(Self { font: Arc::new(font) })
    }
}

/// One bitmap-font glyph cell, in page pixel rows (UVs already flipped).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphCell {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl GlyphCell {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }
}

/// Bitmap font: a texture page plus per-character cells.
#[derive(Clone, Debug)]
pub struct BitmapFontData {
    pub page: ImageData,
    glyphs: BTreeMap<char, GlyphCell>,
}

impl BitmapFontData {
    /// Parse the bitmap-font descriptor: a JSON object mapping each
    /// character to `{uv0: [u, v], uv1: [u, v]}` in normalized texture
    /// coordinates. UVs are clamped to [0, 1]; the vertical axis is flipped
    /// when converting to pixel rows (v=0 is the bottom of the page).
    pub fn from_json(descriptor: &str, page: ImageData) -> ScrimResult<Self> {
        #[derive(serde::Deserialize)]
        struct Cell {
            uv0: [f32; 2],
            uv1: [f32; 2],
        }

        let parsed: BTreeMap<String, Cell> = serde_json::from_str(descriptor)
            .map_err(|e| ScrimError::missing_data(format!("bitmap font descriptor: {e}")))?;

        let (w, h) = (page.width as f32, page.height as f32);
        let mut glyphs = BTreeMap::new();
        for (key, cell) in parsed {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                return Err(ScrimError::missing_data(format!(
                    "bitmap font key '{key}' is not a single character"
                )));
            };
            let u0 = cell.uv0[0].clamp(0.0, 1.0);
            let v0 = cell.uv0[1].clamp(0.0, 1.0);
            let u1 = cell.uv1[0].clamp(0.0, 1.0);
            let v1 = cell.uv1[1].clamp(0.0, 1.0);
            glyphs.insert(
                ch,
                GlyphCell {
                    x0: (u0 * w).round() as u32,
                    x1: (u1 * w).round() as u32,
                    // v grows upward; pixel rows grow downward.
                    y0: ((1.0 - v1) * h).round() as u32,
                    y1: ((1.0 - v0) * h).round() as u32,
                },
            );
        }
        Ok(Self { page, glyphs })
    }

    pub fn glyph(&self, ch: char) -> Option<GlyphCell> {
        self.glyphs.get(&ch).copied()
    }

    /// Advance width of a line at scale 1, summing glyph cell widths.
    /// Characters without a cell contribute nothing.
    pub fn line_width(&self, line: &str) -> u32 {
        line.chars()
            .filter_map(|c| self.glyph(c))
            .map(|g| g.width())
            .sum()
    }

    /// Tallest cell in the font, used as the line height.
    pub fn line_height(&self) -> u32 {
        self.glyphs.values().map(GlyphCell::height).max().unwrap_or(0)
    }
}

/// In-memory provider for applications and tests.
#[derive(Default)]
pub struct MemoryAssets {
    entries: BTreeMap<String, AssetData>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, data: AssetData) {
        self.entries.insert(id.into(), data);
    }
}

impl AssetProvider for MemoryAssets {
    fn get(&self, id: &str) -> Option<&AssetData> {
        self.entries.get(id)
    }
}
