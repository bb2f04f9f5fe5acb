//! Glyph cells painted on a surface.

use std::io;
use std::path::Path;

use fbmux_core::{Canvas, Geometry, Pen, Region};
use fbmux_font::{Font, FontError};
use fbmux_vt::{CellFlags, Rgb};

use crate::surface::Surface;

/// The regular face and optional italic and bold faces.
///
/// Every face must have the regular face's glyph size.
#[derive(Clone, Debug)]
pub struct Fonts {
    regular: Font,
    italic: Option<Font>,
    bold: Option<Font>,
}

impl Fonts {
    pub fn new(regular: Font) -> Self {
        Self {
            regular,
            italic: None,
            bold: None,
        }
    }

    /// Load the faces; a variant that fails to load or has another size is
    /// skipped.
    pub fn load(regular: &Path, italic: Option<&Path>, bold: Option<&Path>) -> Result<Self, FontError> {
        let mut fonts = Self::new(Font::open(regular)?);
        fonts.italic = italic.and_then(|p| fonts.variant(p));
        fonts.bold = bold.and_then(|p| fonts.variant(p));
        Ok(fonts)
    }

    fn variant(&self, path: &Path) -> Option<Font> {
        match Font::open(path) {
            Ok(f) if (f.rows(), f.cols()) == (self.regular.rows(), self.regular.cols()) => Some(f),
            Ok(_) => {
                log::warn!("{}: glyph size differs from the regular font", path.display());
                None
            }
            Err(e) => {
                log::warn!("{}: {e}", path.display());
                None
            }
        }
    }

    pub fn with_bold(mut self, bold: Font) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn with_italic(mut self, italic: Font) -> Self {
        self.italic = Some(italic);
        self
    }

    /// The bitmap for `ch` in the face `flags` ask for, falling back to
    /// the regular face.
    fn glyph(&self, ch: char, flags: CellFlags) -> Option<&[u8]> {
        let face = if flags.contains(CellFlags::BOLD) {
            self.bold.as_ref()
        } else if flags.contains(CellFlags::ITALIC) {
            self.italic.as_ref()
        } else {
            None
        };
        face.and_then(|f| f.bitmap(ch as u32))
            .or_else(|| self.regular.bitmap(ch as u32))
    }
}

/// Mix `fg` over `bg` by an intensity of 0..=255.
fn blend(fg: Rgb, bg: Rgb, level: u8) -> Rgb {
    let mix = |f: u8, b: u8| ((f as u32 * level as u32 + b as u32 * (255 - level as u32)) / 255) as u8;
    Rgb::new(mix(fg.r, bg.r), mix(fg.g, bg.g), mix(fg.b, bg.b))
}

/// Paints character cells on a surface.
pub struct Pad<S> {
    surface: S,
    fonts: Fonts,
}

impl<S: Surface> Pad<S> {
    pub fn new(surface: S, fonts: Fonts) -> Self {
        Self { surface, fonts }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn cell_size(&self) -> (usize, usize) {
        (self.fonts.regular.rows(), self.fonts.regular.cols())
    }
}

impl<S: Surface> Canvas for Pad<S> {
    fn geometry(&self) -> Geometry {
        let (cell_height, cell_width) = self.cell_size();
        Geometry {
            height: self.surface.height(),
            width: self.surface.width(),
            cell_height,
            cell_width,
        }
    }

    fn put(&mut self, region: &Region, row: usize, col: usize, ch: char, pen: Pen) {
        if row >= region.rows || col >= region.cols {
            return;
        }
        let (ch_h, ch_w) = self.cell_size();
        let top = region.top + row * ch_h;
        let left = region.left + col * ch_w;
        let Some(bitmap) = self.fonts.glyph(ch, pen.flags).filter(|_| ch != ' ') else {
            self.surface.fill(top, left, ch_h, ch_w, pen.bg);
            if pen.flags.contains(CellFlags::UNDERLINE) {
                self.surface.fill(top + ch_h - 1, left, 1, ch_w, pen.fg);
            }
            return;
        };
        for y in 0..ch_h {
            let underline = y == ch_h - 1 && pen.flags.contains(CellFlags::UNDERLINE);
            for x in 0..ch_w {
                let level = if underline { 255 } else { bitmap[y * ch_w + x] };
                self.surface.set_pixel(top + y, left + x, blend(pen.fg, pen.bg, level));
            }
        }
    }

    fn fill(&mut self, region: &Region, row: usize, col: usize, rows: usize, cols: usize, color: Rgb) {
        let (ch_h, ch_w) = self.cell_size();
        let rows = rows.min(region.rows.saturating_sub(row));
        let cols = cols.min(region.cols.saturating_sub(col));
        self.surface.fill(
            region.top + row * ch_h,
            region.left + col * ch_w,
            rows * ch_h,
            cols * ch_w,
            color,
        );
    }

    fn border(&mut self, region: &Region, color: Rgb, width: usize) {
        let top = region.top.saturating_sub(width);
        let left = region.left.saturating_sub(width);
        let bottom = region.top + region.height;
        let right = region.left + region.width;
        let outer_h = bottom + width - top;
        let outer_w = right + width - left;
        self.surface.fill(top, left, width, outer_w, color);
        self.surface.fill(bottom, left, width, outer_w, color);
        self.surface.fill(top, left, outer_h, width, color);
        self.surface.fill(top, right, outer_h, width, color);
    }

    fn capture(&self) -> Vec<u8> {
        self.surface.save()
    }

    fn restore(&mut self, pixels: &[u8]) -> bool {
        self.surface.load(pixels)
    }

    fn reload_colormap(&mut self) -> io::Result<()> {
        self.surface.reload_colormap()
    }
}
