//! The drawing surface the multiplexer and its sessions paint on.

use std::collections::HashMap;
use std::io;

use fbmux_vt::{CellFlags, Rgb};

use crate::layout::{Geometry, Region};

/// Colors and attributes of one painted cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pen {
    pub fg: Rgb,
    pub bg: Rgb,
    pub flags: CellFlags,
}

impl Pen {
    pub const fn new(fg: Rgb, bg: Rgb) -> Self {
        Self {
            fg,
            bg,
            flags: CellFlags::empty(),
        }
    }

    pub const fn bold(self) -> Self {
        Self {
            flags: self.flags.union(CellFlags::BOLD),
            ..self
        }
    }
}

/// A pixel surface addressed in character cells relative to a [`Region`].
///
/// Implementations must not block; drawing outside the surface is clipped.
pub trait Canvas {
    fn geometry(&self) -> Geometry;

    /// Paint `ch` in cell `(row, col)` of `region`.
    fn put(&mut self, region: &Region, row: usize, col: usize, ch: char, pen: Pen);

    /// Fill `rows x cols` cells starting at `(row, col)` of `region`.
    fn fill(&mut self, region: &Region, row: usize, col: usize, rows: usize, cols: usize, color: Rgb);

    /// Draw a frame `width` pixels thick just outside `region`.
    fn border(&mut self, region: &Region, color: Rgb, width: usize);

    /// Copy out the whole surface.
    fn capture(&self) -> Vec<u8>;

    /// Put back a surface copied by [`Canvas::capture`].
    ///
    /// Returns `false` and leaves the surface untouched when `pixels` does
    /// not match the current surface.
    fn restore(&mut self, pixels: &[u8]) -> bool;

    /// Reprogram the hardware color map, if the device has one.
    fn reload_colormap(&mut self) -> io::Result<()>;
}

/// A canvas backed by memory, one `0xRRGGBB` word per pixel.
///
/// Used headless and in tests; it also remembers the last character put in
/// every cell and the borders drawn.
#[derive(Debug, Clone)]
pub struct MemoryCanvas {
    geometry: Geometry,
    pixels: Vec<u32>,
    glyphs: HashMap<(usize, usize), char>,
    borders: Vec<(Region, Rgb)>,
    colormap_reloads: usize,
}

impl MemoryCanvas {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            pixels: vec![0; geometry.height * geometry.width],
            glyphs: HashMap::new(),
            borders: Vec::new(),
            colormap_reloads: 0,
        }
    }

    pub fn pixel(&self, y: usize, x: usize) -> Rgb {
        Rgb::from_u32(self.pixels[y * self.geometry.width + x])
    }

    /// The last character put in a cell of `region`.
    pub fn char_at(&self, region: &Region, row: usize, col: usize) -> Option<char> {
        let (y, x) = self.cell_origin(region, row, col);
        self.glyphs.get(&(y, x)).copied()
    }

    /// Text of one cell row of `region`; unpainted cells read as spaces.
    pub fn row_text(&self, region: &Region, row: usize) -> String {
        (0..region.cols)
            .map(|col| self.char_at(region, row, col).unwrap_or(' '))
            .collect()
    }

    pub fn borders(&self) -> &[(Region, Rgb)] {
        &self.borders
    }

    pub fn colormap_reloads(&self) -> usize {
        self.colormap_reloads
    }

    fn cell_origin(&self, region: &Region, row: usize, col: usize) -> (usize, usize) {
        (
            region.top + row * self.geometry.cell_height,
            region.left + col * self.geometry.cell_width,
        )
    }

    fn fill_pixels(&mut self, y: usize, x: usize, height: usize, width: usize, color: Rgb) {
        let g = self.geometry;
        for py in y..(y + height).min(g.height) {
            for px in x..(x + width).min(g.width) {
                self.pixels[py * g.width + px] = color.to_u32();
            }
        }
    }
}

impl Canvas for MemoryCanvas {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn put(&mut self, region: &Region, row: usize, col: usize, ch: char, pen: Pen) {
        if row >= region.rows || col >= region.cols {
            return;
        }
        let (y, x) = self.cell_origin(region, row, col);
        let (ch_h, ch_w) = (self.geometry.cell_height, self.geometry.cell_width);
        self.fill_pixels(y, x, ch_h, ch_w, pen.bg);
        // One foreground pixel per visible glyph keeps captures sensitive to text.
        if ch != ' ' {
            self.fill_pixels(y, x, 1, 1, pen.fg);
        }
        self.glyphs.insert((y, x), ch);
    }

    fn fill(&mut self, region: &Region, row: usize, col: usize, rows: usize, cols: usize, color: Rgb) {
        let rows = rows.min(region.rows.saturating_sub(row));
        let cols = cols.min(region.cols.saturating_sub(col));
        let (ch_h, ch_w) = (self.geometry.cell_height, self.geometry.cell_width);
        for r in row..row + rows {
            for c in col..col + cols {
                let (y, x) = self.cell_origin(region, r, c);
                self.glyphs.remove(&(y, x));
            }
        }
        let (y, x) = self.cell_origin(region, row, col);
        self.fill_pixels(y, x, rows * ch_h, cols * ch_w, color);
    }

    fn border(&mut self, region: &Region, color: Rgb, width: usize) {
        let top = region.top.saturating_sub(width);
        let left = region.left.saturating_sub(width);
        let outer_h = region.top + region.height + width - top;
        let outer_w = region.left + region.width + width - left;
        self.fill_pixels(top, left, width, outer_w, color);
        self.fill_pixels(region.top + region.height, left, width, outer_w, color);
        self.fill_pixels(top, left, outer_h, width, color);
        self.fill_pixels(top, region.left + region.width, outer_h, width, color);
        self.borders.push((*region, color));
    }

    fn capture(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    fn restore(&mut self, pixels: &[u8]) -> bool {
        if pixels.len() != self.pixels.len() * 4 {
            return false;
        }
        for (dst, src) in self.pixels.iter_mut().zip(pixels.chunks_exact(4)) {
            *dst = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        }
        true
    }

    fn reload_colormap(&mut self) -> io::Result<()> {
        self.colormap_reloads += 1;
        Ok(())
    }
}
