use alacritty_terminal::grid::Dimensions;
use alacritty_terminal::index::{Column, Line};
use alacritty_terminal::term::cell::Flags as AlacFlags;
use alacritty_terminal::term::color::Colors;
use alacritty_terminal::term::Term;
use alacritty_terminal::vte::ansi::{Color, NamedColor};

use crate::cell::{CellFlags, Rgb, VtCell};
use crate::palette::Palette;
use crate::terminal::EventProxy;

/// Position and visibility of the cursor, in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorState {
    pub row: u16,
    pub col: u16,
    pub visible: bool,
}

/// A read-only view into the visible part of the terminal.
///
/// Row 0 is the top of the viewport, which follows the scrollback position.
pub struct ScreenView<'a> {
    term: &'a Term<EventProxy>,
    palette: &'a Palette,
}

impl<'a> ScreenView<'a> {
    pub(crate) fn new(term: &'a Term<EventProxy>, palette: &'a Palette) -> Self {
        Self { term, palette }
    }

    /// Number of visible rows.
    pub fn rows(&self) -> u16 {
        self.term.screen_lines() as u16
    }

    /// Number of columns.
    pub fn cols(&self) -> u16 {
        self.term.columns() as u16
    }

    /// Get a single cell at the given viewport row and column.
    pub fn cell(&self, row: u16, col: u16) -> VtCell {
        if (row as usize) >= self.term.screen_lines() || (col as usize) >= self.term.columns() {
            return VtCell::default();
        }

        let grid = self.term.grid();
        let line = Line(row as i32 - grid.display_offset() as i32);
        let cell = &grid[line][Column(col as usize)];
        convert_cell(cell, self.term.colors(), self.palette)
    }

    /// Get all cells in a row.
    pub fn row_cells(&self, row: u16) -> Vec<VtCell> {
        (0..self.cols()).map(|col| self.cell(row, col)).collect()
    }

    /// The visible text, one line per row with trailing blanks trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for row in 0..self.rows() {
            let line: String = self.row_cells(row).iter().map(|c| c.codepoint).collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Information about which parts of the screen have changed.
#[derive(Debug)]
pub enum DamageInfo {
    /// The entire screen needs redrawing.
    Full,
    /// Only specific rows/columns changed.
    Partial(Vec<DamagedRow>),
}

/// A row (or portion of a row) that has been damaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamagedRow {
    pub row: u16,
    pub left: u16,
    pub right: u16,
}

/// Resolve a `vte::ansi::Color` against the dynamic colors and the palette.
pub(crate) fn resolve_color(color: &Color, colors: &Colors, palette: &Palette, is_fg: bool) -> Rgb {
    match color {
        Color::Spec(rgb) => Rgb::new(rgb.r, rgb.g, rgb.b),
        Color::Named(named) => {
            if let Some(rgb) = colors[*named] {
                return Rgb::new(rgb.r, rgb.g, rgb.b);
            }
            let idx = *named as usize;
            match named {
                NamedColor::Foreground | NamedColor::BrightForeground | NamedColor::Cursor => {
                    palette.foreground()
                }
                NamedColor::DimForeground => palette.get(8),
                NamedColor::Background => palette.background(),
                _ if idx < 16 => palette.get(idx),
                // Dim colors map onto the normal range.
                NamedColor::DimBlack => palette.get(0),
                NamedColor::DimRed => palette.get(1),
                NamedColor::DimGreen => palette.get(2),
                NamedColor::DimYellow => palette.get(3),
                NamedColor::DimBlue => palette.get(4),
                NamedColor::DimMagenta => palette.get(5),
                NamedColor::DimCyan => palette.get(6),
                NamedColor::DimWhite => palette.get(7),
                _ if is_fg => palette.foreground(),
                _ => palette.background(),
            }
        }
        Color::Indexed(idx) => {
            let idx = *idx as usize;
            if let Some(rgb) = colors[idx] {
                Rgb::new(rgb.r, rgb.g, rgb.b)
            } else if idx < 16 {
                palette.get(idx)
            } else if idx < 232 {
                // 216-color cube (indices 16..232).
                let n = idx - 16;
                let to_byte = |v: usize| if v == 0 { 0u8 } else { (55 + 40 * v) as u8 };
                Rgb::new(to_byte((n / 36) % 6), to_byte((n / 6) % 6), to_byte(n % 6))
            } else {
                // Grayscale ramp (indices 232..256).
                let v = (8 + 10 * (idx - 232)) as u8;
                Rgb::new(v, v, v)
            }
        }
    }
}

/// Convert an alacritty Cell to our VtCell.
pub(crate) fn convert_cell(
    cell: &alacritty_terminal::term::cell::Cell,
    colors: &Colors,
    palette: &Palette,
) -> VtCell {
    let fg = resolve_color(&cell.fg, colors, palette, true);
    let bg = resolve_color(&cell.bg, colors, palette, false);

    let mut flags = CellFlags::empty();
    if cell.flags.contains(AlacFlags::BOLD) {
        flags |= CellFlags::BOLD;
    }
    if cell.flags.contains(AlacFlags::ITALIC) {
        flags |= CellFlags::ITALIC;
    }
    if cell.flags.contains(AlacFlags::UNDERLINE) {
        flags |= CellFlags::UNDERLINE;
    }
    if cell.flags.contains(AlacFlags::INVERSE) {
        flags |= CellFlags::INVERSE;
    }
    if cell.flags.contains(AlacFlags::HIDDEN) {
        flags |= CellFlags::HIDDEN;
    }

    // The spacer half of a wide character renders as a blank.
    let codepoint = if cell.flags.contains(AlacFlags::WIDE_CHAR_SPACER) {
        ' '
    } else {
        cell.c
    };

    VtCell {
        codepoint,
        fg,
        bg,
        flags,
    }
}
