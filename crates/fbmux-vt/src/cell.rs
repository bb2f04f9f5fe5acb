use bitflags::bitflags;

/// RGB color value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a packed `0xRRGGBB` value.
    pub const fn from_u32(rgb: u32) -> Self {
        Self {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }

    /// Pack the color as `0xRRGGBB`.
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

bitflags! {
    /// Cell attribute flags, packed into a single byte.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        const BOLD          = 0b0000_0001;
        const ITALIC        = 0b0000_0010;
        const UNDERLINE     = 0b0000_0100;
        const INVERSE       = 0b0001_0000;
        const HIDDEN        = 0b0100_0000;
    }
}

/// A single cell in the terminal grid, with colors already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VtCell {
    /// The character displayed in this cell.
    pub codepoint: char,
    pub fg: Rgb,
    pub bg: Rgb,
    pub flags: CellFlags,
}

impl VtCell {
    /// Foreground and background after applying `INVERSE` and `HIDDEN`.
    pub fn pen(&self) -> (Rgb, Rgb) {
        let (fg, bg) = if self.flags.contains(CellFlags::INVERSE) {
            (self.bg, self.fg)
        } else {
            (self.fg, self.bg)
        };
        if self.flags.contains(CellFlags::HIDDEN) {
            (bg, bg)
        } else {
            (fg, bg)
        }
    }
}

impl Default for VtCell {
    fn default() -> Self {
        Self {
            codepoint: ' ',
            fg: Rgb::new(229, 229, 229),
            bg: Rgb::new(0, 0, 0),
            flags: CellFlags::empty(),
        }
    }
}
