//! The 16-entry ANSI palette and its on-disk color file format.
//!
//! A color file holds 16 hexadecimal colors separated by whitespace, in ANSI
//! order (black, red, ..., bright white). Each color may carry a `#` or `0x`
//! prefix.

use std::path::Path;

use crate::cell::Rgb;

#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    #[error("failed to read color file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    #[error("expected 16 colors, found {0}")]
    TooFew(usize),
}

/// The ANSI palette used to resolve indexed colors 0..16.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; 16],
}

/// Standard xterm ANSI palette.
const ANSI_COLORS: [Rgb; 16] = [
    Rgb::new(0, 0, 0),       // Black
    Rgb::new(205, 0, 0),     // Red
    Rgb::new(0, 205, 0),     // Green
    Rgb::new(205, 205, 0),   // Yellow
    Rgb::new(0, 0, 238),     // Blue
    Rgb::new(205, 0, 205),   // Magenta
    Rgb::new(0, 205, 205),   // Cyan
    Rgb::new(229, 229, 229), // White
    Rgb::new(127, 127, 127), // Bright Black
    Rgb::new(255, 0, 0),     // Bright Red
    Rgb::new(0, 255, 0),     // Bright Green
    Rgb::new(255, 255, 0),   // Bright Yellow
    Rgb::new(92, 92, 255),   // Bright Blue
    Rgb::new(255, 0, 255),   // Bright Magenta
    Rgb::new(0, 255, 255),   // Bright Cyan
    Rgb::new(255, 255, 255), // Bright White
];

impl Palette {
    pub fn get(&self, idx: usize) -> Rgb {
        self.colors[idx & 15]
    }

    /// Default foreground (ANSI white).
    pub fn foreground(&self) -> Rgb {
        self.colors[7]
    }

    /// Default background (ANSI black).
    pub fn background(&self) -> Rgb {
        self.colors[0]
    }

    /// Parse a color file's contents.
    pub fn parse(text: &str) -> Result<Self, PaletteError> {
        let mut colors = ANSI_COLORS;
        let mut count = 0;
        for token in text.split_whitespace().take(16) {
            let hex = token
                .strip_prefix('#')
                .or_else(|| token.strip_prefix("0x"))
                .unwrap_or(token);
            let value = u32::from_str_radix(hex, 16)
                .ok()
                .filter(|v| *v <= 0xff_ffff)
                .ok_or_else(|| PaletteError::InvalidColor(token.to_string()))?;
            colors[count] = Rgb::from_u32(value);
            count += 1;
        }
        if count < 16 {
            return Err(PaletteError::TooFew(count));
        }
        Ok(Self { colors })
    }

    /// Load a color file from disk.
    pub fn load(path: &Path) -> Result<Self, PaletteError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: ANSI_COLORS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SOLARIZED: &str = "\
        #073642 #dc322f #859900 #b58900 #268bd2 #d33682 #2aa198 #eee8d5\n\
        0x002b36 0xcb4b16 0x586e75 0x657b83 0x839496 0x6c71c4 0x93a1a1 fdf6e3\n";

    #[test]
    fn test_parse_sixteen_colors() {
        let palette = Palette::parse(SOLARIZED).unwrap();
        assert_eq!(palette.get(0), Rgb::from_u32(0x073642));
        assert_eq!(palette.get(8), Rgb::from_u32(0x002b36));
        assert_eq!(palette.get(15), Rgb::from_u32(0xfdf6e3));
    }

    #[test]
    fn test_parse_rejects_short_file() {
        let err = Palette::parse("#000000 #ffffff").unwrap_err();
        assert!(matches!(err, PaletteError::TooFew(2)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Palette::parse("#zzzzzz").unwrap_err();
        assert!(matches!(err, PaletteError::InvalidColor(ref t) if t == "#zzzzzz"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SOLARIZED.as_bytes()).unwrap();
        let palette = Palette::load(file.path()).unwrap();
        assert_eq!(palette.foreground(), Rgb::from_u32(0xeee8d5));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Palette::load(Path::new("/nonexistent/fbmux/colors")).unwrap_err();
        assert!(matches!(err, PaletteError::Io(_)));
    }
}
