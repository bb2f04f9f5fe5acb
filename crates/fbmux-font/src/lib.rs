//! fbmux-font: the tinyfont glyph bitmap store.
//!
//! A tinyfont file is a fixed header followed by a sorted codepoint table and
//! one `rows * cols` byte bitmap per codepoint:
//!
//! ```text
//! sig[8]       "tinyfont"
//! ver          0
//! n            number of glyphs
//! rows, cols   glyph dimensions
//! glyphs[n]    codepoints, strictly ascending
//! bitmaps[n]   rows * cols bytes each, one intensity byte per pixel
//! ```
//!
//! Integers are 32-bit in host byte order.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const MAGIC: &[u8; 8] = b"tinyfont";
const HEADER_LEN: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to open font: {0}")]
    Io(#[from] io::Error),
    #[error("truncated font header")]
    ShortHeader,
    #[error("not a tinyfont file")]
    BadMagic,
    #[error("unsupported tinyfont version {0}")]
    BadVersion(i32),
    #[error("invalid glyph table dimensions")]
    BadDimensions,
    #[error("truncated {0} table")]
    ShortData(&'static str),
}

/// A loaded tinyfont.
#[derive(Debug, Clone)]
pub struct Font {
    rows: usize,
    cols: usize,
    glyphs: Vec<u32>,
    data: Vec<u8>,
}

impl Font {
    /// Open and load a tinyfont file.
    pub fn open(path: &Path) -> Result<Self, FontError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a tinyfont from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, FontError> {
        let mut head = [0u8; HEADER_LEN];
        read_exact_or(&mut reader, &mut head, FontError::ShortHeader)?;

        if &head[..8] != MAGIC {
            return Err(FontError::BadMagic);
        }
        let field = |i: usize| i32::from_ne_bytes([head[i], head[i + 1], head[i + 2], head[i + 3]]);
        let version = field(8);
        if version != 0 {
            return Err(FontError::BadVersion(version));
        }
        let (n, rows, cols) = (field(12), field(16), field(20));
        if n < 0 || rows <= 0 || cols <= 0 {
            return Err(FontError::BadDimensions);
        }
        let (n, rows, cols) = (n as usize, rows as usize, cols as usize);
        let data_len = n
            .checked_mul(rows)
            .and_then(|v| v.checked_mul(cols))
            .ok_or(FontError::BadDimensions)?;

        let table_len = n.checked_mul(4).ok_or(FontError::BadDimensions)?;
        let table = read_block(&mut reader, table_len, "codepoint")?;
        let glyphs = table
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let data = read_block(&mut reader, data_len, "bitmap")?;

        Ok(Self {
            rows,
            cols,
            glyphs,
            data,
        })
    }

    /// Glyph height in pixels.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Glyph width in pixels.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Look up the bitmap of a codepoint.
    ///
    /// Returns `rows * cols` intensity bytes, or `None` when the font has no
    /// glyph for `codepoint`.
    pub fn bitmap(&self, codepoint: u32) -> Option<&[u8]> {
        let len = self.rows * self.cols;
        self.glyphs
            .binary_search(&codepoint)
            .ok()
            .map(|i| &self.data[i * len..(i + 1) * len])
    }
}

/// Read exactly `len` bytes, growing the buffer only as data arrives so a
/// corrupt header cannot force a huge allocation.
fn read_block<R: Read>(reader: &mut R, len: usize, what: &'static str) -> Result<Vec<u8>, FontError> {
    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(FontError::ShortData(what));
    }
    Ok(buf)
}

fn read_exact_or<R: Read>(reader: &mut R, buf: &mut [u8], short: FontError) -> Result<(), FontError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(short),
        Err(e) => Err(FontError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn encode(codepoints: &[u32], rows: i32, cols: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        for v in [0, codepoints.len() as i32, rows, cols] {
            out.extend_from_slice(&v.to_ne_bytes());
        }
        for cp in codepoints {
            out.extend_from_slice(&cp.to_ne_bytes());
        }
        let len = (rows * cols) as usize;
        for (i, _) in codepoints.iter().enumerate() {
            out.extend(std::iter::repeat(i as u8 + 1).take(len));
        }
        out
    }

    #[test]
    fn test_lookup_three_glyphs() {
        let font = Font::from_reader(&encode(&[65, 97, 8364], 2, 3)[..]).unwrap();
        assert_eq!(font.len(), 3);
        assert_eq!((font.rows(), font.cols()), (2, 3));
        assert_eq!(font.bitmap(97), Some(&[2u8; 6][..]));
        assert_eq!(font.bitmap(8364), Some(&[3u8; 6][..]));
        assert_eq!(font.bitmap(66), None);
        assert_eq!(font.bitmap(0), None);
    }

    #[test]
    fn test_empty_font() {
        let font = Font::from_reader(&encode(&[], 8, 4)[..]).unwrap();
        assert!(font.is_empty());
        assert_eq!(font.bitmap(65), None);
    }

    #[test]
    fn test_short_header() {
        let bytes = encode(&[65], 2, 2);
        let err = Font::from_reader(&bytes[..10]).unwrap_err();
        assert!(matches!(err, FontError::ShortHeader));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut bytes = encode(&[65], 2, 2);
        bytes[0] = b'T';
        assert!(matches!(Font::from_reader(&bytes[..]), Err(FontError::BadMagic)));

        let mut bytes = encode(&[65], 2, 2);
        bytes[8..12].copy_from_slice(&1i32.to_ne_bytes());
        assert!(matches!(Font::from_reader(&bytes[..]), Err(FontError::BadVersion(1))));
    }

    #[test]
    fn test_truncated_tables() {
        let bytes = encode(&[65, 66], 2, 2);
        let err = Font::from_reader(&bytes[..HEADER_LEN + 4]).unwrap_err();
        assert!(matches!(err, FontError::ShortData("codepoint")));

        let err = Font::from_reader(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FontError::ShortData("bitmap")));
    }

    #[test]
    fn test_oversized_header_is_short_data() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        for v in [0i32, 1, 0x4000_0000, 0x4000_0000] {
            bytes.extend_from_slice(&v.to_ne_bytes());
        }
        bytes.extend_from_slice(&65u32.to_ne_bytes());
        let err = Font::from_reader(&bytes[..]).unwrap_err();
        assert!(matches!(err, FontError::ShortData("bitmap")));
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&encode(&[32, 65], 16, 8)).unwrap();
        let font = Font::open(file.path()).unwrap();
        assert_eq!(font.bitmap(65).map(<[u8]>::len), Some(128));

        assert!(matches!(
            Font::open(Path::new("/nonexistent/font.tf")),
            Err(FontError::Io(_))
        ));
    }
}
