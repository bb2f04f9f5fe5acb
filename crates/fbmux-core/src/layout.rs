//! Region layout for split and unsplit tags.

use serde::{Deserialize, Serialize};

use crate::slots::Instance;

/// Thickness of the border drawn around each pane of a split tag, in pixels.
pub const BORDER: usize = 2;

/// How a tag shows its two instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Only the active instance, full screen.
    #[default]
    None,
    /// Main on top, alternate below.
    Horizontal,
    /// Main on the left, alternate on the right.
    Vertical,
}

impl SplitMode {
    pub fn is_split(self) -> bool {
        self != Self::None
    }
}

/// Pixel size of the surface and of one character cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub height: usize,
    pub width: usize,
    pub cell_height: usize,
    pub cell_width: usize,
}

/// A rectangle of the surface in pixels, plus the whole cells it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub top: usize,
    pub left: usize,
    pub height: usize,
    pub width: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Region {
    fn new(top: usize, left: usize, height: usize, width: usize, g: &Geometry) -> Self {
        Self {
            top,
            left,
            height,
            width,
            rows: height / g.cell_height.max(1),
            cols: width / g.cell_width.max(1),
        }
    }
}

/// The region of `instance` in a tag with the given split mode.
///
/// The first pane gets half the surface rounded down to whole cells; the
/// second absorbs the remainder minus the borders, so both panes plus their
/// borders tile the surface.
pub fn region(split: SplitMode, instance: Instance, g: &Geometry) -> Region {
    let first = instance == Instance::Main;
    match split {
        SplitMode::None => Region::new(0, 0, g.height, g.width, g),
        SplitMode::Horizontal => {
            let h1 = g.height / 2 / g.cell_height.max(1) * g.cell_height;
            let h2 = g.height.saturating_sub(h1 + 4 * BORDER);
            let width = g.width.saturating_sub(2 * BORDER);
            if first {
                Region::new(BORDER, BORDER, h1, width, g)
            } else {
                Region::new(h1 + 3 * BORDER, BORDER, h2, width, g)
            }
        }
        SplitMode::Vertical => {
            let w1 = g.width / 2 / g.cell_width.max(1) * g.cell_width;
            let w2 = g.width.saturating_sub(w1 + 4 * BORDER);
            let height = g.height.saturating_sub(2 * BORDER);
            if first {
                Region::new(BORDER, BORDER, height, w1, g)
            } else {
                Region::new(BORDER, w1 + 3 * BORDER, height, w2, g)
            }
        }
    }
}
