//! fbmux-vt: terminal emulation engine for fbmux.
//!
//! Provides a small API over `alacritty_terminal`. This crate parses pty
//! output, keeps the grid and scrollback, and hands out resolved cells that a
//! renderer can paint without knowing anything about escape sequences.

pub mod cell;
pub mod palette;
pub mod screen;
pub mod terminal;

pub use cell::{CellFlags, Rgb, VtCell};
pub use palette::{Palette, PaletteError};
pub use screen::{CursorState, DamageInfo, DamagedRow, ScreenView};
pub use terminal::VtTerminal;
