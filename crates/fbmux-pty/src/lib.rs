//! fbmux-pty: pty processes and the terminal sessions built on them.
//!
//! This crate sits between a child process and the display. It reads the
//! child's output, feeds it into a [`fbmux_vt::VtTerminal`], paints the
//! result on a [`fbmux_core::Canvas`] and writes keys back to the child.
//!
//! - [`PtyHandle`]: one child process on a pty (spawn, read, write, resize,
//!   signal).
//! - [`TerminalSession`]: a `PtyHandle` plus its emulator, implementing
//!   [`fbmux_core::Session`] for one slot.

pub mod pty;
pub mod session;

pub use pty::{PtyError, PtyHandle};
pub use session::TerminalSession;
