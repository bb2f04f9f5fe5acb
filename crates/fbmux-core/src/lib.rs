//! fbmux-core: the tag/session multiplexing engine.
//!
//! Owns the slot table, decides which session is drawn where, interprets
//! command keys and drives the poll loop. Terminal sessions and the display
//! are reached only through the [`Session`] and [`Canvas`] traits, so the
//! whole state machine runs against fakes in tests.

pub mod canvas;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod handoff;
pub mod input;
pub mod layout;
pub mod mux;
pub mod session;
pub mod slots;
pub mod snapshot;
pub mod state;
pub mod status;
pub mod switch;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use canvas::{Canvas, MemoryCanvas, Pen};
pub use config::MuxConfig;
pub use error::MuxError;
pub use event_loop::{Cycle, POLL_TIMEOUT};
pub use handoff::{Console, Notification};
pub use input::{Command, PasswordVerifier, Program, Verdict};
pub use layout::{region, Geometry, Region, SplitMode, BORDER};
pub use mux::Mux;
pub use session::{Drain, Launch, Session, SpawnError};
pub use slots::{Instance, SlotId, SlotTable, TagState, INSTANCES};
pub use snapshot::Snapshots;
pub use state::{MuxState, PASSWORD_CAPACITY};
pub use status::{status_cells, BarState, StatusBar, TagCell};
pub use visibility::Show;
