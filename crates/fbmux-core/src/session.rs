//! The interface the multiplexer uses to drive one terminal session.

use std::error::Error;
use std::os::fd::BorrowedFd;

use fbmux_vt::Palette;

use crate::canvas::Canvas;
use crate::layout::Region;

/// Result of draining a session's output once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drain {
    /// Bytes were consumed (possibly zero on a spurious wakeup).
    Output(usize),
    /// End of stream: the process is gone.
    Closed,
}

/// What to run in a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Launch {
    pub argv: Vec<String>,
    /// Notify the child with `SIGUSR1`/`SIGUSR2` when it is hidden/shown.
    pub switch_signals: bool,
}

impl Launch {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            switch_signals: false,
        }
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("slot already holds a running session")]
    Occupied,
    #[error("nothing to run")]
    EmptyCommand,
    #[error("failed to start {program}: {source}")]
    Failed {
        program: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// One terminal session handle, owned by its slot for the whole run.
///
/// A handle exists even when no process runs in it; [`Session::is_open`]
/// tells the two apart. At most one session is attached at a time: the
/// multiplexer always detaches the previous one before attaching the next.
pub trait Session {
    fn is_open(&self) -> bool;

    /// The descriptor to poll for output, while open.
    fn descriptor(&self) -> Option<BorrowedFd<'_>>;

    /// Start `launch` sized to `rows x cols` cells.
    fn spawn(&mut self, launch: &Launch, rows: u16, cols: u16) -> Result<(), SpawnError>;

    /// Bind the session to `region`; it only paints when `visible`.
    fn attach(&mut self, region: Region, visible: bool);

    /// Persist cursor and scroll state and stop painting.
    fn detach(&mut self);

    /// Tell the child its output is no longer shown.
    fn suspend(&mut self);

    /// Tell the child its output is shown again.
    fn resume(&mut self);

    /// Repaint the attached region; `full` repaints every cell.
    fn redraw(&mut self, canvas: &mut dyn Canvas, full: bool);

    /// Read whatever output is pending without blocking and render it.
    fn drain(&mut self, canvas: &mut dyn Canvas) -> Drain;

    /// Close the session and release its process.
    fn end(&mut self, canvas: &mut dyn Canvas);

    /// Write input to the child. Dropped when closed.
    fn send(&mut self, bytes: &[u8]);

    /// Move through history; positive goes back.
    fn scroll(&mut self, canvas: &mut dyn Canvas, lines: i32);

    fn set_palette(&mut self, palette: &Palette);

    /// The visible text, for screenshots.
    fn screen_text(&self) -> Option<String>;
}
