use std::io;
use std::os::fd::BorrowedFd;

use fbmux_core::{Canvas, Drain, Launch, Pen, Region, Session, SpawnError};
use fbmux_vt::{DamageInfo, Palette, VtCell, VtTerminal};
use nix::sys::signal::Signal;

use crate::pty::{PtyError, PtyHandle};

/// Size of an emulator that has never been attached.
const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 25;

/// One slot's terminal: an emulator, and a pty process while open.
///
/// Output is parsed whenever it arrives but only painted while the session
/// is attached visibly; a full redraw catches up after that.
pub struct TerminalSession {
    vt: VtTerminal,
    pty: Option<PtyHandle>,
    region: Option<Region>,
    visible: bool,
    switch_signals: bool,
    /// Where the cursor was last painted.
    cursor: Option<(u16, u16)>,
}

impl Default for TerminalSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSession {
    /// A closed session.
    pub fn new() -> Self {
        Self {
            vt: VtTerminal::new(DEFAULT_COLS, DEFAULT_ROWS),
            pty: None,
            region: None,
            visible: false,
            switch_signals: false,
            cursor: None,
        }
    }

    /// Get a reference to the VT terminal for screen reading.
    pub fn vt(&self) -> &VtTerminal {
        &self.vt
    }

    /// Follow the size of the attached region.
    fn fit(&mut self, region: &Region) {
        let cols = u16::try_from(region.cols).unwrap_or(u16::MAX).max(1);
        let rows = u16::try_from(region.rows).unwrap_or(u16::MAX).max(1);
        if (cols, rows) == (self.vt.cols(), self.vt.rows()) {
            return;
        }
        log::trace!("resizing to {cols}x{rows}");
        self.vt.resize(cols, rows);
        self.cursor = None;
        if let Some(pty) = self.pty.as_ref() {
            if let Err(e) = pty.resize(cols, rows) {
                log::debug!("resize: {e}");
            }
        }
    }

    fn notify(&mut self, signal: Signal) {
        if !self.switch_signals {
            return;
        }
        if let Some(pty) = self.pty.as_ref() {
            if let Err(e) = pty.signal(signal) {
                log::debug!("switch signal {signal}: {e}");
            }
        }
    }

    fn put_cell(canvas: &mut dyn Canvas, region: &Region, row: u16, col: u16, cell: &VtCell, inverse: bool) {
        let (fg, bg) = cell.pen();
        let (fg, bg) = if inverse { (bg, fg) } else { (fg, bg) };
        let pen = Pen {
            fg,
            bg,
            flags: cell.flags,
        };
        canvas.put(region, row as usize, col as usize, cell.codepoint, pen);
    }

    fn paint_row(&self, canvas: &mut dyn Canvas, region: &Region, row: u16, left: u16, right: u16) {
        let screen = self.vt.screen();
        let right = right.min(screen.cols().saturating_sub(1));
        for col in left..=right {
            Self::put_cell(canvas, region, row, col, &screen.cell(row, col), false);
        }
    }

    /// Paint what changed, or everything with `full`, then the cursor.
    fn paint(&mut self, canvas: &mut dyn Canvas, full: bool) {
        let Some(region) = self.region.filter(|_| self.visible) else {
            return;
        };
        if self.pty.is_none() {
            if full {
                let bg = self.vt.palette().background();
                canvas.fill(&region, 0, 0, region.rows, region.cols, bg);
            }
            return;
        }
        let cols = self.vt.cols();
        match self.vt.damage() {
            DamageInfo::Full => {
                for row in 0..self.vt.rows() {
                    self.paint_row(canvas, &region, row, 0, cols);
                }
            }
            DamageInfo::Partial(_) if full => {
                for row in 0..self.vt.rows() {
                    self.paint_row(canvas, &region, row, 0, cols);
                }
            }
            DamageInfo::Partial(rows) => {
                for d in rows {
                    self.paint_row(canvas, &region, d.row, d.left, d.right);
                }
                // The old cursor cell is not part of the damage.
                if let Some((row, col)) = self.cursor {
                    if row < self.vt.rows() && col < cols {
                        self.paint_row(canvas, &region, row, col, col);
                    }
                }
            }
        }
        self.vt.reset_damage();

        let cursor = self.vt.cursor();
        self.cursor = None;
        if cursor.visible && self.vt.display_offset() == 0 {
            let cell = self.vt.screen().cell(cursor.row, cursor.col);
            Self::put_cell(canvas, &region, cursor.row, cursor.col, &cell, true);
            self.cursor = Some((cursor.row, cursor.col));
        }
    }

    /// Answer terminal queries the emulator produced.
    fn write_back(&mut self) {
        let writes = self.vt.take_pty_writes();
        if let Some(pty) = self.pty.as_mut() {
            for data in &writes {
                if let Err(e) = pty.write(data.as_bytes()) {
                    log::debug!("write-back: {e}");
                }
            }
        }
    }
}

impl Session for TerminalSession {
    fn is_open(&self) -> bool {
        self.pty.is_some()
    }

    fn descriptor(&self) -> Option<BorrowedFd<'_>> {
        self.pty.as_ref().map(PtyHandle::descriptor)
    }

    fn spawn(&mut self, launch: &Launch, rows: u16, cols: u16) -> Result<(), SpawnError> {
        if self.pty.is_some() {
            return Err(SpawnError::Occupied);
        }
        if launch.argv.is_empty() {
            return Err(SpawnError::EmptyCommand);
        }
        let (cols, rows) = (cols.max(1), rows.max(1));
        let pty = PtyHandle::spawn(&launch.argv, cols, rows).map_err(|e| SpawnError::Failed {
            program: launch.program().to_string(),
            source: Box::new(e),
        })?;
        let palette = self.vt.palette().clone();
        self.vt = VtTerminal::new(cols, rows);
        self.vt.set_palette(palette);
        self.pty = Some(pty);
        self.switch_signals = launch.switch_signals;
        self.cursor = None;
        Ok(())
    }

    fn attach(&mut self, region: Region, visible: bool) {
        self.fit(&region);
        self.region = Some(region);
        self.visible = visible;
    }

    fn detach(&mut self) {
        self.visible = false;
    }

    fn suspend(&mut self) {
        self.notify(Signal::SIGUSR1);
    }

    fn resume(&mut self) {
        self.notify(Signal::SIGUSR2);
    }

    fn redraw(&mut self, canvas: &mut dyn Canvas, full: bool) {
        self.paint(canvas, full);
    }

    fn drain(&mut self, canvas: &mut dyn Canvas) -> Drain {
        let Some(pty) = self.pty.as_mut() else {
            return Drain::Closed;
        };
        let mut buf = [0u8; 4096];
        let n = match pty.read(&mut buf) {
            Ok(0) => return Drain::Closed,
            Ok(n) => n,
            Err(PtyError::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) =>
            {
                return Drain::Output(0);
            }
            // EIO once the child side is closed.
            Err(e) => {
                log::debug!("pty read: {e}");
                return Drain::Closed;
            }
        };
        self.vt.write(&buf[..n]);
        self.write_back();
        self.paint(canvas, false);
        Drain::Output(n)
    }

    fn end(&mut self, canvas: &mut dyn Canvas) {
        if let Some(mut pty) = self.pty.take() {
            pty.terminate();
        }
        let (cols, rows) = (self.vt.cols(), self.vt.rows());
        let palette = self.vt.palette().clone();
        self.vt = VtTerminal::new(cols, rows);
        self.vt.set_palette(palette);
        self.switch_signals = false;
        self.cursor = None;
        self.paint(canvas, true);
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Some(pty) = self.pty.as_mut() {
            if let Err(e) = pty.write(bytes) {
                log::debug!("pty write: {e}");
            }
        }
    }

    fn scroll(&mut self, canvas: &mut dyn Canvas, lines: i32) {
        self.vt.scroll(lines);
        self.paint(canvas, true);
    }

    fn set_palette(&mut self, palette: &Palette) {
        self.vt.set_palette(palette.clone());
    }

    fn screen_text(&self) -> Option<String> {
        self.pty.is_some().then(|| self.vt.screen().text())
    }
}
