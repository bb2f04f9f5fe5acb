//! A scripted session for driving the multiplexer in tests.

use std::io::Read;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;

use fbmux_vt::{Palette, Rgb};

use crate::canvas::Canvas;
use crate::layout::Region;
use crate::session::{Drain, Launch, Session, SpawnError};
use crate::slots::SlotId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Attach(bool),
    Detach,
    Suspend,
    Resume,
    Redraw(bool),
    Drain,
    End,
}

pub struct FakeSession {
    pub slot: SlotId,
    pub open: bool,
    pub attached: Option<(Region, bool)>,
    pub calls: Vec<Call>,
    pub sent: Vec<u8>,
    pub spawned: Vec<Launch>,
    pub fail_spawn: bool,
    pub scrolled: i32,
    pub palette: Option<Palette>,
    pub text: String,
    /// Our end of a socket pair standing in for the pty.
    pub stream: Option<UnixStream>,
}

impl FakeSession {
    pub fn new(slot: SlotId) -> Self {
        Self {
            slot,
            open: false,
            attached: None,
            calls: Vec::new(),
            sent: Vec::new(),
            spawned: Vec::new(),
            fail_spawn: false,
            scrolled: 0,
            palette: None,
            text: String::new(),
            stream: None,
        }
    }

    /// The color this session paints its region with.
    pub fn color(&self) -> Rgb {
        Rgb::from_u32(0x010203 * (self.slot.index() as u32 + 1))
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.attached, Some((_, true)))
    }

    pub fn redraws(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Redraw(full) => Some(*full),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    fn paint(&self, canvas: &mut dyn Canvas) {
        if let Some((region, true)) = self.attached {
            if self.open {
                canvas.fill(&region, 0, 0, region.rows, region.cols, self.color());
            }
        }
    }
}

impl Session for FakeSession {
    fn is_open(&self) -> bool {
        self.open
    }

    fn descriptor(&self) -> Option<BorrowedFd<'_>> {
        self.stream.as_ref().filter(|_| self.open).map(|s| s.as_fd())
    }

    fn spawn(&mut self, launch: &Launch, _rows: u16, _cols: u16) -> Result<(), SpawnError> {
        if self.open {
            return Err(SpawnError::Occupied);
        }
        if self.fail_spawn {
            return Err(SpawnError::Failed {
                program: launch.program().to_string(),
                source: "no such program".into(),
            });
        }
        self.open = true;
        self.spawned.push(launch.clone());
        Ok(())
    }

    fn attach(&mut self, region: Region, visible: bool) {
        self.attached = Some((region, visible));
        self.calls.push(Call::Attach(visible));
    }

    fn detach(&mut self) {
        self.attached = None;
        self.calls.push(Call::Detach);
    }

    fn suspend(&mut self) {
        self.calls.push(Call::Suspend);
    }

    fn resume(&mut self) {
        self.calls.push(Call::Resume);
    }

    fn redraw(&mut self, canvas: &mut dyn Canvas, full: bool) {
        self.calls.push(Call::Redraw(full));
        self.paint(canvas);
    }

    fn drain(&mut self, canvas: &mut dyn Canvas) -> Drain {
        self.calls.push(Call::Drain);
        let Some(stream) = self.stream.as_mut() else {
            return Drain::Closed;
        };
        let mut buf = [0u8; 4096];
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => Drain::Closed,
            Ok(n) => {
                self.text.push_str(&String::from_utf8_lossy(&buf[..n]));
                self.paint(canvas);
                Drain::Output(n)
            }
        }
    }

    fn end(&mut self, _canvas: &mut dyn Canvas) {
        self.calls.push(Call::End);
        self.open = false;
        self.stream = None;
    }

    fn send(&mut self, bytes: &[u8]) {
        if self.open {
            self.sent.extend_from_slice(bytes);
        }
    }

    fn scroll(&mut self, _canvas: &mut dyn Canvas, lines: i32) {
        self.scrolled += lines;
    }

    fn set_palette(&mut self, palette: &Palette) {
        self.palette = Some(palette.clone());
    }

    fn screen_text(&self) -> Option<String> {
        self.open.then(|| self.text.clone())
    }
}
