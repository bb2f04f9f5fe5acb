use std::cell::RefCell;
use std::rc::Rc;

use alacritty_terminal::event::{Event, EventListener};
use alacritty_terminal::grid::{Dimensions, Scroll};
use alacritty_terminal::term::{Config, Term, TermDamage};
use alacritty_terminal::vte::ansi;

use crate::palette::Palette;
use crate::screen::{CursorState, DamageInfo, DamagedRow, ScreenView};

/// Events captured from the terminal that need to go back to the pty.
#[derive(Default)]
struct EventState {
    pty_writes: Vec<String>,
}

/// Event proxy that captures terminal events.
///
/// The emulator is driven from a single thread, so plain shared ownership is
/// enough here.
#[derive(Clone, Default)]
pub struct EventProxy {
    state: Rc<RefCell<EventState>>,
}

impl EventListener for EventProxy {
    fn send_event(&self, event: Event) {
        if let Event::PtyWrite(data) = event {
            self.state.borrow_mut().pty_writes.push(data);
        }
    }
}

/// Dimensions helper for creating / resizing the terminal.
struct TermSize {
    columns: usize,
    screen_lines: usize,
}

impl Dimensions for TermSize {
    fn total_lines(&self) -> usize {
        self.screen_lines
    }

    fn screen_lines(&self) -> usize {
        self.screen_lines
    }

    fn columns(&self) -> usize {
        self.columns
    }
}

/// The core terminal emulator.
///
/// Wraps `alacritty_terminal::Term` and a VTE parser, and resolves colors
/// through a replaceable [`Palette`].
pub struct VtTerminal {
    term: Term<EventProxy>,
    parser: ansi::Processor,
    event_proxy: EventProxy,
    palette: Palette,
    /// Set when something outside the grid changed (palette), forcing the
    /// next damage query to report a full repaint.
    force_full: bool,
}

impl VtTerminal {
    /// Create a new terminal with the given dimensions.
    ///
    /// Uses 1,000 lines of scrollback history.
    pub fn new(cols: u16, rows: u16) -> Self {
        let config = Config {
            scrolling_history: 1_000,
            ..Config::default()
        };

        let size = TermSize {
            columns: cols.max(1) as usize,
            screen_lines: rows.max(1) as usize,
        };

        let event_proxy = EventProxy::default();
        let term = Term::new(config, &size, event_proxy.clone());

        Self {
            term,
            parser: ansi::Processor::new(),
            event_proxy,
            palette: Palette::default(),
            force_full: true,
        }
    }

    /// Feed raw pty output bytes into the terminal.
    pub fn write(&mut self, bytes: &[u8]) {
        self.parser.advance(&mut self.term, bytes);
    }

    /// Resize the terminal to new dimensions.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let size = TermSize {
            columns: cols.max(1) as usize,
            screen_lines: rows.max(1) as usize,
        };
        self.term.resize(size);
        self.force_full = true;
    }

    pub fn cols(&self) -> u16 {
        self.term.columns() as u16
    }

    pub fn rows(&self) -> u16 {
        self.term.screen_lines() as u16
    }

    /// Replace the palette used to resolve ANSI colors.
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
        self.force_full = true;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Move the viewport through scrollback; positive values go back in history.
    pub fn scroll(&mut self, lines: i32) {
        self.term.scroll_display(Scroll::Delta(lines));
        self.force_full = true;
    }

    /// Lines the viewport is currently scrolled back.
    pub fn display_offset(&self) -> usize {
        self.term.grid().display_offset()
    }

    /// Get a read-only view of the terminal screen.
    pub fn screen(&self) -> ScreenView<'_> {
        ScreenView::new(&self.term, &self.palette)
    }

    /// Get the cursor position in viewport coordinates.
    pub fn cursor(&self) -> CursorState {
        let content = self.term.renderable_content();
        let cursor = &content.cursor;
        let row = cursor.point.line.0 + self.display_offset() as i32;

        CursorState {
            row: row.max(0) as u16,
            col: cursor.point.column.0 as u16,
            visible: cursor.shape != ansi::CursorShape::Hidden
                && row >= 0
                && (row as usize) < self.term.screen_lines(),
        }
    }

    /// Get damage information since the last reset.
    ///
    /// After using this information for rendering, call `reset_damage()`.
    pub fn damage(&mut self) -> DamageInfo {
        if self.force_full {
            return DamageInfo::Full;
        }
        match self.term.damage() {
            TermDamage::Full => DamageInfo::Full,
            TermDamage::Partial(iter) => DamageInfo::Partial(
                iter.map(|d| DamagedRow {
                    row: d.line as u16,
                    left: d.left as u16,
                    right: d.right as u16,
                })
                .collect(),
            ),
        }
    }

    /// Reset damage tracking after rendering.
    pub fn reset_damage(&mut self) {
        self.term.reset_damage();
        self.force_full = false;
    }

    /// Drain any write-back data from the terminal (e.g. device status responses).
    pub fn take_pty_writes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.event_proxy.state.borrow_mut().pty_writes)
    }
}
