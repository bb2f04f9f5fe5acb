//! Key dispatch: pass-through bytes, command keys and the password lock.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use fbmux_vt::Palette;

use crate::canvas::Canvas;
use crate::config::MuxConfig;
use crate::mux::Mux;
use crate::session::{Launch, Session};
use crate::state::PASSWORD_CAPACITY;

const fn ctrl(key: u8) -> u8 {
    key - 96
}

/// Outcome of a password check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
    /// The check could not be made; never unlocks.
    Unavailable,
}

/// Checks the lock password of a user.
pub trait PasswordVerifier {
    fn verify(&self, user: &str, password: &str) -> Verdict;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Program {
    Shell,
    Mail,
    Editor,
}

/// What a byte following the escape key asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Spawn { program: Program, switch_signals: bool },
    Sibling,
    LastTag,
    ToggleBar,
    NextOpen,
    Quit,
    Screenshot { timestamped: bool },
    Redraw,
    ReloadPalette,
    Lock,
    ToggleTagLock,
    /// Half a screen back (`true`) or forward through history.
    Scroll { back: bool },
    CycleSplit,
    Unsplit,
    Tag(usize),
    /// Not a command: the escape and the byte go to the session.
    Forward(u8),
}

impl Command {
    pub fn parse(key: u8, config: &MuxConfig) -> Self {
        match key {
            b'c' => Self::Spawn {
                program: Program::Shell,
                switch_signals: false,
            },
            b';' => Self::Spawn {
                program: Program::Shell,
                switch_signals: true,
            },
            b'm' => Self::Spawn {
                program: Program::Mail,
                switch_signals: false,
            },
            b'e' => Self::Spawn {
                program: Program::Editor,
                switch_signals: false,
            },
            b'j' | b'k' => Self::Sibling,
            b'o' => Self::LastTag,
            b'p' => Self::ToggleBar,
            b'\t' => Self::NextOpen,
            k if k == ctrl(b'q') => Self::Quit,
            b's' => Self::Screenshot { timestamped: false },
            k if k == ctrl(b's') => Self::Screenshot { timestamped: true },
            b'y' => Self::Redraw,
            k if k == ctrl(b'e') => Self::ReloadPalette,
            k if k == ctrl(b'l') => Self::Lock,
            k if k == ctrl(b'o') => Self::ToggleTagLock,
            b',' => Self::Scroll { back: true },
            b'.' => Self::Scroll { back: false },
            b'=' => Self::CycleSplit,
            b'-' => Self::Unsplit,
            k => match config.tag_index(k) {
                Some(tag) => Self::Tag(tag),
                None => Self::Forward(k),
            },
        }
    }

    /// Whether the command can change what is on screen, so the status bar
    /// is repainted after it.
    pub fn repaints_status(self) -> bool {
        matches!(
            self,
            Self::Spawn { .. }
                | Self::Sibling
                | Self::LastTag
                | Self::NextOpen
                | Self::Redraw
                | Self::ReloadPalette
                | Self::CycleSplit
                | Self::Unsplit
                | Self::Tag(_)
        )
    }
}

/// Read one byte; nothing pending or a read error yields `None`.
fn read_byte<R: Read>(input: &mut R) -> Option<u8> {
    let mut byte = [0u8; 1];
    match input.read(&mut byte) {
        Ok(1) => Some(byte[0]),
        Ok(_) => None,
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
        Err(e) => {
            log::debug!("input read failed: {e}");
            None
        }
    }
}

impl<S: Session, C: Canvas> Mux<S, C> {
    /// Consume one key from `input` and act on it.
    pub fn dispatch_key<R: Read>(&mut self, input: &mut R) {
        let Some(byte) = read_byte(input) else {
            return;
        };
        if self.state.locked && self.verifier.is_some() {
            self.password_key(byte);
            return;
        }
        if byte != self.config.escape {
            self.send_current(&[byte]);
            return;
        }
        match read_byte(input) {
            Some(key) => self.run_command(Command::parse(key, &self.config)),
            None => self.send_current(&[byte]),
        }
    }

    fn password_key(&mut self, byte: u8) {
        if byte == b'\r' {
            let password = String::from_utf8_lossy(&self.state.password).into_owned();
            self.state.password.clear();
            let user = self.user.as_deref().unwrap_or_default();
            let verdict = self
                .verifier
                .as_ref()
                .map_or(Verdict::Unavailable, |v| v.verify(user, &password));
            match verdict {
                Verdict::Accepted => {
                    log::info!("unlocked");
                    self.state.locked = false;
                }
                Verdict::Rejected => log::info!("wrong password"),
                Verdict::Unavailable => log::warn!("password check unavailable"),
            }
            return;
        }
        if (0x20..=0x7e).contains(&byte) && self.state.password.len() < PASSWORD_CAPACITY {
            self.state.password.push(byte);
        }
    }

    fn send_current(&mut self, bytes: &[u8]) {
        let current = self.current_slot();
        if self.slots.is_open(current) {
            self.slots[current].send(bytes);
        }
    }

    /// Carry out a command key.
    pub fn run_command(&mut self, command: Command) {
        log::trace!("command {command:?}");
        match command {
            Command::Spawn {
                program,
                switch_signals,
            } => {
                let argv = match program {
                    Program::Shell => &self.config.shell,
                    Program::Mail => &self.config.mail,
                    Program::Editor => &self.config.editor,
                };
                let launch = Launch {
                    argv: argv.clone(),
                    switch_signals,
                };
                self.spawn_current(&launch);
            }
            Command::Sibling => self.switch_sibling(),
            Command::LastTag => self.switch_tag(self.state.last_tag),
            Command::ToggleBar => self.toggle_bar(),
            Command::NextOpen => {
                let current = self.current_slot();
                let next = self.slots.next_open_slot(current);
                if next != current {
                    self.switch_to(next);
                }
            }
            Command::Quit => {
                log::info!("exit requested");
                self.state.exiting = true;
            }
            Command::Screenshot { timestamped } => self.screenshot(timestamped),
            Command::Redraw => self.redraw_current(),
            Command::ReloadPalette => {
                if self.reload_palette() {
                    self.redraw_current();
                }
            }
            Command::Lock => {
                self.state.locked = true;
                self.state.password.clear();
            }
            Command::ToggleTagLock => {
                self.state.tag_switch_locked = !self.state.tag_switch_locked;
            }
            Command::Scroll { back } => {
                let current = self.current_slot();
                let half = (self.region_of(current).rows / 2) as i32;
                let lines = if back { half } else { -half };
                if self.slots.is_open(current) {
                    self.slots[current].scroll(&mut self.canvas, lines);
                }
            }
            Command::CycleSplit => self.cycle_split(),
            Command::Unsplit => self.set_split(Default::default()),
            Command::Tag(tag) => self.switch_tag(tag),
            Command::Forward(key) => self.send_current(&[self.config.escape, key]),
        }
        if command.repaints_status() {
            self.repaint_status();
        }
    }

    /// Load the color file into every session.
    fn reload_palette(&mut self) -> bool {
        let Some(path) = self.config.palette_file.as_ref() else {
            log::debug!("no palette file configured");
            return false;
        };
        match Palette::load(path) {
            Ok(palette) => {
                for session in self.slots.sessions_mut() {
                    session.set_palette(&palette);
                }
                true
            }
            Err(e) => {
                log::warn!("palette {}: {e}", path.display());
                false
            }
        }
    }

    pub(crate) fn screenshot_path(&self, timestamped: bool) -> PathBuf {
        let mut name = self.config.screenshot.clone().into_os_string();
        if let Some(user) = &self.user {
            name.push("-");
            name.push(user);
        }
        if timestamped {
            name.push(chrono::Local::now().format("-%Y%m%d-%H%M%S").to_string());
        }
        PathBuf::from(name)
    }

    fn screenshot(&mut self, timestamped: bool) {
        let Some(text) = self.slots[self.current_slot()].screen_text() else {
            return;
        };
        let path = self.screenshot_path(timestamped);
        match fs::write(&path, text) {
            Ok(()) => log::info!("screenshot written to {}", path.display()),
            Err(e) => log::warn!("screenshot {}: {e}", path.display()),
        }
    }
}
