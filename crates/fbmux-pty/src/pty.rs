use std::ffi::OsString;
use std::io::{Read, Write};
use std::os::fd::{BorrowedFd, RawFd};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};

/// Errors from PTY operations.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    #[error("PTY spawn failed: {0}")]
    SpawnFailed(String),
    #[error("PTY I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PTY resize failed: {0}")]
    ResizeFailed(String),
    #[error("cannot signal child: {0}")]
    Signal(#[from] nix::errno::Errno),
}

/// Owns a child process on a pty, with the master side's reader and writer.
pub struct PtyHandle {
    master: Box<dyn MasterPty + Send>,
    fd: RawFd,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
}

impl PtyHandle {
    /// Start `argv` on a new pty of `cols x rows` cells.
    ///
    /// The child runs in the current directory with `TERM=linux`.
    pub fn spawn(argv: &[String], cols: u16, rows: u16) -> Result<Self, PtyError> {
        if argv.is_empty() {
            return Err(PtyError::SpawnFailed("empty command".into()));
        }
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(size(cols, rows))
            .map_err(|e| PtyError::SpawnFailed(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::from_argv(argv.iter().map(OsString::from).collect());
        cmd.env("TERM", "linux");
        if let Ok(dir) = std::env::current_dir() {
            cmd.cwd(dir);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::SpawnFailed(format!("failed to spawn {}: {e}", argv[0])))?;

        let fd = pair
            .master
            .as_raw_fd()
            .ok_or_else(|| PtyError::SpawnFailed("PTY master has no descriptor".into()))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to clone reader: {e}")))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to take writer: {e}")))?;

        Ok(Self {
            master: pair.master,
            fd,
            reader,
            writer,
            child,
        })
    }

    /// The master side, for polling.
    pub fn descriptor(&self) -> BorrowedFd<'_> {
        // SAFETY: `fd` belongs to `self.master`, which lives as long as `self`.
        unsafe { BorrowedFd::borrow_raw(self.fd) }
    }

    /// Resize the PTY to new dimensions.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        self.master
            .resize(size(cols, rows))
            .map_err(|e| PtyError::ResizeFailed(format!("{e}")))
    }

    /// Write bytes to the PTY master (keys -> child).
    pub fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read output from the PTY master (child -> us).
    ///
    /// Blocks when nothing is pending; poll [`PtyHandle::descriptor`] first.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, PtyError> {
        Ok(self.reader.read(buf)?)
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Send `signal` to the child.
    pub fn signal(&self, signal: Signal) -> Result<(), PtyError> {
        let pid = self
            .pid()
            .ok_or_else(|| PtyError::SpawnFailed("child has no pid".into()))?;
        kill(Pid::from_raw(pid as i32), signal)?;
        Ok(())
    }

    /// Kill the child unless it has already exited.
    ///
    /// A child reaped elsewhere (a `waitpid(-1)` in the host) counts as
    /// exited; its pid may already belong to another process.
    pub fn terminate(&mut self) {
        if self.state() == ChildState::Running {
            if let Err(e) = self.child.kill() {
                log::debug!("kill: {e}");
            }
            let _ = self.state();
        }
    }

    /// Check if the child process is still alive.
    pub fn is_alive(&mut self) -> bool {
        self.state() == ChildState::Running
    }

    /// Get the child process exit status if it has exited.
    ///
    /// Returns `None` if the process is still running or was reaped by
    /// someone else.
    pub fn try_wait(&mut self) -> Option<u32> {
        match self.state() {
            ChildState::Exited(code) => Some(code),
            ChildState::Running | ChildState::Reaped => None,
        }
    }

    fn state(&mut self) -> ChildState {
        match self.child.try_wait() {
            Ok(None) => ChildState::Running,
            Ok(Some(status)) => ChildState::Exited(status.exit_code()),
            Err(e) => {
                log::debug!("child already collected: {e}");
                ChildState::Reaped
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChildState {
    Running,
    Exited(u32),
    Reaped,
}

fn size(cols: u16, rows: u16) -> PtySize {
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}
