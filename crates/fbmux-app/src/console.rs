//! The controlling virtual terminal: raw keyboard input and the console
//! switching protocol.

use std::ffi::c_char;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};

use fbmux_core::Console;
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::signal::Signal;
use nix::sys::termios::{self, SetArg, Termios};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use nix::{ioctl_write_int_bad, ioctl_write_ptr_bad};

const VT_SETMODE: u16 = 0x5602;
const VT_RELDISP: u16 = 0x5605;
const VT_AUTO: c_char = 0;
const VT_PROCESS: c_char = 1;

/// `struct vt_mode` from `<linux/vt.h>`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
struct VtMode {
    mode: c_char,
    waitv: c_char,
    relsig: i16,
    acqsig: i16,
    frsig: i16,
}

impl VtMode {
    fn process(release: Signal, acquire: Signal) -> Self {
        Self {
            mode: VT_PROCESS,
            relsig: release as i16,
            acqsig: acquire as i16,
            ..Self::default()
        }
    }
}

ioctl_write_ptr_bad!(vt_setmode, VT_SETMODE, VtMode);
ioctl_write_int_bad!(vt_reldisp, VT_RELDISP);

/// Owns the terminal settings of standard input while the multiplexer runs.
///
/// Dropping it puts back the saved line discipline, file flags and console
/// mode.
pub struct VtConsole {
    fd: RawFd,
    saved_termios: Option<Termios>,
    saved_flags: Option<OFlag>,
    process_mode: bool,
}

impl VtConsole {
    /// Put `input` in raw non-blocking mode and ask the kernel to signal
    /// console switches with `SIGUSR1` (release) and `SIGUSR2` (acquire).
    ///
    /// Each step that fails is logged and skipped; input that is not a
    /// virtual terminal still works.
    pub fn setup(input: BorrowedFd<'_>) -> io::Result<Self> {
        let fd = input.as_raw_fd();
        let mut console = Self {
            fd,
            saved_termios: None,
            saved_flags: None,
            process_mode: false,
        };

        match termios::tcgetattr(input) {
            Ok(saved) => {
                let mut raw = saved.clone();
                termios::cfmakeraw(&mut raw);
                termios::tcsetattr(input, SetArg::TCSANOW, &raw)?;
                console.saved_termios = Some(saved);
            }
            Err(e) => log::warn!("input is not a terminal: {e}"),
        }

        let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
        fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
        console.saved_flags = Some(flags);

        let mode = VtMode::process(Signal::SIGUSR1, Signal::SIGUSR2);
        // SAFETY: `mode` is a live `struct vt_mode` for the duration of the call.
        match unsafe { vt_setmode(fd, &mode) } {
            Ok(_) => console.process_mode = true,
            Err(e) => log::warn!("console switching stays automatic: {e}"),
        }
        Ok(console)
    }

    fn borrowed(&self) -> BorrowedFd<'_> {
        // SAFETY: the caller of `setup` keeps the descriptor open for the
        // life of this value.
        unsafe { BorrowedFd::borrow_raw(self.fd) }
    }
}

impl Console for VtConsole {
    fn acknowledge_release(&mut self) -> io::Result<()> {
        // SAFETY: VT_RELDISP takes its argument by value.
        unsafe { vt_reldisp(self.fd, 1) }
            .map(drop)
            .map_err(io::Error::from)
    }

    fn reap_children(&mut self) {
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
                Ok(status) => log::debug!("reaped {status:?}"),
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    log::debug!("waitpid: {e}");
                    break;
                }
            }
        }
    }
}

impl Drop for VtConsole {
    fn drop(&mut self) {
        if self.process_mode {
            let mode = VtMode {
                mode: VT_AUTO,
                ..VtMode::default()
            };
            // SAFETY: as in `setup`.
            if let Err(e) = unsafe { vt_setmode(self.fd, &mode) } {
                log::debug!("restoring console mode: {e}");
            }
        }
        if let Some(flags) = self.saved_flags {
            let _ = fcntl(self.fd, FcntlArg::F_SETFL(flags));
        }
        if let Some(saved) = self.saved_termios.take() {
            if let Err(e) = termios::tcsetattr(self.borrowed(), SetArg::TCSANOW, &saved) {
                log::warn!("restoring terminal settings: {e}");
            }
        }
    }
}
