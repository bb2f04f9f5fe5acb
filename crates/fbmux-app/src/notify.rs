//! Signals turned into notifications for the main loop.
//!
//! A background thread waits on the signals and queues one notification per
//! delivery, then writes a byte to a socket the poll loop watches, so a
//! signal cuts the current wait short.

use std::io::{self, Read, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use fbmux_core::Notification;
use signal_hook::consts::signal::{SIGALRM, SIGCHLD, SIGUSR1, SIGUSR2};
use signal_hook::iterator::{Handle, Signals};

/// The notification a signal stands for.
fn notification(signal: i32) -> Option<Notification> {
    match signal {
        SIGUSR1 => Some(Notification::Release),
        SIGUSR2 => Some(Notification::Acquire),
        SIGCHLD => Some(Notification::ChildExited),
        SIGALRM => Some(Notification::Tick),
        _ => None,
    }
}

pub struct Notifier {
    queue: Receiver<Notification>,
    wake: UnixStream,
    handle: Handle,
    thread: Option<JoinHandle<()>>,
    interval: Option<Duration>,
    last_tick: Instant,
}

impl Notifier {
    /// Start listening. With `interval`, a [`Notification::Tick`] is also
    /// produced that often.
    pub fn new(interval: Option<Duration>) -> io::Result<Self> {
        let (wake, mut ring) = UnixStream::pair()?;
        wake.set_nonblocking(true)?;
        ring.set_nonblocking(true)?;
        let mut signals = Signals::new([SIGUSR1, SIGUSR2, SIGCHLD, SIGALRM])?;
        let handle = signals.handle();
        let (tx, queue) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    let Some(notification) = notification(signal) else {
                        continue;
                    };
                    if tx.send(notification).is_err() {
                        break;
                    }
                    // A full socket already has a wakeup pending.
                    let _ = ring.write(&[1]);
                }
            })?;
        Ok(Self {
            queue,
            wake,
            handle,
            thread: Some(thread),
            interval,
            last_tick: Instant::now(),
        })
    }

    /// Readable while notifications are pending.
    pub fn wake_fd(&self) -> BorrowedFd<'_> {
        self.wake.as_fd()
    }

    /// Everything pending, in arrival order, with repeats of the same
    /// notification merged.
    pub fn take(&mut self) -> Vec<Notification> {
        let mut buf = [0u8; 64];
        while matches!(self.wake.read(&mut buf), Ok(n) if n > 0) {}

        let mut pending: Vec<Notification> = self.queue.try_iter().collect();
        if let Some(interval) = self.interval {
            if self.last_tick.elapsed() >= interval {
                self.last_tick = Instant::now();
                pending.push(Notification::Tick);
            }
        }
        pending.dedup();
        pending
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
