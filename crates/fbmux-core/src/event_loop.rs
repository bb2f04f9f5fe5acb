//! One cycle of the poll loop over the keyboard and every open session.

use std::io::Read;
use std::os::fd::{AsFd, BorrowedFd};
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::canvas::Canvas;
use crate::error::MuxError;
use crate::mux::Mux;
use crate::session::{Drain, Session};
use crate::slots::SlotId;
use crate::visibility::Show;

/// Longest wait for input before the caller gets control back.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// What a poll cycle saw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cycle {
    /// Timed out or interrupted by a signal.
    Idle,
    Continue,
    /// `wake` became readable; nothing else was handled so the caller can
    /// process notifications first.
    Wake,
    /// The input stream is gone; stop the loop.
    Hangup,
}

fn revents(fd: &PollFd<'_>) -> PollFlags {
    fd.revents().unwrap_or(PollFlags::empty())
}

impl<S: Session, C: Canvas> Mux<S, C> {
    /// Wait up to `timeout` for input, a wakeup on `wake` or session output,
    /// then handle one key and drain every ready session.
    ///
    /// Input is handled before session output. `wake` is only polled: when it
    /// is readable the cycle ends with [`Cycle::Wake`] before any key or
    /// output is handled, and reading it is up to the caller.
    pub fn poll_cycle<I: Read + AsFd>(
        &mut self,
        input: &mut I,
        wake: Option<BorrowedFd<'_>>,
        timeout: Duration,
    ) -> Result<Cycle, MuxError> {
        let timeout = PollTimeout::try_from(timeout).unwrap_or(PollTimeout::MAX);
        let (input_events, woken, ready) = {
            let mut fds = vec![PollFd::new(input.as_fd(), PollFlags::POLLIN)];
            if let Some(fd) = wake {
                fds.push(PollFd::new(fd, PollFlags::POLLIN));
            }
            let first_session = fds.len();
            let mut polled = Vec::new();
            for slot in self.slots.open_slots() {
                if let Some(fd) = self.slots[slot].descriptor() {
                    fds.push(PollFd::new(fd, PollFlags::POLLIN));
                    polled.push(slot);
                }
            }
            match poll(&mut fds, timeout) {
                Ok(0) | Err(Errno::EINTR) => return Ok(Cycle::Idle),
                Ok(_) => {}
                Err(e) => return Err(MuxError::Poll(e)),
            }
            let ready: Vec<(SlotId, PollFlags)> = polled
                .into_iter()
                .zip(fds[first_session..].iter().map(revents))
                .filter(|(_, ev)| !ev.is_empty())
                .collect();
            let woken = wake.is_some() && !revents(&fds[1]).is_empty();
            (revents(&fds[0]), woken, ready)
        };

        if woken {
            return Ok(Cycle::Wake);
        }

        let failure = PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL;
        if input_events.intersects(failure) {
            log::info!("input stream closed ({input_events:?})");
            return Ok(Cycle::Hangup);
        }
        if input_events.contains(PollFlags::POLLIN) {
            self.dispatch_key(input);
        }
        for (slot, events) in ready {
            self.peep(slot);
            let closed = !events.contains(PollFlags::POLLIN)
                || self.slots[slot].drain(&mut self.canvas) == Drain::Closed;
            if closed {
                self.close_slot(slot);
            }
            self.peep_back(slot);
        }
        Ok(Cycle::Continue)
    }

    /// Attach a background slot so its output lands where it belongs.
    fn peep(&mut self, slot: SlotId) {
        let current = self.current_slot();
        if slot == current {
            return;
        }
        let visible = !self.state.display_suspended
            && self.slots.tag_of(slot) == self.state.current_tag
            && self.slots.tag(self.state.current_tag).split.is_split();
        let mode = if visible { Show::Visible } else { Show::Hidden };
        self.hide_then_show(current, false, slot, mode);
    }

    fn peep_back(&mut self, slot: SlotId) {
        let current = self.current_slot();
        if slot == current {
            return;
        }
        let mode = if self.state.display_suspended {
            Show::Hidden
        } else {
            Show::Visible
        };
        self.hide_then_show(slot, false, current, mode);
    }

    /// The session in `slot` has ended.
    fn close_slot(&mut self, slot: SlotId) {
        log::info!("session in slot {} ended", slot.index());
        self.snapshots.discard(slot);
        self.slots[slot].end(&mut self.canvas);
        if self.state.single_command_mode {
            self.state.exiting = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SplitMode;
    use crate::mux::tests::{mux, open};
    use crate::slots::Instance;
    use crate::testing::{Call, FakeSession};
    use crate::MemoryCanvas;
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    /// Open `(tag, instance)` with a socket pair as its pty; returns our end.
    fn wire(mux: &mut Mux<FakeSession, MemoryCanvas>, tag: usize, instance: Instance) -> (SlotId, UnixStream) {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let slot = open(mux, tag, instance);
        mux.slots_mut()[slot].stream = Some(theirs);
        (slot, ours)
    }

    const SHORT: Duration = Duration::from_millis(200);

    #[test]
    fn test_idle_cycle_times_out() {
        let mut mux = mux();
        let (mut keyboard, _typist) = UnixStream::pair().unwrap();
        let cycle = mux.poll_cycle(&mut keyboard, None, Duration::from_millis(10)).unwrap();
        assert_eq!(cycle, Cycle::Idle);
    }

    #[test]
    fn test_key_reaches_current_session() {
        let mut mux = mux();
        let (slot, _child) = wire(&mut mux, 0, Instance::Main);
        let (mut keyboard, mut typist) = UnixStream::pair().unwrap();
        typist.write_all(b"q").unwrap();
        assert_eq!(mux.poll_cycle(&mut keyboard, None, SHORT).unwrap(), Cycle::Continue);
        assert_eq!(mux.slots()[slot].sent, b"q");
    }

    #[test]
    fn test_input_hangup_ends_loop() {
        let mut mux = mux();
        let (mut keyboard, typist) = UnixStream::pair().unwrap();
        drop(typist);
        let cycle = mux.poll_cycle(&mut keyboard, None, SHORT).unwrap();
        assert_eq!(cycle, Cycle::Hangup);
    }

    #[test]
    fn test_background_output_is_drained_hidden() {
        let mut mux = mux();
        let current = open(&mut mux, 0, Instance::Main);
        let (slot, mut child) = wire(&mut mux, 1, Instance::Main);
        child.write_all(b"hello").unwrap();
        let (mut keyboard, _typist) = UnixStream::pair().unwrap();
        mux.slots_mut()[slot].calls.clear();

        mux.poll_cycle(&mut keyboard, None, SHORT).unwrap();
        let calls = &mux.slots()[slot].calls;
        assert_eq!(calls[0], Call::Attach(false));
        assert!(calls.contains(&Call::Drain));
        assert_eq!(mux.slots()[slot].text, "hello");
        // Focus is back on the current slot.
        assert!(mux.slots()[current].is_visible());
        assert_eq!(mux.slots()[slot].attached, None);
    }

    #[test]
    fn test_split_partner_is_drained_visible() {
        let mut mux = mux();
        open(&mut mux, 0, Instance::Main);
        let (slot, mut child) = wire(&mut mux, 0, Instance::Alternate);
        mux.set_split(SplitMode::Horizontal);
        child.write_all(b"x").unwrap();
        let (mut keyboard, _typist) = UnixStream::pair().unwrap();
        mux.slots_mut()[slot].calls.clear();

        mux.poll_cycle(&mut keyboard, None, SHORT).unwrap();
        assert_eq!(mux.slots()[slot].calls[0], Call::Attach(true));
    }

    #[test]
    fn test_ended_session_is_closed() {
        let mut mux = mux();
        let (slot, child) = wire(&mut mux, 0, Instance::Main);
        drop(child);
        let (mut keyboard, _typist) = UnixStream::pair().unwrap();

        mux.poll_cycle(&mut keyboard, None, SHORT).unwrap();
        assert!(!mux.slots().is_open(slot));
        assert_eq!(mux.slots()[slot].count(&Call::End), 1);
        assert!(!mux.state().exiting);
    }

    #[test]
    fn test_single_command_exits_with_session() {
        let mut mux = mux();
        mux.state_mut().single_command_mode = true;
        let (slot, child) = wire(&mut mux, 0, Instance::Main);
        drop(child);
        let (mut keyboard, _typist) = UnixStream::pair().unwrap();

        mux.poll_cycle(&mut keyboard, None, SHORT).unwrap();
        assert!(!mux.slots().is_open(slot));
        assert!(mux.state().exiting);
    }

    #[test]
    fn test_ended_session_loses_snapshot() {
        let mut mux = mux();
        // Tag 2 keeps snapshots.
        let (slot, child) = wire(&mut mux, 2, Instance::Main);
        mux.switch_tag(2);
        mux.switch_tag(0);
        assert!(mux.snapshots.contains(slot));
        drop(child);
        let (mut keyboard, _typist) = UnixStream::pair().unwrap();

        mux.poll_cycle(&mut keyboard, None, SHORT).unwrap();
        assert!(!mux.snapshots.contains(slot));
    }

    #[test]
    fn test_wake_fd_ends_wait() {
        let mut mux = mux();
        let (mut keyboard, _typist) = UnixStream::pair().unwrap();
        let (wake, mut waker) = UnixStream::pair().unwrap();
        waker.write_all(&[1]).unwrap();
        let cycle = mux
            .poll_cycle(&mut keyboard, Some(wake.as_fd()), Duration::from_secs(5))
            .unwrap();
        assert_eq!(cycle, Cycle::Wake);
    }

    #[test]
    fn test_wake_preempts_input_and_output() {
        let mut mux = mux();
        let (slot, mut child) = wire(&mut mux, 0, Instance::Main);
        let (mut keyboard, mut typist) = UnixStream::pair().unwrap();
        let (wake, mut waker) = UnixStream::pair().unwrap();
        typist.write_all(b"x").unwrap();
        child.write_all(b"output").unwrap();
        waker.write_all(&[1]).unwrap();

        let cycle = mux.poll_cycle(&mut keyboard, Some(wake.as_fd()), SHORT).unwrap();
        assert_eq!(cycle, Cycle::Wake);
        assert!(mux.slots()[slot].sent.is_empty());
        assert_eq!(mux.slots()[slot].count(&Call::Drain), 0);

        let mut drained = [0u8; 1];
        (&wake).read_exact(&mut drained).unwrap();
        let cycle = mux.poll_cycle(&mut keyboard, Some(wake.as_fd()), SHORT).unwrap();
        assert_eq!(cycle, Cycle::Continue);
        assert_eq!(mux.slots()[slot].sent, b"x");
        assert_eq!(mux.slots()[slot].count(&Call::Drain), 1);
    }
}
