//! Reacting to console notifications: VT release/acquire, child exits and
//! status ticks.

use std::io;

use crate::canvas::Canvas;
use crate::mux::Mux;
use crate::session::Session;
use crate::visibility::Show;

/// An asynchronous event from the host, handled between poll cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notification {
    /// The kernel wants the display for another console.
    Release,
    /// The display is ours again.
    Acquire,
    ChildExited,
    /// Time to re-read the status source.
    Tick,
}

/// The host side of the console switching protocol.
pub trait Console {
    /// Let the kernel complete a pending switch away. Must not block.
    fn acknowledge_release(&mut self) -> io::Result<()>;

    /// Collect every exited child without blocking.
    fn reap_children(&mut self);
}

impl<S: Session, C: Canvas> Mux<S, C> {
    /// Handle one notification. Nothing is done once exiting.
    pub fn handle_notification(&mut self, notification: Notification, console: &mut dyn Console) {
        if self.state.exiting {
            return;
        }
        log::debug!("notification {notification:?}");
        match notification {
            Notification::Release => {
                self.state.display_suspended = true;
                self.hide(self.current_slot(), true);
                if let Err(e) = console.acknowledge_release() {
                    log::warn!("cannot release the console: {e}");
                }
            }
            Notification::Acquire => {
                self.state.display_suspended = false;
                if let Err(e) = self.canvas.reload_colormap() {
                    log::warn!("cannot restore the color map: {e}");
                }
                let current = self.current_slot();
                let split = self.slots.tag(self.state.current_tag).split.is_split();
                if self.show(current, Show::Load) == Show::Redraw && split {
                    let partner = self.slots.other_instance(current);
                    self.hide_then_show(current, false, partner, Show::Redraw);
                    self.hide_then_show(partner, false, current, Show::Visible);
                }
            }
            Notification::ChildExited => console.reap_children(),
            // The text is kept current while away; drawing checks suspension.
            Notification::Tick => self.refresh_status(),
        }
    }
}
