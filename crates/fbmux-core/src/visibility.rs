//! Hiding and showing slots.
//!
//! A slot's visibility is not stored; it follows from which session is
//! attached and how. These transitions are the only way the multiplexer
//! changes what is on screen.

use fbmux_vt::Rgb;

use crate::canvas::Canvas;
use crate::layout::BORDER;
use crate::mux::Mux;
use crate::session::Session;
use crate::slots::SlotId;

/// Color of the frame around the focused pane of a split tag.
pub const FOCUS_BORDER: Rgb = Rgb::from_u32(0xff0000);
const CLEAR_BORDER: Rgb = Rgb::from_u32(0x000000);

/// How to show a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Show {
    /// Attach without painting.
    Hidden,
    /// Attach and paint what changed.
    Visible,
    /// Bring back the saved snapshot, falling back to [`Show::Redraw`].
    Load,
    /// Attach and repaint every cell.
    Redraw,
}

impl<S: Session, C: Canvas> Mux<S, C> {
    /// Detach `slot`. With `save`, an open session is told it is hidden and
    /// the screen is captured if its tag keeps snapshots.
    pub fn hide(&mut self, slot: SlotId, save: bool) {
        let open = self.slots.is_open(slot);
        if save && open {
            self.slots[slot].suspend();
            if self.is_saved(slot) {
                self.snapshots.capture(slot, &self.canvas);
            }
        }
        self.slots[slot].detach();
    }

    /// Attach `slot` to its region and paint it as `mode` asks.
    ///
    /// Returns the mode actually used: a [`Show::Load`] whose snapshot
    /// cannot be restored comes back as [`Show::Redraw`], and everything is
    /// [`Show::Hidden`] while the display is suspended.
    pub fn show(&mut self, slot: SlotId, mode: Show) -> Show {
        let mut mode = if self.state.display_suspended {
            Show::Hidden
        } else {
            mode
        };
        let region = self.region_of(slot);
        let open = self.slots.is_open(slot);
        self.slots[slot].attach(region, mode != Show::Hidden);
        if mode == Show::Load {
            let restored =
                open && self.is_saved(slot) && self.snapshots.restore(slot, &mut self.canvas);
            if !restored {
                log::trace!("no snapshot for slot {}, repainting", slot.index());
                mode = Show::Redraw;
            }
        }
        if mode != Show::Hidden {
            self.slots[slot].redraw(&mut self.canvas, mode == Show::Redraw);
        }
        if matches!(mode, Show::Load | Show::Redraw) && open {
            self.slots[slot].resume();
        }
        mode
    }

    /// Hide `old` and show `new`, moving the focus frame when both belong
    /// to the same split tag.
    pub fn hide_then_show(&mut self, old: SlotId, save: bool, new: SlotId, mode: Show) -> Show {
        let old_tag = self.slots.tag_of(old);
        let new_tag = self.slots.tag_of(new);
        let drawing = mode != Show::Hidden && !self.state.display_suspended;
        self.hide(old, save);
        if drawing && old_tag == new_tag && self.slots.tag(old_tag).split.is_split() {
            let region = self.region_of(old);
            self.canvas.border(&region, CLEAR_BORDER, BORDER);
        }
        let shown = self.show(new, mode);
        if drawing && self.slots.tag(new_tag).split.is_split() {
            let region = self.region_of(new);
            self.canvas.border(&region, FOCUS_BORDER, BORDER);
        }
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SplitMode;
    use crate::mux::tests::{mux, open};
    use crate::slots::Instance;
    use crate::testing::Call;

    #[test]
    fn test_load_without_snapshot_escalates() {
        let mut mux = mux();
        let slot = open(&mut mux, 2, Instance::Main);
        assert_eq!(mux.show(slot, Show::Load), Show::Redraw);
        assert_eq!(mux.slots()[slot].redraws(), vec![true]);
        assert_eq!(mux.slots()[slot].count(&Call::Resume), 1);
    }

    #[test]
    fn test_load_restores_saved_tag() {
        let mut mux = mux();
        let slot = open(&mut mux, 2, Instance::Main);
        mux.show(slot, Show::Redraw);
        let painted = mux.canvas().capture();

        mux.hide(slot, true);
        assert_eq!(mux.slots()[slot].count(&Call::Suspend), 1);
        let other = open(&mut mux, 1, Instance::Main);
        mux.show(other, Show::Redraw);
        assert_ne!(mux.canvas().capture(), painted);

        assert_eq!(mux.show(slot, Show::Load), Show::Load);
        assert_eq!(mux.canvas().capture(), painted);
        assert_eq!(mux.slots()[slot].redraws(), vec![true, false]);
    }

    #[test]
    fn test_unsaved_tag_never_restores() {
        let mut mux = mux();
        let slot = open(&mut mux, 1, Instance::Main);
        mux.hide(slot, true);
        assert_eq!(mux.show(slot, Show::Load), Show::Redraw);
    }

    #[test]
    fn test_closed_slot_is_not_resumed() {
        let mut mux = mux();
        let slot = mux.slots().slot_of(1, Instance::Alternate);
        assert_eq!(mux.show(slot, Show::Load), Show::Redraw);
        assert_eq!(mux.slots()[slot].count(&Call::Resume), 0);
        mux.hide(slot, true);
        assert_eq!(mux.slots()[slot].count(&Call::Suspend), 0);
    }

    #[test]
    fn test_hidden_show_does_not_paint() {
        let mut mux = mux();
        let slot = open(&mut mux, 1, Instance::Main);
        let before = mux.canvas().capture();
        assert_eq!(mux.show(slot, Show::Hidden), Show::Hidden);
        assert!(!mux.slots()[slot].is_visible());
        assert!(mux.slots()[slot].redraws().is_empty());
        assert_eq!(mux.canvas().capture(), before);
    }

    #[test]
    fn test_suspended_display_forces_hidden() {
        let mut mux = mux();
        let slot = open(&mut mux, 1, Instance::Main);
        mux.state_mut().display_suspended = true;
        assert_eq!(mux.show(slot, Show::Redraw), Show::Hidden);
        assert!(mux.slots()[slot].redraws().is_empty());
    }

    #[test]
    fn test_focus_border_follows_split_pane() {
        let mut mux = mux();
        let main = open(&mut mux, 0, Instance::Main);
        let alt = open(&mut mux, 0, Instance::Alternate);
        mux.slots_mut().tag_mut(0).split = SplitMode::Vertical;

        mux.hide_then_show(main, false, alt, Show::Visible);
        let borders = mux.canvas().borders().to_vec();
        assert_eq!(borders.len(), 2);
        assert_eq!(borders[0], (mux.region_of(main), CLEAR_BORDER));
        assert_eq!(borders[1], (mux.region_of(alt), FOCUS_BORDER));
        assert!(mux.slots()[alt].is_visible());
        assert_eq!(mux.slots()[main].attached, None);
    }

    #[test]
    fn test_unsplit_switch_draws_no_border() {
        let mut mux = mux();
        let a = open(&mut mux, 0, Instance::Main);
        let b = open(&mut mux, 1, Instance::Main);
        mux.hide_then_show(a, true, b, Show::Load);
        assert!(mux.canvas().borders().is_empty());
    }
}
