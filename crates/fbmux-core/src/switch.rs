//! Changing the current tag, instance and split.

use crate::canvas::Canvas;
use crate::layout::SplitMode;
use crate::mux::Mux;
use crate::session::Session;
use crate::slots::SlotId;
use crate::visibility::Show;

impl<S: Session, C: Canvas> Mux<S, C> {
    /// Make `target` the current slot.
    ///
    /// Refused in single-command mode and, while tag switching is locked,
    /// for a target in another tag.
    pub fn switch_to(&mut self, target: SlotId) {
        let current = self.current_slot();
        if target == current || self.state.single_command_mode {
            return;
        }
        let tag = self.slots.tag_of(target);
        let same_tag = tag == self.state.current_tag;
        if self.state.tag_switch_locked && !same_tag {
            log::debug!("tag switching is locked");
            return;
        }
        if !same_tag {
            self.state.last_tag = self.state.current_tag;
        }

        let split = self.slots.tag(tag).split.is_split();
        if same_tag {
            if split {
                // Both panes are on screen already.
                self.hide_then_show(current, false, target, Show::Visible);
            } else {
                self.hide_then_show(current, true, target, Show::Load);
            }
        } else {
            let shown = self.hide_then_show(current, true, target, Show::Load);
            if split {
                // A restored snapshot already holds the partner pane.
                let partner = self.slots.other_instance(target);
                let partner_mode = if shown == Show::Load {
                    Show::Visible
                } else {
                    Show::Load
                };
                self.hide_then_show(target, false, partner, partner_mode);
                self.hide_then_show(partner, false, target, Show::Visible);
            }
        }

        self.state.current_tag = tag;
        let instance = self.slots.instance_of(target);
        self.slots.tag_mut(tag).active = instance;
    }

    /// Switch to the other instance of the current tag.
    pub fn switch_sibling(&mut self) {
        let sibling = self.slots.other_instance(self.current_slot());
        self.switch_to(sibling);
    }

    /// Switch to the active instance of `tag`.
    pub fn switch_tag(&mut self, tag: usize) {
        if tag < self.slots.tag_count() {
            self.switch_to(self.slots.active_slot(tag));
        }
    }

    /// Change the current tag's split and repaint both of its panes.
    pub fn set_split(&mut self, mode: SplitMode) {
        let tag = self.state.current_tag;
        self.slots.tag_mut(tag).split = mode;
        let current = self.current_slot();
        let partner = self.slots.other_instance(current);
        self.hide_then_show(current, false, partner, Show::Redraw);
        self.hide_then_show(partner, true, current, Show::Redraw);
    }

    /// Alternate between horizontal and vertical split.
    pub fn cycle_split(&mut self) {
        let next = match self.slots.tag(self.state.current_tag).split {
            SplitMode::Horizontal => SplitMode::Vertical,
            _ => SplitMode::Horizontal,
        };
        self.set_split(next);
    }
}
