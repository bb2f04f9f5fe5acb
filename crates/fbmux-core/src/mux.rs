//! The multiplexer: slot table, display and mode flags in one owner.

use crate::canvas::Canvas;
use crate::config::MuxConfig;
use crate::error::MuxError;
use crate::input::PasswordVerifier;
use crate::layout::{region, Region};
use crate::session::{Launch, Session};
use crate::slots::{SlotId, SlotTable};
use crate::snapshot::Snapshots;
use crate::state::MuxState;
use crate::status::StatusBar;

/// Drives every session of the process on one canvas.
///
/// All mutation happens on the thread that owns this value: poll cycles,
/// key dispatch and console notifications are serialized by the caller.
pub struct Mux<S, C> {
    pub(crate) slots: SlotTable<S>,
    pub(crate) canvas: C,
    pub(crate) snapshots: Snapshots,
    pub(crate) state: MuxState,
    pub(crate) bar: StatusBar,
    pub(crate) config: MuxConfig,
    pub(crate) verifier: Option<Box<dyn PasswordVerifier>>,
    pub(crate) user: Option<String>,
}

impl<S: Session, C: Canvas> Mux<S, C> {
    /// Build the slot table, creating each slot's (closed) session with `make`.
    pub fn new(
        config: MuxConfig,
        canvas: C,
        make: impl FnMut(SlotId) -> S,
    ) -> Result<Self, MuxError> {
        config.validate()?;
        let slots = SlotTable::new(config.tag_count(), make);
        let bar = StatusBar::new(config.status_file.clone());
        log::debug!("{} tags, {} slots", slots.tag_count(), slots.len());
        Ok(Self {
            slots,
            canvas,
            snapshots: Snapshots::new(),
            state: MuxState::default(),
            bar,
            config,
            verifier: None,
            user: None,
        })
    }

    /// Gate input behind `verifier` when locked.
    pub fn with_verifier(mut self, verifier: Box<dyn PasswordVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// The invoking user, for password checks and screenshot names.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn slots(&self) -> &SlotTable<S> {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotTable<S> {
        &mut self.slots
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn state(&self) -> &MuxState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MuxState {
        &mut self.state
    }

    pub fn bar(&self) -> &StatusBar {
        &self.bar
    }

    pub fn bar_mut(&mut self) -> &mut StatusBar {
        &mut self.bar
    }

    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// The active slot of the current tag.
    pub fn current_slot(&self) -> SlotId {
        self.slots.active_slot(self.state.current_tag)
    }

    /// Where `slot` is drawn under its tag's current split.
    pub fn region_of(&self, slot: SlotId) -> Region {
        let split = self.slots.tag(self.slots.tag_of(slot)).split;
        region(split, self.slots.instance_of(slot), &self.canvas.geometry())
    }

    /// Whether hidden screens of `slot`'s tag are kept as snapshots.
    pub(crate) fn is_saved(&self, slot: SlotId) -> bool {
        self.config.is_saved(self.slots.tag_of(slot))
    }

    /// Paint the first screen and, with `command`, run it as the only
    /// session of this run.
    pub fn start(&mut self, command: Option<Launch>) {
        let current = self.current_slot();
        let region = self.region_of(current);
        let visible = !self.state.display_suspended;
        self.slots[current].attach(region, visible);
        if visible {
            self.slots[current].redraw(&mut self.canvas, true);
        }
        self.toggle_bar();
        if let Some(launch) = command {
            self.state.single_command_mode = true;
            self.spawn_current(&launch);
        }
    }

    /// End every open session.
    pub fn shutdown(&mut self) {
        for slot in self.slots.open_slots() {
            log::debug!("ending slot {}", slot.index());
            self.slots[slot].end(&mut self.canvas);
        }
    }

    /// Full repaint of the current slot, unless the display is away.
    pub(crate) fn redraw_current(&mut self) {
        if self.state.display_suspended {
            return;
        }
        let current = self.current_slot();
        self.slots[current].redraw(&mut self.canvas, true);
    }

    /// Start `launch` in the current slot if it is free.
    pub(crate) fn spawn_current(&mut self, launch: &Launch) {
        let current = self.current_slot();
        if self.slots.is_open(current) {
            log::debug!("slot {} is busy, not starting {}", current.index(), launch.program());
            return;
        }
        let region = self.region_of(current);
        let rows = u16::try_from(region.rows).unwrap_or(u16::MAX);
        let cols = u16::try_from(region.cols).unwrap_or(u16::MAX);
        match self.slots[current].spawn(launch, rows, cols) {
            Ok(()) => {
                log::info!("started {} in slot {}", launch.program(), current.index());
                self.redraw_current();
            }
            Err(e) => log::warn!("cannot start {}: {e}", launch.program()),
        }
    }
}
