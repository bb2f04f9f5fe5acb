//! The fixed slot table and its addressing.
//!
//! Every tag owns two instance slots. Slot `tag + instance * T` holds the
//! session of `(tag, instance)`, so the main instances come first.

use std::ops::{Index, IndexMut};

use crate::layout::SplitMode;
use crate::session::Session;

/// Number of instances per tag.
pub const INSTANCES: usize = 2;

/// Index of a slot in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Which of a tag's two slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Instance {
    #[default]
    Main,
    Alternate,
}

impl Instance {
    pub const fn other(self) -> Self {
        match self {
            Self::Main => Self::Alternate,
            Self::Alternate => Self::Main,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Main => 0,
            Self::Alternate => 1,
        }
    }
}

/// Per-tag layout state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagState {
    /// The instance on top.
    pub active: Instance,
    pub split: SplitMode,
}

/// Owns one session per slot for the lifetime of the multiplexer.
pub struct SlotTable<S> {
    sessions: Vec<S>,
    tags: Vec<TagState>,
}

impl<S> SlotTable<S> {
    /// Build a table for `tag_count` tags, creating each slot's session
    /// handle with `make`.
    pub fn new(tag_count: usize, mut make: impl FnMut(SlotId) -> S) -> Self {
        let sessions = (0..tag_count * INSTANCES).map(|i| make(SlotId(i))).collect();
        Self {
            sessions,
            tags: vec![TagState::default(); tag_count],
        }
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn slot_of(&self, tag: usize, instance: Instance) -> SlotId {
        SlotId(tag + instance.index() * self.tag_count())
    }

    pub fn tag_of(&self, slot: SlotId) -> usize {
        slot.0 % self.tag_count()
    }

    pub fn instance_of(&self, slot: SlotId) -> Instance {
        if slot.0 < self.tag_count() {
            Instance::Main
        } else {
            Instance::Alternate
        }
    }

    /// The other slot of the same tag.
    pub fn other_instance(&self, slot: SlotId) -> SlotId {
        self.slot_of(self.tag_of(slot), self.instance_of(slot).other())
    }

    /// The slot on top of `tag`.
    pub fn active_slot(&self, tag: usize) -> SlotId {
        self.slot_of(tag, self.tags[tag].active)
    }

    pub fn tag(&self, tag: usize) -> &TagState {
        &self.tags[tag]
    }

    pub fn tag_mut(&mut self, tag: usize) -> &mut TagState {
        &mut self.tags[tag]
    }

    pub fn slots(&self) -> impl Iterator<Item = SlotId> {
        (0..self.sessions.len()).map(SlotId)
    }

    pub fn sessions_mut(&mut self) -> impl Iterator<Item = &mut S> {
        self.sessions.iter_mut()
    }
}

impl<S: Session> SlotTable<S> {
    pub fn is_open(&self, slot: SlotId) -> bool {
        self.sessions[slot.0].is_open()
    }

    /// Number of open sessions in `tag`.
    pub fn open_count(&self, tag: usize) -> usize {
        [Instance::Main, Instance::Alternate]
            .into_iter()
            .filter(|&i| self.is_open(self.slot_of(tag, i)))
            .count()
    }

    /// Slots holding an open session, in table order.
    pub fn open_slots(&self) -> Vec<SlotId> {
        self.slots().filter(|&s| self.is_open(s)).collect()
    }

    /// The first open slot after `from`, scanning cyclically.
    ///
    /// Returns `from` itself when no other slot is open.
    pub fn next_open_slot(&self, from: SlotId) -> SlotId {
        let n = self.len();
        (1..n)
            .map(|step| SlotId((from.0 + step) % n))
            .find(|&s| self.is_open(s))
            .unwrap_or(from)
    }
}

impl<S> Index<SlotId> for SlotTable<S> {
    type Output = S;

    fn index(&self, slot: SlotId) -> &S {
        &self.sessions[slot.0]
    }
}

impl<S> IndexMut<SlotId> for SlotTable<S> {
    fn index_mut(&mut self, slot: SlotId) -> &mut S {
        &mut self.sessions[slot.0]
    }
}
