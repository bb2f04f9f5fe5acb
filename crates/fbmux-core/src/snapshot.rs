//! Saved surface contents of hidden slots.

use std::collections::HashMap;

use crate::canvas::Canvas;
use crate::layout::Geometry;
use crate::slots::SlotId;

struct Snapshot {
    geometry: Geometry,
    pixels: Vec<u8>,
}

/// Captured surfaces keyed by slot.
///
/// A capture copies the whole surface, so restoring a slot brings back
/// everything that was on screen when it was hidden, split partner and
/// borders included.
#[derive(Default)]
pub struct Snapshots {
    saved: HashMap<SlotId, Snapshot>,
}

impl Snapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&mut self, slot: SlotId, canvas: &dyn Canvas) {
        let snapshot = Snapshot {
            geometry: canvas.geometry(),
            pixels: canvas.capture(),
        };
        self.saved.insert(slot, snapshot);
    }

    /// Paint the snapshot of `slot` back.
    ///
    /// Fails when nothing was captured or the surface changed shape since.
    pub fn restore(&self, slot: SlotId, canvas: &mut dyn Canvas) -> bool {
        match self.saved.get(&slot) {
            Some(snap) if snap.geometry == canvas.geometry() => canvas.restore(&snap.pixels),
            Some(_) => {
                log::debug!("snapshot of slot {} no longer matches the surface", slot.index());
                false
            }
            None => false,
        }
    }

    pub fn discard(&mut self, slot: SlotId) {
        self.saved.remove(&slot);
    }

    pub fn contains(&self, slot: SlotId) -> bool {
        self.saved.contains_key(&slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::MemoryCanvas;
    use crate::layout::{region, SplitMode};
    use crate::slots::{Instance, SlotTable};
    use crate::testing::FakeSession;
    use fbmux_vt::Rgb;

    fn geometry() -> Geometry {
        Geometry {
            height: 32,
            width: 32,
            cell_height: 8,
            cell_width: 4,
        }
    }

    #[test]
    fn test_restore_reproduces_capture() {
        let table = SlotTable::new(2, FakeSession::new);
        let slot = table.slot_of(1, Instance::Main);
        let mut canvas = MemoryCanvas::new(geometry());
        let full = region(SplitMode::None, Instance::Main, &geometry());
        canvas.fill(&full, 0, 0, 2, 2, Rgb::from_u32(0x336699));
        let before = canvas.capture();

        let mut snaps = Snapshots::new();
        snaps.capture(slot, &canvas);
        canvas.fill(&full, 0, 0, 4, 8, Rgb::from_u32(0xffffff));
        assert!(snaps.restore(slot, &mut canvas));
        assert_eq!(canvas.capture(), before);
    }

    #[test]
    fn test_restore_of_unknown_slot_fails() {
        let table = SlotTable::new(2, FakeSession::new);
        let mut canvas = MemoryCanvas::new(geometry());
        let before = canvas.capture();
        let mut snaps = Snapshots::new();
        let slot = table.slot_of(0, Instance::Alternate);
        assert!(!snaps.restore(slot, &mut canvas));
        assert_eq!(canvas.capture(), before);

        snaps.capture(slot, &canvas);
        assert!(snaps.contains(slot));
        snaps.discard(slot);
        assert!(!snaps.restore(slot, &mut canvas));
    }

    #[test]
    fn test_restore_rejects_other_geometry() {
        let table = SlotTable::new(1, FakeSession::new);
        let slot = table.slot_of(0, Instance::Main);
        let mut snaps = Snapshots::new();
        snaps.capture(slot, &MemoryCanvas::new(geometry()));

        let mut bigger = MemoryCanvas::new(Geometry {
            height: 64,
            ..geometry()
        });
        assert!(!snaps.restore(slot, &mut bigger));
    }
}
