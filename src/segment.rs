// src/segment.rs

//! The slot arena the colliders read from.
//!
//! A `Segment` owns one run of positioned glyphs (`Slot`s), the collision
//! record of each slot, and a handle to the glyph geometry. Attachment and
//! cluster links are `SlotId` indices into the arena.

use crate::collision::{GlyphAttrs, SlotCollision};
use crate::geometry::Position;
use crate::glyph::{GlyphGeometry, GlyphId};
use anyhow::{bail, Result};
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reading direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Direction of a bidi embedding level: odd levels are right-to-left.
    pub fn from_level(level: u8) -> Self {
        if level & 1 == 1 {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }

    pub fn is_rtl(self) -> bool {
        self == Direction::Rtl
    }
}

/// Index of a slot in its segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One positioned glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub gid: GlyphId,
    /// Position of the glyph origin, including offsets applied in earlier passes.
    pub origin: Position,
    /// Logical position in the run.
    pub index: usize,
    pub parent: Option<SlotId>,
    pub child: Option<SlotId>,
    pub sibling: Option<SlotId>,
}

impl Slot {
    pub fn new(gid: GlyphId, origin: Position, index: usize) -> Self {
        Slot {
            gid,
            origin,
            index,
            parent: None,
            child: None,
            sibling: None,
        }
    }
}

/// A run of slots with their collision records.
#[derive(Debug, Clone)]
pub struct Segment<G> {
    glyphs: G,
    dir: Direction,
    slots: Vec<Slot>,
    collisions: Vec<SlotCollision>,
}

impl<G: GlyphGeometry> Segment<G> {
    pub fn new(glyphs: G, dir: Direction) -> Self {
        Segment {
            glyphs,
            dir,
            slots: Vec::new(),
            collisions: Vec::new(),
        }
    }

    pub fn glyphs(&self) -> &G {
        &self.glyphs
    }

    pub fn dir(&self) -> Direction {
        self.dir
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends a glyph with an empty collision record.
    pub fn push_glyph(&mut self, gid: GlyphId, origin: Position) -> SlotId {
        self.push_glyph_with_collision(gid, origin, SlotCollision::new())
    }

    /// Appends a glyph whose collision record is read from its attributes.
    pub fn push_glyph_with_attrs<A: GlyphAttrs + ?Sized>(
        &mut self,
        gid: GlyphId,
        origin: Position,
        attrs: &A,
        collision_base: u16,
    ) -> SlotId {
        let coll = SlotCollision::from_glyph_attrs(attrs, gid, collision_base);
        self.push_glyph_with_collision(gid, origin, coll)
    }

    pub fn push_glyph_with_collision(
        &mut self,
        gid: GlyphId,
        origin: Position,
        coll: SlotCollision,
    ) -> SlotId {
        let id = SlotId(self.slots.len());
        self.slots.push(Slot::new(gid, origin, id.0));
        self.collisions.push(coll);
        id
    }

    /// Panics if `id` does not belong to this segment.
    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.0]
    }

    pub fn slot_mut(&mut self, id: SlotId) -> &mut Slot {
        &mut self.slots[id.0]
    }

    pub fn collision(&self, id: SlotId) -> &SlotCollision {
        &self.collisions[id.0]
    }

    pub fn collision_mut(&mut self, id: SlotId) -> &mut SlotCollision {
        &mut self.collisions[id.0]
    }

    pub fn slot_ids(&self) -> impl Iterator<Item = SlotId> {
        (0..self.slots.len()).map(SlotId)
    }

    /// Attaches `child` to `parent`, appending it to the parent's children.
    pub fn attach(&mut self, child: SlotId, parent: SlotId) -> Result<()> {
        if child.0 >= self.slots.len() || parent.0 >= self.slots.len() {
            bail!("Cannot attach {} to {}: slot out of range", child, parent);
        }
        if child == parent {
            bail!("Cannot attach {} to itself", child);
        }
        if self.slots[child.0].parent.is_some() {
            bail!("{} is already attached", child);
        }
        // Walking up from the parent must not reach the child.
        let mut up = Some(parent);
        while let Some(p) = up {
            if p == child {
                bail!("Attaching {} to {} would create a cycle", child, parent);
            }
            up = self.slots[p.0].parent;
        }

        self.slots[child.0].parent = Some(parent);
        match self.slots[parent.0].child {
            None => self.slots[parent.0].child = Some(child),
            Some(first) => {
                let mut last = first;
                while let Some(next) = self.slots[last.0].sibling {
                    last = next;
                }
                self.slots[last.0].sibling = Some(child);
            }
        }
        trace!("attach: {} -> {}", child, parent);
        Ok(())
    }

    /// Root of the attachment tree containing `id`.
    pub fn cluster_base(&self, id: SlotId) -> SlotId {
        let mut base = id;
        while let Some(parent) = self.slots[base.0].parent {
            base = parent;
        }
        base
    }

    /// Next slot of the cluster in depth-first order, or `None` after the last one.
    pub fn next_in_cluster(&self, id: SlotId) -> Option<SlotId> {
        let slot = &self.slots[id.0];
        if let Some(child) = slot.child {
            return Some(child);
        }
        if let Some(sibling) = slot.sibling {
            return Some(sibling);
        }
        let mut up = slot.parent;
        while let Some(p) = up {
            let ps = &self.slots[p.0];
            if let Some(sibling) = ps.sibling {
                // A root's sibling belongs to no cluster of ours.
                return ps.parent.map(|_| sibling);
            }
            up = ps.parent;
        }
        None
    }

    /// All slots of the cluster rooted at `base`, starting with `base` itself.
    pub fn cluster(&self, base: SlotId) -> ClusterIter<'_, G> {
        ClusterIter {
            seg: self,
            next: Some(base),
        }
    }
}

/// Iterator returned by `Segment::cluster`.
pub struct ClusterIter<'a, G> {
    seg: &'a Segment<G>,
    next: Option<SlotId>,
}

impl<G: GlyphGeometry> Iterator for ClusterIter<'_, G> {
    type Item = SlotId;

    fn next(&mut self) -> Option<SlotId> {
        let current = self.next?;
        self.next = self.seg.next_in_cluster(current);
        Some(current)
    }
}
