// src/collision.rs

//! Per-glyph collision metadata (`SlotCollision`) and its flag types.
//!
//! A record is built once from the glyph's attribute table. After that only
//! the resolution driver touches it, updating `shift`, `offset` and `status`
//! between passes. The colliders read it and never write to it.

use crate::geometry::{Position, Rect};
use crate::glyph::GlyphId;
use crate::segment::Direction;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Collision behaviour flags (the `collision.flags` glyph attribute).
    ///
    /// With no flags set a glyph is only tested against; it is never moved.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CollisionFlags: u16 {
        const FIX    = 1 << 0; // fix collisions involving this glyph
        const IGNORE = 1 << 1; // ignore this glyph altogether
        const START  = 1 << 2; // start of a range of possible collisions
        const END    = 1 << 3; // end of a range of possible collisions
        const KERN   = 1 << 4; // fixed by adding kerning space after it
        const ISCOL  = 1 << 5; // this glyph still has a collision
        const KNOWN  = 1 << 6; // resolution has settled for this glyph
    }
}

bitflags! {
    /// Stacking order constraints (the `collision.seq.order` glyph attribute).
    ///
    /// The flags describe where the glyph must sit relative to glyphs that
    /// follow it logically; the shift collider inverts them for glyphs before it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SeqOrder: u16 {
        const LEFT   = 1 << 0;
        const RIGHT  = 1 << 1;
        const DOWN   = 1 << 2;
        const UP     = 1 << 3;
        const XOVERY = 1 << 4;
    }
}

impl SeqOrder {
    pub const X: SeqOrder = SeqOrder::LEFT.union(SeqOrder::RIGHT);
    pub const Y: SeqOrder = SeqOrder::DOWN.union(SeqOrder::UP);

    /// Swaps LEFT/RIGHT and DOWN/UP, keeping any other bits.
    pub fn inverted(self) -> SeqOrder {
        let mut out = self;
        if self.intersects(SeqOrder::X) {
            out ^= SeqOrder::X;
        }
        if self.intersects(SeqOrder::Y) {
            out ^= SeqOrder::Y;
        }
        out
    }
}

/// Source of raw glyph attribute values.
pub trait GlyphAttrs {
    /// Value of attribute `attr` for glyph `gid`; zero when undefined.
    fn glyph_attr(&self, gid: GlyphId, attr: u16) -> i16;
}

// Attribute offsets from the collision base attribute.
const ATTR_FLAGS: u16 = 0;
const ATTR_LIMIT_BL_X: u16 = 1;
const ATTR_LIMIT_BL_Y: u16 = 2;
const ATTR_LIMIT_TR_X: u16 = 3;
const ATTR_LIMIT_TR_Y: u16 = 4;
const ATTR_MARGIN: u16 = 5;
const ATTR_MARGIN_WT: u16 = 6;
// 7..=9 are the exclusion glyph and offset, which are not read from attributes.
const ATTR_SEQ_CLASS: u16 = 10;
const ATTR_SEQ_ORDER: u16 = 11;
const ATTR_SEQ_ABOVE_XOFF: u16 = 12;
const ATTR_SEQ_ABOVE_WT: u16 = 13;
const ATTR_SEQ_BELOW_XLIM: u16 = 14;
const ATTR_SEQ_BELOW_WT: u16 = 15;
const ATTR_SEQ_VALIGN_HT: u16 = 16;
const ATTR_SEQ_VALIGN_WT: u16 = 17;

/// Collision attributes of one slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotCollision {
    limit: Rect,
    shift: Position,  // adjustment within the current pass
    offset: Position, // total adjustment applied so far
    excl_offset: Position,
    excl_glyph: Option<GlyphId>,
    margin: u16,
    margin_wt: u16,
    flags: CollisionFlags,
    status: CollisionFlags,
    seq_class: u16,
    seq_order: SeqOrder,
    seq_above_xoff: i16,
    seq_above_wt: u16,
    seq_below_xlim: i16,
    seq_below_wt: u16,
    seq_valign_ht: i16,
    seq_valign_wt: u16,
}

impl SlotCollision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the record from the glyph's attribute table, starting at `base`.
    ///
    /// The field order matches the compiled font layout. Exclusion glyph and
    /// offset are left unset; callers that want them use `set_exclusion`.
    pub fn from_glyph_attrs<A: GlyphAttrs + ?Sized>(attrs: &A, gid: GlyphId, base: u16) -> Self {
        let attr = |offset: u16| attrs.glyph_attr(gid, base + offset);
        // Weights and heights are stored unsigned in the font.
        let unsigned = |offset: u16| attr(offset) as u16;
        let flags = CollisionFlags::from_bits_retain(unsigned(ATTR_FLAGS));
        SlotCollision {
            limit: Rect::from_coords(
                attr(ATTR_LIMIT_BL_X) as f32,
                attr(ATTR_LIMIT_BL_Y) as f32,
                attr(ATTR_LIMIT_TR_X) as f32,
                attr(ATTR_LIMIT_TR_Y) as f32,
            ),
            shift: Position::ZERO,
            offset: Position::ZERO,
            excl_offset: Position::ZERO,
            excl_glyph: None,
            margin: unsigned(ATTR_MARGIN),
            margin_wt: unsigned(ATTR_MARGIN_WT),
            flags,
            status: flags,
            seq_class: unsigned(ATTR_SEQ_CLASS),
            seq_order: SeqOrder::from_bits_retain(unsigned(ATTR_SEQ_ORDER)),
            seq_above_xoff: attr(ATTR_SEQ_ABOVE_XOFF),
            seq_above_wt: unsigned(ATTR_SEQ_ABOVE_WT),
            seq_below_xlim: attr(ATTR_SEQ_BELOW_XLIM),
            seq_below_wt: unsigned(ATTR_SEQ_BELOW_WT),
            seq_valign_ht: attr(ATTR_SEQ_VALIGN_HT),
            seq_valign_wt: unsigned(ATTR_SEQ_VALIGN_WT),
        }
    }

    /// Kerning this glyph contributes in reading direction.
    pub fn kern(&self, dir: Direction) -> f32 {
        if !self.flags.contains(CollisionFlags::KERN) {
            return 0.0;
        }
        match dir {
            Direction::Rtl => -self.shift.x,
            Direction::Ltr => self.shift.x,
        }
    }

    pub fn limit(&self) -> Rect {
        self.limit
    }
    pub fn set_limit(&mut self, limit: Rect) {
        self.limit = limit;
    }

    pub fn shift(&self) -> Position {
        self.shift
    }
    pub fn set_shift(&mut self, shift: Position) {
        self.shift = shift;
    }

    pub fn offset(&self) -> Position {
        self.offset
    }
    pub fn set_offset(&mut self, offset: Position) {
        self.offset = offset;
    }

    /// The phantom exclusion glyph and its offset from this glyph's origin.
    pub fn exclusion(&self) -> Option<(GlyphId, Position)> {
        self.excl_glyph.map(|gid| (gid, self.excl_offset))
    }
    pub fn set_exclusion(&mut self, exclusion: Option<(GlyphId, Position)>) {
        match exclusion {
            Some((gid, offset)) => {
                self.excl_glyph = Some(gid);
                self.excl_offset = offset;
            }
            None => {
                self.excl_glyph = None;
                self.excl_offset = Position::ZERO;
            }
        }
    }

    pub fn margin(&self) -> u16 {
        self.margin
    }
    pub fn set_margin(&mut self, margin: u16) {
        self.margin = margin;
    }

    pub fn margin_wt(&self) -> u16 {
        self.margin_wt
    }
    pub fn set_margin_wt(&mut self, margin_wt: u16) {
        self.margin_wt = margin_wt;
    }

    pub fn flags(&self) -> CollisionFlags {
        self.flags
    }
    pub fn set_flags(&mut self, flags: CollisionFlags) {
        self.flags = flags;
    }

    pub fn status(&self) -> CollisionFlags {
        self.status
    }
    pub fn set_status(&mut self, status: CollisionFlags) {
        self.status = status;
    }

    pub fn seq_class(&self) -> u16 {
        self.seq_class
    }
    pub fn set_seq_class(&mut self, seq_class: u16) {
        self.seq_class = seq_class;
    }

    pub fn seq_order(&self) -> SeqOrder {
        self.seq_order
    }
    pub fn set_seq_order(&mut self, seq_order: SeqOrder) {
        self.seq_order = seq_order;
    }

    pub fn seq_above_xoff(&self) -> i16 {
        self.seq_above_xoff
    }
    pub fn set_seq_above_xoff(&mut self, v: i16) {
        self.seq_above_xoff = v;
    }

    pub fn seq_above_wt(&self) -> u16 {
        self.seq_above_wt
    }
    pub fn set_seq_above_wt(&mut self, v: u16) {
        self.seq_above_wt = v;
    }

    pub fn seq_below_xlim(&self) -> i16 {
        self.seq_below_xlim
    }
    pub fn set_seq_below_xlim(&mut self, v: i16) {
        self.seq_below_xlim = v;
    }

    pub fn seq_below_wt(&self) -> u16 {
        self.seq_below_wt
    }
    pub fn set_seq_below_wt(&mut self, v: u16) {
        self.seq_below_wt = v;
    }

    pub fn seq_valign_ht(&self) -> i16 {
        self.seq_valign_ht
    }
    pub fn set_seq_valign_ht(&mut self, v: i16) {
        self.seq_valign_ht = v;
    }

    pub fn seq_valign_wt(&self) -> u16 {
        self.seq_valign_wt
    }
    pub fn set_seq_valign_wt(&mut self, v: u16) {
        self.seq_valign_wt = v;
    }
}
