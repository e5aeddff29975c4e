// src/kern.rs

//! The kern collider: resolves collisions by adding space in reading direction.
//!
//! The target's whole cluster is cut into horizontal slices about one margin
//! high. For every slice the collider records the cluster's trailing edge
//! (right edge for left-to-right runs, left edge for right-to-left ones).
//! Merging a neighbor compares its opposing edge against those slices and
//! keeps the smallest gap seen; `resolve` turns that gap into a horizontal
//! displacement.
//!
//! Slices without cluster ink have no edge (`None`), and the gap stays
//! `None` until a neighbor is measured, so no placeholder value ever enters
//! the gap arithmetic.

use crate::config::CollisionConfig;
use crate::geometry::{Octabox, Position, Rect};
use crate::glyph::{GlyphGeometry, GlyphId};
use crate::segment::{Direction, Segment, SlotId};
use crate::trace::{emit, Trace};
use log::{debug, trace};
use serde_json::json;
use std::ops::Range;

/// Leftmost ink of `oct` (placed at `pos`) on the horizontal line `y`.
fn left_of(oct: &Octabox, pos: Position, y: f32) -> f32 {
    (pos.x + oct.bbox.xi)
        .max(pos.x - pos.y + oct.slant.di + y)
        .max(pos.x + pos.y + oct.slant.si - y)
}

/// Rightmost ink of `oct` (placed at `pos`) on the horizontal line `y`.
fn right_of(oct: &Octabox, pos: Position, y: f32) -> f32 {
    (pos.x + oct.bbox.xa)
        .min(pos.x - pos.y + oct.slant.da + y)
        .min(pos.x + pos.y + oct.slant.sa - y)
}

/// Sub-boxes of `gid` whose vertical extent reaches the slice centred on `y`.
fn sub_boxes_near<'a, G: GlyphGeometry>(
    glyphs: &'a G,
    gid: GlyphId,
    pos: Position,
    y: f32,
    width: f32,
) -> impl Iterator<Item = &'a Octabox> {
    glyphs.sub_boxes(gid).iter().filter(move |b| {
        !(pos.y + b.bbox.yi > y + width / 2.0 || pos.y + b.bbox.ya < y - width / 2.0)
    })
}

/// Left edge of the glyph's ink in the slice at `y`; `None` if none of its
/// sub-boxes reach the slice.
fn left_edge<G: GlyphGeometry>(glyphs: &G, gid: GlyphId, pos: Position, y: f32, width: f32) -> Option<f32> {
    if glyphs.sub_boxes(gid).is_empty() {
        return Some(left_of(&glyphs.octabox(gid), pos, y));
    }
    sub_boxes_near(glyphs, gid, pos, y, width)
        .map(|b| left_of(b, pos, y))
        .reduce(f32::min)
}

fn right_edge<G: GlyphGeometry>(glyphs: &G, gid: GlyphId, pos: Position, y: f32, width: f32) -> Option<f32> {
    if glyphs.sub_boxes(gid).is_empty() {
        return Some(right_of(&glyphs.octabox(gid), pos, y));
    }
    sub_boxes_near(glyphs, gid, pos, y, width)
        .map(|b| right_of(b, pos, y))
        .reduce(f32::max)
}

/// True if `a` lies further out than `b` on the cluster's trailing side.
fn beyond(dir: Direction, a: f32, b: f32) -> bool {
    if dir.is_rtl() {
        a < b
    } else {
        a > b
    }
}

/// Finds the horizontal kern that keeps a cluster clear of its neighbors.
#[derive(Debug, Clone)]
pub struct KernCollider {
    config: CollisionConfig,
    target: Option<SlotId>,
    gid: GlyphId,
    origin: Position,
    limit: Rect,
    offset_prev: Position,
    curr_shift: Position,
    margin: f32,
    margin_min: f32,
    miny: f32,
    maxy: f32,
    slice_width: f32,
    // Trailing edge of the cluster per slice.
    edges: Vec<Option<f32>>,
    // Closest neighbor edge per slice and who owns it, for the trace.
    near_edges: Vec<Option<f32>>,
    slot_near: Vec<Option<SlotId>>,
    xbound: Option<f32>,
    mingap: Option<f32>,
}

impl Default for KernCollider {
    fn default() -> Self {
        Self::new()
    }
}

impl KernCollider {
    pub fn new() -> Self {
        Self::with_config(CollisionConfig::default())
    }

    pub fn with_config(config: CollisionConfig) -> Self {
        KernCollider {
            config,
            target: None,
            gid: 0,
            origin: Position::ZERO,
            limit: Rect::default(),
            offset_prev: Position::ZERO,
            curr_shift: Position::ZERO,
            margin: 0.0,
            margin_min: 0.0,
            miny: 0.0,
            maxy: 0.0,
            slice_width: 0.0,
            edges: Vec::new(),
            near_edges: Vec::new(),
            slot_near: Vec::new(),
            xbound: None,
            mingap: None,
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Builds the slice silhouette of the cluster `target` belongs to.
    ///
    /// `margin` is raised to the configured minimum and sets the slice
    /// height. `offset_prev` is the kern applied in earlier passes, which
    /// `resolve` takes out of the limit.
    #[allow(clippy::too_many_arguments)]
    pub fn init_slot<G: GlyphGeometry>(
        &mut self,
        seg: &Segment<G>,
        target: SlotId,
        limit: Rect,
        margin: f32,
        margin_min: f32,
        curr_shift: Position,
        offset_prev: Position,
        dir: Direction,
        trace: Option<&mut Trace>,
    ) {
        let glyphs = seg.glyphs();
        let margin = margin.max(self.config.kern_min_margin);
        let pad = self.config.kern_slice_padding;
        let base = seg.cluster_base(target);
        let slot = seg.slot(target);

        self.target = Some(target);
        self.gid = slot.gid;
        self.origin = slot.origin;
        self.limit = limit;
        self.offset_prev = offset_prev;
        self.curr_shift = curr_shift;
        self.margin = margin;
        self.margin_min = margin_min;
        self.mingap = None;
        self.xbound = None;

        // Cluster members with ink, at their current positions.
        let members: Vec<(SlotId, Position)> = seg
            .cluster(base)
            .filter(|&s| !glyphs.octabox(seg.slot(s).gid).is_degenerate())
            .map(|s| {
                let shift = if s == target {
                    curr_shift
                } else {
                    seg.collision(s).shift()
                };
                (s, seg.slot(s).origin + shift)
            })
            .collect();

        let (miny, maxy) = members
            .iter()
            .map(|&(s, pos)| {
                let bb = glyphs.bbox(seg.slot(s).gid);
                (pos.y + bb.yi, pos.y + bb.ya)
            })
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
            .unwrap_or((0.0, 0.0));
        self.miny = miny;
        self.maxy = maxy;

        let num_slices = if members.is_empty() {
            0
        } else {
            ((((self.maxy - self.miny + 2.0 * pad) / margin) + 1.0) as usize).max(1)
        };
        self.slice_width = if num_slices > 0 {
            (self.maxy - self.miny + 2.0 * pad) / num_slices as f32
        } else {
            0.0
        };
        self.edges = vec![None; num_slices];
        self.near_edges = vec![None; num_slices];
        self.slot_near = vec![None; num_slices];

        for &(s, pos) in &members {
            let gid = seg.slot(s).gid;
            let bb = glyphs.bbox(gid);
            let x = pos.x + if dir.is_rtl() { bb.xi } else { bb.xa };
            for i in self.slice_range(pos.y + bb.yi, pos.y + bb.ya) {
                if self.edges[i].is_some_and(|e| !beyond(dir, x, e)) {
                    continue;
                }
                let y = self.slice_center(i);
                let t = if dir.is_rtl() {
                    left_edge(glyphs, gid, pos, y, self.slice_width)
                } else {
                    right_edge(glyphs, gid, pos, y, self.slice_width)
                };
                let Some(t) = t else { continue };
                if self.edges[i].map_or(true, |e| beyond(dir, t, e)) {
                    self.edges[i] = Some(t);
                    if self.xbound.map_or(true, |b| beyond(dir, t, b)) {
                        self.xbound = Some(t);
                    }
                }
            }
        }

        debug!(
            "kern init {} base={} slices={} width={} y={}..{} xbound={:?}",
            target,
            base,
            num_slices,
            self.slice_width,
            self.miny,
            self.maxy,
            self.xbound
        );
        emit(trace, || {
            json!({
                "event": "kern.init",
                "slot": target.0,
                "base": base.0,
                "gid": self.gid,
                "margin": margin,
                "slices": num_slices,
                "sliceWidth": self.slice_width,
                "edges": self.edges,
                "xbound": self.xbound,
            })
        });
    }

    pub fn num_slices(&self) -> usize {
        self.edges.len()
    }

    pub fn slice_width(&self) -> f32 {
        self.slice_width
    }

    /// Trailing edge of the cluster in each slice; `None` where the slice
    /// holds no cluster ink.
    pub fn edges(&self) -> &[Option<f32>] {
        &self.edges
    }

    /// Smallest gap seen so far, if any neighbor came close enough to matter.
    pub fn min_gap(&self) -> Option<f32> {
        self.mingap
    }

    fn slice_pos(&self, y: f32) -> f32 {
        let pad = self.config.kern_slice_padding;
        (y - self.miny + pad) / (self.maxy - self.miny + 2.0 * pad) * self.edges.len() as f32
    }

    /// Slices touched by ink spanning `y0..y1`, widened by one at the top.
    fn slice_range(&self, y0: f32, y1: f32) -> Range<usize> {
        let n = self.edges.len() as i64;
        let lo = (self.slice_pos(y0) as i64).max(0);
        let hi = ((self.slice_pos(y1) + 1.0) as i64).min(n - 1);
        if lo > hi {
            return 0..0;
        }
        lo as usize..hi as usize + 1
    }

    fn slice_center(&self, i: usize) -> f32 {
        self.miny - self.config.kern_slice_padding + (i as f32 + 0.5) * self.slice_width
    }

    /// Gap between neighbor edge `m` and the cluster in slice `i` and the
    /// slices directly above and below it.
    fn gap_at(&self, i: usize, m: f32, dir: Direction) -> Option<f32> {
        let last = (i + 1).min(self.edges.len() - 1);
        self.edges[i.saturating_sub(1)..=last]
            .iter()
            .flatten()
            .map(|&e| if dir.is_rtl() { e - m } else { m - e })
            .reduce(f32::min)
    }

    /// Records the gap `t` if it is the smallest so far.
    fn lower_gap(&mut self, t: Option<f32>) -> bool {
        match t {
            Some(t) if self.mingap.map_or(true, |g| t < g) => {
                self.mingap = Some(t);
                true
            }
            _ => false,
        }
    }

    /// Keeps `m` as the slice's nearest neighbor edge if it is closer than
    /// the one recorded.
    fn note_near(&mut self, i: usize, m: f32, slot: SlotId, dir: Direction) {
        if self.near_edges[i].map_or(true, |n| beyond(dir, n, m)) {
            self.near_edges[i] = Some(m);
            self.slot_near[i] = Some(slot);
        }
    }

    /// Narrows the minimum gap with `slot` displaced by `shift`.
    ///
    /// `extra_spacing` is additional clearance wanted from this neighbor.
    /// Returns true if the neighbor lowered the minimum gap, which hints at
    /// (but does not prove) a collision.
    pub fn merge_slot<G: GlyphGeometry>(
        &mut self,
        seg: &Segment<G>,
        slot: SlotId,
        shift: Position,
        extra_spacing: f32,
        dir: Direction,
        trace: Option<&mut Trace>,
    ) -> bool {
        let glyphs = seg.glyphs();
        let gid = seg.slot(slot).gid;
        let oct = glyphs.octabox(gid);
        if self.edges.is_empty() || oct.is_degenerate() {
            return false;
        }
        let pos = seg.slot(slot).origin + shift;
        let bb = oct.bbox;
        let width = self.slice_width;
        let mut collides = false;

        // Outermost x the neighbor's opposing edge can reach.
        let x = if dir.is_rtl() {
            pos.x + bb.xa + extra_spacing
        } else {
            pos.x + bb.xi - extra_spacing
        };
        // A neighbor further from the outermost cluster edge than the gap
        // already found cannot lower it in any slice.
        if let (Some(b), Some(g)) = (self.xbound, self.mingap) {
            let out_of_reach = if dir.is_rtl() { x <= b - g } else { x >= b + g };
            if out_of_reach {
                trace!("kern merge {}: cannot reduce gap {}", slot, g);
                return false;
            }
        }
        for i in self.slice_range(pos.y + bb.yi, pos.y + bb.ya) {
            let y = self.slice_center(i);
            let m = if dir.is_rtl() {
                right_edge(glyphs, gid, pos, y, width).map(|m| m + extra_spacing)
            } else {
                left_edge(glyphs, gid, pos, y, width).map(|m| m - extra_spacing)
            };
            let Some(m) = m else { continue };
            let t = self.gap_at(i, m, dir);
            collides |= self.lower_gap(t);
            self.note_near(i, m, slot, dir);
        }

        trace!(
            "kern merge {} gid={} at {:?}: mingap={:?} collides={}",
            slot,
            gid,
            pos,
            self.mingap,
            collides
        );
        emit(trace, || {
            json!({
                "event": "kern.merge",
                "slot": slot.0,
                "gid": gid,
                "origin": pos,
                "extraSpacing": extra_spacing,
                "minGap": self.min_gap(),
                "collides": collides,
            })
        });
        collides
    }

    /// Horizontal displacement that opens the smallest gap up to `margin`,
    /// clipped to the limit left after `offset_prev`.
    ///
    /// Zero when no neighbor came within reach of the cluster.
    pub fn resolve(&self, dir: Direction, margin: f32, trace: Option<&mut Trace>) -> Position {
        let sign = if dir.is_rtl() { -1.0 } else { 1.0 };
        let (needed, result) = match self.min_gap() {
            Some(gap) => {
                let needed = sign * (gap - margin);
                let result = needed
                    .max(self.limit.bl.x - self.offset_prev.x)
                    .min(self.limit.tr.x - self.offset_prev.x);
                (Some(needed), result)
            }
            None => (None, 0.0),
        };
        debug!(
            "kern resolve gid={}: gap={:?} needed={:?} result={}",
            self.gid,
            self.min_gap(),
            needed,
            result
        );
        emit(trace, || {
            let slices: Vec<_> = (0..self.edges.len())
                .map(|i| {
                    json!({
                        "i": i,
                        "targetEdge": self.edges[i],
                        "neighbor": self.slot_near[i].map(|s| s.0),
                        "nearEdge": self.near_edges[i],
                    })
                })
                .collect();
            json!({
                "event": "kern.resolve",
                "slot": self.target.map(|t| t.0),
                "gid": self.gid,
                "margin": self.margin,
                "marginMin": self.margin_min,
                "limit": self.limit,
                "target": {
                    "origin": self.origin,
                    "currShift": self.curr_shift,
                    "offsetPrev": self.offset_prev,
                    "fix": "kern",
                    "slices": self.edges.len(),
                    "sliceWidth": self.slice_width,
                },
                "slices": slices,
                "xbound": self.xbound,
                "minGap": self.min_gap(),
                "needed": needed,
                "result": result,
                "stillBad": needed.is_some_and(|n| n != result),
            })
        });
        Position::new(result, 0.0)
    }
}
