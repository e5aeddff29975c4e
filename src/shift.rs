// src/shift.rs

//! The four-axis shift collider.
//!
//! A `ShiftCollider` is set up for one target glyph with `init_slot`, fed every
//! nearby glyph with `merge_slot`, and finally asked for the cheapest legal
//! displacement with `resolve`. Each of the four axes keeps its own `Zones`
//! cost landscape; a merge cuts the positions at which the target would overlap
//! the neighbor out of every landscape, or, for glyphs ordered by a shared
//! sequence class, lays graded cost regions over it instead.
//!
//! Axis positions are absolute coordinates of the target's origin on that
//! axis (`x`, `y`, `x + y` or `x - y`).

use crate::axis::{overlap_interval, Axis};
use crate::collision::{SeqOrder, SlotCollision};
use crate::geometry::{BBox, Octabox, Position, Rect};
use crate::glyph::{GlyphGeometry, GlyphId};
use crate::segment::{Direction, Segment, SlotId};
use crate::trace::{emit, Trace};
use crate::zones::{Penalty, Zones};
use log::{debug, trace};
use serde::Serialize;
use serde_json::{json, Value};

/// Outcome of `ShiftCollider::resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShiftResolution {
    /// Displacement to apply to the target, relative to its origin.
    pub shift: Position,
    /// Axis the displacement was found on; `None` if no axis had room.
    pub axis: Option<Axis>,
    /// Cost of the chosen position, `f32::INFINITY` when still colliding.
    pub cost: f32,
    /// No axis offered a feasible position; `shift` is zero.
    pub still_colliding: bool,
}

/// A glyph being merged: either a real slot or a phantom exclusion glyph.
struct Neighbor<'a> {
    gid: GlyphId,
    origin: Position,
    shift: Position,
    collision: Option<&'a SlotCollision>,
}

/// Accumulates collision constraints for one target glyph.
#[derive(Debug, Clone)]
pub struct ShiftCollider {
    target: Option<SlotId>,
    gid: GlyphId,
    origin: Position,
    target_box: Octabox,
    limit: Rect,
    // Area the target's ink may reach within its limit.
    reach: Rect,
    margin: f32,
    margin_wt: f32,
    curr_shift: Position,
    curr_offset: Position,
    seq_class: u16,
    seq_order: SeqOrder,
    ranges: [Zones; 4],
    len: [f32; 4],
}

impl Default for ShiftCollider {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftCollider {
    pub fn new() -> Self {
        ShiftCollider {
            target: None,
            gid: 0,
            origin: Position::ZERO,
            target_box: Octabox::default(),
            limit: Rect::default(),
            reach: Rect::default(),
            margin: 0.0,
            margin_wt: 0.0,
            curr_shift: Position::ZERO,
            curr_offset: Position::ZERO,
            seq_class: 0,
            seq_order: SeqOrder::empty(),
            ranges: Axis::ALL.map(Zones::new),
            len: [0.0; 4],
        }
    }

    /// Starts a new session for `target`.
    ///
    /// `limit` bounds the total adjustment of the glyph; `curr_offset` is the
    /// part already applied in earlier passes and `curr_shift` the shift
    /// computed so far in this pass.
    #[allow(clippy::too_many_arguments)]
    pub fn init_slot<G: GlyphGeometry>(
        &mut self,
        seg: &Segment<G>,
        target: SlotId,
        limit: Rect,
        margin: f32,
        margin_wt: f32,
        curr_shift: Position,
        curr_offset: Position,
        dir: Direction,
        trace: Option<&mut Trace>,
    ) {
        let slot = seg.slot(target);
        let oct = seg.glyphs().octabox(slot.gid);
        let mut lim = limit.translate(-curr_offset);
        if dir.is_rtl() {
            // Limits are given in reading direction.
            lim = Rect::from_coords(-lim.tr.x, lim.bl.y, -lim.bl.x, lim.tr.y);
        }
        let o = slot.origin;
        let cs = curr_shift;

        for axis in Axis::ALL {
            let (min, max) = match axis {
                Axis::X => (lim.bl.x + o.x, lim.tr.x + o.x),
                Axis::Y => (lim.bl.y + o.y, lim.tr.y + o.y),
                // Diagonal moves start from the current shift and stop at
                // whichever limit edge they reach first.
                Axis::Sum => {
                    let base = o.x + o.y + cs.x + cs.y;
                    (
                        base - 2.0 * (cs.x - lim.bl.x).min(cs.y - lim.bl.y),
                        base + 2.0 * (lim.tr.x - cs.x).min(lim.tr.y - cs.y),
                    )
                }
                Axis::Diff => {
                    let base = o.x - o.y + cs.x - cs.y;
                    (
                        base - 2.0 * (cs.x - lim.bl.x).min(lim.tr.y - cs.y),
                        base + 2.0 * (lim.tr.x - cs.x).min(cs.y - lim.bl.y),
                    )
                }
            };
            let (lo, hi) = axis.extent(&oct);
            let i = axis.index();
            self.len[i] = hi - lo;
            let perp = axis.perp().project(cs + curr_offset);
            self.ranges[i].initialise(min, max, margin * axis.margin_scale(), margin_wt, perp);
        }

        self.target = Some(target);
        self.gid = slot.gid;
        self.origin = o;
        self.target_box = oct;
        self.limit = lim;
        self.reach = Rect::from_coords(
            lim.bl.x + o.x + oct.bbox.xi,
            lim.bl.y + o.y + oct.bbox.yi,
            lim.tr.x + o.x + oct.bbox.xa,
            lim.tr.y + o.y + oct.bbox.ya,
        );
        self.margin = margin;
        self.margin_wt = margin_wt;
        self.curr_shift = curr_shift;
        self.curr_offset = curr_offset;

        let coll = seg.collision(target);
        self.seq_class = coll.seq_class();
        self.seq_order = coll.seq_order();

        trace!(
            "shift init {} gid={} limit={:?} seq_class={} order={:?}",
            target,
            self.gid,
            lim,
            self.seq_class,
            self.seq_order
        );
        emit(trace, || {
            let raw: Vec<(f32, f32)> = self.ranges.iter().map(Zones::bounds).collect();
            json!({
                "event": "shift.init",
                "slot": target.0,
                "gid": self.gid,
                "limit": lim,
                "rawRanges": raw,
            })
        });
    }

    pub fn target(&self) -> Option<SlotId> {
        self.target
    }

    /// Movement limit relative to the target origin, after offset and direction.
    pub fn limit(&self) -> Rect {
        self.limit
    }

    pub fn zones(&self, axis: Axis) -> &Zones {
        &self.ranges[axis.index()]
    }

    /// Extent of the target glyph on `axis`.
    pub fn axis_len(&self, axis: Axis) -> f32 {
        self.len[axis.index()]
    }

    /// Adds the constraints `slot` (displaced by `shift`) puts on the target.
    ///
    /// `is_after` tells whether `slot` follows the target logically and
    /// `same_cluster` whether both belong to one cluster; together with the
    /// sequence classes they decide if stacking order applies. Returns true
    /// when the neighbor may collide with the target within its reach.
    pub fn merge_slot<G: GlyphGeometry>(
        &mut self,
        seg: &Segment<G>,
        slot: SlotId,
        shift: Position,
        is_after: bool,
        same_cluster: bool,
        trace: Option<&mut Trace>,
    ) -> bool {
        let s = seg.slot(slot);
        let neighbor = Neighbor {
            gid: s.gid,
            origin: s.origin,
            shift,
            collision: Some(seg.collision(slot)),
        };
        self.merge_neighbor(seg.glyphs(), &neighbor, is_after, same_cluster, trace)
    }

    fn merge_neighbor<G: GlyphGeometry>(
        &mut self,
        glyphs: &G,
        nb: &Neighbor<'_>,
        is_after: bool,
        same_cluster: bool,
        mut trace: Option<&mut Trace>,
    ) -> bool {
        let mut order = SeqOrder::empty();
        if let Some(coll) = nb.collision {
            if same_cluster && self.seq_class != 0 && self.seq_class == coll.seq_class() {
                order = if is_after {
                    self.seq_order.inverted()
                } else {
                    self.seq_order
                };
            }
        }

        let pos = nb.origin + nb.shift;
        let whole = glyphs.octabox(nb.gid);
        let subs = glyphs.sub_boxes(nb.gid);
        let tpos = self.origin + self.curr_shift;
        let tink = self.target_box.translate(tpos);
        let before: [usize; 4] = std::array::from_fn(|i| self.ranges[i].exclusions().len());
        let mut is_col = false;

        if whole.is_degenerate() || self.target_box.is_degenerate() {
            trace!("shift merge: gid {} has no ink, skipped", nb.gid);
        } else {
            let other = whole.translate(pos);
            for axis in Axis::ALL {
                let i = axis.index();
                let across = axis.perp().project(tpos);
                let m = self.margin * axis.margin_scale();
                let (lo, hi) = overlap_interval(axis, &self.target_box, across, &other);
                let reachable =
                    self.within_reach(axis, lo, hi, m) && perp_overlap(axis, &tink, &other, m);

                let sign = enforce_sign(axis, order);
                if sign != 0 {
                    if let Some(coll) = nb.collision {
                        self.add_seq_regions(axis, sign, coll, &other.bbox, &tink.bbox);
                    }
                    is_col |= reachable;
                    continue;
                }
                if !reachable {
                    continue;
                }

                if subs.is_empty() {
                    self.ranges[i].exclude_with_margins(lo, hi);
                    is_col = true;
                } else {
                    for sub in subs.iter().filter(|b| !b.is_degenerate()) {
                        let sub = sub.translate(pos);
                        let (slo, shi) = overlap_interval(axis, &self.target_box, across, &sub);
                        if !self.within_reach(axis, slo, shi, m)
                            || !perp_overlap(axis, &tink, &sub, m)
                        {
                            continue;
                        }
                        self.ranges[i].exclude_with_margins(slo, shi);
                        is_col = true;
                    }
                }
            }
        }

        trace!(
            "shift merge: target gid={} neighbor gid={} at {:?} order={:?} -> {}",
            self.gid,
            nb.gid,
            pos,
            order,
            is_col
        );
        emit(trace.as_deref_mut(), || {
            let removals: Vec<Value> = (0..4)
                .map(|i| {
                    let added = &self.ranges[i].exclusions()[before[i]..];
                    json!(added)
                })
                .collect();
            json!({
                "event": "shift.merge",
                "gid": nb.gid,
                "origin": pos,
                "phantom": nb.collision.is_none(),
                "order": order.bits(),
                "removals": removals,
                "isCol": is_col,
            })
        });

        if let Some((excl_gid, excl_offset)) = nb.collision.and_then(SlotCollision::exclusion) {
            let phantom = Neighbor {
                gid: excl_gid,
                origin: nb.origin + excl_offset,
                shift: nb.shift,
                collision: None,
            };
            is_col |= self.merge_neighbor(glyphs, &phantom, is_after, same_cluster, trace);
        }
        is_col
    }

    // Broad phase along the axis: the interval must be non-empty and come
    // within `m` of the range the target may occupy.
    fn within_reach(&self, axis: Axis, lo: f32, hi: f32, m: f32) -> bool {
        let (zmin, zmax) = self.ranges[axis.index()].bounds();
        lo < hi && hi >= zmin - m && lo <= zmax + m
    }

    // --- Sequence regions ---

    /// Lays the five stacking regions around neighbor ink `n` over `axis`.
    ///
    /// `sign > 0` keeps the target right of / above the neighbor, `sign < 0`
    /// uses the mirrored layout. `org` is the target's current ink box.
    fn add_seq_regions(
        &mut self,
        axis: Axis,
        sign: i32,
        coll: &SlotCollision,
        n: &BBox,
        org: &BBox,
    ) {
        let h = coll.seq_valign_ht() as f32;
        let above_xoff = coll.seq_above_xoff() as f32;
        let above_wt = coll.seq_above_wt() as f32;
        let below_xlim = coll.seq_below_xlim() as f32;
        let below_wt = coll.seq_below_wt() as f32;
        let valign_wt = coll.seq_valign_wt() as f32;
        let Rect { bl: inf_lo, tr: inf_hi } = self.reach;

        if sign > 0 {
            let r2y = n.yi + 0.5 * h;
            let r3x = n.xa + below_xlim;
            let r1 = Rect::from_coords(inf_lo.x, r2y, n.xa + above_xoff, inf_hi.y);
            let r2 = Rect::from_coords(inf_lo.x, inf_lo.y, r3x, r2y);
            let r3 = Rect::from_coords(r3x, inf_lo.y, inf_hi.x, r2y);
            let r4 = Rect::from_coords(n.xi, n.yi, inf_hi.x, r2y);
            let r5 = Rect::from_coords(n.xi, n.yi - 0.5 * h, inf_hi.x, n.yi);
            self.slope_x(axis, r1, org, 0.0, above_wt, true);
            self.remove_box(axis, r2);
            self.slope_x(axis, r3, org, below_wt, 0.0, true);
            self.slope_y(axis, r4, org, 0.0, valign_wt, true);
            self.slope_y(axis, r5, org, 0.0, valign_wt, false);
        } else {
            let r2y = n.ya - 0.5 * h;
            let r3x = n.xi - below_xlim;
            let r1 = Rect::from_coords(n.xi - above_xoff, inf_lo.y, inf_hi.x, r2y);
            let r2 = Rect::from_coords(r3x, r2y, inf_hi.x, inf_hi.y);
            let r3 = Rect::from_coords(inf_lo.x, r2y, r3x, inf_hi.y);
            let r4 = Rect::from_coords(inf_lo.x, r2y, n.xa, n.ya);
            let r5 = Rect::from_coords(inf_lo.x, n.ya, n.xa, n.ya + 0.5 * h);
            self.slope_x(axis, r1, org, 0.0, above_wt, false);
            self.remove_box(axis, r2);
            self.slope_x(axis, r3, org, below_wt, 0.0, false);
            self.slope_y(axis, r4, org, 0.0, valign_wt, false);
            self.slope_y(axis, r5, org, 0.0, valign_wt, true);
        }
    }

    /// Positions on `axis` at which the target's ink enters `region`.
    fn region_interval(&self, axis: Axis, region: Rect) -> Option<(f32, f32)> {
        if region.is_empty() {
            return None;
        }
        let tpos = self.origin + self.curr_shift;
        let oct = Octabox::from_rect(region);
        if !perp_overlap(axis, &self.target_box.translate(tpos), &oct, 0.0) {
            return None;
        }
        let (lo, hi) = overlap_interval(axis, &self.target_box, axis.perp().project(tpos), &oct);
        (lo < hi).then_some((lo, hi))
    }

    fn remove_box(&mut self, axis: Axis, region: Rect) {
        if let Some((lo, hi)) = self.region_interval(axis, region) {
            self.ranges[axis.index()].exclude(lo, hi);
        }
    }

    /// Region whose cost varies with horizontal position; `minright` puts the
    /// cheapest point at its right end.
    fn slope_x(
        &mut self,
        axis: Axis,
        region: Rect,
        org: &BBox,
        weight: f32,
        m: f32,
        minright: bool,
    ) {
        let Some((lo, hi)) = self.region_interval(axis, region) else {
            return;
        };
        let penalty = if axis.step().0 != 0.0 {
            Penalty {
                weight,
                offset: org.yi - region.bl.y,
                slope: m,
                anchor: if minright { hi } else { lo },
                constant: 0.0,
            }
        } else {
            Penalty::flat(weight + m, org.xi - region.bl.x)
        };
        self.ranges[axis.index()].weighted(lo, hi, penalty);
    }

    /// Region whose cost varies with vertical position; `mintop` puts the
    /// cheapest point at its top.
    fn slope_y(
        &mut self,
        axis: Axis,
        region: Rect,
        org: &BBox,
        weight: f32,
        m: f32,
        mintop: bool,
    ) {
        let Some((lo, hi)) = self.region_interval(axis, region) else {
            return;
        };
        let (_, dy) = axis.step();
        let penalty = if dy != 0.0 {
            Penalty {
                weight,
                offset: org.xi - region.bl.x,
                slope: m,
                // Positions grow downwards along the diff axis.
                anchor: if mintop == (dy > 0.0) { hi } else { lo },
                constant: 0.0,
            }
        } else {
            Penalty::flat(weight + m, org.yi - region.bl.y)
        };
        self.ranges[axis.index()].weighted(lo, hi, penalty);
    }

    // --- Resolution ---

    /// Picks the cheapest feasible displacement over all four axes.
    ///
    /// Each axis is asked for the position closest to where the glyph sat
    /// before any offset was applied. The strictly cheapest axis wins; equal
    /// costs keep the earlier axis in `Axis::ALL` order.
    pub fn resolve(&self, trace: Option<&mut Trace>) -> ShiftResolution {
        let mut best: Option<(Axis, f32, Position)> = None;
        let mut vectors = Vec::new();

        for axis in Axis::ALL {
            let zones = &self.ranges[axis.index()];
            let tbase = axis.project(self.origin);
            let natural = tbase - axis.project(self.curr_offset);
            let found = zones.closest(natural);
            if let Some(c) = found {
                let shift = axis.compose(c.pos - tbase, axis.perp().project(self.curr_shift));
                if best.map_or(true, |(_, cost, _)| c.cost < cost) {
                    best = Some((axis, c.cost, shift));
                }
            }
            if trace.is_some() {
                vectors.push(json!({
                    "direction": axis.label(),
                    "targetMin": tbase,
                    "targetSize": self.len[axis.index()],
                    "rawRanges": zones.bounds(),
                    "removals": zones.exclusions(),
                    "ranges": zones.to_json(),
                    "bestCost": found.map_or(-1.0, |c| c.cost),
                    "bestVal": found.map(|c| c.pos - tbase),
                }));
            }
        }

        let res = match best {
            Some((axis, cost, shift)) => ShiftResolution {
                shift,
                axis: Some(axis),
                cost,
                still_colliding: false,
            },
            None => ShiftResolution {
                shift: Position::ZERO,
                axis: None,
                cost: f32::INFINITY,
                still_colliding: true,
            },
        };
        debug!(
            "shift resolve gid={}: {:?} on {:?} (cost {}, colliding {})",
            self.gid, res.shift, res.axis, res.cost, res.still_colliding
        );
        emit(trace, || {
            json!({
                "event": "shift.resolve",
                "slot": self.target.map(|t| t.0),
                "gid": self.gid,
                "limit": self.limit,
                "target": {
                    "origin": self.origin,
                    "currShift": self.curr_shift,
                    "margin": self.margin,
                    "marginWt": self.margin_wt,
                    "bbox": self.target_box.bbox,
                    "slantBox": self.target_box.slant,
                    "fix": "shift",
                },
                "vectors": vectors,
                "result": res.shift,
                "bestAxis": res.axis.map_or(-1, |a| a.index() as i64),
                "stillBad": res.still_colliding,
            })
        });
        res
    }
}

/// Sign of the stacking constraint along `axis`: +1 keeps the target
/// right/up of the neighbor, -1 left/down, 0 means no constraint.
fn enforce_sign(axis: Axis, order: SeqOrder) -> i32 {
    let x = i32::from(order.contains(SeqOrder::RIGHT)) - i32::from(order.contains(SeqOrder::LEFT));
    let y = i32::from(order.contains(SeqOrder::UP)) - i32::from(order.contains(SeqOrder::DOWN));
    match axis {
        Axis::X => x,
        Axis::Y => y,
        Axis::Sum | Axis::Diff => (x + y).signum(),
    }
}

/// Whether the two envelopes overlap (within `m`) on the axis perpendicular to `axis`.
fn perp_overlap(axis: Axis, a: &Octabox, b: &Octabox, m: f32) -> bool {
    let (amin, amax) = axis.perp().extent(a);
    let (bmin, bmax) = axis.perp().extent(b);
    !(bmax < amin - m || bmin > amax + m)
}

#[cfg(test)]
mod tests;
