// src/shift/tests.rs

use super::*;
use crate::collision::SlotCollision;
use crate::glyph::{GlyphBounds, GlyphCache};

const SQUARE: GlyphId = 1;
const MARK: GlyphId = 2;
const L_SHAPE: GlyphId = 3;
const L_WHOLE: GlyphId = 4;
const SMALL: GlyphId = 5;

fn cache() -> GlyphCache {
    let mut cache = GlyphCache::new();
    cache.insert(SQUARE, GlyphBounds::from_bbox(BBox::new(0.0, 0.0, 100.0, 100.0)));
    cache.insert(MARK, GlyphBounds::from_bbox(BBox::new(0.0, 0.0, 100.0, 50.0)));
    // An L: bottom bar plus left bar, inside the same 100x100 envelope.
    let l_subs = vec![
        Octabox::from_bbox(BBox::new(0.0, 0.0, 100.0, 20.0)),
        Octabox::from_bbox(BBox::new(0.0, 0.0, 20.0, 100.0)),
    ];
    cache.insert(
        L_SHAPE,
        GlyphBounds::from_bbox(BBox::new(0.0, 0.0, 100.0, 100.0)).with_sub_boxes(l_subs),
    );
    cache.insert(L_WHOLE, GlyphBounds::from_bbox(BBox::new(0.0, 0.0, 100.0, 100.0)));
    cache.insert(SMALL, GlyphBounds::from_bbox(BBox::new(0.0, 0.0, 30.0, 30.0)));
    cache
}

fn limit(l: f32) -> Rect {
    Rect::from_coords(-l, -l, l, l)
}

fn start(seg: &Segment<GlyphCache>, target: SlotId, lim: Rect) -> ShiftCollider {
    let mut c = ShiftCollider::new();
    c.init_slot(seg, target, lim, 0.0, 0.0, Position::ZERO, Position::ZERO, Direction::Ltr, None);
    c
}

fn merge(c: &mut ShiftCollider, seg: &Segment<GlyphCache>, slot: SlotId) -> bool {
    c.merge_slot(seg, slot, Position::ZERO, false, false, None)
}

#[test_log::test]
fn overlapping_squares_move_apart_along_x() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let a = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let b = seg.push_glyph(SQUARE, Position::new(50.0, 0.0));

    let mut c = start(&seg, a, limit(500.0));
    assert!(merge(&mut c, &seg, b));
    let res = c.resolve(None);

    assert!(!res.still_colliding);
    assert_eq!(res.axis, Some(Axis::X));
    assert_eq!(res.shift, Position::new(-50.0, 0.0));
    assert_eq!(res.cost, 2500.0);
    assert!(res.shift.x.abs() >= 50.0);
}

#[test_log::test]
fn equal_costs_prefer_x_over_y() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let a = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let b = seg.push_glyph(SQUARE, Position::new(50.0, 50.0));

    let mut c = start(&seg, a, limit(500.0));
    assert!(merge(&mut c, &seg, b));
    // Both axes need a 50 unit move.
    assert_eq!(c.zones(Axis::X).closest(0.0).map(|b| b.cost), Some(2500.0));
    assert_eq!(c.zones(Axis::Y).closest(0.0).map(|b| b.cost), Some(2500.0));

    let res = c.resolve(None);
    assert_eq!(res.axis, Some(Axis::X));
    assert_eq!(res.shift, Position::new(-50.0, 0.0));
}

fn stacked_mark(seq_class: u16) -> (Segment<GlyphCache>, SlotId, SlotId) {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let mut base_coll = SlotCollision::new();
    base_coll.set_seq_class(seq_class);
    base_coll.set_seq_above_wt(0);
    let base = seg.push_glyph_with_collision(SQUARE, Position::new(0.0, 0.0), base_coll);

    let mut mark_coll = SlotCollision::new();
    mark_coll.set_seq_class(seq_class);
    mark_coll.set_seq_order(SeqOrder::UP);
    // Overlaps the top 10 units of the base.
    let mark = seg.push_glyph_with_collision(MARK, Position::new(0.0, 90.0), mark_coll);
    seg.attach(mark, base).unwrap();
    (seg, base, mark)
}

#[test_log::test]
fn ordered_mark_settles_above_base_for_free() {
    let (seg, base, mark) = stacked_mark(1);
    let mut c = start(&seg, mark, limit(500.0));
    assert!(c.merge_slot(&seg, base, Position::ZERO, false, true, None));

    assert!(c.zones(Axis::Y).is_feasible(90.0), "above region must not be excluded");
    let res = c.resolve(None);
    assert!(!res.still_colliding);
    assert_eq!(res.axis, Some(Axis::Y));
    assert_eq!(res.cost, 0.0);
    assert!(res.shift.is_zero());
}

#[test_log::test]
fn unordered_mark_is_pushed_clear() {
    let (seg, base, mark) = stacked_mark(0);
    let mut c = start(&seg, mark, limit(500.0));
    assert!(c.merge_slot(&seg, base, Position::ZERO, false, true, None));

    let res = c.resolve(None);
    assert_eq!(res.axis, Some(Axis::Y));
    assert_eq!(res.shift, Position::new(0.0, 10.0));
    assert_eq!(res.cost, 100.0);
}

#[test_log::test]
fn ordering_is_ignored_across_clusters() {
    let (seg, base, mark) = stacked_mark(1);
    let mut c = start(&seg, mark, limit(500.0));
    c.merge_slot(&seg, base, Position::ZERO, false, false, None);
    assert!(!c.zones(Axis::Y).is_feasible(90.0));
}

#[test_log::test]
fn is_after_flips_the_stacking_direction() {
    let (seg, base, mark) = stacked_mark(1);
    let mut c = start(&seg, mark, limit(500.0));
    // UP becomes DOWN: the region above the base top is now blocked.
    c.merge_slot(&seg, base, Position::ZERO, true, true, None);
    assert!(!c.zones(Axis::Y).is_feasible(90.0));
    assert!(c.zones(Axis::Y).is_feasible(-50.0));
}

#[test_log::test]
fn detection_is_symmetric_without_ordering() {
    let offsets = [
        Position::new(60.0, 30.0),
        Position::new(150.0, 0.0),
        Position::new(-99.0, 99.0),
        Position::new(500.0, 500.0),
        Position::new(0.0, -350.0),
        Position::new(250.0, 10.0),
    ];
    for off in offsets {
        let mut seg = Segment::new(cache(), Direction::Ltr);
        let a = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
        let b = seg.push_glyph(SQUARE, off);

        let mut ca = start(&seg, a, limit(200.0));
        let mut cb = start(&seg, b, limit(200.0));
        assert_eq!(merge(&mut ca, &seg, b), merge(&mut cb, &seg, a), "offset {off:?}");
    }
}

#[test_log::test]
fn far_glyphs_do_not_collide() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let a = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let b = seg.push_glyph(SQUARE, Position::new(500.0, 500.0));
    let mut c = start(&seg, a, limit(200.0));
    assert!(!merge(&mut c, &seg, b));
    let res = c.resolve(None);
    assert!(res.shift.is_zero());
    assert_eq!(res.cost, 0.0);
}

#[test_log::test]
fn sub_boxes_exclude_no_more_than_the_envelope() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let t = seg.push_glyph(SMALL, Position::new(50.0, 40.0));
    let with_subs = seg.push_glyph(L_SHAPE, Position::new(0.0, 0.0));
    let whole = seg.push_glyph(L_WHOLE, Position::new(0.0, 0.0));

    let mut cs = start(&seg, t, limit(300.0));
    let mut cw = start(&seg, t, limit(300.0));
    assert!(merge(&mut cs, &seg, with_subs));
    assert!(merge(&mut cw, &seg, whole));

    for axis in Axis::ALL {
        let envelope = cw.zones(axis).exclusions();
        assert_eq!(envelope.len(), 1, "{axis}");
        let (wlo, whi) = envelope[0];
        for &(lo, hi) in cs.zones(axis).exclusions() {
            assert!(wlo <= lo && hi <= whi, "{axis}: ({lo}, {hi}) outside ({wlo}, {whi})");
        }
    }

    // The target sits in the hollow of the L: it only has to move for the envelope.
    let res = cs.resolve(None);
    assert!(res.shift.is_zero());
    assert_eq!(res.cost, 0.0);
    let res = cw.resolve(None);
    assert!(!res.shift.is_zero());
    assert!(res.cost > 0.0);
}

#[test_log::test]
fn resolved_position_avoids_every_exclusion() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let t = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let others = [
        seg.push_glyph(SQUARE, Position::new(60.0, 0.0)),
        seg.push_glyph(SQUARE, Position::new(-70.0, 20.0)),
        seg.push_glyph(SQUARE, Position::new(0.0, 90.0)),
    ];

    let mut c = start(&seg, t, limit(500.0));
    for &o in &others {
        merge(&mut c, &seg, o);
    }
    let res = c.resolve(None);
    let axis = res.axis.expect("there is room within the limit");
    let moved = seg.slot(t).origin + res.shift;
    let pos = axis.project(moved);
    for &(lo, hi) in c.zones(axis).exclusions() {
        assert!(!(lo < pos && pos < hi), "{pos} inside ({lo}, {hi}) on {axis}");
    }

    let ink = BBox::new(0.0, 0.0, 100.0, 100.0).translate(moved);
    for &o in &others {
        let n = BBox::new(0.0, 0.0, 100.0, 100.0).translate(seg.slot(o).origin);
        let w = ink.xa.min(n.xa) - ink.xi.max(n.xi);
        let h = ink.ya.min(n.ya) - ink.yi.max(n.yi);
        assert!(w <= 1e-3 || h <= 1e-3, "still overlapping {o}");
    }
}

#[test_log::test]
fn exclusions_accumulate_across_merges() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let t = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let others: Vec<SlotId> = [(40.0, 0.0), (-30.0, 60.0), (80.0, -80.0), (10.0, 10.0)]
        .iter()
        .map(|&(x, y)| seg.push_glyph(SQUARE, Position::new(x, y)))
        .collect();

    let mut c = start(&seg, t, limit(400.0));
    let mut seen: Vec<Vec<(f32, f32)>> = Axis::ALL.iter().map(|_| Vec::new()).collect();
    for &o in &others {
        merge(&mut c, &seg, o);
        for axis in Axis::ALL {
            let now = c.zones(axis).exclusions();
            assert!(now.starts_with(&seen[axis.index()]), "{axis} lost an exclusion");
            for &(lo, hi) in now {
                assert!(!c.zones(axis).is_feasible(0.5 * (lo + hi)));
            }
            seen[axis.index()] = now.to_vec();
        }
    }
}

#[test_log::test]
fn exclusion_glyph_is_merged_as_phantom() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let t = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let mut far = SlotCollision::new();
    // The glyph itself is out of reach; its exclusion glyph lands on the target.
    far.set_exclusion(Some((SQUARE, Position::new(-950.0, 0.0))));
    let n = seg.push_glyph_with_collision(SQUARE, Position::new(1000.0, 0.0), far);

    let mut c = start(&seg, t, limit(500.0));
    assert!(merge(&mut c, &seg, n));
    assert_eq!(c.zones(Axis::X).exclusions().to_vec(), vec![(-50.0, 150.0)]);

    seg.collision_mut(n).set_exclusion(None);
    let mut c = start(&seg, t, limit(500.0));
    assert!(!merge(&mut c, &seg, n));
}

#[test_log::test]
fn no_room_reports_still_colliding() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let t = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let n = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));

    let mut c = start(&seg, t, limit(10.0));
    assert!(merge(&mut c, &seg, n));
    let res = c.resolve(None);
    assert!(res.still_colliding);
    assert_eq!(res.axis, None);
    assert!(res.shift.is_zero());
}

#[test_log::test]
fn rtl_mirrors_horizontal_limit() {
    let mut seg = Segment::new(cache(), Direction::Rtl);
    let t = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let lim = Rect::from_coords(-10.0, -500.0, 300.0, 500.0);

    let mut c = ShiftCollider::new();
    c.init_slot(&seg, t, lim, 0.0, 0.0, Position::ZERO, Position::ZERO, Direction::Rtl, None);
    assert_eq!(c.zones(Axis::X).bounds(), (-300.0, 10.0));

    c.init_slot(&seg, t, lim, 0.0, 0.0, Position::ZERO, Position::ZERO, Direction::Ltr, None);
    assert_eq!(c.zones(Axis::X).bounds(), (-10.0, 300.0));
}

#[test_log::test]
fn current_offset_narrows_limit() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let t = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let mut c = ShiftCollider::new();
    let offset = Position::new(30.0, 0.0);
    c.init_slot(&seg, t, limit(100.0), 0.0, 0.0, Position::ZERO, offset, Direction::Ltr, None);
    assert_eq!(c.zones(Axis::X).bounds(), (-130.0, 70.0));
    // Unconstrained, the glyph goes back to where it was before the offset.
    let res = c.resolve(None);
    assert_eq!(res.axis, Some(Axis::X));
    assert_eq!(res.shift, Position::new(-30.0, 0.0));
}

#[test_log::test]
fn trace_does_not_change_the_result() {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let a = seg.push_glyph(SQUARE, Position::new(0.0, 0.0));
    let b = seg.push_glyph(SQUARE, Position::new(50.0, 0.0));

    let plain = {
        let mut c = start(&seg, a, limit(500.0));
        merge(&mut c, &seg, b);
        c.resolve(None)
    };

    let mut trace = Trace::new();
    let mut c = ShiftCollider::new();
    c.init_slot(
        &seg,
        a,
        limit(500.0),
        0.0,
        0.0,
        Position::ZERO,
        Position::ZERO,
        Direction::Ltr,
        Some(&mut trace),
    );
    c.merge_slot(&seg, b, Position::ZERO, false, false, Some(&mut trace));
    let traced = c.resolve(Some(&mut trace));

    assert_eq!(plain, traced);
    let record = trace.last_event("shift.resolve").expect("resolve record");
    assert_eq!(record["bestAxis"], 0);
    assert_eq!(record["stillBad"], false);
    assert_eq!(record["vectors"].as_array().map(Vec::len), Some(4));
    let merged = trace.last_event("shift.merge").expect("merge record");
    assert_eq!(merged["isCol"], true);
}

// --- Graded sequence regions ---

/// Square base at the origin with `target_gid` attached at `at`, both in
/// sequence class 1. `weights` sets the base's region parameters.
fn ordered_pair(
    target_gid: GlyphId,
    at: Position,
    order: SeqOrder,
    weights: impl FnOnce(&mut SlotCollision),
) -> (Segment<GlyphCache>, SlotId, SlotId) {
    let mut seg = Segment::new(cache(), Direction::Ltr);
    let mut base_coll = SlotCollision::new();
    base_coll.set_seq_class(1);
    weights(&mut base_coll);
    let base = seg.push_glyph_with_collision(SQUARE, Position::new(0.0, 0.0), base_coll);

    let mut target_coll = SlotCollision::new();
    target_coll.set_seq_class(1);
    target_coll.set_seq_order(order);
    let target = seg.push_glyph_with_collision(target_gid, at, target_coll);
    seg.attach(target, base).unwrap();
    (seg, base, target)
}

fn ordered_collider(seg: &Segment<GlyphCache>, base: SlotId, target: SlotId) -> ShiftCollider {
    let mut c = start(seg, target, limit(500.0));
    c.merge_slot(seg, base, Position::ZERO, false, true, None);
    c
}

/// Cost at `p` on `axis` minus the cost of moving there from `origin`.
fn region_cost(c: &ShiftCollider, axis: Axis, p: f32, origin: f32) -> f32 {
    let total = c.zones(axis).cost_at(p, origin).expect("position is feasible");
    total - (p - origin) * (p - origin)
}

#[test_log::test]
fn above_region_slopes_towards_the_neighbor_edge() {
    // RIGHT: the mark above the base is cheapest at the base's right edge.
    let (seg, base, mark) = ordered_pair(MARK, Position::new(0.0, 150.0), SeqOrder::RIGHT, |c| {
        c.set_seq_above_wt(1)
    });
    let c = ordered_collider(&seg, base, mark);
    assert!(c.zones(Axis::X).exclusions().is_empty());
    assert!(!c.zones(Axis::Y).exclusions().is_empty(), "y keeps the plain exclusion");
    assert_eq!(region_cost(&c, Axis::X, 0.0, 0.0), 10000.0);
    assert!(region_cost(&c, Axis::X, 75.0, 0.0) < region_cost(&c, Axis::X, 25.0, 0.0));
    assert_eq!(region_cost(&c, Axis::X, 150.0, 0.0), 0.0);
    let best = c.zones(Axis::X).closest(0.0).unwrap();
    assert_eq!((best.pos, best.cost), (50.0, 5000.0));

    // LEFT: the mirrored layout, the mark below the base pulled to its left edge.
    let (seg, base, mark) = ordered_pair(MARK, Position::new(0.0, -150.0), SeqOrder::LEFT, |c| {
        c.set_seq_above_wt(1)
    });
    let c = ordered_collider(&seg, base, mark);
    assert!(c.zones(Axis::X).exclusions().is_empty());
    assert_eq!(region_cost(&c, Axis::X, -25.0, 0.0), 5625.0);
    assert_eq!(region_cost(&c, Axis::X, -75.0, 0.0), 625.0);
    assert_eq!(region_cost(&c, Axis::X, -150.0, 0.0), 0.0);
    let best = c.zones(Axis::X).closest(0.0).unwrap();
    assert_eq!((best.pos, best.cost), (-50.0, 5000.0));
}

#[test_log::test]
fn below_region_adds_a_flat_penalty() {
    let set_below = |c: &mut SlotCollision| c.set_seq_below_wt(2);

    // UP, right of the base: dropping below the base's bottom costs extra.
    let (seg, base, t) = ordered_pair(SMALL, Position::new(120.0, 50.0), SeqOrder::UP, set_below);
    let c = ordered_collider(&seg, base, t);
    assert_eq!(region_cost(&c, Axis::Y, -10.0, 50.0), 800.0);
    assert_eq!(region_cost(&c, Axis::Y, 110.0, 50.0), 0.0);
    assert!(c.zones(Axis::Y).cost_at(-10.0, 50.0) > c.zones(Axis::Y).cost_at(110.0, 50.0));

    // DOWN, left of the base: rising above the base's top costs extra.
    let (seg, base, t) = ordered_pair(SMALL, Position::new(-50.0, 20.0), SeqOrder::DOWN, set_below);
    let c = ordered_collider(&seg, base, t);
    assert_eq!(region_cost(&c, Axis::Y, 80.0, 20.0), 500000.0);
    assert_eq!(region_cost(&c, Axis::Y, -40.0, 20.0), 0.0);
    assert!(c.zones(Axis::Y).cost_at(80.0, 20.0) > c.zones(Axis::Y).cost_at(-40.0, 20.0));
}

#[test_log::test]
fn valign_bands_pull_towards_the_base_line() {
    let set_valign = |c: &mut SlotCollision| {
        c.set_seq_valign_ht(40);
        c.set_seq_valign_wt(1);
    };

    // UP: the band above the base bottom is cheapest at its top, the band
    // below it at its bottom.
    let (seg, base, t) = ordered_pair(SMALL, Position::new(120.0, 50.0), SeqOrder::UP, set_valign);
    let c = ordered_collider(&seg, base, t);
    assert_eq!(region_cost(&c, Axis::Y, 15.0, 50.0), 25.0);
    assert_eq!(region_cost(&c, Axis::Y, 5.0, 50.0), 225.0);
    assert_eq!(region_cost(&c, Axis::Y, -45.0, 50.0), 25.0);
    assert_eq!(region_cost(&c, Axis::Y, -35.0, 50.0), 225.0);

    // DOWN mirrors both bands around the base top.
    let (seg, base, t) = ordered_pair(SMALL, Position::new(-50.0, 70.0), SeqOrder::DOWN, set_valign);
    let c = ordered_collider(&seg, base, t);
    assert_eq!(region_cost(&c, Axis::Y, 55.0, 70.0), 25.0);
    assert_eq!(region_cost(&c, Axis::Y, 65.0, 70.0), 225.0);
    assert_eq!(region_cost(&c, Axis::Y, 115.0, 70.0), 25.0);
    assert_eq!(region_cost(&c, Axis::Y, 105.0, 70.0), 225.0);
}

#[test_log::test]
fn stacking_sign_follows_each_axis() {
    assert_eq!(enforce_sign(Axis::X, SeqOrder::RIGHT), 1);
    assert_eq!(enforce_sign(Axis::X, SeqOrder::LEFT), -1);
    assert_eq!(enforce_sign(Axis::X, SeqOrder::UP), 0);
    assert_eq!(enforce_sign(Axis::Y, SeqOrder::UP), 1);
    assert_eq!(enforce_sign(Axis::Y, SeqOrder::DOWN), -1);
    assert_eq!(enforce_sign(Axis::Y, SeqOrder::LEFT), 0);

    // Diagonals take the sign of the x and y constraints together.
    let up_right = SeqOrder::UP | SeqOrder::RIGHT;
    let down_left = SeqOrder::DOWN | SeqOrder::LEFT;
    let up_left = SeqOrder::UP | SeqOrder::LEFT;
    for axis in [Axis::Sum, Axis::Diff] {
        assert_eq!(enforce_sign(axis, up_right), 1, "{axis}");
        assert_eq!(enforce_sign(axis, down_left), -1, "{axis}");
        assert_eq!(enforce_sign(axis, up_left), 0, "{axis}");
        assert_eq!(enforce_sign(axis, SeqOrder::UP), 1, "{axis}");
        assert_eq!(enforce_sign(axis, SeqOrder::LEFT), -1, "{axis}");
    }
}
