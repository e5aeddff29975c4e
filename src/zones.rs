// src/zones.rs

//! One-dimensional cost landscape used by the shift collider.
//!
//! A `Zones` holds the feasible positions along one axis as a sorted list of
//! closed, non-overlapping spans. Hard exclusions cut holes into the list and
//! are never undone. Weighted regions add a quadratic cost to whatever part of
//! the existing spans they cover; they never make excluded space feasible.
//!
//! Costs are additive. Moving the glyph away from its natural position costs
//! the squared Euclidean distance travelled, on top of any weighted regions.

use crate::axis::Axis;
use log::trace;
use serde::Serialize;
use serde_json::{json, Value};

/// A graded cost over part of an axis.
///
/// Contributes `scale * (weight * offset² + slope * (p - anchor)²) + constant`
/// at position `p`, where `scale` is the axis' `cost_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Penalty {
    pub weight: f32,
    pub offset: f32,
    pub slope: f32,
    pub anchor: f32,
    pub constant: f32,
}

impl Penalty {
    /// Cost growing quadratically with distance from `anchor`.
    pub fn slope(slope: f32, anchor: f32) -> Self {
        Penalty {
            slope,
            anchor,
            ..Default::default()
        }
    }

    /// Constant cost `weight * offset²`.
    pub fn flat(weight: f32, offset: f32) -> Self {
        Penalty {
            weight,
            offset,
            ..Default::default()
        }
    }

    fn quadratic(&self, scale: f64) -> Quadratic {
        let m = scale * self.slope as f64;
        let xi = self.anchor as f64;
        let off = self.offset as f64;
        Quadratic {
            a: m,
            b: -2.0 * m * xi,
            c: m * xi * xi + scale * self.weight as f64 * off * off + self.constant as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Quadratic {
    a: f64,
    b: f64,
    c: f64,
}

/// A feasible span `[x, xm]` and the cost accumulated on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub x: f32,
    pub xm: f32,
    cost: Quadratic,
}

impl Span {
    fn new(x: f32, xm: f32) -> Self {
        Span {
            x,
            xm,
            cost: Quadratic::default(),
        }
    }

    fn clipped(&self, x: f32, xm: f32) -> Span {
        Span { x, xm, ..*self }
    }

    /// Weighted cost at `p`, excluding the movement cost.
    pub fn cost_at(&self, p: f32) -> f64 {
        let p = p as f64;
        (self.cost.a * p + self.cost.b) * p + self.cost.c
    }

    pub fn contains(&self, p: f32) -> bool {
        self.x <= p && p <= self.xm
    }

    fn to_json(&self) -> Value {
        json!([self.x, self.xm, self.cost.a, self.cost.b, self.cost.c])
    }
}

/// Best position found by `Zones::closest`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Closest {
    pub pos: f32,
    pub cost: f32,
}

/// Cost landscape along one axis.
#[derive(Debug, Clone)]
pub struct Zones {
    axis: Axis,
    spans: Vec<Span>,
    removed: Vec<(f32, f32)>,
    margin_len: f32,
    margin_weight: f32,
    pos: f32,
    posm: f32,
    perp_cost: f64,
}

impl Zones {
    pub fn new(axis: Axis) -> Self {
        Zones {
            axis,
            spans: Vec::with_capacity(8),
            removed: Vec::new(),
            margin_len: 0.0,
            margin_weight: 0.0,
            pos: 0.0,
            posm: 0.0,
            perp_cost: 0.0,
        }
    }

    /// Resets to the single feasible range `[min, max]`.
    ///
    /// `margin_len` and `margin_weight` shape the soft ramps placed inside
    /// the range edges now and around every exclusion added later.
    /// `perp_offset` is the displacement already applied across the axis,
    /// which every position on this axis pays for.
    pub fn initialise(
        &mut self,
        min: f32,
        max: f32,
        margin_len: f32,
        margin_weight: f32,
        perp_offset: f32,
    ) {
        self.spans.clear();
        self.removed.clear();
        self.margin_len = margin_len;
        self.margin_weight = margin_weight;
        self.pos = min;
        self.posm = max;
        let off = perp_offset as f64;
        self.perp_cost = self.axis.cost_scale() * off * off;
        if min > max {
            trace!("zones[{}]: empty range {}..{}", self.axis, min, max);
            return;
        }
        self.spans.push(Span::new(min, max));
        if self.has_margins() {
            let len = margin_len;
            self.weighted(min, min + len, Penalty::slope(margin_weight, min + len));
            self.weighted(max - len, max, Penalty::slope(margin_weight, max - len));
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The range passed to `initialise`.
    pub fn bounds(&self) -> (f32, f32) {
        (self.pos, self.posm)
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Every interval removed since `initialise`, in insertion order.
    pub fn exclusions(&self) -> &[(f32, f32)] {
        &self.removed
    }

    pub fn is_feasible(&self, p: f32) -> bool {
        self.spans.iter().any(|s| s.contains(p))
    }

    fn has_margins(&self) -> bool {
        self.margin_len > 0.0 && self.margin_weight > 0.0
    }

    /// Makes the open interval `(lo, hi)` infeasible.
    pub fn exclude(&mut self, lo: f32, hi: f32) {
        if !(lo < hi) {
            return;
        }
        self.removed.push((lo, hi));
        let mut out = Vec::with_capacity(self.spans.len() + 1);
        for span in std::mem::take(&mut self.spans) {
            if hi <= span.x || lo >= span.xm {
                out.push(span);
                continue;
            }
            if lo >= span.x {
                out.push(span.clipped(span.x, lo));
            }
            if hi <= span.xm {
                out.push(span.clipped(hi, span.xm));
            }
        }
        self.spans = out;
    }

    /// `exclude` plus soft margin ramps on both sides of the hole.
    pub fn exclude_with_margins(&mut self, lo: f32, hi: f32) {
        if !(lo < hi) {
            return;
        }
        self.exclude(lo, hi);
        if self.has_margins() {
            let len = self.margin_len;
            let wt = self.margin_weight;
            self.weighted(lo - len, lo, Penalty::slope(wt, lo - len));
            self.weighted(hi, hi + len, Penalty::slope(wt, hi + len));
        }
    }

    /// Adds `penalty` over `[lo, hi]`, limited to the spans still feasible.
    pub fn weighted(&mut self, lo: f32, hi: f32, penalty: Penalty) {
        let lo = lo.max(self.pos);
        let hi = hi.min(self.posm);
        if lo > hi {
            return;
        }
        let q = penalty.quadratic(self.axis.cost_scale());
        let mut out = Vec::with_capacity(self.spans.len() + 2);
        for span in std::mem::take(&mut self.spans) {
            let a = span.x.max(lo);
            let b = span.xm.min(hi);
            let covered = if span.x == span.xm { a <= b } else { a < b };
            if !covered {
                out.push(span);
                continue;
            }
            if a > span.x {
                out.push(span.clipped(span.x, a));
            }
            let mut mid = span.clipped(a, b);
            mid.cost.a += q.a;
            mid.cost.b += q.b;
            mid.cost.c += q.c;
            out.push(mid);
            if span.xm > b {
                out.push(span.clipped(b, span.xm));
            }
        }
        self.spans = out;
    }

    /// Total cost of standing at `p` when the natural position is `origin`,
    /// or `None` if `p` is excluded.
    pub fn cost_at(&self, p: f32, origin: f32) -> Option<f32> {
        self.spans
            .iter()
            .filter(|s| s.contains(p))
            .map(|s| self.total_cost(s, p, origin))
            .min_by(|a, b| a.total_cmp(b))
            .map(|c| c as f32)
    }

    fn total_cost(&self, span: &Span, p: f32, origin: f32) -> f64 {
        let d = (p - origin) as f64;
        let cost = span.cost_at(p) + self.axis.cost_scale() * d * d + self.perp_cost;
        cost.max(0.0)
    }

    /// Cheapest feasible position for a glyph whose natural position is `origin`.
    ///
    /// Returns `None` when nothing is feasible. Equal costs prefer the position
    /// nearer to `origin`, then the lower one.
    pub fn closest(&self, origin: f32) -> Option<Closest> {
        let scale = self.axis.cost_scale();
        let o = origin as f64;
        let mut best: Option<(f64, f32)> = None;
        for span in &self.spans {
            let a = span.cost.a + scale;
            let b = span.cost.b - 2.0 * scale * o;
            let p = if a > 0.0 {
                ((-b / (2.0 * a)) as f32).clamp(span.x, span.xm)
            } else if self.total_cost(span, span.x, origin)
                <= self.total_cost(span, span.xm, origin)
            {
                span.x
            } else {
                span.xm
            };
            let cost = self.total_cost(span, p, origin);
            let better = match best {
                None => true,
                Some((bc, bp)) => {
                    cost < bc
                        || (cost == bc
                            && ((p - origin).abs() < (bp - origin).abs()
                                || ((p - origin).abs() == (bp - origin).abs() && p < bp)))
                }
            };
            if better {
                best = Some((cost, p));
            }
        }
        best.map(|(cost, pos)| Closest {
            pos,
            cost: cost as f32,
        })
    }

    /// Feasible spans with their cost coefficients, for trace output.
    pub fn to_json(&self) -> Value {
        Value::Array(self.spans.iter().map(Span::to_json).collect())
    }
}
