// src/axis.rs

//! The four movement axes of the shift collider.
//!
//! Every axis is a linear projection of the plane: `x`, `y`, `x + y` and
//! `x - y`. Diagonal coordinates are stretched by √2 relative to Euclidean
//! distance, which is what `cost_scale` and `margin_scale` compensate for.

use crate::geometry::{Octabox, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    /// Along `x + y`: movement up and to the right.
    Sum,
    /// Along `x - y`: movement down and to the right.
    Diff,
}

impl Axis {
    /// Enumeration order; also the tie-break order when costs are equal.
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Sum, Axis::Diff];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Sum => 2,
            Axis::Diff => 3,
        }
    }

    /// The axis whose coordinate stays fixed while moving along this one.
    pub fn perp(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
            Axis::Sum => Axis::Diff,
            Axis::Diff => Axis::Sum,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, Axis::Sum | Axis::Diff)
    }

    /// Change in (x, y) per unit of this axis' coordinate with the perpendicular held fixed.
    pub fn step(self) -> (f32, f32) {
        match self {
            Axis::X => (1.0, 0.0),
            Axis::Y => (0.0, 1.0),
            Axis::Sum => (0.5, 0.5),
            Axis::Diff => (0.5, -0.5),
        }
    }

    /// Factor turning squared axis distance into squared Euclidean distance.
    pub fn cost_scale(self) -> f64 {
        if self.is_diagonal() {
            0.5
        } else {
            1.0
        }
    }

    /// Factor turning a Euclidean margin into axis units.
    pub fn margin_scale(self) -> f32 {
        if self.is_diagonal() {
            std::f32::consts::SQRT_2
        } else {
            1.0
        }
    }

    pub fn project(self, p: Position) -> f32 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
            Axis::Sum => p.x + p.y,
            Axis::Diff => p.x - p.y,
        }
    }

    /// Inverse of (`project`, `perp().project`): the point with coordinate
    /// `along` on this axis and `across` on the perpendicular one.
    pub fn compose(self, along: f32, across: f32) -> Position {
        match self {
            Axis::X => Position::new(along, across),
            Axis::Y => Position::new(across, along),
            Axis::Sum => Position::new(0.5 * (along + across), 0.5 * (along - across)),
            Axis::Diff => Position::new(0.5 * (across + along), 0.5 * (across - along)),
        }
    }

    /// Extent of an octabox on this axis.
    pub fn extent(self, oct: &Octabox) -> (f32, f32) {
        match self {
            Axis::X => (oct.bbox.xi, oct.bbox.xa),
            Axis::Y => (oct.bbox.yi, oct.bbox.ya),
            Axis::Sum => (oct.slant.si, oct.slant.sa),
            Axis::Diff => (oct.slant.di, oct.slant.da),
        }
    }

    /// Name used in trace output.
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Sum => "sum (NE-SW)",
            Axis::Diff => "diff (NW-SE)",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Open interval of positions along `axis` at which a glyph with envelope
/// `target` (relative to its origin) overlaps the absolute envelope `other`,
/// while its perpendicular coordinate stays at `across`.
///
/// Each of the three projections that move with the axis bounds the interval;
/// their intersection is the exact overlap set for octaboxes. The returned
/// interval is empty (`lo >= hi`) when there is no such position.
pub fn overlap_interval(axis: Axis, target: &Octabox, across: f32, other: &Octabox) -> (f32, f32) {
    let mut lo = f32::NEG_INFINITY;
    let mut hi = f32::INFINITY;
    for proj in Axis::ALL {
        if proj == axis.perp() {
            continue;
        }
        // proj(compose(p, across)) = rate * p + base
        let rate = proj.project(axis.compose(1.0, 0.0));
        let base = proj.project(axis.compose(0.0, across));
        let (tmin, tmax) = proj.extent(target);
        let (omin, omax) = proj.extent(other);
        // Overlap needs rate*p + base + tmax > omin and rate*p + base + tmin < omax.
        let (a, b) = ((omin - tmax - base) / rate, (omax - tmin - base) / rate);
        let (from, to) = if rate > 0.0 { (a, b) } else { (b, a) };
        lo = lo.max(from);
        hi = hi.min(to);
    }
    (lo, hi)
}
