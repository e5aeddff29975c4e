// src/lib.rs

//! Collision avoidance for positioned glyph runs.
//!
//! Glyphs are approximated by octaboxes: an axis-aligned box intersected with
//! a 45-degree rotated box, optionally refined by a grid of sub-boxes. Two
//! solvers work on a [`Segment`] of positioned slots:
//!
//! - [`ShiftCollider`] moves one glyph in any direction, searching four axes
//!   (horizontal, vertical and both diagonals) for the cheapest position that
//!   clears every neighbor. Each axis is a [`Zones`] cost landscape.
//! - [`KernCollider`] only moves a whole cluster horizontally, opening the
//!   smallest gap to a neighbor up to a margin.
//!
//! Per-glyph parameters and results live in [`SlotCollision`]. Every solver
//! entry point takes an optional [`Trace`] collecting JSON records of what it
//! did; logging goes through the `log` facade.

pub mod axis;
pub mod collision;
pub mod config;
pub mod geometry;
pub mod glyph;
pub mod kern;
pub mod segment;
pub mod shift;
pub mod trace;
pub mod zones;

pub use axis::Axis;
pub use collision::{CollisionFlags, GlyphAttrs, SeqOrder, SlotCollision};
pub use config::CollisionConfig;
pub use geometry::{BBox, Octabox, Position, Rect, SlantBox};
pub use glyph::{GlyphBounds, GlyphCache, GlyphGeometry, GlyphId};
pub use kern::KernCollider;
pub use segment::{Direction, Segment, Slot, SlotId};
pub use shift::{ShiftCollider, ShiftResolution};
pub use trace::Trace;
pub use zones::{Closest, Penalty, Zones};
