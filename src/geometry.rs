// src/geometry.rs

//! Plain geometric value types shared by the colliders.
//!
//! Glyph ink is approximated by an *octabox*: an upright bounding box (`BBox`)
//! intersected with a box measured along the two diagonals (`SlantBox`).
//! Glyph boxes are stored relative to the glyph origin; `translate` moves them
//! into absolute segment coordinates.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A point or displacement in font units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ZERO: Position = Position { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Position { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Position {
    type Output = Position;
    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Position {
    type Output = Position;
    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Position {
    type Output = Position;
    fn neg(self) -> Position {
        Position::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Position {
    type Output = Position;
    fn mul(self, rhs: f32) -> Position {
        Position::new(self.x * rhs, self.y * rhs)
    }
}

/// An axis-aligned rectangle given by its bottom-left and top-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub bl: Position,
    pub tr: Position,
}

impl Rect {
    pub const fn new(bl: Position, tr: Position) -> Self {
        Rect { bl, tr }
    }

    pub fn from_coords(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect::new(Position::new(x0, y0), Position::new(x1, y1))
    }

    pub fn width(&self) -> f32 {
        self.tr.x - self.bl.x
    }

    pub fn height(&self) -> f32 {
        self.tr.y - self.bl.y
    }

    /// True when the rectangle encloses no area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn translate(&self, by: Position) -> Rect {
        Rect::new(self.bl + by, self.tr + by)
    }
}

/// Upright bounding box relative to a glyph origin: `xi..xa` by `yi..ya`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub xi: f32,
    pub yi: f32,
    pub xa: f32,
    pub ya: f32,
}

impl BBox {
    pub const fn new(xi: f32, yi: f32, xa: f32, ya: f32) -> Self {
        BBox { xi, yi, xa, ya }
    }

    pub fn width(&self) -> f32 {
        self.xa - self.xi
    }

    pub fn height(&self) -> f32 {
        self.ya - self.yi
    }

    pub fn translate(&self, by: Position) -> BBox {
        BBox::new(self.xi + by.x, self.yi + by.y, self.xa + by.x, self.ya + by.y)
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_coords(self.xi, self.yi, self.xa, self.ya)
    }
}

/// Bounding box along the diagonals: `si..sa` bounds `x + y`, `di..da` bounds `x - y`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlantBox {
    pub si: f32,
    pub sa: f32,
    pub di: f32,
    pub da: f32,
}

impl SlantBox {
    pub const fn new(si: f32, sa: f32, di: f32, da: f32) -> Self {
        SlantBox { si, sa, di, da }
    }

    pub fn translate(&self, by: Position) -> SlantBox {
        let s = by.x + by.y;
        let d = by.x - by.y;
        SlantBox::new(self.si + s, self.sa + s, self.di + d, self.da + d)
    }
}

/// Octagonal ink envelope: the intersection of an upright and a slant box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Octabox {
    pub bbox: BBox,
    pub slant: SlantBox,
}

impl Octabox {
    pub const fn new(bbox: BBox, slant: SlantBox) -> Self {
        Octabox { bbox, slant }
    }

    /// Octabox of a plain rectangle; the slant box is the tightest one around its corners.
    pub fn from_bbox(bbox: BBox) -> Self {
        let slant = SlantBox::new(
            bbox.xi + bbox.yi,
            bbox.xa + bbox.ya,
            bbox.xi - bbox.ya,
            bbox.xa - bbox.yi,
        );
        Octabox { bbox, slant }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Octabox::from_bbox(BBox::new(rect.bl.x, rect.bl.y, rect.tr.x, rect.tr.y))
    }

    pub fn translate(&self, by: Position) -> Octabox {
        Octabox::new(self.bbox.translate(by), self.slant.translate(by))
    }

    /// True when any of the four extents is empty or inverted.
    pub fn is_degenerate(&self) -> bool {
        self.bbox.xa <= self.bbox.xi
            || self.bbox.ya <= self.bbox.yi
            || self.slant.sa < self.slant.si
            || self.slant.da < self.slant.di
    }
}
