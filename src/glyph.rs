// src/glyph.rs

//! Glyph geometry as seen by the colliders.
//!
//! The colliders never parse fonts. They ask a `GlyphGeometry` implementation
//! for a glyph's upright box, slant box and optional sub-boxes, all relative
//! to the glyph origin. `GlyphCache` is the in-memory implementation used by
//! callers that have already extracted this data (and by the tests).

use crate::geometry::{BBox, Octabox, SlantBox};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Font glyph identifier.
pub type GlyphId = u16;

/// Envelope of one glyph: the whole octabox plus optional sub-boxes for
/// non-convex outlines. Sub-boxes, when present, must lie inside the whole box.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlyphBounds {
    pub octabox: Octabox,
    #[serde(default)]
    pub sub_boxes: Vec<Octabox>,
}

impl GlyphBounds {
    /// Bounds for a plain rectangular glyph.
    pub fn from_bbox(bbox: BBox) -> Self {
        GlyphBounds {
            octabox: Octabox::from_bbox(bbox),
            sub_boxes: Vec::new(),
        }
    }

    pub fn with_sub_boxes(mut self, sub_boxes: Vec<Octabox>) -> Self {
        self.sub_boxes = sub_boxes;
        self
    }
}

/// Read-only access to per-glyph collision geometry.
pub trait GlyphGeometry {
    /// Upright bounding box of the glyph.
    fn bbox(&self, gid: GlyphId) -> BBox;

    /// Diagonal bounding box of the glyph.
    fn slant(&self, gid: GlyphId) -> SlantBox;

    /// Sub-boxes refining the envelope; empty when the glyph has none.
    fn sub_boxes(&self, gid: GlyphId) -> &[Octabox];

    fn octabox(&self, gid: GlyphId) -> Octabox {
        Octabox::new(self.bbox(gid), self.slant(gid))
    }
}

impl<T: GlyphGeometry + ?Sized> GlyphGeometry for &T {
    fn bbox(&self, gid: GlyphId) -> BBox {
        (**self).bbox(gid)
    }

    fn slant(&self, gid: GlyphId) -> SlantBox {
        (**self).slant(gid)
    }

    fn sub_boxes(&self, gid: GlyphId) -> &[Octabox] {
        (**self).sub_boxes(gid)
    }
}

/// `GlyphGeometry` backed by a hash map.
///
/// Unknown glyph ids answer with all-zero boxes, which every collider treats
/// as "no ink" and skips.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlyphCache {
    glyphs: HashMap<GlyphId, GlyphBounds>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gid: GlyphId, bounds: GlyphBounds) {
        self.glyphs.insert(gid, bounds);
    }

    pub fn get(&self, gid: GlyphId) -> Option<&GlyphBounds> {
        self.glyphs.get(&gid)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Loads a cache from a JSON object of the form `{"glyphs": {"<gid>": {...}}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse glyph geometry JSON")
    }
}

impl GlyphGeometry for GlyphCache {
    fn bbox(&self, gid: GlyphId) -> BBox {
        self.glyphs
            .get(&gid)
            .map(|g| g.octabox.bbox)
            .unwrap_or_default()
    }

    fn slant(&self, gid: GlyphId) -> SlantBox {
        self.glyphs
            .get(&gid)
            .map(|g| g.octabox.slant)
            .unwrap_or_default()
    }

    fn sub_boxes(&self, gid: GlyphId) -> &[Octabox] {
        self.glyphs
            .get(&gid)
            .map(|g| g.sub_boxes.as_slice())
            .unwrap_or(&[])
    }
}
