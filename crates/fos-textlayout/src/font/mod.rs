//! Font metrics and glyph provider boundary
//!
//! The shaping pipeline never parses fonts itself; it asks a `FontProvider`
//! for glyph ids, advance widths and, for the complex backend, the raw face.

mod collection;

pub use collection::FontCollection;

use crate::style::{StyleFingerprint, TypefaceId};

/// Font-level vertical metrics in pixels for a given text size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Distance above the baseline (positive)
    pub ascent: f32,
    /// Distance below the baseline (negative)
    pub descent: f32,
    pub line_gap: f32,
    pub units_per_em: u16,
}

/// Raw face bytes handed to the complex shaping backend
#[derive(Debug, Clone, Copy)]
pub struct FaceData<'a> {
    pub data: &'a [u8],
    pub index: u32,
}

/// Supplies glyph ids, widths and metrics per typeface.
///
/// Implementations must be shareable across the caller threads that use
/// one engine.
pub trait FontProvider: Send + Sync {
    /// Glyph id for a code point, `None` when the face has no mapping
    fn glyph_index(&self, typeface: TypefaceId, ch: char) -> Option<u16>;

    /// Horizontal advance of a glyph in pixels, scaled by size and `scale_x`
    fn glyph_advance(&self, style: &StyleFingerprint, glyph: u16) -> f32;

    /// Vertical metrics for the style's typeface and size
    fn metrics(&self, style: &StyleFingerprint) -> Option<FontMetrics>;

    /// Raw face for complex shaping; providers without font files return `None`
    fn face_data(&self, _typeface: TypefaceId) -> Option<FaceData<'_>> {
        None
    }
}

/// A provider bound to one style snapshot
#[derive(Clone, Copy)]
pub struct FontHandle<'a> {
    provider: &'a dyn FontProvider,
    style: &'a StyleFingerprint,
}

impl<'a> FontHandle<'a> {
    pub fn new(provider: &'a dyn FontProvider, style: &'a StyleFingerprint) -> Self {
        Self { provider, style }
    }

    pub fn style(&self) -> &'a StyleFingerprint {
        self.style
    }

    pub fn glyph_index(&self, ch: char) -> Option<u16> {
        self.provider.glyph_index(self.style.typeface(), ch)
    }

    pub fn glyph_advance(&self, glyph: u16) -> f32 {
        self.provider.glyph_advance(self.style, glyph)
    }

    pub fn metrics(&self) -> Option<FontMetrics> {
        self.provider.metrics(self.style)
    }

    pub fn face_data(&self) -> Option<FaceData<'a>> {
        self.provider.face_data(self.style.typeface())
    }
}

impl std::fmt::Debug for FontHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle").field("style", &self.style).finish()
    }
}
