//! Style snapshots
//!
//! `TextStyle` is the caller's live, mutable paint-like object.
//! `StyleFingerprint` freezes the attributes that change shaping output so a
//! cache key stays valid after the caller mutates its style.

use std::cmp::Ordering;
use std::sync::Arc;

/// Opaque typeface identity (index into the font provider)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TypefaceId(pub u32);

/// Paint flags that influence glyph selection or metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StyleFlags(pub u32);

impl StyleFlags {
    pub const NONE: StyleFlags = StyleFlags(0);
    pub const ANTI_ALIAS: StyleFlags = StyleFlags(0x01);
    pub const FAKE_BOLD: StyleFlags = StyleFlags(0x20);
    pub const LINEAR_TEXT: StyleFlags = StyleFlags(0x40);
    pub const SUBPIXEL_TEXT: StyleFlags = StyleFlags(0x80);
    pub const DEV_KERN: StyleFlags = StyleFlags(0x100);

    pub fn contains(self, other: StyleFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: StyleFlags) -> Self {
        StyleFlags(self.0 | other.0)
    }
}

/// Outline hinting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Hinting {
    None,
    Slight,
    #[default]
    Normal,
    Full,
}

/// Live text style owned by the caller
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub typeface: TypefaceId,
    /// Text size in pixels
    pub size: f32,
    /// Horizontal skew (fake italic), 0 for upright
    pub skew_x: f32,
    /// Horizontal scale, 1 for unscaled
    pub scale_x: f32,
    pub flags: StyleFlags,
    pub hinting: Hinting,
    /// BCP-47 language hint for the shaping backend
    pub language: Option<String>,
}

impl TextStyle {
    pub fn new(typeface: TypefaceId, size: f32) -> Self {
        Self {
            typeface,
            size,
            skew_x: 0.0,
            scale_x: 1.0,
            flags: StyleFlags::ANTI_ALIAS,
            hinting: Hinting::Normal,
            language: None,
        }
    }

    pub fn skew_x(mut self, skew_x: f32) -> Self {
        self.skew_x = skew_x;
        self
    }

    pub fn scale_x(mut self, scale_x: f32) -> Self {
        self.scale_x = scale_x;
        self
    }

    pub fn flags(mut self, flags: StyleFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn hinting(mut self, hinting: Hinting) -> Self {
        self.hinting = hinting;
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    /// Snapshot the shaping-relevant attributes
    pub fn fingerprint(&self) -> StyleFingerprint {
        StyleFingerprint::from(self)
    }
}

/// Immutable snapshot of the style attributes that affect shaping.
///
/// Ordering compares typeface, size, skew, scale, flags, hinting and then the
/// language hint; the first differing field decides.
#[derive(Debug, Clone)]
pub struct StyleFingerprint {
    typeface: TypefaceId,
    size: f32,
    skew_x: f32,
    scale_x: f32,
    flags: StyleFlags,
    hinting: Hinting,
    language: Option<Arc<str>>,
}

impl StyleFingerprint {
    pub fn typeface(&self) -> TypefaceId {
        self.typeface
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn skew_x(&self) -> f32 {
        self.skew_x
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn flags(&self) -> StyleFlags {
        self.flags
    }

    pub fn hinting(&self) -> Hinting {
        self.hinting
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl From<&TextStyle> for StyleFingerprint {
    fn from(style: &TextStyle) -> Self {
        Self {
            typeface: style.typeface,
            size: style.size,
            skew_x: style.skew_x,
            scale_x: style.scale_x,
            flags: style.flags,
            hinting: style.hinting,
            language: style.language.as_deref().map(Arc::from),
        }
    }
}

impl Ord for StyleFingerprint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.typeface
            .cmp(&other.typeface)
            .then_with(|| self.size.total_cmp(&other.size))
            .then_with(|| self.skew_x.total_cmp(&other.skew_x))
            .then_with(|| self.scale_x.total_cmp(&other.scale_x))
            .then_with(|| self.flags.cmp(&other.flags))
            .then_with(|| self.hinting.cmp(&other.hinting))
            .then_with(|| self.language.cmp(&other.language))
    }
}

impl PartialOrd for StyleFingerprint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for StyleFingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StyleFingerprint {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_survives_style_mutation() {
        let mut style = TextStyle::new(TypefaceId(1), 12.0);
        let before = style.fingerprint();
        style.size = 24.0;
        assert_eq!(before.size(), 12.0);
        assert_ne!(before, style.fingerprint());
    }

    #[test]
    fn test_ordering_typeface_before_size() {
        let a = TextStyle::new(TypefaceId(1), 40.0).fingerprint();
        let b = TextStyle::new(TypefaceId(2), 10.0).fingerprint();
        assert!(a < b);
    }

    #[test]
    fn test_ordering_tie_break_chain() {
        let base = TextStyle::new(TypefaceId(1), 12.0);
        let skewed = base.clone().skew_x(-0.25);
        let scaled = base.clone().scale_x(1.5);
        assert!(skewed.fingerprint() < base.fingerprint());
        assert!(base.fingerprint() < scaled.fingerprint());

        let hinted = base.clone().hinting(Hinting::Full);
        assert!(base.fingerprint() < hinted.fingerprint());
        assert_eq!(base.fingerprint(), base.clone().fingerprint());
    }

    #[test]
    fn test_flags() {
        let flags = StyleFlags::ANTI_ALIAS.with(StyleFlags::FAKE_BOLD);
        assert!(flags.contains(StyleFlags::FAKE_BOLD));
        assert!(!flags.contains(StyleFlags::LINEAR_TEXT));
    }
}
