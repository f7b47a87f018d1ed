//! In-memory font collection backed by ttf-parser

use std::ops::Range;

use ttf_parser::{Face, GlyphId, Tag, cmap};

use super::{FaceData, FontMetrics, FontProvider};
use crate::style::{StyleFingerprint, TypefaceId};
use crate::{LayoutError, Result};

/// A loaded face with everything the shaping path reads per character.
///
/// The face is parsed once when it is added. Advances are copied out of
/// `hmtx` and the `cmap` table is kept as a byte range into `data`.
#[derive(Debug)]
struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
    /// Font-unit advance per glyph id
    advances: Vec<u16>,
    cmap: Option<Range<usize>>,
}

impl LoadedFace {
    fn parse(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = Face::parse(&data, index).map_err(|e| LayoutError::FontParsing(e.to_string()))?;
        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err(LayoutError::FontParsing("units per em is zero".into()));
        }

        let advances = (0..face.number_of_glyphs())
            .map(|glyph| face.glyph_hor_advance(GlyphId(glyph)).unwrap_or(0))
            .collect();
        let cmap = face
            .raw_face()
            .table(Tag::from_bytes(b"cmap"))
            .and_then(|table| table_range(&data, table));
        let (ascender, descender, line_gap) = (face.ascender(), face.descender(), face.line_gap());

        Ok(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            line_gap,
            advances,
            cmap,
        })
    }

    fn glyph_index(&self, ch: char) -> Option<u16> {
        let table = cmap::Table::parse(self.data.get(self.cmap.clone()?)?)?;
        table
            .subtables
            .into_iter()
            .filter(|subtable| subtable.is_unicode())
            .find_map(|subtable| subtable.glyph_index(ch as u32))
            .map(|glyph| glyph.0)
    }

    fn scale(&self, style: &StyleFingerprint) -> f32 {
        style.size() / self.units_per_em as f32
    }
}

/// Byte range of `table` inside `data`; tables are always subslices of the font
fn table_range(data: &[u8], table: &[u8]) -> Option<Range<usize>> {
    let start = table.as_ptr().addr().checked_sub(data.as_ptr().addr())?;
    let range = start..start + table.len();
    (range.end <= data.len()).then_some(range)
}

/// Font provider over font files loaded into memory.
///
/// Typeface ids are assigned in load order.
#[derive(Debug, Default)]
pub struct FontCollection {
    faces: Vec<LoadedFace>,
}

impl FontCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a face from TrueType/OpenType data
    pub fn add_face(&mut self, data: Vec<u8>, index: u32) -> Result<TypefaceId> {
        let bytes = data.len();
        let loaded = LoadedFace::parse(data, index)?;

        let id = TypefaceId(self.faces.len() as u32);
        tracing::debug!(?id, units_per_em = loaded.units_per_em, glyphs = loaded.advances.len(), bytes, "loaded face");
        self.faces.push(loaded);
        Ok(id)
    }

    /// Number of loaded faces
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn loaded(&self, typeface: TypefaceId) -> Option<&LoadedFace> {
        self.faces.get(typeface.0 as usize)
    }
}

impl FontProvider for FontCollection {
    fn glyph_index(&self, typeface: TypefaceId, ch: char) -> Option<u16> {
        self.loaded(typeface)?.glyph_index(ch)
    }

    fn glyph_advance(&self, style: &StyleFingerprint, glyph: u16) -> f32 {
        let Some(loaded) = self.loaded(style.typeface()) else {
            return 0.0;
        };
        let advance = loaded.advances.get(glyph as usize).copied().unwrap_or(0);
        advance as f32 * loaded.scale(style) * style.scale_x()
    }

    fn metrics(&self, style: &StyleFingerprint) -> Option<FontMetrics> {
        let loaded = self.loaded(style.typeface())?;
        let scale = loaded.scale(style);
        Some(FontMetrics {
            ascent: loaded.ascender as f32 * scale,
            descent: loaded.descender as f32 * scale,
            line_gap: loaded.line_gap as f32 * scale,
            units_per_em: loaded.units_per_em,
        })
    }

    fn face_data(&self, typeface: TypefaceId) -> Option<FaceData<'_>> {
        self.loaded(typeface).map(|loaded| FaceData {
            data: &loaded.data,
            index: loaded.index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;

    #[test]
    fn test_rejects_garbage() {
        let mut fonts = FontCollection::new();
        let err = fonts.add_face(b"not a font".to_vec(), 0).unwrap_err();
        assert!(matches!(err, LayoutError::FontParsing(_)));
        assert!(fonts.is_empty());
    }

    #[test]
    fn test_unknown_typeface_is_empty() {
        let fonts = FontCollection::new();
        let style = TextStyle::new(TypefaceId(3), 12.0).fingerprint();
        assert_eq!(fonts.glyph_index(TypefaceId(3), 'a'), None);
        assert_eq!(fonts.glyph_advance(&style, 1), 0.0);
        assert!(fonts.metrics(&style).is_none());
        assert!(fonts.face_data(TypefaceId(3)).is_none());
    }

    #[test]
    fn test_table_range_inside_data() {
        let data = [0u8; 16];
        assert_eq!(table_range(&data, &data[4..10]), Some(4..10));
        assert_eq!(table_range(&data[8..], &data[..4]), None);
    }
}
