//! Complex-script backend using rustybuzz

use std::str::FromStr;

use rustybuzz::{Direction, Face, GlyphInfo, GlyphPosition, Language, UnicodeBuffer, shape};

use super::{BackendError, GlyphBuffer, ShapeRequest, ShapingBackend};
use crate::font::FontHandle;

/// HarfBuzz-compatible shaping (via rustybuzz)
#[derive(Debug, Default, Clone, Copy)]
pub struct RustybuzzBackend;

impl RustybuzzBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Context as a `String` plus the UTF-16 offset of every byte offset.
///
/// Lone surrogates become U+FFFD and keep their own unit offset.
fn context_string(context: &[u16]) -> (String, Vec<u32>) {
    let mut text = String::with_capacity(context.len());
    let mut unit_of_byte = Vec::with_capacity(context.len() + 1);
    let mut unit = 0u32;
    for decoded in char::decode_utf16(context.iter().copied()) {
        let (ch, units) = match decoded {
            Ok(ch) => (ch, ch.len_utf16() as u32),
            Err(_) => (char::REPLACEMENT_CHARACTER, 1),
        };
        unit_of_byte.extend(std::iter::repeat_n(unit, ch.len_utf8()));
        text.push(ch);
        unit += units;
    }
    unit_of_byte.push(unit);
    (text, unit_of_byte)
}

impl ShapingBackend for RustybuzzBackend {
    fn name(&self) -> &'static str {
        "rustybuzz"
    }

    fn shape(
        &self,
        font: &FontHandle<'_>,
        request: &ShapeRequest<'_>,
        out: &mut GlyphBuffer,
    ) -> Result<(), BackendError> {
        let face_data = font
            .face_data()
            .ok_or_else(|| BackendError::Unavailable("typeface has no face data".into()))?;
        let face = Face::from_slice(face_data.data, face_data.index)
            .ok_or_else(|| BackendError::Unavailable("failed to parse face".into()))?;

        let (text, unit_of_byte) = context_string(request.context);
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(&text);
        buffer.set_direction(if request.rtl {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        });
        if let Some(language) = font.style().language().and_then(|tag| Language::from_str(tag).ok()) {
            buffer.set_language(language);
        }
        buffer.guess_segment_properties();

        let output = shape(&face, &[], buffer);
        let infos = output.glyph_infos();
        let positions = output.glyph_positions();
        out.ensure_fits(infos.len())?;

        let style = font.style();
        let scale = style.size() / face.units_per_em() as f32 * style.scale_x();
        let usable_scale = scale.is_finite() && scale >= 0.0;

        let mut emit = |info: &GlyphInfo, pos: &GlyphPosition| {
            let advance = if usable_scale { pos.x_advance as f32 * scale } else { 0.0 };
            let cluster = unit_of_byte
                .get(info.cluster as usize)
                .copied()
                .unwrap_or(request.context.len() as u32);
            out.push(info.glyph_id as u16, advance, cluster);
        };

        // right-to-left output comes back in visual order
        if request.rtl {
            for (info, pos) in infos.iter().zip(positions).rev() {
                emit(info, pos);
            }
        } else {
            for (info, pos) in infos.iter().zip(positions) {
                emit(info, pos);
            }
        }

        if usable_scale {
            Ok(())
        } else {
            Err(BackendError::InvalidArgument(format!("cannot scale advances for size {}", style.size())))
        }
    }
}
