//! Run shaper
//!
//! Shapes one directional run. The complex backend is tried first over the
//! whole context window; when it is missing or unavailable the run is shaped
//! with Arabic contextual forms and per-glyph widths from the font provider.

use std::sync::Arc;

use super::arabic::{self, NO_CHAR};
use super::run::{self, RunFragment};
use super::{BackendError, GlyphBuffer, ShapeRequest, ShapingBackend};
use crate::bidi::mirror_char;
use crate::font::{FontHandle, FontProvider};
use crate::style::StyleFingerprint;

/// Shapes runs against one font provider and an optional complex backend
#[derive(Clone)]
pub struct ComplexShaper {
    fonts: Arc<dyn FontProvider>,
    backend: Option<Arc<dyn ShapingBackend>>,
}

impl ComplexShaper {
    /// Shaper that tries `backend` before the fallback path
    pub fn new(fonts: Arc<dyn FontProvider>, backend: Arc<dyn ShapingBackend>) -> Self {
        Self { fonts, backend: Some(backend) }
    }

    /// Shaper that only uses the fallback path
    pub fn fallback_only(fonts: Arc<dyn FontProvider>) -> Self {
        Self { fonts, backend: None }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map_or("fallback", |b| b.name())
    }

    pub fn fonts(&self) -> &Arc<dyn FontProvider> {
        &self.fonts
    }

    /// Shape one run of `request.context`
    pub fn shape(&self, style: &StyleFingerprint, request: &ShapeRequest<'_>) -> RunFragment {
        if request.count == 0 {
            return RunFragment::empty(0);
        }

        let font = FontHandle::new(self.fonts.as_ref(), style);

        if let Some(backend) = &self.backend {
            match shape_with_backend(backend.as_ref(), &font, request) {
                Ok(fragment) => return fragment,
                Err(err) => {
                    tracing::warn!(backend = backend.name(), %err, "complex shaping failed, using fallback");
                }
            }
        }

        shape_fallback(&font, request)
    }
}

impl std::fmt::Debug for ComplexShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplexShaper")
            .field("backend", &self.backend_name())
            .finish_non_exhaustive()
    }
}

/// Backend path with one resize on overflow
fn shape_with_backend(
    backend: &dyn ShapingBackend,
    font: &FontHandle<'_>,
    request: &ShapeRequest<'_>,
) -> Result<RunFragment, BackendError> {
    let mut buffer = GlyphBuffer::with_capacity(GlyphBuffer::initial_capacity(request.context.len()));

    let outcome = match backend.shape(font, request, &mut buffer) {
        Err(BackendError::BufferTooSmall { required }) => {
            tracing::debug!(backend = backend.name(), required, "glyph buffer too small, retrying");
            buffer.grow_to(required);
            backend.shape(font, request, &mut buffer)
        }
        other => other,
    };

    match outcome {
        Ok(()) => {}
        Err(BackendError::InvalidArgument(reason)) => {
            tracing::warn!(backend = backend.name(), %reason, glyphs = buffer.len(), "keeping partial shaping output");
        }
        Err(err) => return Err(err),
    }

    Ok(fragment_from_clusters(request, &buffer))
}

/// Keep glyphs whose cluster lies in the run and apply the cluster rule
fn fragment_from_clusters(request: &ShapeRequest<'_>, buffer: &GlyphBuffer) -> RunFragment {
    let (start, end, count) = (request.start, request.end(), request.count);

    let mut cluster_advance = vec![0.0f32; count];
    let mut cluster_start = vec![false; count];
    let mut glyphs = Vec::with_capacity(buffer.len());

    let shaped = buffer.glyphs().iter().zip(buffer.advances()).zip(buffer.clusters());
    for ((&glyph, &advance), &cluster) in shaped {
        let cluster = cluster as usize;
        if cluster < start || cluster >= end {
            continue;
        }
        let index = cluster - start;
        cluster_start[index] = true;
        cluster_advance[index] += advance;
        glyphs.push(glyph);
    }

    let mut log_clusters = Vec::with_capacity(count);
    let mut current = 0;
    for (i, &starts) in cluster_start.iter().enumerate() {
        if starts {
            current = i;
        }
        log_clusters.push(current);
    }

    let (advances, total_advance) = run::cluster_advances(&log_clusters, &cluster_advance);
    RunFragment { advances, total_advance, glyphs }
}

/// Per-character path: contextual forms, mirroring and provider widths
fn shape_fallback(font: &FontHandle<'_>, request: &ShapeRequest<'_>) -> RunFragment {
    // fixed length so run offsets into the context stay valid
    let mut scratch = request.context.to_vec();
    if request.rtl {
        arabic::shape_fixed_length(&mut scratch);
    }
    let units = &scratch[request.start..request.end()];

    let points = run::code_points(units);
    let mut widths = Vec::with_capacity(points.len());
    let mut glyphs = Vec::with_capacity(points.len());

    for point in &points {
        if point.units == 1 && units[point.offset] == NO_CHAR {
            widths.push(0.0);
            continue;
        }
        let ch = if request.rtl { mirror_char(point.ch) } else { point.ch };
        let glyph = font.glyph_index(ch).unwrap_or(0);
        widths.push(font.glyph_advance(glyph));
        glyphs.push(glyph);
    }

    let advances = run::expand_code_point_widths(units, &widths);
    let total_advance = advances.iter().sum();
    RunFragment { advances, total_advance, glyphs }
}
