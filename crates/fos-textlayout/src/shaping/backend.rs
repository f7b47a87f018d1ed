//! Complex-script shaping backend interface

use crate::font::FontHandle;

/// One shaping call: a run inside its context window
#[derive(Debug, Clone, Copy)]
pub struct ShapeRequest<'a> {
    /// Context window, UTF-16 code units
    pub context: &'a [u16],
    /// Run start, relative to the context
    pub start: usize,
    /// Run length in code units
    pub count: usize,
    pub rtl: bool,
}

impl<'a> ShapeRequest<'a> {
    pub fn new(context: &'a [u16], start: usize, count: usize, rtl: bool) -> Self {
        assert!(
            start.checked_add(count).is_some_and(|end| end <= context.len()),
            "run {start}+{count} outside a {}-unit context",
            context.len()
        );
        Self { context, start, count, rtl }
    }

    pub fn end(&self) -> usize {
        self.start + self.count
    }

    /// The run's own code units
    pub fn run(&self) -> &'a [u16] {
        &self.context[self.start..self.end()]
    }
}

/// Backend failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// Output did not fit; retry with a buffer of `required` glyph slots
    #[error("glyph buffer too small, {required} slots required")]
    BufferTooSmall { required: usize },

    /// The request cannot be fully honored; the buffer holds partial output
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend cannot shape this font or text at all
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Glyph output slots owned by one shaping call.
///
/// Storage is released when the buffer drops, whichever path the call takes.
#[derive(Debug, Default)]
pub struct GlyphBuffer {
    glyphs: Vec<u16>,
    advances: Vec<f32>,
    clusters: Vec<u32>,
    capacity: usize,
}

impl GlyphBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            glyphs: Vec::with_capacity(capacity),
            advances: Vec::with_capacity(capacity),
            clusters: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Initial slot guess for a context of `context_len` code units
    pub fn initial_capacity(context_len: usize) -> usize {
        2 * (context_len + 2)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Fail with `BufferTooSmall` unless `required` glyphs fit
    pub fn ensure_fits(&self, required: usize) -> Result<(), BackendError> {
        if required > self.capacity {
            Err(BackendError::BufferTooSmall { required })
        } else {
            Ok(())
        }
    }

    /// Drop current output and resize to exactly `capacity` slots
    pub fn grow_to(&mut self, capacity: usize) {
        self.clear();
        self.glyphs.reserve_exact(capacity);
        self.advances.reserve_exact(capacity);
        self.clusters.reserve_exact(capacity);
        self.capacity = capacity;
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
        self.advances.clear();
        self.clusters.clear();
    }

    /// Append a glyph; `cluster` is the context offset of its first code unit
    pub fn push(&mut self, glyph: u16, advance: f32, cluster: u32) {
        debug_assert!(self.glyphs.len() < self.capacity, "push past checked capacity");
        self.glyphs.push(glyph);
        self.advances.push(advance);
        self.clusters.push(cluster);
    }

    pub fn glyphs(&self) -> &[u16] {
        &self.glyphs
    }

    pub fn advances(&self) -> &[f32] {
        &self.advances
    }

    pub fn clusters(&self) -> &[u32] {
        &self.clusters
    }
}

/// Pluggable complex-script shaper.
///
/// The backend shapes the whole context window so joining and kerning across
/// the run boundary are right. Output glyphs are in logical order, advances
/// are in pixels and clusters are context code-unit offsets. Glyphs outside
/// the requested run are ignored by the caller.
pub trait ShapingBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn shape(
        &self,
        font: &FontHandle<'_>,
        request: &ShapeRequest<'_>,
        out: &mut GlyphBuffer,
    ) -> Result<(), BackendError>;
}
