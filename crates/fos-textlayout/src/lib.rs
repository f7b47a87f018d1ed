//! fOS Text Layout - Shaped Run Engine
//!
//! This crate turns a run of logical-order UTF-16 text plus a style snapshot
//! into visually-ordered glyph ids and per-character advances:
//! - Paragraph bidi analysis and visual run ordering (unicode-bidi)
//! - Complex script shaping (rustybuzz - HarfBuzz port)
//! - Fallback shaping with Arabic contextual forms and per-glyph widths
//! - A byte-budgeted FIFO cache of complete shaping results
//! - Cluster-aware cursor positioning over the cached advances
//!
//! # Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use fos_textlayout::{BidiFlags, FontCollection, LayoutConfig, TextLayoutEngine, TextStyle};
//!
//! let mut fonts = FontCollection::new();
//! let typeface = fonts.add_face(std::fs::read("DejaVuSans.ttf")?, 0)?;
//! let engine = TextLayoutEngine::new(LayoutConfig::default(), Arc::new(fonts));
//!
//! let text: Vec<u16> = "Hello".encode_utf16().collect();
//! let style = TextStyle::new(typeface, 16.0);
//! let run = engine.get_shaped_run(&style, &text, 0, text.len(), 0, text.len(), BidiFlags::DefaultLtr)?;
//! println!("{} glyphs, {}px", run.glyphs().len(), run.total_advance());
//! ```

pub mod bidi;
pub mod cache;
pub mod config;
pub mod cursor;
pub mod font;
pub mod shaping;
pub mod style;

mod engine;
mod result;

pub use bidi::{BidiEngine, BidiFlags, BidiSegmenter, Segmentation, UnicodeBidiEngine, VisualRun, needs_layout};
pub use cache::{CacheStats, ShapingCache, ShapingCacheKey};
pub use config::{BackendKind, LayoutConfig};
pub use cursor::CursorOpt;
pub use engine::{TextLayoutEngine, TextLayoutEngineBuilder};
pub use font::{FaceData, FontCollection, FontHandle, FontMetrics, FontProvider};
pub use result::ShapingResult;
pub use shaping::{BackendError, ComplexShaper, GlyphBuffer, RunFragment, RunMerger, ShapeRequest, ShapingBackend};
pub use style::{Hinting, StyleFingerprint, StyleFlags, TextStyle, TypefaceId};

/// Text layout error types
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(
        "run {start}+{count} outside context {context_start}+{context_count} of a {len}-unit buffer"
    )]
    OutOfBounds {
        start: usize,
        count: usize,
        context_start: usize,
        context_count: usize,
        len: usize,
    },

    #[error("Failed to parse font: {0}")]
    FontParsing(String),

    #[error("Unknown typeface: {0:?}")]
    UnknownTypeface(TypefaceId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
