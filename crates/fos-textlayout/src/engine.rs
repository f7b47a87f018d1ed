//! Text layout engine
//!
//! Owns one cache and one shaper for its whole lifetime and exposes the
//! shaped-run entry point to callers.

use std::sync::Arc;

use crate::bidi::{self, BidiEngine, BidiFlags, BidiSegmenter};
use crate::cache::{CacheStats, ShapingCache, ShapingCacheKey};
use crate::config::{BackendKind, LayoutConfig};
use crate::cursor::{self, CursorOpt};
use crate::font::{FontMetrics, FontProvider};
use crate::result::ShapingResult;
use crate::shaping::{ComplexShaper, RunMerger, ShapeRequest, ShapingBackend};
use crate::style::{StyleFingerprint, TextStyle};
use crate::{LayoutError, Result};

/// Shaped-run engine shared by all layout threads
#[derive(Debug)]
pub struct TextLayoutEngine {
    config: LayoutConfig,
    cache: Option<ShapingCache>,
    segmenter: BidiSegmenter,
    shaper: ComplexShaper,
}

impl TextLayoutEngine {
    /// Engine with the default bidi engine and the backend selected by `config`
    pub fn new(config: LayoutConfig, fonts: Arc<dyn FontProvider>) -> Self {
        Self::builder(fonts).config(config).build()
    }

    pub fn builder(fonts: Arc<dyn FontProvider>) -> TextLayoutEngineBuilder {
        TextLayoutEngineBuilder::new(fonts)
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Name of the complex backend, or "fallback"
    pub fn backend_name(&self) -> &'static str {
        self.shaper.backend_name()
    }

    /// Shape `text[start..start + count]` within the context window
    /// `text[context_start..context_start + context_count]`.
    ///
    /// `advances` of the result are indexed by logical position inside the
    /// run; `glyphs` are in drawing order.
    pub fn get_shaped_run(
        &self,
        style: &TextStyle,
        text: &[u16],
        start: usize,
        count: usize,
        context_start: usize,
        context_count: usize,
        flags: BidiFlags,
    ) -> Result<Arc<ShapingResult>> {
        let context = context_window(text, start, count, context_start, context_count)?;
        let run_start = start - context_start;
        let style = style.fingerprint();

        let result = match &self.cache {
            Some(cache) => {
                let key = ShapingCacheKey::new(style.clone(), context, run_start, count, flags);
                cache.get(key, || self.layout(&style, context, run_start, count, flags))
            }
            None => Arc::new(self.layout(&style, context, run_start, count, flags)),
        };
        Ok(result)
    }

    /// Segment, shape each visual run and merge
    fn layout(
        &self,
        style: &StyleFingerprint,
        context: &[u16],
        start: usize,
        count: usize,
        flags: BidiFlags,
    ) -> ShapingResult {
        let end = start + count;
        let segmentation = self.segmenter.segment(context, flags);
        tracing::debug!(
            start,
            count,
            context = context.len(),
            paragraph_rtl = segmentation.paragraph_rtl,
            runs = segmentation.runs.len(),
            "shaping run"
        );

        let mut merger = RunMerger::new(start, count);
        for run in segmentation.runs.iter().filter_map(|run| run.clip(start, end)) {
            let request = ShapeRequest::new(context, run.start, run.len, run.rtl);
            let fragment = self.shaper.shape(style, &request);
            merger.push(&run, &fragment);
        }
        merger.finish()
    }

    /// Change the cache budget, evicting as needed
    pub fn set_cache_budget(&self, bytes: usize) {
        match &self.cache {
            Some(cache) => cache.set_max_size(bytes),
            None => tracing::debug!(bytes, "shaping cache disabled, budget ignored"),
        }
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// `None` when the cache is disabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ShapingCache::stats)
    }

    pub fn reset_cache_stats(&self) {
        if let Some(cache) = &self.cache {
            cache.reset_stats();
        }
    }

    pub fn log_cache_stats(&self) {
        if let Some(cache) = &self.cache {
            cache.log_stats();
        }
    }

    /// Whether `text` may need bidi analysis under `flags`
    pub fn needs_layout(&self, text: &[u16], flags: BidiFlags) -> bool {
        bidi::needs_layout(text, flags)
    }

    /// Next cursor position from `offset` inside the context window.
    ///
    /// Positions inside a cluster (trailing surrogate, ligature tail,
    /// combining mark) are skipped. `offset` and the result are absolute
    /// indices into `text`; `None` only for `CursorOpt::At` on an invalid
    /// position.
    pub fn get_text_run_cursor(
        &self,
        style: &TextStyle,
        text: &[u16],
        context_start: usize,
        context_count: usize,
        flags: BidiFlags,
        offset: usize,
        opt: CursorOpt,
    ) -> Result<Option<usize>> {
        context_window(text, offset, 0, context_start, context_count)?;
        let run = self.get_shaped_run(style, text, context_start, context_count, context_start, context_count, flags)?;
        let position = cursor::cursor_position(run.advances(), offset - context_start, opt);
        Ok(position.map(|pos| pos + context_start))
    }

    /// Vertical metrics for the style's typeface at its size
    pub fn font_metrics(&self, style: &TextStyle) -> Result<FontMetrics> {
        let style = style.fingerprint();
        self.shaper
            .fonts()
            .metrics(&style)
            .ok_or(LayoutError::UnknownTypeface(style.typeface()))
    }
}

/// Validate bounds and slice out the context window
fn context_window(
    text: &[u16],
    start: usize,
    count: usize,
    context_start: usize,
    context_count: usize,
) -> Result<&[u16]> {
    let out_of_bounds = || LayoutError::OutOfBounds {
        start,
        count,
        context_start,
        context_count,
        len: text.len(),
    };

    let context_end = context_start.checked_add(context_count).ok_or_else(out_of_bounds)?;
    let end = start.checked_add(count).ok_or_else(out_of_bounds)?;
    if context_end > text.len() || start < context_start || end > context_end {
        return Err(out_of_bounds());
    }
    Ok(&text[context_start..context_end])
}

/// Builder for [`TextLayoutEngine`] with injectable backends
pub struct TextLayoutEngineBuilder {
    fonts: Arc<dyn FontProvider>,
    config: LayoutConfig,
    backend: Option<Arc<dyn ShapingBackend>>,
    bidi: Option<Arc<dyn BidiEngine>>,
}

impl TextLayoutEngineBuilder {
    pub fn new(fonts: Arc<dyn FontProvider>) -> Self {
        Self {
            fonts,
            config: LayoutConfig::default(),
            backend: None,
            bidi: None,
        }
    }

    pub fn config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default complex backend. Ignored with `BackendKind::Fallback`.
    pub fn shaping_backend(mut self, backend: Arc<dyn ShapingBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn bidi_engine(mut self, engine: Arc<dyn BidiEngine>) -> Self {
        self.bidi = Some(engine);
        self
    }

    pub fn build(self) -> TextLayoutEngine {
        let shaper = match (self.config.backend, self.backend) {
            (BackendKind::Fallback, _) => ComplexShaper::fallback_only(self.fonts),
            (BackendKind::Complex, Some(backend)) => ComplexShaper::new(self.fonts, backend),
            (BackendKind::Complex, None) => default_shaper(self.fonts),
        };

        let segmenter = match self.bidi {
            Some(engine) => BidiSegmenter::new(engine),
            None => BidiSegmenter::default(),
        };

        let cache = self.config.cache_enabled.then(|| {
            ShapingCache::new(self.config.cache_budget_bytes).with_stats_logging(self.config.log_stats_every)
        });

        tracing::info!(
            backend = shaper.backend_name(),
            cache_enabled = cache.is_some(),
            cache_budget = self.config.cache_budget_bytes,
            "text layout engine ready"
        );

        TextLayoutEngine {
            config: self.config,
            cache,
            segmenter,
            shaper,
        }
    }
}

impl std::fmt::Debug for TextLayoutEngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngineBuilder")
            .field("config", &self.config)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "complex-shaping")]
fn default_shaper(fonts: Arc<dyn FontProvider>) -> ComplexShaper {
    ComplexShaper::new(fonts, Arc::new(crate::shaping::RustybuzzBackend::new()))
}

#[cfg(not(feature = "complex-shaping"))]
fn default_shaper(fonts: Arc<dyn FontProvider>) -> ComplexShaper {
    tracing::warn!("built without complex-shaping, using fallback shaping");
    ComplexShaper::fallback_only(fonts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TypefaceId;

    struct MonoFonts;

    impl FontProvider for MonoFonts {
        fn glyph_index(&self, _typeface: TypefaceId, ch: char) -> Option<u16> {
            u16::try_from(ch as u32).ok()
        }

        fn glyph_advance(&self, style: &StyleFingerprint, _glyph: u16) -> f32 {
            style.size() / 2.0
        }

        fn metrics(&self, style: &StyleFingerprint) -> Option<FontMetrics> {
            Some(FontMetrics {
                ascent: style.size() * 0.75,
                descent: -style.size() * 0.25,
                line_gap: 0.0,
                units_per_em: 1000,
            })
        }
    }

    fn engine() -> TextLayoutEngine {
        TextLayoutEngine::new(LayoutConfig::default().backend(BackendKind::Fallback), Arc::new(MonoFonts))
    }

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TextLayoutEngine>();
    }

    #[test]
    fn test_context_window_bounds() {
        let text = utf16("hello world");
        assert_eq!(context_window(&text, 6, 5, 6, 5).map(|c| c.len()).ok(), Some(5));
        assert!(context_window(&text, 0, 12, 0, 11).is_err());
        assert!(context_window(&text, 2, 2, 3, 5).is_err());
        assert!(context_window(&text, 0, 1, 5, 7).is_err());
        assert!(context_window(&text, usize::MAX, 2, 0, 11).is_err());
    }

    #[test]
    fn test_run_inside_context() {
        let engine = engine();
        let text = utf16("abcdef");
        let style = TextStyle::new(TypefaceId(0), 10.0);
        let run = engine
            .get_shaped_run(&style, &text, 2, 2, 0, 6, BidiFlags::ForceLtr)
            .unwrap();
        assert_eq!(run.glyphs(), &[b'c' as u16, b'd' as u16]);
        assert_eq!(run.advances(), &[5.0, 5.0]);
        assert_eq!(run.total_advance(), 10.0);
    }

    #[test]
    fn test_empty_run() {
        let engine = engine();
        let text = utf16("abc");
        let style = TextStyle::new(TypefaceId(0), 10.0);
        let run = engine
            .get_shaped_run(&style, &text, 1, 0, 0, 3, BidiFlags::DefaultLtr)
            .unwrap();
        assert!(run.glyphs().is_empty());
        assert!(run.advances().is_empty());
        assert_eq!(run.total_advance(), 0.0);
    }

    #[test]
    fn test_font_metrics_follow_size() {
        let engine = engine();
        let metrics = engine.font_metrics(&TextStyle::new(TypefaceId(0), 20.0)).unwrap();
        assert_eq!(metrics.ascent, 15.0);
    }

    #[test]
    fn test_font_metrics_unknown_typeface() {
        let engine = TextLayoutEngine::new(LayoutConfig::default(), Arc::new(crate::font::FontCollection::new()));
        let err = engine.font_metrics(&TextStyle::new(TypefaceId(7), 12.0)).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownTypeface(TypefaceId(7))));
    }

    #[test]
    fn test_cursor_offset_outside_context() {
        let engine = engine();
        let text = utf16("abcdef");
        let style = TextStyle::new(TypefaceId(0), 10.0);
        assert!(engine.get_text_run_cursor(&style, &text, 2, 2, BidiFlags::Ltr, 1, CursorOpt::After).is_err());
        assert!(engine.get_text_run_cursor(&style, &text, 2, 2, BidiFlags::Ltr, 5, CursorOpt::After).is_err());
        assert_eq!(
            engine.get_text_run_cursor(&style, &text, 2, 2, BidiFlags::Ltr, 3, CursorOpt::After).unwrap(),
            Some(4)
        );
    }

    #[test]
    fn test_disabled_cache_has_no_stats() {
        let engine = TextLayoutEngine::new(LayoutConfig::default().without_cache(), Arc::new(MonoFonts));
        assert!(engine.cache_stats().is_none());
        engine.set_cache_budget(10);
        engine.clear_cache();
    }
}
