//! Bidirectional segmentation (UAX #9)
//!
//! Splits a logical-order UTF-16 buffer into directional runs listed in
//! visual order. The paragraph algorithm itself is a pluggable `BidiEngine`;
//! the default engine is backed by `unicode-bidi`.

use std::sync::Arc;

use unicode_bidi::{BidiClass, Level};

/// First code unit that can start right-to-left text (Hebrew block)
pub const FIRST_RTL_CHAR: u16 = 0x0590;

/// Caller's paragraph direction request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BidiFlags {
    /// Left-to-right paragraph, implicit levels resolved
    Ltr = 0,
    /// Right-to-left paragraph, implicit levels resolved
    Rtl = 1,
    /// First strong character decides, left-to-right when there is none
    #[default]
    DefaultLtr = 2,
    /// First strong character decides, right-to-left when there is none
    DefaultRtl = 3,
    /// Whole run is left-to-right, no analysis
    ForceLtr = 4,
    /// Whole run is right-to-left, no analysis
    ForceRtl = 5,
}

impl BidiFlags {
    /// Decode the raw flag value used at API boundaries
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw & 0x7 {
            0 => BidiFlags::Ltr,
            1 => BidiFlags::Rtl,
            2 => BidiFlags::DefaultLtr,
            3 => BidiFlags::DefaultRtl,
            4 => BidiFlags::ForceLtr,
            5 => BidiFlags::ForceRtl,
            _ => return None,
        })
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    pub fn is_forced(self) -> bool {
        matches!(self, BidiFlags::ForceLtr | BidiFlags::ForceRtl)
    }
}

/// Whether text needs the full layout pipeline or can take the LTR fast path
pub fn needs_layout(text: &[u16], flags: BidiFlags) -> bool {
    match flags {
        BidiFlags::ForceLtr => false,
        BidiFlags::Rtl | BidiFlags::DefaultRtl | BidiFlags::ForceRtl => true,
        BidiFlags::Ltr | BidiFlags::DefaultLtr => text.iter().any(|&unit| unit >= FIRST_RTL_CHAR),
    }
}

/// A directional run, offsets in code units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualRun {
    pub start: usize,
    pub len: usize,
    pub rtl: bool,
}

impl VisualRun {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Intersect with `[start, end)`, `None` when nothing remains
    pub fn clip(&self, start: usize, end: usize) -> Option<VisualRun> {
        let clipped_start = self.start.max(start);
        let clipped_end = self.end().min(end);
        (clipped_start < clipped_end).then(|| VisualRun {
            start: clipped_start,
            len: clipped_end - clipped_start,
            rtl: self.rtl,
        })
    }
}

/// Paragraph direction plus runs in visual order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub paragraph_rtl: bool,
    pub runs: Vec<VisualRun>,
}

impl Segmentation {
    /// One run covering `len` units
    pub fn single(len: usize, rtl: bool) -> Self {
        let runs = if len == 0 {
            Vec::new()
        } else {
            vec![VisualRun { start: 0, len, rtl }]
        };
        Self { paragraph_rtl: rtl, runs }
    }
}

/// Bidi engine failure
#[derive(Debug, thiserror::Error)]
pub enum BidiError {
    #[error("bidi engine exhausted: {0}")]
    Exhausted(String),
}

/// Paragraph-level bidi algorithm
pub trait BidiEngine: Send + Sync {
    /// Resolve levels for `text` and list its runs in visual order.
    ///
    /// Forced flags are never passed; the segmenter short-circuits them.
    fn analyze(&self, text: &[u16], flags: BidiFlags) -> Result<Segmentation, BidiError>;
}

/// `unicode-bidi` backed engine
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeBidiEngine;

impl UnicodeBidiEngine {
    fn paragraph_level(text: &[u16], flags: BidiFlags) -> Option<Level> {
        match flags {
            BidiFlags::Ltr | BidiFlags::ForceLtr => Some(Level::ltr()),
            BidiFlags::Rtl | BidiFlags::ForceRtl => Some(Level::rtl()),
            BidiFlags::DefaultLtr => None,
            BidiFlags::DefaultRtl => {
                if first_strong_is_rtl(text).is_some() {
                    None
                } else {
                    Some(Level::rtl())
                }
            }
        }
    }
}

impl BidiEngine for UnicodeBidiEngine {
    fn analyze(&self, text: &[u16], flags: BidiFlags) -> Result<Segmentation, BidiError> {
        let default_level = Self::paragraph_level(text, flags);
        let info = unicode_bidi::utf16::BidiInfo::new(text, default_level);

        let paragraph_rtl = info
            .paragraphs
            .first()
            .map(|para| para.level.is_rtl())
            .or(default_level.map(|level| level.is_rtl()))
            .unwrap_or(false);

        let mut runs = Vec::new();
        for para in &info.paragraphs {
            let (levels, level_runs) = info.visual_runs(para, para.range.clone());
            for range in level_runs {
                if range.is_empty() {
                    continue;
                }
                runs.push(VisualRun {
                    start: range.start,
                    len: range.end - range.start,
                    rtl: levels[range.start].is_rtl(),
                });
            }
        }

        Ok(Segmentation { paragraph_rtl, runs })
    }
}

/// Direction of the first strong character, `None` when there is none
fn first_strong_is_rtl(text: &[u16]) -> Option<bool> {
    char::decode_utf16(text.iter().copied())
        .filter_map(|c| c.ok())
        .find_map(|c| match unicode_bidi::bidi_class(c) {
            BidiClass::L => Some(false),
            BidiClass::R | BidiClass::AL => Some(true),
            _ => None,
        })
}

/// Produces visual runs for a context window
#[derive(Clone)]
pub struct BidiSegmenter {
    engine: Arc<dyn BidiEngine>,
}

impl BidiSegmenter {
    pub fn new(engine: Arc<dyn BidiEngine>) -> Self {
        Self { engine }
    }

    /// Segment `text` into visual runs.
    ///
    /// Forced flags skip analysis. When the engine fails the whole text
    /// becomes one run whose direction is guessed from the presence of any
    /// unit at or above `FIRST_RTL_CHAR`.
    pub fn segment(&self, text: &[u16], flags: BidiFlags) -> Segmentation {
        if flags.is_forced() {
            return Segmentation::single(text.len(), flags == BidiFlags::ForceRtl);
        }

        match self.engine.analyze(text, flags) {
            Ok(segmentation) => segmentation,
            Err(err) => {
                let rtl = text.iter().any(|&unit| unit >= FIRST_RTL_CHAR);
                tracing::warn!(%err, rtl, len = text.len(), "bidi analysis failed, using single run");
                Segmentation::single(text.len(), rtl)
            }
        }
    }
}

impl Default for BidiSegmenter {
    fn default() -> Self {
        Self::new(Arc::new(UnicodeBidiEngine))
    }
}

impl std::fmt::Debug for BidiSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BidiSegmenter").finish_non_exhaustive()
    }
}

/// Mirror a character for RTL display
pub fn mirror_char(c: char) -> char {
    match c {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '«' => '»',
        '»' => '«',
        '‹' => '›',
        '›' => '‹',
        '⁅' => '⁆',
        '⁆' => '⁅',
        '⟨' => '⟩',
        '⟩' => '⟨',
        '⟪' => '⟫',
        '⟫' => '⟪',
        '⟬' => '⟭',
        '⟭' => '⟬',
        '⟮' => '⟯',
        '⟯' => '⟮',
        _ => c,
    }
}
