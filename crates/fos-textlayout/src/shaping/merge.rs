//! Visual-order merge of shaped runs

use super::RunFragment;
use crate::bidi::VisualRun;
use crate::result::ShapingResult;

/// Joins run fragments into one result.
///
/// Glyphs are emitted in drawing order: runs in visual order, each
/// right-to-left run reversed. Advances stay at their logical code-unit
/// slots, so the two arrays deliberately use different index spaces.
#[derive(Debug)]
pub struct RunMerger {
    start: usize,
    advances: Vec<f32>,
    total_advance: f32,
    glyphs: Vec<u16>,
}

impl RunMerger {
    /// Merger for a run of `count` units beginning at context offset `start`
    pub fn new(start: usize, count: usize) -> Self {
        Self {
            start,
            advances: vec![0.0; count],
            total_advance: 0.0,
            glyphs: Vec::new(),
        }
    }

    /// Append the next run in visual order. `run` uses context offsets.
    pub fn push(&mut self, run: &VisualRun, fragment: &RunFragment) {
        debug_assert_eq!(run.len, fragment.len());
        let offset = run.start - self.start;
        self.advances[offset..offset + run.len].copy_from_slice(&fragment.advances);
        self.total_advance += fragment.total_advance;

        if run.rtl {
            self.glyphs.extend(fragment.glyphs.iter().rev());
        } else {
            self.glyphs.extend_from_slice(&fragment.glyphs);
        }
    }

    pub fn finish(self) -> ShapingResult {
        ShapingResult::new(self.advances, self.total_advance, self.glyphs)
    }
}
