//! Shaping result

/// Complete, immutable shaping output for one requested run
#[derive(Debug, Clone, PartialEq)]
pub struct ShapingResult {
    advances: Vec<f32>,
    total_advance: f32,
    glyphs: Vec<u16>,
}

impl ShapingResult {
    pub fn new(advances: Vec<f32>, total_advance: f32, glyphs: Vec<u16>) -> Self {
        Self { advances, total_advance, glyphs }
    }

    /// One advance per input code unit, logical order
    pub fn advances(&self) -> &[f32] {
        &self.advances
    }

    pub fn total_advance(&self) -> f32 {
        self.total_advance
    }

    /// Glyph ids in drawing (visual) order
    pub fn glyphs(&self) -> &[u16] {
        &self.glyphs
    }

    /// Bytes charged against the cache budget
    pub fn size(&self) -> usize {
        std::mem::size_of::<Self>()
            + std::mem::size_of::<f32>() * self.advances.len()
            + std::mem::size_of::<u16>() * self.glyphs.len()
    }
}
