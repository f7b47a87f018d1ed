//! Shaped run fragments

/// Shaping output for one directional run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFragment {
    /// One advance per code unit of the run, logical order
    pub advances: Vec<f32>,
    /// Sum of `advances`
    pub total_advance: f32,
    /// Glyph ids in logical order
    pub glyphs: Vec<u16>,
}

impl RunFragment {
    /// Empty fragment for a run of `count` units
    pub fn empty(count: usize) -> Self {
        Self {
            advances: vec![0.0; count],
            total_advance: 0.0,
            glyphs: Vec::new(),
        }
    }

    /// Number of glyphs
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Run length in code units
    pub fn len(&self) -> usize {
        self.advances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advances.is_empty()
    }
}

/// Per-code-unit advances from per-cluster advances.
///
/// `log_clusters[i]` is the cluster that code unit `i` belongs to and
/// `cluster_advance[c]` the full advance of cluster `c`. Only the first unit
/// of a cluster (where the cluster index changes) carries the advance; the
/// rest get 0.
pub fn cluster_advances(log_clusters: &[usize], cluster_advance: &[f32]) -> (Vec<f32>, f32) {
    let mut advances = vec![0.0; log_clusters.len()];
    let mut total = 0.0;
    for i in 0..log_clusters.len() {
        if i == 0 || log_clusters[i] != log_clusters[i - 1] {
            let advance = cluster_advance[log_clusters[i]];
            advances[i] = advance;
            total += advance;
        }
    }
    (advances, total)
}

pub const fn is_high_surrogate(unit: u16) -> bool {
    matches!(unit, 0xD800..=0xDBFF)
}

pub const fn is_low_surrogate(unit: u16) -> bool {
    matches!(unit, 0xDC00..=0xDFFF)
}

/// A decoded code point and where it sits in its UTF-16 buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePoint {
    pub offset: usize,
    pub ch: char,
    /// 2 for a valid surrogate pair, otherwise 1
    pub units: usize,
}

/// Decode code points, checking both halves of every surrogate pair.
///
/// Unpaired surrogates decode to U+FFFD and occupy one unit.
pub fn code_points(units: &[u16]) -> Vec<CodePoint> {
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        let next = units.get(i + 1).copied();
        let point = match next {
            Some(low) if is_high_surrogate(unit) && is_low_surrogate(low) => {
                let value = 0x10000 + (((unit as u32) - 0xD800) << 10) + ((low as u32) - 0xDC00);
                CodePoint {
                    offset: i,
                    ch: char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER),
                    units: 2,
                }
            }
            _ => CodePoint {
                offset: i,
                ch: char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER),
                units: 1,
            },
        };
        i += point.units;
        out.push(point);
    }
    out
}

/// Expand one width per code point into one advance per code unit.
///
/// The high unit of a valid surrogate pair takes the pair's width and the
/// low unit gets 0.
pub fn expand_code_point_widths(units: &[u16], widths: &[f32]) -> Vec<f32> {
    let mut advances = vec![0.0; units.len()];
    let mut i = 0;
    for &width in widths {
        if i >= units.len() {
            break;
        }
        advances[i] = width;
        let paired = is_high_surrogate(units[i]) && units.get(i + 1).is_some_and(|&low| is_low_surrogate(low));
        i += if paired { 2 } else { 1 };
    }
    advances
}
