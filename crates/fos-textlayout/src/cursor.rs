//! Cursor positioning over shaped advances
//!
//! A cursor may sit at the start or end of the context, or before any code
//! unit that carries a non-zero advance. Trailing surrogates, the tail of a
//! ligature and combining marks all have zero advance, so the cursor never
//! lands inside them.

/// How to move from an offset to a valid cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorOpt {
    /// First valid position strictly after the offset, or the context end
    After = 0,
    /// The offset if valid, else the next valid position after it
    AtOrAfter = 1,
    /// Last valid position strictly before the offset, or the context start
    Before = 2,
    /// The offset if valid, else the previous valid position
    AtOrBefore = 3,
    /// The offset if valid, otherwise no position
    At = 4,
}

impl CursorOpt {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => CursorOpt::After,
            1 => CursorOpt::AtOrAfter,
            2 => CursorOpt::Before,
            3 => CursorOpt::AtOrBefore,
            4 => CursorOpt::At,
            _ => return None,
        })
    }

    pub fn raw(self) -> u32 {
        self as u32
    }
}

/// Whether `pos` is a valid cursor position over `advances`
pub fn is_cursor_position(advances: &[f32], pos: usize) -> bool {
    pos == 0 || pos >= advances.len() || advances[pos] != 0.0
}

/// Resolve a cursor position relative to the start of `advances`.
///
/// `offset` is clamped to the context end.
pub fn cursor_position(advances: &[f32], offset: usize, opt: CursorOpt) -> Option<usize> {
    let count = advances.len();
    let mut pos = offset.min(count);

    match opt {
        CursorOpt::After | CursorOpt::AtOrAfter => {
            if opt == CursorOpt::After && pos < count {
                pos += 1;
            }
            while !is_cursor_position(advances, pos) {
                pos += 1;
            }
            Some(pos)
        }
        CursorOpt::Before | CursorOpt::AtOrBefore => {
            if opt == CursorOpt::Before && pos > 0 {
                pos -= 1;
            }
            while !is_cursor_position(advances, pos) {
                pos -= 1;
            }
            Some(pos)
        }
        CursorOpt::At => is_cursor_position(advances, pos).then_some(pos),
    }
}
