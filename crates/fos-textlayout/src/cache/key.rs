//! Shaping cache key

use std::cmp::Ordering;
use std::sync::Arc;

use crate::bidi::BidiFlags;
use crate::style::StyleFingerprint;

/// Context text: borrowed for lookups, owned once inserted
#[derive(Debug, Clone)]
enum KeyText<'a> {
    Borrowed(&'a [u16]),
    Owned(Arc<[u16]>),
}

impl KeyText<'_> {
    fn as_slice(&self) -> &[u16] {
        match self {
            KeyText::Borrowed(text) => text,
            KeyText::Owned(text) => text,
        }
    }
}

/// Identity of one shaping request.
///
/// A key built for lookup only borrows the caller's context window. The
/// cache calls `into_owned` exactly once, right before inserting, because the
/// caller's buffer may not outlive the entry. Clones of an owned key share
/// the same text.
#[derive(Debug, Clone)]
pub struct ShapingCacheKey<'a> {
    text: KeyText<'a>,
    start: usize,
    count: usize,
    context_count: usize,
    flags: BidiFlags,
    style: StyleFingerprint,
}

impl<'a> ShapingCacheKey<'a> {
    /// Lookup key over `context`; `start`/`count` are relative to it
    pub fn new(
        style: StyleFingerprint,
        context: &'a [u16],
        start: usize,
        count: usize,
        flags: BidiFlags,
    ) -> Self {
        assert!(
            start.checked_add(count).is_some_and(|end| end <= context.len()),
            "run {start}+{count} outside a {}-unit context",
            context.len()
        );
        Self {
            text: KeyText::Borrowed(context),
            start,
            count,
            context_count: context.len(),
            flags,
            style,
        }
    }

    /// Take an owned copy of the context text
    pub fn into_owned(self) -> ShapingCacheKey<'static> {
        let text = match self.text {
            KeyText::Borrowed(text) => KeyText::Owned(Arc::from(text)),
            KeyText::Owned(text) => KeyText::Owned(text),
        };
        ShapingCacheKey {
            text,
            start: self.start,
            count: self.count,
            context_count: self.context_count,
            flags: self.flags,
            style: self.style,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.text, KeyText::Owned(_))
    }

    /// Context window text
    pub fn text(&self) -> &[u16] {
        self.text.as_slice()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn context_count(&self) -> usize {
        self.context_count
    }

    pub fn flags(&self) -> BidiFlags {
        self.flags
    }

    pub fn style(&self) -> &StyleFingerprint {
        &self.style
    }

    /// Bytes charged against the cache budget once the text is owned
    pub fn size(&self) -> usize {
        std::mem::size_of::<ShapingCacheKey<'static>>() + std::mem::size_of::<u16>() * self.context_count
    }
}

impl Ord for ShapingCacheKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| self.context_count.cmp(&other.context_count))
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| self.style.cmp(&other.style))
            .then_with(|| self.flags.cmp(&other.flags))
            .then_with(|| self.text().cmp(other.text()))
    }
}

impl PartialOrd for ShapingCacheKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ShapingCacheKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ShapingCacheKey<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{TextStyle, TypefaceId};

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn style(size: f32) -> StyleFingerprint {
        TextStyle::new(TypefaceId(1), size).fingerprint()
    }

    #[test]
    fn test_lookup_key_borrows() {
        let text = utf16("hello");
        let key = ShapingCacheKey::new(style(12.0), &text, 0, 5, BidiFlags::ForceLtr);
        assert!(!key.is_owned());
        assert_eq!(key.text().as_ptr(), text.as_ptr());

        let owned = key.into_owned();
        assert!(owned.is_owned());
        assert_ne!(owned.text().as_ptr(), text.as_ptr());
        assert_eq!(owned.text(), &text[..]);
    }

    #[test]
    fn test_owned_clone_shares_text() {
        let text = utf16("hello");
        let owned = ShapingCacheKey::new(style(12.0), &text, 0, 5, BidiFlags::Ltr).into_owned();
        let copy = owned.clone();
        assert_eq!(copy.text().as_ptr(), owned.text().as_ptr());
    }

    #[test]
    fn test_borrowed_equals_owned() {
        let text = utf16("abc");
        let lookup = ShapingCacheKey::new(style(12.0), &text, 0, 3, BidiFlags::Ltr);
        let stored = lookup.clone().into_owned();
        assert_eq!(lookup, stored);
    }

    #[test]
    fn test_ordering_count_first() {
        let text = utf16("abcd");
        let short = ShapingCacheKey::new(style(99.0), &text, 3, 1, BidiFlags::Ltr);
        let long = ShapingCacheKey::new(style(1.0), &text, 0, 2, BidiFlags::Ltr);
        assert!(short < long);
    }

    #[test]
    fn test_ordering_text_is_last_tie_break() {
        let a = utf16("abc");
        let b = utf16("abd");
        let ka = ShapingCacheKey::new(style(12.0), &a, 0, 3, BidiFlags::Ltr);
        let kb = ShapingCacheKey::new(style(12.0), &b, 0, 3, BidiFlags::Ltr);
        assert!(ka < kb);

        let rtl = ShapingCacheKey::new(style(12.0), &a, 0, 3, BidiFlags::Rtl);
        assert!(kb < rtl);
    }

    #[test]
    fn test_size_counts_context() {
        let text = utf16("hello world");
        let key = ShapingCacheKey::new(style(12.0), &text, 6, 5, BidiFlags::Ltr);
        assert_eq!(key.size(), std::mem::size_of::<ShapingCacheKey<'static>>() + 22);
    }
}
