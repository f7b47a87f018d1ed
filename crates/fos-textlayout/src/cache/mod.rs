//! Shaping result cache
//!
//! Memoizes complete shaping results per (style, context text, run, direction)
//! under a byte budget shared by all threads.

mod key;
mod store;

pub use key::ShapingCacheKey;
pub use store::{CacheStats, ShapingCache};
