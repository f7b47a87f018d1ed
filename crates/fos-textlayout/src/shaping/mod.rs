//! Text shaping module

mod arabic;
mod backend;
#[cfg(feature = "complex-shaping")]
mod complex;
mod merge;
mod run;
mod shaper;

pub use arabic::{ArabicShaper, JoiningType, NO_CHAR, PositionalForm, joining_type, shape_fixed_length};
pub use backend::{BackendError, GlyphBuffer, ShapeRequest, ShapingBackend};
#[cfg(feature = "complex-shaping")]
pub use complex::RustybuzzBackend;
pub use merge::RunMerger;
pub use run::{CodePoint, RunFragment, cluster_advances, code_points, expand_code_point_widths};
pub use shaper::ComplexShaper;
