//! Arithmetic transformers for pointer and tablet event streams:
//! quantizers, jump filters, abs-to-relative conversion, and the
//! ignore/substitute stages used to strip tablet-only noise.

pub mod abs2rel;
pub mod ignore;
pub mod jump_filter;
pub mod quantizer;

pub use abs2rel::AbsToRel;
pub use ignore::IgnoreAbs;
pub use jump_filter::{IgnoreBigJumps, IgnoreInitMoves};
pub use quantizer::{MiceQuantizer, MouseMode, Quantizer};
