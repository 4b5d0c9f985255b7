//! glyphc-util — core utilities and foundation types.
//!
//! Foundation types shared by every phase of the glyphc pipeline: interned
//! identifiers (`Symbol`), source locations (`Span`), and typed indices
//! (`IndexVec`/`Idx`). None of these types know anything about Glyph's
//! grammar or semantics — they are the plumbing every other `glyphc-*`
//! crate is built on top of.

pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;

pub use rustc_hash::{FxHashMap, FxHashSet};
