//! # OxiArc Core
//!
//! Core components shared by the OxiArc codec crates.
//!
//! - [`traits`]: the streaming [`Decompressor`] interface
//! - [`error`]: the workspace-wide [`OxiArcError`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L2: Codec                                               │
//! │     Brotli (context modeling + LZ77 + static dictionary) │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     Decompressor trait, DecompressStatus, OxiArcError   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Codec crates own their bit readers and window buffers, since those are
//! tied to the bit order and framing of each format.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod traits;

// Re-exports for convenience
pub use error::{OxiArcError, Result};
pub use traits::{DecompressStatus, Decompressor};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{OxiArcError, Result};
    pub use crate::traits::{DecompressStatus, Decompressor};
}
