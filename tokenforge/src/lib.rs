//! TokenForge, an upgradeable token factory runtime
//!
//! This crate re-exports all the components of the TokenForge system.

pub use tokenforge_core::*;
pub use tokenforge_runtime::*;
