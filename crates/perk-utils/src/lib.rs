//! Shared utilities for the perk runtime manager.

pub mod bytes;
pub mod error;
pub mod fs;
pub mod hash;
