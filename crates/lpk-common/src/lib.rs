//! Common utilities for lpk.
//!
//! This crate provides small building blocks shared by the lpk crates:
//!
//! - [`hash`] - Mapping of logical entry names to their hashed archive names
//! - [`sanitize`] - Making manifest-provided names safe to use on disk

pub mod hash;
pub mod sanitize;

pub use hash::hashed_name;
pub use sanitize::{sanitize_dir_name, sanitize_file_stem};
