//! File content generation for the write workload
//!
//! This module provides functions for:
//! - Producing pseudorandom printable ASCII blocks
//! - Writing a block as the whole contents of a file

pub mod random;

pub use random::{random_printable, write_random_file, BYTES_PER_KB};
