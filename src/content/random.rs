//! Pseudorandom printable content
//!
//! Files are filled with characters drawn uniformly from the visible ASCII
//! range (`' '..='~'`). The source is rand's thread-local generator; the
//! content is not meant to be reproducible or secure, only incompressible
//! enough to exercise the filesystem.

use rand::{rng, Rng};
use std::fs;
use std::io;
use std::path::Path;

/// Bytes written per kilobyte of requested file size
pub const BYTES_PER_KB: usize = 1024;

const PRINTABLE_FIRST: u8 = b' ';
const PRINTABLE_LAST: u8 = b'~';

/// Generate `len` pseudorandom printable ASCII bytes
pub fn random_printable(len: usize) -> Vec<u8> {
    let mut rng = rng();
    (0..len)
        .map(|_| rng.random_range(PRINTABLE_FIRST..=PRINTABLE_LAST))
        .collect()
}

/// Write `size_kb` kilobytes of random printable content to `path`
///
/// The file is created or truncated. Errors (missing parent, permissions,
/// disk full) are returned unchanged; callers decide whether to abort. A
/// size whose byte count overflows `usize` is `InvalidInput`.
pub fn write_random_file(path: &Path, size_kb: usize) -> io::Result<()> {
    let len = BYTES_PER_KB.checked_mul(size_kb).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("file size of {} KiB overflows", size_kb),
        )
    })?;
    fs::write(path, random_printable(len))
}
