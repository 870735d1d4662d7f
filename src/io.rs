//! Feeding a `Hasher` from a reader.

use crate::guts::CHUNK_LEN;

// A whole number of chunks, large enough that update() gets to hash entire
// subtrees instead of buffering one chunk at a time.
const READ_BUF_LEN: usize = 64 * CHUNK_LEN;

/// Drain `reader` into `hasher`, returning the number of bytes hashed.
/// Interrupted reads are retried; other errors are returned as-is.
pub(crate) fn copy_wide(
    mut reader: impl std::io::Read,
    hasher: &mut crate::Hasher,
) -> std::io::Result<u64> {
    let mut buf = [0; READ_BUF_LEN];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            tracing::trace!(total, "reader exhausted");
            return Ok(total);
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
}
