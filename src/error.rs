//! The error type for the few fallible entry points.
//!
//! Hashing itself never fails. Errors are reserved for caller contract
//! violations that are cheap to check up front: a key of the wrong length, an
//! output buffer shorter than the requested length, an unusable lane width,
//! or a root flag on a chunk that can't be the root. Each one is rejected
//! before any state is touched or any output byte is written.

use crate::platform::MAX_LANE_WIDTH;

/// Errors returned by the fallible constructors and by
/// [`Hasher::finalize_range`](crate::Hasher::finalize_range).
///
/// The `.to_string()` representation is meant for logging and debugging. It
/// isn't a stable API detail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A keyed-mode key was not exactly [`KEY_LEN`](crate::KEY_LEN) bytes.
    #[error("expected a {expected}-byte key, received {actual} bytes")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The output buffer can't hold the requested number of bytes.
    #[error("requested {requested} output bytes, but the buffer holds only {available}")]
    OutputTooShort { requested: usize, available: usize },

    /// Lane widths must be a power of two no larger than the compiled maximum.
    #[error("lane width must be a power of two between 1 and {max}, received {0}", max = MAX_LANE_WIDTH)]
    InvalidLaneWidth(usize),

    /// Only the first chunk of an input can be the root of its tree.
    #[error("only chunk 0 can be the root, received chunk {chunk_counter}")]
    NonRootChunk { chunk_counter: u64 },
}
