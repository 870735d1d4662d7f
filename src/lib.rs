//! An incremental [BLAKE3] tree hash with seekable extended output.
//!
//! The engine consumes input in 1 KiB chunks, keeps a bounded stack of
//! completed subtree chaining values, and defers the final (root)
//! compression until output is requested, so the same state can produce a
//! 32-byte digest or any byte range of an unbounded output stream.
//!
//! # Examples
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Hash an input all at once.
//! let hash1 = b3tree::hash(b"foobarbaz");
//!
//! // Hash an input incrementally.
//! let mut hasher = b3tree::Hasher::new();
//! hasher.update(b"foo");
//! hasher.update(b"bar");
//! hasher.update(b"baz");
//! let hash2 = hasher.finalize();
//! assert_eq!(hash1, hash2);
//!
//! // Extended output, from any offset.
//! let mut output = [0; 1000];
//! hasher.finalize_range(0, output.len(), &mut output)?;
//! assert_eq!(hash1, output[..32]);
//!
//! let mut tail = [0; 100];
//! hasher.finalize_range(900, tail.len(), &mut tail)?;
//! assert_eq!(tail, output[900..]);
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! The `std` feature (the only feature enabled by default) is required for
//! the [`Write`] impl on [`Hasher`], the [`Read`] and [`Seek`] impls on
//! [`OutputReader`], and [`Hasher::update_reader`].
//!
//! The `rayon` feature adds [`Hasher::update_rayon`], which hashes large
//! inputs on the Rayon thread pool. Its output is identical to
//! [`Hasher::update`]. All other APIs remain single-threaded.
//!
//! The `zeroize` feature implements `Zeroize` for [`Hash`], [`Hasher`] and
//! [`OutputReader`]. The `serde` feature implements `Serialize` and
//! `Deserialize` for [`Hash`].
//!
//! [BLAKE3]: https://blake3.io
//! [`Write`]: https://doc.rust-lang.org/std/io/trait.Write.html
//! [`Read`]: https://doc.rust-lang.org/std/io/trait.Read.html
//! [`Seek`]: https://doc.rust-lang.org/std/io/trait.Seek.html

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
mod test;

mod chunk;
mod error;

// Chunk and parent chaining values for callers that walk the tree
// themselves.
#[doc(hidden)]
pub mod guts;

mod hash;
mod hasher;

#[cfg(feature = "std")]
mod io;

mod join;
mod output;

/// Undocumented and unstable. Lane width selection and word conversions.
#[doc(hidden)]
pub mod platform;

mod portable;
mod reader;
mod subtree;

pub use error::Error;
pub use hash::Hash;
pub use hasher::Hasher;
pub use reader::OutputReader;

use join::SerialJoin;
use platform::Platform;

/// The number of bytes in a [`Hash`], 32.
pub const OUT_LEN: usize = 32;

/// The number of bytes in a key, 32.
pub const KEY_LEN: usize = 32;

pub(crate) use guts::{BLOCK_LEN, CHUNK_LEN};

// 2^54 chunks of 2^10 bytes is the whole 2^64-byte input space.
const MAX_DEPTH: usize = 54;

// Chunk state stays in words between blocks. Finished CVs are bytes, since
// parent blocks are built from them.
type CVWords = [u32; 8];
type CVBytes = [u8; 32]; // little-endian

const IV: &CVWords = &[
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A, 0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

// Message word order for each of the seven rounds.
const MSG_SCHEDULE: [[usize; 16]; 7] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8],
    [3, 4, 10, 12, 13, 2, 7, 14, 6, 5, 9, 0, 11, 15, 8, 1],
    [10, 7, 12, 9, 14, 3, 13, 15, 4, 0, 11, 2, 5, 8, 1, 6],
    [12, 13, 9, 11, 15, 10, 14, 8, 7, 2, 5, 3, 0, 1, 6, 4],
    [9, 14, 11, 5, 8, 12, 15, 1, 13, 3, 0, 10, 2, 6, 4, 7],
    [11, 15, 5, 0, 1, 9, 8, 6, 14, 10, 2, 12, 3, 4, 7, 13],
];

// Domain separation flags, the last word of the compression state.
const CHUNK_START: u8 = 1 << 0;
const CHUNK_END: u8 = 1 << 1;
const PARENT: u8 = 1 << 2;
const ROOT: u8 = 1 << 3;
const KEYED_HASH: u8 = 1 << 4;
const DERIVE_KEY_CONTEXT: u8 = 1 << 5;
const DERIVE_KEY_MATERIAL: u8 = 1 << 6;

/// Hash `input` in the regular mode.
///
/// [`Hasher`] does the same incrementally. For more than 32 bytes of output,
/// see [`Hasher::finalize_range`] and [`Hasher::finalize_xof`].
///
/// Always single-threaded. With the `rayon` feature, see
/// [`Hasher::update_rayon`](struct.Hasher.html#method.update_rayon).
pub fn hash(input: &[u8]) -> Hash {
    subtree::root_output::<SerialJoin>(input, IV, 0, Platform::detect()).root_hash()
}

/// Hash `input` under a 32-byte key.
///
/// The result works as a message authentication code. Compare MACs as
/// [`Hash`] values, never as raw bytes, to keep the comparison constant-time.
///
/// For keys held in slices, see [`Hasher::try_new_keyed`].
pub fn keyed_hash(key: &[u8; KEY_LEN], input: &[u8]) -> Hash {
    let key = platform::words_from_le_bytes_32(key);
    subtree::root_output::<SerialJoin>(input, &key, KEYED_HASH, Platform::detect()).root_hash()
}

/// Derive a 32-byte subkey from `key_material`.
///
/// **The context string should be hardcoded, globally unique, and
/// application-specific**, for example
/// `"example.com 2019-12-25 16:18:03 session tokens v1"`. This is not a
/// password hash; never feed it passwords.
///
/// For other output lengths, see [`Hasher::new_derive_key`].
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; OUT_LEN] {
    let platform = Platform::detect();
    let key = hasher::context_key(context, platform);
    subtree::root_output::<SerialJoin>(key_material, &key, DERIVE_KEY_MATERIAL, platform)
        .root_hash()
        .into()
}
