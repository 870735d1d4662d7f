//! Chunk and parent chaining values, for callers that build or verify the
//! tree themselves (streaming verification, out-of-order chunk hashing).
//! Nothing here is a stable API.
//!
//! A caller that hashes chunks independently must number them with the
//! same counter the whole-input hash would use, and must only mark the final
//! node `is_root`.

use crate::output::Output;
use crate::platform::words_from_le_bytes_32;
use crate::{CVWords, Error, Hash, IV, KEYED_HASH, KEY_LEN};

pub const BLOCK_LEN: usize = 64;
pub const CHUNK_LEN: usize = 1024;

#[derive(Clone, Debug)]
pub struct ChunkState(crate::chunk::ChunkState);

impl ChunkState {
    /// Chunk `chunk_counter` of a regular hash.
    pub fn new(chunk_counter: u64) -> Self {
        Self(crate::chunk::ChunkState::new(IV, chunk_counter, 0))
    }

    /// Chunk `chunk_counter` of a keyed hash under `key`.
    pub fn new_keyed(key: &[u8; KEY_LEN], chunk_counter: u64) -> Self {
        let key = words_from_le_bytes_32(key);
        Self(crate::chunk::ChunkState::new(&key, chunk_counter, KEYED_HASH))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    #[inline]
    pub fn update(&mut self, input: &[u8]) -> &mut Self {
        self.0.update(input);
        self
    }

    /// The chunk's chaining value, or with `is_root` the hash of an input
    /// that is this chunk alone. Any chunk but the first is rejected as the
    /// root with [`Error::NonRootChunk`].
    pub fn finalize(&self, is_root: bool) -> Result<Hash, Error> {
        let output = self.0.output();
        if !is_root {
            return Ok(output.chaining_value().into());
        }
        if output.counter != 0 {
            return Err(Error::NonRootChunk {
                chunk_counter: output.counter,
            });
        }
        Ok(output.root_hash())
    }
}

fn parent(left: &Hash, right: &Hash, key: &CVWords, flags: u8, is_root: bool) -> Hash {
    let output = Output::parent(left.as_bytes(), right.as_bytes(), key, flags);
    if is_root {
        output.root_hash()
    } else {
        output.chaining_value().into()
    }
}

/// The parent of two chaining values in the regular hash.
pub fn parent_cv(left_child: &Hash, right_child: &Hash, is_root: bool) -> Hash {
    parent(left_child, right_child, IV, 0, is_root)
}

/// The parent of two chaining values in the keyed hash under `key`.
pub fn keyed_parent_cv(
    key: &[u8; KEY_LEN],
    left_child: &Hash,
    right_child: &Hash,
    is_root: bool,
) -> Hash {
    let key = words_from_le_bytes_32(key);
    parent(left_child, right_child, &key, KEYED_HASH, is_root)
}
