//! The compression function, in plain Rust.
//!
//! [`compress`] runs the seven rounds and returns the whole 16-word state.
//! Callers pick an extractor: [`fold`] for a chaining value, [`xof`] for a
//! 64-byte block of root output.

use crate::platform::{le_bytes_from_words_32, le_bytes_from_words_64, words_from_le_bytes_64};
use crate::{CVBytes, CVWords, BLOCK_LEN, CHUNK_END, CHUNK_LEN, CHUNK_START, IV, MSG_SCHEDULE, PARENT};
use arrayref::array_ref;

const BLOCKS_PER_CHUNK: usize = CHUNK_LEN / BLOCK_LEN;

#[inline(always)]
fn g(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, mx: u32, my: u32) {
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(mx);
    state[d] = (state[d] ^ state[a]).rotate_right(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(12);
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(my);
    state[d] = (state[d] ^ state[a]).rotate_right(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(7);
}

// (a, b, c, d) for the four columns, then the four diagonals.
const QUARTER_ROUNDS: [[usize; 4]; 8] = [
    [0, 4, 8, 12],
    [1, 5, 9, 13],
    [2, 6, 10, 14],
    [3, 7, 11, 15],
    [0, 5, 10, 15],
    [1, 6, 11, 12],
    [2, 7, 8, 13],
    [3, 4, 9, 14],
];

/// Run all seven rounds over one block and return the raw state.
#[inline(always)]
pub fn compress(
    cv: &CVWords,
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: u8,
) -> [u32; 16] {
    let m = words_from_le_bytes_64(block);
    let mut state = [0u32; 16];
    state[..8].copy_from_slice(cv);
    state[8..12].copy_from_slice(&IV[..4]);
    state[12] = counter as u32;
    state[13] = (counter >> 32) as u32;
    state[14] = block_len as u32;
    state[15] = flags as u32;

    for schedule in &MSG_SCHEDULE {
        for (i, &[a, b, c, d]) in QUARTER_ROUNDS.iter().enumerate() {
            g(&mut state, a, b, c, d, m[schedule[2 * i]], m[schedule[2 * i + 1]]);
        }
    }
    state
}

/// The chaining-value extractor: `state[i] ^ state[i + 8]`.
#[inline(always)]
pub fn fold(state: &[u32; 16]) -> CVWords {
    core::array::from_fn(|i| state[i] ^ state[i + 8])
}

/// The extended-output extractor. The first half matches [`fold`]; the
/// second half feeds the input chaining value forward.
#[inline(always)]
pub fn xof(state: &[u32; 16], cv: &CVWords) -> [u8; 2 * crate::OUT_LEN] {
    let words: [u32; 16] = core::array::from_fn(|i| {
        if i < 8 {
            state[i] ^ state[i + 8]
        } else {
            state[i] ^ cv[i - 8]
        }
    });
    le_bytes_from_words_64(&words)
}

/// Chaining value of one whole chunk, which is never the root.
pub fn hash_chunk(chunk: &[u8; CHUNK_LEN], key: &CVWords, counter: u64, flags: u8) -> CVBytes {
    let mut cv = *key;
    for (i, block) in chunk.chunks_exact(BLOCK_LEN).enumerate() {
        let mut block_flags = flags;
        if i == 0 {
            block_flags |= CHUNK_START;
        }
        if i == BLOCKS_PER_CHUNK - 1 {
            block_flags |= CHUNK_END;
        }
        let block = array_ref!(block, 0, BLOCK_LEN);
        cv = fold(&compress(&cv, block, BLOCK_LEN as u8, counter, block_flags));
    }
    le_bytes_from_words_32(&cv)
}

/// Chaining value of a non-root parent node. `block` is the left child's CV
/// followed by the right child's.
pub fn hash_parent(block: &[u8; BLOCK_LEN], key: &CVWords, flags: u8) -> CVBytes {
    let state = compress(key, block, BLOCK_LEN as u8, 0, flags | PARENT);
    le_bytes_from_words_32(&fold(&state))
}
