//! Hashing a run of input that starts on a chunk boundary.
//!
//! A subtree of `n` chunks always splits after the largest power of two
//! strictly less than `n` chunks, so its shape is fixed by its length alone.
//! Below that rule, work is free to be regrouped: once a subtree fits in one
//! lane batch its chunks are hashed together, and its parents are reduced a
//! level at a time, a batch of parents per call. Lane width and join
//! strategy change only the order of compressions.

use crate::chunk::ChunkState;
use crate::join::Join;
use crate::output::{parent_block, Output};
use crate::platform::{Lanes, Platform, MAX_LANE_WIDTH};
use crate::{CVBytes, CVWords, BLOCK_LEN, CHUNK_LEN};
use arrayref::array_ref;
use arrayvec::ArrayVec;

/// Bytes in the left subtree of `len > CHUNK_LEN` input bytes.
pub(crate) fn left_len(len: usize) -> usize {
    debug_assert!(len > CHUNK_LEN);
    let full_chunks = (len - 1) / CHUNK_LEN;
    // Largest power of two <= full_chunks.
    (1usize << full_chunks.ilog2()) * CHUNK_LEN
}

/// Chaining values of the two children of a subtree holding more than one
/// chunk. The node above them is left to the caller, since it may be the root.
pub(crate) fn children<J: Join>(
    input: &[u8],
    key: &CVWords,
    counter: u64,
    flags: u8,
    platform: Platform,
) -> (CVBytes, CVBytes) {
    let (left, right) = input.split_at(left_len(input.len()));
    let right_counter = counter + (left.len() / CHUNK_LEN) as u64;
    J::join(
        || subtree_cv::<J>(left, key, counter, flags, platform),
        || subtree_cv::<J>(right, key, right_counter, flags, platform),
    )
}

/// The chaining value of a non-root subtree.
fn subtree_cv<J: Join>(
    input: &[u8],
    key: &CVWords,
    counter: u64,
    flags: u8,
    platform: Platform,
) -> CVBytes {
    if input.len() <= platform.lane_width() * CHUNK_LEN {
        return leaf_batch(input, key, counter, flags, platform);
    }
    let (left, right) = children::<J>(input, key, counter, flags, platform);
    Output::parent(&left, &right, key, flags).chaining_value()
}

// Hash every chunk of the batch in one call, then pair them off.
fn leaf_batch(
    input: &[u8],
    key: &CVWords,
    counter: u64,
    flags: u8,
    platform: Platform,
) -> CVBytes {
    debug_assert!(!input.is_empty());
    let whole = input.chunks_exact(CHUNK_LEN);
    let tail = whole.remainder();
    let chunks: ArrayVec<&[u8; CHUNK_LEN], MAX_LANE_WIDTH> =
        whole.map(|chunk| array_ref!(chunk, 0, CHUNK_LEN)).collect();

    let mut cvs = Lanes::new();
    platform.hash_chunks(&chunks, key, counter, flags, &mut cvs);
    if !tail.is_empty() {
        let tail_counter = counter + chunks.len() as u64;
        let cv = ChunkState::new(key, tail_counter, flags)
            .update(tail)
            .output()
            .chaining_value();
        cvs.push(cv);
    }
    reduce(cvs, key, flags, platform)
}

// Merge a level of sibling CVs pairwise until one is left. An odd CV at the
// right edge moves up a level unchanged, which is exactly where the split rule
// puts it.
fn reduce(mut level: Lanes, key: &CVWords, flags: u8, platform: Platform) -> CVBytes {
    while level.len() > 1 {
        let blocks: ArrayVec<[u8; BLOCK_LEN], { MAX_LANE_WIDTH / 2 }> = level
            .chunks_exact(2)
            .map(|pair| parent_block(&pair[0], &pair[1]))
            .collect();
        let odd = (level.len() % 2 == 1).then(|| level[level.len() - 1]);

        let refs: ArrayVec<&[u8; BLOCK_LEN], { MAX_LANE_WIDTH / 2 }> =
            blocks.iter().collect();
        let mut next = Lanes::new();
        platform.hash_parents(&refs, key, flags, &mut next);
        next.extend(odd);
        level = next;
    }
    level[0]
}

/// The root node of a whole input, hashed in one go.
pub(crate) fn root_output<J: Join>(
    input: &[u8],
    key: &CVWords,
    flags: u8,
    platform: Platform,
) -> Output {
    if input.len() <= CHUNK_LEN {
        return ChunkState::new(key, 0, flags).update(input).output();
    }
    let (left, right) = children::<J>(input, key, 0, flags, platform);
    Output::parent(&left, &right, key, flags)
}
