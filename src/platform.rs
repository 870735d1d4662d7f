use crate::{portable, CVBytes, CVWords, Error, BLOCK_LEN, CHUNK_LEN};
use arrayref::{array_mut_ref, array_ref};
use arrayvec::ArrayVec;

/// The widest batch of chunks (or parent blocks) hashed in one call.
pub const MAX_LANE_WIDTH: usize = 16;

/// A fixed-capacity batch of chaining values, one per lane.
pub type Lanes = ArrayVec<CVBytes, MAX_LANE_WIDTH>;

/// How many chunks the subtree hasher hands over per batch. The result never
/// depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Platform {
    lane_width: u8,
}

impl Platform {
    /// One lane: every chunk and parent is compressed on its own.
    pub const fn portable() -> Self {
        Self { lane_width: 1 }
    }

    /// The platform used by `Hasher::new` and the all-at-once functions.
    #[inline]
    pub fn detect() -> Self {
        Self::portable()
    }

    /// Must be a power of two no larger than [`MAX_LANE_WIDTH`].
    pub fn with_lane_width(lane_width: usize) -> Result<Self, Error> {
        if !lane_width.is_power_of_two() || lane_width > MAX_LANE_WIDTH {
            return Err(Error::InvalidLaneWidth(lane_width));
        }
        Ok(Self {
            lane_width: lane_width as u8,
        })
    }

    #[inline]
    pub fn lane_width(&self) -> usize {
        self.lane_width as usize
    }

    /// Append one chaining value per chunk to `out`. Chunk `i` gets counter
    /// `first_counter + i`.
    pub fn hash_chunks(
        &self,
        chunks: &[&[u8; CHUNK_LEN]],
        key: &CVWords,
        first_counter: u64,
        flags: u8,
        out: &mut Lanes,
    ) {
        debug_assert!(chunks.len() <= self.lane_width(), "batch too wide");
        for (chunk, counter) in chunks.iter().zip(first_counter..) {
            out.push(portable::hash_chunk(chunk, key, counter, flags));
        }
    }

    /// Append one parent chaining value per 64-byte block to `out`.
    pub fn hash_parents(
        &self,
        blocks: &[&[u8; BLOCK_LEN]],
        key: &CVWords,
        flags: u8,
        out: &mut Lanes,
    ) {
        debug_assert!(blocks.len() <= self.lane_width(), "batch too wide");
        for block in blocks {
            out.push(portable::hash_parent(block, key, flags));
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::detect()
    }
}

#[inline(always)]
pub fn words_from_le_bytes_32(bytes: &[u8; 32]) -> [u32; 8] {
    core::array::from_fn(|i| u32::from_le_bytes(*array_ref!(bytes, 4 * i, 4)))
}

#[inline(always)]
pub fn words_from_le_bytes_64(bytes: &[u8; 64]) -> [u32; 16] {
    core::array::from_fn(|i| u32::from_le_bytes(*array_ref!(bytes, 4 * i, 4)))
}

#[inline(always)]
pub fn le_bytes_from_words_32(words: &[u32; 8]) -> [u8; 32] {
    let mut out = [0; 32];
    for (i, word) in words.iter().enumerate() {
        *array_mut_ref!(out, i * 4, 4) = word.to_le_bytes();
    }
    out
}

#[inline(always)]
pub fn le_bytes_from_words_64(words: &[u32; 16]) -> [u8; 64] {
    let mut out = [0; 64];
    for (i, word) in words.iter().enumerate() {
        *array_mut_ref!(out, i * 4, 4) = word.to_le_bytes();
    }
    out
}
