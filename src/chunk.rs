use crate::output::Output;
use crate::{portable, CVWords, BLOCK_LEN, CHUNK_END, CHUNK_LEN, CHUNK_START};
use arrayref::array_ref;
use core::fmt;

/// The state of one chunk that is still taking input.
///
/// The last block received is always held back in `block`, even when it is
/// full, because only [`output`](ChunkState::output) knows it is the last
/// and sets `CHUNK_END` on it.
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
#[derive(Clone)]
pub(crate) struct ChunkState {
    cv: CVWords,
    pub(crate) counter: u64,
    block: [u8; BLOCK_LEN],
    block_len: u8,
    blocks_compressed: u8,
    pub(crate) flags: u8,
}

impl ChunkState {
    pub(crate) fn new(key: &CVWords, counter: u64, flags: u8) -> Self {
        Self {
            cv: *key,
            counter,
            block: [0; BLOCK_LEN],
            block_len: 0,
            blocks_compressed: 0,
            flags,
        }
    }

    /// Start chunk `counter` under the same mode.
    pub(crate) fn reset(&mut self, key: &CVWords, counter: u64) {
        *self = Self::new(key, counter, self.flags);
    }

    pub(crate) fn len(&self) -> usize {
        BLOCK_LEN * self.blocks_compressed as usize + self.block_len as usize
    }

    fn block_flags(&self) -> u8 {
        match self.blocks_compressed {
            0 => self.flags | CHUNK_START,
            _ => self.flags,
        }
    }

    fn absorb(&mut self, block: &[u8; BLOCK_LEN]) {
        let state = portable::compress(
            &self.cv,
            block,
            BLOCK_LEN as u8,
            self.counter,
            self.block_flags(),
        );
        self.cv = portable::fold(&state);
        self.blocks_compressed += 1;
    }

    pub(crate) fn update(&mut self, mut input: &[u8]) -> &mut Self {
        while !input.is_empty() {
            if self.block_len as usize == BLOCK_LEN {
                let block = self.block;
                self.absorb(&block);
                self.block_len = 0;
            }

            // Whole blocks skip the buffer, but never the last one.
            if self.block_len == 0 && input.len() > BLOCK_LEN {
                let (block, rest) = input.split_at(BLOCK_LEN);
                self.absorb(array_ref!(block, 0, BLOCK_LEN));
                input = rest;
                continue;
            }

            let start = self.block_len as usize;
            let take = input.len().min(BLOCK_LEN - start);
            self.block[start..start + take].copy_from_slice(&input[..take]);
            self.block_len += take as u8;
            input = &input[take..];
        }
        debug_assert!(self.len() <= CHUNK_LEN);
        self
    }

    pub(crate) fn output(&self) -> Output {
        // Bytes past block_len are left over from earlier blocks.
        let mut block = [0; BLOCK_LEN];
        block[..self.block_len as usize].copy_from_slice(&self.block[..self.block_len as usize]);
        Output {
            cv: self.cv,
            block,
            block_len: self.block_len,
            counter: self.counter,
            flags: self.block_flags() | CHUNK_END,
        }
    }
}

// The buffered bytes may be secret.
impl fmt::Debug for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ChunkState")
            .field("counter", &self.counter)
            .field("len", &self.len())
            .field("flags", &self.flags)
            .finish()
    }
}
