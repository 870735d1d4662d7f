use crate::platform::le_bytes_from_words_32;
use crate::{portable, CVBytes, CVWords, Hash, BLOCK_LEN, OUT_LEN, PARENT, ROOT};

/// A node whose last compression hasn't happened yet.
///
/// The same inputs give a chaining value through [`fold`](portable::fold),
/// or, with `ROOT` set and the counter reused as an output block index, any
/// stretch of the output stream through [`xof`](portable::xof).
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
#[derive(Clone)]
pub(crate) struct Output {
    pub(crate) cv: CVWords,
    pub(crate) block: [u8; BLOCK_LEN],
    pub(crate) block_len: u8,
    pub(crate) counter: u64,
    pub(crate) flags: u8,
}

pub(crate) fn parent_block(left: &CVBytes, right: &CVBytes) -> [u8; BLOCK_LEN] {
    let mut block = [0; BLOCK_LEN];
    block[..OUT_LEN].copy_from_slice(left);
    block[OUT_LEN..].copy_from_slice(right);
    block
}

impl Output {
    pub(crate) fn parent(left: &CVBytes, right: &CVBytes, key: &CVWords, flags: u8) -> Self {
        Self {
            cv: *key,
            block: parent_block(left, right),
            block_len: BLOCK_LEN as u8,
            counter: 0,
            flags: flags | PARENT,
        }
    }

    pub(crate) fn chaining_value(&self) -> CVBytes {
        let state = portable::compress(
            &self.cv,
            &self.block,
            self.block_len,
            self.counter,
            self.flags,
        );
        le_bytes_from_words_32(&portable::fold(&state))
    }

    /// Output block `index` of the root output stream.
    pub(crate) fn root_output_block(&self, index: u64) -> [u8; BLOCK_LEN] {
        debug_assert_eq!(self.counter, 0, "only chunk 0 can be the root");
        let state = portable::compress(
            &self.cv,
            &self.block,
            self.block_len,
            index,
            self.flags | ROOT,
        );
        portable::xof(&state, &self.cv)
    }

    pub(crate) fn root_hash(&self) -> Hash {
        let block = self.root_output_block(0);
        let mut hash = [0; OUT_LEN];
        hash.copy_from_slice(&block[..OUT_LEN]);
        Hash::from_bytes(hash)
    }

    /// Write output bytes `seek..seek + out.len()`.
    pub(crate) fn root_bytes(&self, seek: u64, out: &mut [u8]) {
        let mut index = seek / BLOCK_LEN as u64;
        let offset = (seek % BLOCK_LEN as u64) as usize;

        let head = out.len().min(BLOCK_LEN - offset);
        let (first, rest) = out.split_at_mut(head);
        if head > 0 {
            first.copy_from_slice(&self.root_output_block(index)[offset..offset + head]);
            index = index.wrapping_add(1);
        }

        for piece in rest.chunks_mut(BLOCK_LEN) {
            let block = self.root_output_block(index);
            piece.copy_from_slice(&block[..piece.len()]);
            index = index.wrapping_add(1);
        }
    }
}
