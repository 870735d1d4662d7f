use crate::chunk::ChunkState;
use crate::join::{Join, SerialJoin};
use crate::output::Output;
use crate::platform::{self, Platform};
use crate::reader::OutputReader;
use crate::{
    portable, subtree, CVBytes, CVWords, Error, Hash, CHUNK_LEN, DERIVE_KEY_CONTEXT,
    DERIVE_KEY_MATERIAL, IV, KEYED_HASH, KEY_LEN, MAX_DEPTH,
};
use arrayref::array_ref;
use arrayvec::ArrayVec;
use core::fmt;

/// Hash the context string on its own, under `IV`, to get the key of the
/// material phase.
pub(crate) fn context_key(context: &str, platform: Platform) -> CVWords {
    let context_hash = subtree::root_output::<SerialJoin>(
        context.as_bytes(),
        IV,
        DERIVE_KEY_CONTEXT,
        platform,
    )
    .root_hash();
    tracing::trace!(context_len = context.len(), "hashed key derivation context");
    platform::words_from_le_bytes_32(context_hash.as_bytes())
}

/// An incremental hash state that can accept any number of writes.
///
/// Splitting the input differently across calls to [`update`] never changes
/// the result. Finalizing doesn't consume or modify the `Hasher`, so it can be
/// finalized repeatedly, and more input can be added afterwards.
///
/// A `Hasher` must not be updated from several threads at once; independent
/// hashes need independent `Hasher`s. With the `rayon` Cargo feature,
/// [`update_rayon`](#method.update_rayon) parallelizes a single large update
/// internally.
///
/// # Examples
///
/// ```
/// let mut hasher = b3tree::Hasher::new();
/// hasher.update(b"foo");
/// hasher.update(b"bar");
/// hasher.update(b"baz");
/// assert_eq!(hasher.finalize(), b3tree::hash(b"foobarbaz"));
///
/// // Extended output. OutputReader also implements Read and Seek.
/// let mut output = [0; 1000];
/// let mut output_reader = hasher.finalize_xof();
/// output_reader.fill(&mut output);
/// assert_eq!(&output[..32], b3tree::hash(b"foobarbaz").as_bytes());
/// ```
///
/// [`update`]: #method.update
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
#[derive(Clone)]
pub struct Hasher {
    key: CVWords,
    pub(crate) chunk: ChunkState,
    // One entry per set bit of the chunk count, plus one unmerged right
    // sibling left behind by a bulk subtree.
    pub(crate) cv_stack: ArrayVec<CVBytes, { MAX_DEPTH + 1 }>,
    #[cfg_attr(feature = "zeroize", zeroize(skip))]
    platform: Platform,
}

impl Hasher {
    pub(crate) fn new_internal(key: &CVWords, flags: u8, platform: Platform) -> Self {
        Self {
            key: *key,
            chunk: ChunkState::new(key, 0, flags),
            cv_stack: ArrayVec::new(),
            platform,
        }
    }

    /// Construct a new `Hasher` for the regular hash function.
    pub fn new() -> Self {
        Self::new_internal(IV, 0, Platform::detect())
    }

    /// Construct a new `Hasher` for the keyed hash function. See
    /// [`keyed_hash`](crate::keyed_hash).
    pub fn new_keyed(key: &[u8; KEY_LEN]) -> Self {
        let key_words = platform::words_from_le_bytes_32(key);
        Self::new_internal(&key_words, KEYED_HASH, Platform::detect())
    }

    /// Like [`new_keyed`](#method.new_keyed), for a key held in a slice.
    /// Returns [`Error::InvalidKeyLength`] unless the key is exactly
    /// [`KEY_LEN`] bytes.
    ///
    /// ```
    /// assert!(b3tree::Hasher::try_new_keyed(&[7; 32]).is_ok());
    /// assert!(b3tree::Hasher::try_new_keyed(&[7; 16]).is_err());
    /// ```
    pub fn try_new_keyed(key: &[u8]) -> Result<Self, Error> {
        let key: &[u8; KEY_LEN] = key.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        Ok(Self::new_keyed(key))
    }

    /// Construct a new `Hasher` for the key derivation function. See
    /// [`derive_key`](crate::derive_key). The context string should be
    /// hardcoded, globally unique, and application-specific.
    pub fn new_derive_key(context: &str) -> Self {
        let platform = Platform::detect();
        let key = context_key(context, platform);
        Self::new_internal(&key, DERIVE_KEY_MATERIAL, platform)
    }

    /// Forget all input, keeping the key or context.
    pub fn reset(&mut self) -> &mut Self {
        self.chunk.reset(&self.key, 0);
        self.cv_stack.clear();
        self
    }

    // Merge the top two entries until one entry is left per set bit of
    // `completed`. Larger subtrees are always below smaller ones, so the top
    // two are siblings.
    fn settle(&mut self, completed: u64) {
        let keep = completed.count_ones() as usize;
        while self.cv_stack.len() > keep {
            let n = self.cv_stack.len();
            let (left, right) = (self.cv_stack[n - 2], self.cv_stack[n - 1]);
            self.cv_stack[n - 2] =
                Output::parent(&left, &right, &self.key, self.chunk.flags).chaining_value();
            self.cv_stack.truncate(n - 1);
        }
    }

    // Merges for `cv` are deferred to the next push, so the last CV pushed is
    // never folded in before finalize, where it may turn out to be the root's
    // child.
    fn push_cv(&mut self, cv: &CVBytes, chunks_before: u64) {
        self.settle(chunks_before);
        self.cv_stack.push(*cv);
    }

    /// Add input bytes to the hash state. You can call this any number of
    /// times.
    ///
    /// This method is always single-threaded. For multithreading support, see
    /// [`update_rayon`](#method.update_rayon) below (enabled with the `rayon`
    /// Cargo feature).
    pub fn update(&mut self, input: &[u8]) -> &mut Self {
        self.absorb::<SerialJoin>(input)
    }

    /// Identical to [`update`](Hasher::update), but hashing large subtrees on
    /// the Rayon thread pool.
    ///
    /// This method is gated by the `rayon` Cargo feature. Multithreading only
    /// pays off for large inputs, on the order of 128 KiB and up.
    #[cfg(feature = "rayon")]
    pub fn update_rayon(&mut self, input: &[u8]) -> &mut Self {
        self.absorb::<crate::join::RayonJoin>(input)
    }

    /// Read everything from `reader` and add it to the hash state.
    ///
    /// Reads are retried on [`std::io::ErrorKind::Interrupted`]. Any other
    /// read error is returned, and the bytes read before it have already been
    /// hashed.
    #[cfg(feature = "std")]
    pub fn update_reader(&mut self, reader: impl std::io::Read) -> std::io::Result<&mut Self> {
        crate::io::copy_wide(reader, self)?;
        Ok(self)
    }

    fn absorb<J: Join>(&mut self, mut input: &[u8]) -> &mut Self {
        if self.chunk.len() > 0 {
            input = self.top_up_chunk(input);
        }
        while input.len() > CHUNK_LEN {
            input = self.take_subtree::<J>(input);
        }
        if !input.is_empty() {
            self.chunk.update(input);
            // root_output() expects a settled stack whenever the chunk has
            // bytes.
            self.settle(self.chunk.counter);
        }
        self
    }

    // Finish the buffered chunk. It's pushed only once more input shows up,
    // since until then it could be the root.
    fn top_up_chunk<'a>(&mut self, input: &'a [u8]) -> &'a [u8] {
        let take = input.len().min(CHUNK_LEN - self.chunk.len());
        let (head, rest) = input.split_at(take);
        self.chunk.update(head);
        if !rest.is_empty() {
            let counter = self.chunk.counter;
            let cv = self.chunk.output().chaining_value();
            self.push_cv(&cv, counter);
            self.chunk.reset(&self.key, counter + 1);
            tracing::trace!(counter, "buffered chunk complete");
        }
        rest
    }

    // Hash the biggest subtree that starts at the current chunk and can still
    // be a complete subtree of the final tree: a power of two that divides
    // the chunks already done and fits in the whole chunks of `input`.
    fn take_subtree<'a, J: Join>(&mut self, input: &'a [u8]) -> &'a [u8] {
        debug_assert_eq!(self.chunk.len(), 0);
        let completed = self.chunk.counter;
        let mut span = 1u64 << (input.len() / CHUNK_LEN).ilog2();
        if completed != 0 {
            span = span.min(1 << completed.trailing_zeros());
        }
        let len = span as usize * CHUNK_LEN;
        tracing::trace!(counter = completed, chunks = span, "hashing subtree");

        let key = self.key;
        let flags = self.chunk.flags;
        if span == 1 {
            // More input follows, so this chunk isn't the root.
            let cv = portable::hash_chunk(array_ref!(input, 0, CHUNK_LEN), &key, completed, flags);
            self.push_cv(&cv, completed);
        } else {
            let (left, right) =
                subtree::children::<J>(&input[..len], &key, completed, flags, self.platform);
            self.push_cv(&left, completed);
            self.push_cv(&right, completed + span / 2);
        }
        self.chunk.reset(&key, completed + span);
        &input[len..]
    }

    pub(crate) fn root_output(&self) -> Output {
        let flags = self.chunk.flags;
        let (mut output, rest) = if self.chunk.len() > 0 || self.cv_stack.len() < 2 {
            debug_assert!(self.chunk.len() > 0 || self.cv_stack.is_empty());
            (self.chunk.output(), &self.cv_stack[..])
        } else {
            // The last subtree left its two halves on top, unmerged.
            let (rest, top) = self.cv_stack.split_at(self.cv_stack.len() - 2);
            (Output::parent(&top[0], &top[1], &self.key, flags), rest)
        };
        for left in rest.iter().rev() {
            output = Output::parent(left, &output.chaining_value(), &self.key, flags);
        }
        tracing::trace!(stack_len = self.cv_stack.len(), "finalized tree");
        output
    }

    /// Return the [`Hash`] of everything added so far.
    ///
    /// This method is idempotent. Calling it twice will give the same result.
    /// You can also add more input and finalize again.
    pub fn finalize(&self) -> Hash {
        self.root_output().root_hash()
    }

    /// Write `length` bytes of extended output, starting at byte `seek` of the
    /// output stream, into the front of `out`.
    ///
    /// The output stream is unbounded, and any range of it can be requested
    /// directly: the result always equals the same range of one long read
    /// starting at 0, and the first 32 bytes at seek 0 are the
    /// [`finalize`](#method.finalize) hash. A `length` of 0 writes nothing.
    ///
    /// Returns [`Error::OutputTooShort`], without writing anything, if `out`
    /// is shorter than `length`.
    pub fn finalize_range(&self, seek: u64, length: usize, out: &mut [u8]) -> Result<(), Error> {
        let available = out.len();
        let out = out.get_mut(..length).ok_or(Error::OutputTooShort {
            requested: length,
            available,
        })?;
        if !out.is_empty() {
            self.root_output().root_bytes(seek, out);
        }
        Ok(())
    }

    /// Return an [`OutputReader`] positioned at the start of the output
    /// stream.
    ///
    /// This method is idempotent. Calling it twice will give the same result.
    /// You can also add more input and finalize again.
    pub fn finalize_xof(&self) -> OutputReader {
        OutputReader::new(self.root_output())
    }

    /// Return the total number of bytes hashed so far.
    pub fn count(&self) -> u64 {
        self.chunk.counter * CHUNK_LEN as u64 + self.chunk.len() as u64
    }
}

// The hash state may be secret, so print only its shape.
impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("count", &self.count())
            .field("flags", &self.chunk.flags)
            .field("platform", &self.platform)
            .finish()
    }
}

impl Default for Hasher {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl std::io::Write for Hasher {
    /// This is equivalent to [`update`](#method.update).
    #[inline]
    fn write(&mut self, input: &[u8]) -> std::io::Result<usize> {
        self.update(input);
        Ok(input.len())
    }

    #[inline]
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
