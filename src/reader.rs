use crate::output::Output;
use core::fmt;

/// An incremental reader for extended output, returned by
/// [`Hasher::finalize_xof`](crate::Hasher::finalize_xof).
///
/// Shorter outputs are prefixes of longer ones, and explicitly requesting a
/// short output is equivalent to truncating the default-length output.
///
/// # Security notes
///
/// Outputs shorter than the default length of 32 bytes (256 bits) provide
/// less security. Longer outputs don't provide any additional security.
///
/// Avoid relying on the secrecy of the output offset. An attacker who knows
/// both the message and the key (if any) can determine the offset of an
/// extended output block.
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
#[derive(Clone)]
pub struct OutputReader {
    inner: Output,
    position: u64,
}

impl OutputReader {
    pub(crate) fn new(inner: Output) -> Self {
        Self { inner, position: 0 }
    }

    /// Fill `buf` from the current position and move past it. Unlike
    /// [`Read::read`](#method.read) this can't fail, and it always fills the
    /// whole buffer.
    ///
    /// Nothing is cached between calls, so a read that ends mid-block
    /// recomputes that block next time. Buffers sized in multiples of 64
    /// avoid the repeat.
    ///
    /// The stream is 2<sup>64</sup>-1 bytes long. Reading past that is
    /// unspecified.
    pub fn fill(&mut self, buf: &mut [u8]) {
        self.inner.root_bytes(self.position, buf);
        self.position = self.position.wrapping_add(buf.len() as u64);
    }

    /// The offset of the next byte [`fill`](#method.fill) will return.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move to `position`. This is the infallible form of seeking with
    /// [`SeekFrom::Start`](std::io::SeekFrom::Start).
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }
}

// The output may be secret, so print only the position.
impl fmt::Debug for OutputReader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OutputReader")
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(feature = "std")]
impl std::io::Read for OutputReader {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.fill(buf);
        Ok(buf.len())
    }
}

/// Seeking from the end is an error, since the stream has no end to speak
/// of. So is landing before 0 or past `u64::MAX`.
#[cfg(feature = "std")]
impl std::io::Seek for OutputReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        use std::io::{Error, ErrorKind, SeekFrom};

        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(_) => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "seek from end not supported",
                ));
            }
        };
        let target = target.ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput, "seek outside the output stream")
        })?;
        self.position = target;
        Ok(target)
    }
}
