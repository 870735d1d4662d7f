use crate::platform::Platform;
use crate::{CVBytes, CVWords, Hash, Hasher, BLOCK_LEN, CHUNK_LEN, KEYED_HASH};
use rand::prelude::*;

// Input lengths around every block, chunk and subtree boundary that matters.
pub const TEST_CASES: &[usize] = &[
    0,
    1,
    2,
    3,
    7,
    BLOCK_LEN - 1,
    BLOCK_LEN,
    BLOCK_LEN + 1,
    2 * BLOCK_LEN - 1,
    2 * BLOCK_LEN,
    2 * BLOCK_LEN + 1,
    CHUNK_LEN - 1,
    CHUNK_LEN,
    CHUNK_LEN + 1,
    2 * CHUNK_LEN,
    2 * CHUNK_LEN + 1,
    3 * CHUNK_LEN,
    3 * CHUNK_LEN + 1,
    4 * CHUNK_LEN,
    4 * CHUNK_LEN + 1,
    5 * CHUNK_LEN,
    5 * CHUNK_LEN + 1,
    7 * CHUNK_LEN,
    7 * CHUNK_LEN + 1,
    8 * CHUNK_LEN,
    8 * CHUNK_LEN + 1,
    16 * CHUNK_LEN,
    31 * CHUNK_LEN,
    100 * CHUNK_LEN,
];

pub const TEST_CASES_MAX: usize = 100 * CHUNK_LEN;

pub const TEST_KEY: CVBytes = *b"whats the Elvish word for friend";
pub const TEST_KEY_WORDS: CVWords = [
    1952540791, 1752440947, 1816469605, 1752394102, 1919907616, 1868963940, 1919295602, 1684956521,
];

pub const TEST_CONTEXT: &str = "b3tree 2024-05-02 11:07:31 test context";

// 251 is prime, so the pattern never lines up with a block or chunk and
// swapping two of them changes the input.
pub fn paint_test_input(buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b = (i % 251) as u8;
    }
}

#[derive(Clone, Copy, Debug)]
enum Mode {
    Regular,
    Keyed,
    DeriveKey,
}

const MODES: [Mode; 3] = [Mode::Regular, Mode::Keyed, Mode::DeriveKey];

impl Mode {
    fn hasher(self) -> Hasher {
        match self {
            Mode::Regular => Hasher::new(),
            Mode::Keyed => Hasher::new_keyed(&TEST_KEY),
            Mode::DeriveKey => Hasher::new_derive_key(TEST_CONTEXT),
        }
    }

    fn one_shot(self, input: &[u8]) -> Hash {
        match self {
            Mode::Regular => crate::hash(input),
            Mode::Keyed => crate::keyed_hash(&TEST_KEY, input),
            Mode::DeriveKey => crate::derive_key(TEST_CONTEXT, input).into(),
        }
    }

    fn reference(self, input: &[u8], out: &mut [u8]) {
        let mut reference = match self {
            Mode::Regular => reference_impl::Hasher::new(),
            Mode::Keyed => reference_impl::Hasher::new_keyed(&TEST_KEY),
            Mode::DeriveKey => reference_impl::Hasher::new_derive_key(TEST_CONTEXT),
        };
        reference.update(input);
        reference.finalize(out);
    }

    fn reference_hash(self, input: &[u8]) -> Hash {
        let mut out = [0; 32];
        self.reference(input, &mut out);
        out.into()
    }
}

fn hasher_with_lane_width(lane_width: usize) -> Hasher {
    let platform = Platform::with_lane_width(lane_width).unwrap();
    Hasher::new_internal(crate::IV, 0, platform)
}

#[test]
fn test_key_bytes_equal_key_words() {
    assert_eq!(TEST_KEY_WORDS, crate::platform::words_from_le_bytes_32(&TEST_KEY));
}

#[test]
fn test_msg_schedule_rows_permute() {
    // Each round's order is the previous round's, permuted the same way.
    let permutation = crate::MSG_SCHEDULE[1];
    for rounds in crate::MSG_SCHEDULE.windows(2) {
        let next: [usize; 16] = core::array::from_fn(|i| rounds[0][permutation[i]]);
        assert_eq!(next, rounds[1]);
    }
    assert_eq!(crate::MSG_SCHEDULE[0], core::array::from_fn::<usize, 16, _>(|i| i));
}

#[test]
fn test_matches_reference() {
    // Longer than one output block, not a multiple of 4.
    const OUT: usize = 303;
    let mut input_buf = [0; TEST_CASES_MAX];
    paint_test_input(&mut input_buf);

    for mode in MODES {
        for &len in TEST_CASES {
            let input = &input_buf[..len];
            let mut expected = [0; OUT];
            mode.reference(input, &mut expected);
            let expected_hash = Hash::from(*arrayref::array_ref!(expected, 0, 32));

            assert_eq!(mode.one_shot(input), expected_hash, "{mode:?} len {len}");

            let mut hasher = mode.hasher();
            hasher.update(input);
            assert_eq!(hasher.finalize(), expected_hash, "{mode:?} len {len}");
            assert_eq!(hasher.count(), len as u64);

            let mut extended = [0; OUT];
            hasher.finalize_xof().fill(&mut extended);
            assert_eq!(extended, expected, "{mode:?} len {len}");

            #[cfg(feature = "rayon")]
            {
                let mut hasher = mode.hasher();
                hasher.update_rayon(input);
                assert_eq!(hasher.finalize(), expected_hash, "rayon {mode:?} len {len}");
            }
        }
    }
}

#[test]
fn test_output_lengths() {
    let mut input_buf = [0; 2 * CHUNK_LEN + 1];
    paint_test_input(&mut input_buf);
    let lens = [0, 1, 63, 64, 65, 1023, 1024, 1025, 2048, 2049];

    for mode in MODES {
        for len in lens {
            let input = &input_buf[..len];
            let mut hasher = mode.hasher();
            hasher.update(input);
            let mut expected = [0; 131];
            mode.reference(input, &mut expected);

            // A short request leaves the rest of the buffer untouched.
            let mut out = [0; 131];
            hasher.finalize_range(0, 32, &mut out).unwrap();
            assert_eq!(out[..32], expected[..32], "{mode:?} len {len}");
            assert!(out[32..].iter().all(|&b| b == 0));

            hasher.finalize_range(0, out.len(), &mut out).unwrap();
            assert_eq!(out, expected, "{mode:?} len {len}");
        }
    }
}

#[test]
fn test_split_updates() {
    let end = TEST_CASES.iter().position(|&len| len == 4 * CHUNK_LEN).unwrap();
    let short_cases = &TEST_CASES[..=end];
    let mut input_buf = [0; 8 * CHUNK_LEN];
    paint_test_input(&mut input_buf);

    for &first in short_cases {
        let mut hasher = Hasher::new();
        hasher.update(&input_buf[..first]);
        for &second in short_cases {
            let mut hasher = hasher.clone();
            hasher.update(&input_buf[first..first + second]);
            let expected = Mode::Regular.reference_hash(&input_buf[..first + second]);
            assert_eq!(hasher.finalize(), expected, "split {first} + {second}");
        }
    }
}

#[test]
fn test_fuzz_hasher() {
    const INPUT_MAX: usize = 4 * CHUNK_LEN;
    let mut input_buf = [0; 3 * INPUT_MAX];
    paint_test_input(&mut input_buf);

    let iterations = if cfg!(debug_assertions) { 100 } else { 10_000 };
    let mut rng = rand_chacha::ChaCha8Rng::from_seed([1; 32]);
    for _ in 0..iterations {
        let mode = MODES[rng.gen_range(0..MODES.len())];
        let mut hasher = mode.hasher();
        let mut total = 0;
        for _ in 0..3 {
            let len = rng.gen_range(0..=INPUT_MAX);
            hasher.update(&input_buf[total..total + len]);
            total += len;
        }
        assert_eq!(hasher.count(), total as u64);
        assert_eq!(hasher.finalize(), mode.reference_hash(&input_buf[..total]));
    }
}

#[test]
#[cfg(feature = "std")]
fn test_tree_shapes() {
    // Bytewise updates only ever buffer, one big update only ever takes
    // subtrees. They have to agree.
    for chunks in [1, 2, 3, 4, 5, 1024, 1025] {
        let mut input = vec![0; chunks * CHUNK_LEN];
        paint_test_input(&mut input);

        let mut bulk = Hasher::new();
        bulk.update(&input);
        let mut bytewise = Hasher::new();
        for byte in &input {
            bytewise.update(core::slice::from_ref(byte));
        }

        assert_eq!(bulk.count(), bytewise.count());
        assert_eq!(bulk.finalize(), bytewise.finalize(), "{chunks} chunks");
        if chunks <= 5 {
            assert_eq!(bulk.finalize(), Mode::Regular.reference_hash(&input));
        }
    }
}

#[test]
fn test_misaligned_subtrees() {
    // After 1 or 3 chunks, a bulk update has to climb through smaller
    // subtrees before it can take 8 chunks at once.
    let mut input = [0; 17 * CHUNK_LEN + 5];
    paint_test_input(&mut input);
    let expected = Mode::Regular.reference_hash(&input);
    for first in [CHUNK_LEN, 3 * CHUNK_LEN, 3 * CHUNK_LEN + 1] {
        let mut hasher = Hasher::new();
        hasher.update(&input[..first]);
        hasher.update(&input[first..]);
        assert_eq!(hasher.finalize(), expected, "first update {first}");
    }
}

#[test]
fn test_lane_widths_agree() {
    let mut input_buf = [0; TEST_CASES_MAX];
    paint_test_input(&mut input_buf);
    for &len in TEST_CASES {
        let input = &input_buf[..len];
        let expected = Mode::Regular.reference_hash(input);
        let mut expected_xof = [0; 200];
        Mode::Regular.reference(input, &mut expected_xof);

        for lane_width in [1, 2, 4, 8, 16] {
            let platform = Platform::with_lane_width(lane_width).unwrap();
            let one_shot = crate::subtree::root_output::<crate::join::SerialJoin>(
                input,
                crate::IV,
                0,
                platform,
            );
            assert_eq!(one_shot.root_hash(), expected, "width {lane_width} len {len}");

            let mut hasher = hasher_with_lane_width(lane_width);
            hasher.update(input);
            assert_eq!(hasher.finalize(), expected, "width {lane_width} len {len}");
            let mut xof = [0; 200];
            hasher.finalize_xof().fill(&mut xof);
            assert_eq!(xof, expected_xof);

            #[cfg(feature = "rayon")]
            {
                let mut hasher = hasher_with_lane_width(lane_width);
                hasher.update_rayon(input);
                assert_eq!(hasher.finalize(), expected, "rayon width {lane_width}");
            }
        }
    }
}

#[test]
fn test_lane_widths_keyed_split_updates() {
    let mut input = [0; 37 * CHUNK_LEN + 3];
    paint_test_input(&mut input);
    let expected = crate::keyed_hash(&TEST_KEY, &input);
    for lane_width in [2, 8, 16] {
        let platform = Platform::with_lane_width(lane_width).unwrap();
        let mut hasher = Hasher::new_internal(&TEST_KEY_WORDS, KEYED_HASH, platform);
        hasher.update(&input[..CHUNK_LEN + 1]);
        hasher.update(&input[CHUNK_LEN + 1..20 * CHUNK_LEN]);
        hasher.update(&input[20 * CHUNK_LEN..]);
        assert_eq!(hasher.finalize(), expected, "width {lane_width}");
    }
}

#[test]
fn test_modes_are_separated() {
    let input = b"the same input in every mode";
    let hashes = MODES.map(|mode| mode.one_shot(input));
    assert_ne!(hashes[0], hashes[1]);
    assert_ne!(hashes[0], hashes[2]);
    assert_ne!(hashes[1], hashes[2]);
    assert_ne!(hashes[2], crate::derive_key("another context", input));
}

#[test]
fn test_reader_matches_range() {
    let mut hasher = Hasher::new();
    hasher.update(b"foo");
    let mut whole = [0; 533];
    hasher.finalize_range(0, whole.len(), &mut whole).unwrap();
    assert_eq!(hasher.finalize(), whole[..32]);

    let mut reader = hasher.finalize_xof();
    reader.set_position(303);
    let mut out = [0; 102];
    reader.fill(&mut out);
    assert_eq!(out, whole[303..405]);
    assert_eq!(reader.position(), 405);
    reader.fill(&mut out[..10]);
    assert_eq!(out[..10], whole[405..415]);
}

#[test]
fn test_finalize_range() {
    let mut input = [0; 3 * CHUNK_LEN + 100];
    paint_test_input(&mut input);
    let mut hasher = Hasher::new();
    hasher.update(&input);

    let mut long = [0; 1000];
    hasher.finalize_range(0, long.len(), &mut long).unwrap();
    assert_eq!(hasher.finalize(), long[..32]);

    for (seek, length) in [(0, 1), (1, 63), (63, 2), (64, 64), (100, 300), (999, 1)] {
        let mut out = [0; 1000];
        hasher.finalize_range(seek as u64, length, &mut out).unwrap();
        assert_eq!(out[..length], long[seek..seek + length], "seek {seek}");
        assert!(out[length..].iter().all(|&b| b == 0));
    }

    // Finalizing leaves the state alone, so more input can follow.
    hasher.update(b"more");
    let mut more = [0; 32];
    hasher.finalize_range(0, 32, &mut more).unwrap();
    assert_ne!(more, long[..32]);
}

#[test]
fn test_finalize_range_far_offsets() {
    let hasher = Hasher::new();
    let seek = u64::MAX - 200;
    let mut reader = hasher.finalize_xof();
    reader.set_position(seek);
    let mut expected = [0; 100];
    reader.fill(&mut expected);

    let mut out = [0; 100];
    hasher.finalize_range(seek, out.len(), &mut out).unwrap();
    assert_eq!(out, expected);
}

#[test]
fn test_finalize_range_errors() {
    let hasher = Hasher::new();
    let mut out = [0xaa; 16];
    assert_eq!(
        hasher.finalize_range(0, 32, &mut out),
        Err(crate::Error::OutputTooShort {
            requested: 32,
            available: 16,
        }),
    );
    assert_eq!(out, [0xaa; 16]);

    assert_eq!(hasher.finalize_range(5, 0, &mut []), Ok(()));
    assert_eq!(hasher.finalize_range(5, 0, &mut out), Ok(()));
    assert_eq!(out, [0xaa; 16]);
}

#[test]
fn test_try_new_keyed() {
    let hasher = Hasher::try_new_keyed(&TEST_KEY).unwrap();
    assert_eq!(hasher.finalize(), crate::keyed_hash(&TEST_KEY, b""));

    let long_key = [1; 64];
    for len in [0, 16, 31, 33, 64] {
        assert_eq!(
            Hasher::try_new_keyed(&long_key[..len]).unwrap_err(),
            crate::Error::InvalidKeyLength {
                expected: 32,
                actual: len,
            },
        );
    }
}

#[test]
fn test_reset() {
    let junk = [42; 3 * CHUNK_LEN + 7];
    let input = [43; CHUNK_LEN + 3];
    for mode in MODES {
        let mut hasher = mode.hasher();
        hasher.update(&junk);
        hasher.reset();
        assert_eq!(hasher.count(), 0);
        hasher.update(&input);
        assert_eq!(hasher.finalize(), mode.one_shot(&input), "{mode:?}");
    }
}

#[test]
#[cfg(feature = "std")]
fn test_update_reader() -> Result<(), std::io::Error> {
    let mut input = vec![0; 1_000_000];
    paint_test_input(&mut input);
    assert_eq!(
        Hasher::new().update_reader(&input[..])?.finalize(),
        crate::hash(&input),
    );
    Ok(())
}

#[test]
#[cfg(feature = "std")]
fn test_write_impl() {
    use std::io::Write;
    let mut input = [0; 3000];
    paint_test_input(&mut input);
    let mut hasher = Hasher::new();
    for piece in input.chunks(77) {
        assert_eq!(hasher.write(piece).unwrap(), piece.len());
    }
    hasher.flush().unwrap();
    assert_eq!(hasher.finalize(), crate::hash(&input));
}

#[test]
#[cfg(feature = "rayon")]
fn test_rayon_large_input() {
    let mut input = vec![0; 1_000_000];
    paint_test_input(&mut input);
    let mut hasher = Hasher::new();
    hasher.update(&input[..5]);
    hasher.update_rayon(&input[5..]);
    assert_eq!(hasher.finalize(), crate::hash(&input));
}

#[test]
#[cfg(feature = "std")]
#[cfg(feature = "serde")]
fn test_serde() {
    let hash: Hash = [7; 32].into();
    let json = serde_json::to_string(&hash).unwrap();
    assert_eq!(
        json,
        "[7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7]",
    );
    let hash2: Hash = serde_json::from_str(&json).unwrap();
    assert_eq!(hash, hash2);
}
