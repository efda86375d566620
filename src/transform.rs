//! Byte-transform engine (C2).
//!
//! Converts between big-endian word streams on the wire and machine scalars
//! under a word-swap / multi-word-swap / string-swap policy. The three flags
//! are orthogonal: `word_swap` acts inside each 16-bit word, `multi_word_swap`
//! reorders the words of a 32/64-bit scalar, and `string_word_swap` is used
//! only when transcoding strings.

/// Text encoding used when transcoding Modbus register data to/from a
/// [`String`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    Ascii,
    /// UTF-16LE, as "Unicode" means on the wire in this domain.
    Unicode,
}

/// Immutable configuration value holding the three swap flags; pure
/// encode/decode functions hang off it rather than mutable shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteTransform {
    pub word_swap: bool,
    pub multi_word_swap: bool,
    pub string_word_swap: bool,
}

impl Default for ByteTransform {
    fn default() -> Self {
        Self {
            word_swap: true,
            multi_word_swap: false,
            string_word_swap: false,
        }
    }
}

impl ByteTransform {
    pub fn new(word_swap: bool, multi_word_swap: bool, string_word_swap: bool) -> Self {
        Self {
            word_swap,
            multi_word_swap,
            string_word_swap,
        }
    }

    /// Splits a byte slice into `2`-byte words, applying `word_swap` to each.
    fn split_words(&self, bytes: &[u8]) -> Vec<[u8; 2]> {
        bytes
            .chunks_exact(2)
            .map(|w| {
                if self.word_swap {
                    [w[1], w[0]]
                } else {
                    [w[0], w[1]]
                }
            })
            .collect()
    }

    /// Reorders words for a multi-word scalar: swaps a pair, reverses a
    /// quad. This operation is its own inverse, so it is used unchanged on
    /// both the decode and encode paths.
    fn reorder_words(&self, words: &mut [[u8; 2]]) {
        if !self.multi_word_swap {
            return;
        }
        match words.len() {
            2 => words.swap(0, 1),
            4 => words.reverse(),
            _ => {}
        }
    }

    fn words_to_bytes(words: &[[u8; 2]]) -> Vec<u8> {
        let mut out = Vec::with_capacity(words.len() * 2);
        for w in words {
            out.extend_from_slice(w);
        }
        out
    }

    /// Decodes `2 * N` bytes into the big-endian value of an `N`-word
    /// scalar, per §4.2: split into words, apply word_swap, apply
    /// multi_word_swap, interpret as big-endian.
    fn decode_be_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        let mut words = self.split_words(bytes);
        self.reorder_words(&mut words);
        Self::words_to_bytes(&words)
    }

    /// Encoding is the exact inverse of decoding: undo the word reorder,
    /// then undo the word swap (both are involutions, so the same
    /// operations run in the same order produce the wire bytes).
    fn encode_be_bytes(&self, be_bytes: &[u8]) -> Vec<u8> {
        let mut words: Vec<[u8; 2]> = be_bytes
            .chunks_exact(2)
            .map(|w| [w[0], w[1]])
            .collect();
        self.reorder_words(&mut words);
        if self.word_swap {
            for w in &mut words {
                w.swap(0, 1);
            }
        }
        Self::words_to_bytes(&words)
    }

    pub fn decode_u16(&self, bytes: &[u8]) -> u16 {
        let be = self.decode_be_bytes(&bytes[..2]);
        u16::from_be_bytes([be[0], be[1]])
    }

    pub fn decode_i16(&self, bytes: &[u8]) -> i16 {
        self.decode_u16(bytes) as i16
    }

    pub fn decode_u32(&self, bytes: &[u8]) -> u32 {
        let be = self.decode_be_bytes(&bytes[..4]);
        u32::from_be_bytes([be[0], be[1], be[2], be[3]])
    }

    pub fn decode_i32(&self, bytes: &[u8]) -> i32 {
        self.decode_u32(bytes) as i32
    }

    pub fn decode_f32(&self, bytes: &[u8]) -> f32 {
        f32::from_bits(self.decode_u32(bytes))
    }

    pub fn decode_u64(&self, bytes: &[u8]) -> u64 {
        let be = self.decode_be_bytes(&bytes[..8]);
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&be[..8]);
        u64::from_be_bytes(arr)
    }

    pub fn decode_i64(&self, bytes: &[u8]) -> i64 {
        self.decode_u64(bytes) as i64
    }

    pub fn decode_f64(&self, bytes: &[u8]) -> f64 {
        f64::from_bits(self.decode_u64(bytes))
    }

    pub fn encode_u16(&self, value: u16) -> Vec<u8> {
        self.encode_be_bytes(&value.to_be_bytes())
    }

    pub fn encode_i16(&self, value: i16) -> Vec<u8> {
        self.encode_u16(value as u16)
    }

    pub fn encode_u32(&self, value: u32) -> Vec<u8> {
        self.encode_be_bytes(&value.to_be_bytes())
    }

    pub fn encode_i32(&self, value: i32) -> Vec<u8> {
        self.encode_u32(value as u32)
    }

    pub fn encode_f32(&self, value: f32) -> Vec<u8> {
        self.encode_u32(value.to_bits())
    }

    pub fn encode_u64(&self, value: u64) -> Vec<u8> {
        self.encode_be_bytes(&value.to_be_bytes())
    }

    pub fn encode_i64(&self, value: i64) -> Vec<u8> {
        self.encode_u64(value as u64)
    }

    pub fn encode_f64(&self, value: f64) -> Vec<u8> {
        self.encode_u64(value.to_bits())
    }

    /// Decodes `bytes` into a string in the given encoding, applying
    /// `string_word_swap` (byte swap within each word) first.
    pub fn decode_string(&self, bytes: &[u8], encoding: StringEncoding) -> String {
        let transcoded = Self::swap_string_words(bytes, self.string_word_swap);
        match encoding {
            StringEncoding::Ascii => transcoded
                .into_iter()
                .take_while(|&b| b != 0)
                .map(|b| b as char)
                .collect(),
            StringEncoding::Unicode => {
                let units: Vec<u16> = transcoded
                    .chunks_exact(2)
                    .map(|w| u16::from_le_bytes([w[0], w[1]]))
                    .take_while(|&u| u != 0)
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }

    /// Encodes `s` into raw bytes, applying padding rules from §4.2:
    /// the byte array is padded to an even length (and, when `fixed_len`
    /// is given, to that exact word-aligned length: zero-filled if short,
    /// truncated if long), then `string_word_swap` is applied.
    pub fn encode_string(
        &self,
        s: &str,
        encoding: StringEncoding,
        fixed_len: Option<usize>,
    ) -> Vec<u8> {
        let mut bytes = match encoding {
            StringEncoding::Ascii => s.chars().map(|c| c as u8).collect::<Vec<u8>>(),
            StringEncoding::Unicode => {
                let mut out = Vec::with_capacity(s.len() * 2);
                for unit in s.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                out
            }
        };

        if let Some(len) = fixed_len {
            bytes.resize(len, 0);
        }
        if bytes.len() % 2 != 0 {
            bytes.push(0);
        }

        Self::swap_string_words(&bytes, self.string_word_swap)
    }

    fn swap_string_words(bytes: &[u8], swap: bool) -> Vec<u8> {
        if !swap {
            return bytes.to_vec();
        }
        let mut out = Vec::with_capacity(bytes.len());
        for chunk in bytes.chunks(2) {
            if chunk.len() == 2 {
                out.push(chunk[1]);
                out.push(chunk[0]);
            } else {
                out.push(chunk[0]);
            }
        }
        out
    }
}

/// Packs a bit array LSB-first, 8 bits per byte, zero-padding the final byte.
pub fn pack_bools(bits: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    out
}

/// Unpacks exactly `len` LSB-first bits from `bytes`, truncating any
/// trailing padding bits.
pub fn unpack_bools(bytes: &[u8], len: usize) -> Vec<bool> {
    (0..len)
        .map(|i| {
            let byte = bytes[i / 8];
            (byte >> (i % 8)) & 0x01 != 0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_flag_combinations() -> Vec<ByteTransform> {
        let mut out = Vec::new();
        for word_swap in [false, true] {
            for multi_word_swap in [false, true] {
                out.push(ByteTransform::new(word_swap, multi_word_swap, false));
            }
        }
        out
    }

    #[test]
    fn scenario_word_swap_true_reads_0x3412() {
        let t = ByteTransform::new(true, false, false);
        assert_eq!(t.decode_u16(&[0x12, 0x34]), 0x3412);
    }

    #[test]
    fn scenario_word_swap_false_reads_0x1234() {
        let t = ByteTransform::new(false, false, false);
        assert_eq!(t.decode_u16(&[0x12, 0x34]), 0x1234);
    }

    #[test]
    fn round_trip_u16() {
        for t in all_flag_combinations() {
            let bytes = t.encode_u16(0xBEEF);
            assert_eq!(t.decode_u16(&bytes), 0xBEEF);
        }
    }

    #[test]
    fn round_trip_i32() {
        for t in all_flag_combinations() {
            let bytes = t.encode_i32(-123456);
            assert_eq!(t.decode_i32(&bytes), -123456);
        }
    }

    #[test]
    fn round_trip_u64() {
        for t in all_flag_combinations() {
            let bytes = t.encode_u64(0x0123_4567_89AB_CDEF);
            assert_eq!(t.decode_u64(&bytes), 0x0123_4567_89AB_CDEF);
        }
    }

    #[test]
    fn round_trip_f32_f64() {
        for t in all_flag_combinations() {
            let f32_bytes = t.encode_f32(123.456);
            assert!((t.decode_f32(&f32_bytes) - 123.456).abs() < f32::EPSILON);

            let f64_bytes = t.encode_f64(-987.654321);
            assert!((t.decode_f64(&f64_bytes) + 987.654321).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn decode_u32_big_endian_swap_matches_known_vector() {
        // CDAB word order: registers swapped relative to straight big-endian.
        let t = ByteTransform::new(false, true, false);
        let bytes = [0x56, 0x78, 0x12, 0x34];
        assert_eq!(t.decode_u32(&bytes), 0x1234_5678);
    }

    #[test]
    fn string_round_trip_ascii_and_unicode() {
        for swap in [false, true] {
            let t = ByteTransform::new(true, false, swap);
            let encoded = t.encode_string("hello!", StringEncoding::Ascii, None);
            assert_eq!(t.decode_string(&encoded, StringEncoding::Ascii), "hello!");

            let encoded = t.encode_string("héllo", StringEncoding::Unicode, None);
            assert_eq!(t.decode_string(&encoded, StringEncoding::Unicode), "héllo");
        }
    }

    #[test]
    fn string_fixed_length_pads_and_truncates() {
        let t = ByteTransform::new(false, false, false);
        let padded = t.encode_string("hi", StringEncoding::Ascii, Some(8));
        assert_eq!(padded.len(), 8);
        assert_eq!(&padded[..2], b"hi");
        assert!(padded[2..].iter().all(|&b| b == 0));

        let truncated = t.encode_string("a very long string", StringEncoding::Ascii, Some(4));
        assert_eq!(truncated.len(), 4);
        assert_eq!(&truncated, b"a ve");
    }

    #[test]
    fn bool_pack_unpack_round_trip_with_padding() {
        let bits = vec![true, false, true, true, false, false, false, false, true];
        let packed = pack_bools(&bits);
        assert_eq!(packed.len(), 2);
        let unpacked = unpack_bools(&packed, bits.len());
        assert_eq!(unpacked, bits);
    }

    #[test]
    fn bool_pack_lsb_first() {
        let bits = vec![true, false, false, false, false, false, false, false];
        let packed = pack_bools(&bits);
        assert_eq!(packed, vec![0b0000_0001]);
    }
}
