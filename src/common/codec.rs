use std::cmp::Ordering;

pub use encode::*;

use super::metadata::Version;

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
}

impl PartialOrd for Mode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mode {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (a, b) if a == b => Ordering::Equal,
            (Self::Numeric, _) | (_, Self::Byte) => Ordering::Less,
            (_, Self::Numeric) | (Self::Byte, _) => Ordering::Greater,
            _ => unreachable!(),
        }
    }
}

impl Mode {
    pub const MODE_INDICATOR_BITS: usize = 4;

    /// Narrowest mode whose alphabet holds every byte of `data`. Empty data is
    /// encoded in byte mode.
    pub fn select(data: &[u8]) -> Self {
        if data.is_empty() {
            return Self::Byte;
        }
        MODES
            .iter()
            .copied()
            .find(|m| m.contains_all(data))
            .unwrap_or(Self::Byte)
    }

    #[inline]
    fn numeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Numeric.contains(char), "Invalid numeric data: {char}");
        (char - b'0') as u16
    }

    #[inline]
    fn alphanumeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Alphanumeric.contains(char), "Invalid alphanumeric data: {char}");
        match char {
            b'0'..=b'9' => (char - b'0') as u16,
            b'A'..=b'Z' => (char - b'A' + 10) as u16,
            b' ' => 36,
            b'$' => 37,
            b'%' => 38,
            b'*' => 39,
            b'+' => 40,
            b'-' => 41,
            b'.' => 42,
            b'/' => 43,
            b':' => 44,
            _ => unreachable!("Invalid alphanumeric {char}"),
        }
    }

    pub fn encode_chunk(&self, data: &[u8]) -> u16 {
        let len = data.len();
        match self {
            Self::Numeric => {
                debug_assert!(len <= 3, "Data is too long for numeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 10 + Self::numeric_digit(*b))
            }
            Self::Alphanumeric => {
                debug_assert!(len <= 2, "Data is too long for alphanumeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 45 + Self::alphanumeric_digit(*b))
            }
            Self::Byte => {
                debug_assert!(len == 1, "Data is too long for byte conversion: {len}");
                data[0] as u16
            }
        }
    }

    pub fn contains(&self, byte: u8) -> bool {
        match self {
            Self::Numeric => byte.is_ascii_digit(),
            Self::Alphanumeric => {
                matches!(byte, b'0'..=b'9' | b'A'..=b'Z' | b' ' | b'$' | b'%' | b'*' | b'+' | b'-' | b'.' | b'/' | b':')
            }
            Self::Byte => true,
        }
    }

    pub fn contains_all(&self, data: &[u8]) -> bool {
        data.iter().all(|&b| self.contains(b))
    }

    /// Bit length of `len` characters packed in this mode, without header
    pub fn encoded_len(&self, len: usize) -> usize {
        match *self {
            Self::Numeric => (len * 10 + 2) / 3,
            Self::Alphanumeric => (len * 11 + 1) / 2,
            Self::Byte => len * 8,
        }
    }

    pub fn char_cnt_bits(&self, ver: Version) -> usize {
        let range = match *ver {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        let mode = match self {
            Self::Numeric => 0,
            Self::Alphanumeric => 1,
            Self::Byte => 2,
        };
        CHAR_CNT_BITS[range][mode]
    }
}


// Segment
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment<'a> {
    mode: Mode,
    len_bits: usize, // Bit len of char count
    data: &'a [u8],  // Reference to raw data
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, ver: Version, data: &'a [u8]) -> Self {
        Self { mode, len_bits: mode.char_cnt_bits(ver), data }
    }

    pub fn bit_len(&self) -> usize {
        let encoded_bits = self.mode.encoded_len(self.data.len());
        Mode::MODE_INDICATOR_BITS + self.len_bits + encoded_bits
    }

    // Char count must fit its indicator
    pub fn fits_char_count(&self) -> bool {
        self.data.len() < (1 << self.len_bits)
    }
}


// Writer for encoded data
//------------------------------------------------------------------------------

mod writer {
    use crate::common::{bitstream::BitStream, metadata::PADDING_CODEWORDS};

    use super::{Mode, Segment};

    pub fn push_segment(seg: Segment, out: &mut BitStream) {
        push_header(&seg, out);
        match seg.mode {
            Mode::Numeric => push_numeric_data(seg.data, out),
            Mode::Alphanumeric => push_alphanumeric_data(seg.data, out),
            Mode::Byte => push_byte_data(seg.data, out),
        }
    }

    fn push_header(seg: &Segment, out: &mut BitStream) {
        out.push_bits(seg.mode as u8, Mode::MODE_INDICATOR_BITS);
        let char_cnt = seg.data.len();
        debug_assert!(
            seg.fits_char_count(),
            "Char count exceeds bit length: Char count {char_cnt}, Char count bits {}",
            seg.len_bits
        );
        out.push_bits(char_cnt as u16, seg.len_bits);
    }

    fn push_numeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(3) {
            let len = Mode::Numeric.encoded_len(chunk.len());
            let data = Mode::Numeric.encode_chunk(chunk);
            out.push_bits(data, len);
        }
    }

    fn push_alphanumeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(2) {
            let len = Mode::Alphanumeric.encoded_len(chunk.len());
            let data = Mode::Alphanumeric.encode_chunk(chunk);
            out.push_bits(data, len);
        }
    }

    fn push_byte_data(data: &[u8], out: &mut BitStream) {
        out.extend(data);
    }

    pub fn push_terminator(out: &mut BitStream) {
        let term_len = std::cmp::min(4, out.remaining());
        out.push_bits(0u8, term_len);
    }

    pub fn pad_remaining_capacity(out: &mut BitStream) {
        push_padding_bits(out);
        push_padding_codewords(out);
    }

    fn push_padding_bits(out: &mut BitStream) {
        let offset = out.len() & 7;
        if offset > 0 {
            let padding_bits_len = 8 - offset;
            out.push_bits(0u8, padding_bits_len);
        }
    }

    fn push_padding_codewords(out: &mut BitStream) {
        let offset = out.len() & 7;
        debug_assert!(
            offset == 0,
            "Bit offset should be zero before padding codewords: {}",
            offset
        );

        let remain_byte_capacity = out.remaining() >> 3;
        PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
            out.push_bits(pc, 8);
        });
    }

}

// Encoder
//------------------------------------------------------------------------------

mod encode {
    use crate::common::{
        bitstream::BitStream,
        error::{QRError, QRResult},
        metadata::{ECLevel, Version},
    };

    use super::{
        writer::{pad_remaining_capacity, push_segment, push_terminator},
        Mode, Segment,
    };

    /// Encodes `data` into the data codewords of the smallest version that holds
    /// it at `ecl`. Returns the codewords as a full bit stream, along with the
    /// chosen version and mode.
    pub fn encode(
        data: &[u8],
        ecl: ECLevel,
        mode: Option<Mode>,
    ) -> QRResult<(BitStream, Version, Mode)> {
        let mode = resolve_mode(data, mode)?;
        let ver = find_min_version(data, ecl, mode)?;
        let bs = structure_message(data, ecl, ver, mode);
        Ok((bs, ver, mode))
    }

    pub fn encode_with_version(
        data: &[u8],
        ecl: ECLevel,
        ver: Version,
        mode: Option<Mode>,
    ) -> QRResult<(BitStream, Mode)> {
        let mode = resolve_mode(data, mode)?;
        if !fits(data, ecl, ver, mode) {
            return Err(QRError::CapacityExceeded);
        }
        let bs = structure_message(data, ecl, ver, mode);
        Ok((bs, mode))
    }

    fn resolve_mode(data: &[u8], mode: Option<Mode>) -> QRResult<Mode> {
        match mode {
            Some(m) if m.contains_all(data) => Ok(m),
            Some(_) => Err(QRError::UnsupportedMode),
            None => Ok(Mode::select(data)),
        }
    }

    fn fits(data: &[u8], ecl: ECLevel, ver: Version, mode: Mode) -> bool {
        let seg = Segment::new(mode, ver, data);
        seg.fits_char_count() && seg.bit_len() <= ver.data_bit_capacity(ecl)
    }

    fn find_min_version(data: &[u8], ecl: ECLevel, mode: Mode) -> QRResult<Version> {
        Version::all().find(|&v| fits(data, ecl, v, mode)).ok_or(QRError::CapacityExceeded)
    }

    fn structure_message(data: &[u8], ecl: ECLevel, ver: Version, mode: Mode) -> BitStream {
        let bit_capacity = ver.data_bit_capacity(ecl);
        let mut bs = BitStream::new(bit_capacity);
        push_segment(Segment::new(mode, ver, data), &mut bs);
        log::trace!("Packed {} payload bits of {bit_capacity}", bs.len());

        push_terminator(&mut bs);
        pad_remaining_capacity(&mut bs);
        debug_assert_eq!(
            bs.data().len(),
            ver.data_codewords(ecl),
            "Structured message length differs from data codeword capacity"
        );
        bs
    }

}

// Global constants
//------------------------------------------------------------------------------

static MODES: [Mode; 3] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];

// Indexed by version range (1-9, 10-26, 27-40), then mode
static CHAR_CNT_BITS: [[usize; 3]; 3] = [[10, 9, 8], [12, 11, 16], [14, 13, 16]];
