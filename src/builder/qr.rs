use std::ops::Deref;

use crate::common::{
    bitstream::BitStream,
    codec::Mode,
    error::{QRError, QRResult},
    iter::EncRegionIter,
    mask::MaskPattern,
    metadata::*,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

impl Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Empty => &Color::Light,
            Module::Func(c) => c,
            Module::Version(c) => c,
            Module::Format(c) => c,
            Module::Data(c) => c,
        }
    }
}

/// Module matrix of a QR symbol. Rows and columns are indexed from the top left
/// corner. Negative indices wrap around from the bottom or right edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QR {
    grid: Vec<Module>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mode: Mode,
    mask: Option<MaskPattern>,
}

// QR type for builder
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn new(ver: Version, ecl: ECLevel, mode: Mode) -> Self {
        let w = ver.width();
        Self { grid: vec![Module::Empty; w * w], w, ver, ecl, mode, mask: None }
    }

    pub fn grid(&self) -> &[Module] {
        &self.grid
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&m| matches!(**m, Color::Dark)).count()
    }

    pub fn is_dark(&self, r: i16, c: i16) -> bool {
        *self.get(r, c) == Color::Dark
    }

    /// True for finder, separator, timing, alignment, dark module, format and
    /// version modules.
    pub fn is_function(&self, r: i16, c: i16) -> bool {
        matches!(self.get(r, c), Module::Func(_) | Module::Format(_) | Module::Version(_))
    }

    /// Row major grid of booleans, true for dark modules
    pub fn to_bool_grid(&self) -> Vec<Vec<bool>> {
        self.grid
            .chunks(self.w)
            .map(|row| row.iter().map(|m| **m == Color::Dark).collect())
            .collect()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.w as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Func(Color::Dark) => 'f',
                    Module::Func(Color::Light) => 'F',
                    Module::Version(Color::Dark) => 'v',
                    Module::Version(Color::Light) => 'V',
                    Module::Format(Color::Dark) => 'm',
                    Module::Format(Color::Light) => 'M',
                    Module::Data(Color::Dark) => 'd',
                    Module::Data(Color::Light) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        debug_assert!(-w <= r && r < w, "Row {r} out of bounds for width {w}");
        debug_assert!(-w <= c && c < w, "Column {c} out of bounds for width {w}");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as _
    }

    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub(crate) fn get_mut(&mut self, r: i16, c: i16) -> &mut Module {
        let index = self.coord_to_index(r, c);
        &mut self.grid[index]
    }

    pub(crate) fn set(&mut self, r: i16, c: i16, module: Module) {
        *self.get_mut(r, c) = module;
    }
}


// Finder pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    // Draws the 7x7 pattern centered at (r, c) with its separator on the inner sides
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_top, dr_bottom) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_left, dc_right) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_top..=dr_bottom {
            for j in dc_left..=dc_right {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (4 | -4, _) | (_, 4 | -4) => Module::Func(Color::Light),
                        (3 | -3, _) | (_, 3 | -3) => Module::Func(Color::Dark),
                        (2 | -2, _) | (_, 2 | -2) => Module::Func(Color::Light),
                        _ => Module::Func(Color::Dark),
                    },
                );
            }
        }
    }
}


// Timing pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_timing_pattern(&mut self) {
        let w = self.w as i16;
        let (off, last) = (TIMING_LINE, w - 9);
        self.draw_line(off, 8, off, last);
        self.draw_line(8, off, last, off);
    }

    fn draw_line(&mut self, r1: i16, c1: i16, r2: i16, c2: i16) {
        debug_assert!(r1 == r2 || c1 == c2, "Line is neither vertical nor horizontal");

        if r1 == r2 {
            for j in c1..=c2 {
                self.set(r1, j, Module::Func(Color::from(j & 1 == 0)));
            }
        } else {
            for i in r1..=r2 {
                self.set(i, c1, Module::Func(Color::from(i & 1 == 0)));
            }
        }
    }
}


// Alignment pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_alignment_patterns(&mut self) {
        let poses = self.ver.alignment_pattern();
        for &r in poses {
            for &c in poses {
                self.draw_alignment_pattern_at(r, c)
            }
        }
    }

    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.w as i16;
        // Overlaps a finder pattern
        if (r == 6 && (c == 6 || c - w == -7)) || (r - w == -7 && c == 6) {
            return;
        }
        for i in -2..=2 {
            for j in -2..=2 {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (-2 | 2, _) | (_, -2 | 2) | (0, 0) => Module::Func(Color::Dark),
                        _ => Module::Func(Color::Light),
                    },
                )
            }
        }
    }
}


// All function patterns
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_pattern();
        self.draw_alignment_patterns();
        self.draw_dark_module();
    }

    fn draw_dark_module(&mut self) {
        self.set(-8, 8, Module::Func(Color::Dark));
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl QR {
    fn reserve_format_area(&mut self) {
        self.draw_format_info(0);
    }

    fn reserve_version_area(&mut self) {
        if *self.ver >= 7 {
            self.draw_version_info(0);
        }
    }

    /// Writes format information for the applied mask, and version information
    /// from version 7 on. A no-op for format information when no mask is set.
    pub(crate) fn embed_metadata(&mut self) {
        if let Some(mask) = self.mask {
            self.draw_format_info(format_info(self.ecl, mask));
        }
        if *self.ver >= 7 {
            self.draw_version_info(self.ver.info());
        }
    }

    fn draw_format_info(&mut self, format_info: u32) {
        for coords in [&FORMAT_INFO_COORDS_QR_MAIN, &FORMAT_INFO_COORDS_QR_SIDE] {
            self.draw_number(
                format_info,
                FORMAT_INFO_BIT_LEN,
                Module::Format(Color::Light),
                Module::Format(Color::Dark),
                coords,
            );
        }
    }

    fn draw_version_info(&mut self, ver_info: u32) {
        for coords in [&VERSION_INFO_COORDS_BL, &VERSION_INFO_COORDS_TR] {
            self.draw_number(
                ver_info,
                VERSION_INFO_BIT_LEN,
                Module::Version(Color::Light),
                Module::Version(Color::Dark),
                coords,
            );
        }
    }

    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        off_clr: Module,
        on_clr: Module,
        coords: &[(i16, i16)],
    ) {
        let mut mask = 1 << (bit_len - 1);
        for (r, c) in coords {
            if number & mask == 0 {
                self.set(*r, *c, off_clr);
            } else {
                self.set(*r, *c, on_clr);
            }
            mask >>= 1;
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_encoding_region(&mut self, payload: BitStream) -> QRResult<()> {
        self.reserve_format_area();
        self.reserve_version_area();
        self.draw_payload(payload)?;

        debug_assert!(!self.grid.contains(&Module::Empty), "Empty module found after drawing");
        Ok(())
    }

    fn draw_payload(&mut self, payload: BitStream) -> QRResult<()> {
        let mut coords = EncRegionIter::new(self.ver);
        for bit in payload {
            let (r, c) = self.next_empty(&mut coords).ok_or(QRError::MatrixOverflow)?;
            self.set(r, c, Module::Data(Color::from(bit)));
        }
        self.fill_remainder_bits(coords)
    }

    fn next_empty(&self, coords: &mut EncRegionIter) -> Option<(i16, i16)> {
        coords.find(|&(r, c)| self.get(r, c) == Module::Empty)
    }

    fn fill_remainder_bits(&mut self, mut coords: EncRegionIter) -> QRResult<()> {
        let mut n = 0;
        while let Some((r, c)) = self.next_empty(&mut coords) {
            self.set(r, c, Module::Data(Color::Light));
            n += 1;
        }
        match n.cmp(&self.ver.remainder_bits()) {
            std::cmp::Ordering::Less => Err(QRError::MatrixOverflow),
            std::cmp::Ordering::Greater => Err(QRError::MatrixUnderflow),
            std::cmp::Ordering::Equal => Ok(()),
        }
    }

    /// Flips data modules where the mask function holds. Any previously applied
    /// mask is expected to be undone by the caller.
    pub(crate) fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask = Some(pattern);
        let mask_fn = pattern.mask_function();
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                if mask_fn(r, c) {
                    if let Module::Data(clr) = self.get(r, c) {
                        self.set(r, c, Module::Data(!clr))
                    }
                }
            }
        }
    }
}


// Global constants
//------------------------------------------------------------------------------

const TIMING_LINE: i16 = 6;
