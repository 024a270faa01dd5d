use std::fmt::{Display, Formatter};
use std::ops::Deref;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::error::{QRError, QRResult};
use super::metadata::Color;
use crate::builder::QR;

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> QRResult<Self> {
        if pattern < 8 {
            Ok(Self(pattern))
        } else {
            Err(QRError::InvalidMaskPattern)
        }
    }

    pub fn all() -> impl Iterator<Item = MaskPattern> {
        (0..8).map(MaskPattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for MaskPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        ((r * c) & 1) + ((r * c) % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        (((r * c) & 1) + ((r * c) % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        (((r + c) & 1) + ((r * c) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_function(self) -> fn(i16, i16) -> bool {
        match *self {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!("Invalid mask pattern {}", self.0),
        }
    }
}


// Mask selection
//------------------------------------------------------------------------------

/// Scores every mask on its own copy of `qr`, then applies the lowest scoring
/// one to `qr`. Ties go to the smallest mask id.
pub fn apply_best_mask(qr: &mut QR) -> (MaskPattern, u32) {
    let score = |m: MaskPattern| {
        let mut candidate = qr.clone();
        candidate.apply_mask(m);
        candidate.embed_metadata();
        let pen = compute_total_penalty(&candidate);
        log::trace!("Mask {} scored {pen}", *m);
        (pen, m)
    };

    let first = score(MaskPattern(0));

    #[cfg(feature = "parallel")]
    let rest: Vec<(u32, MaskPattern)> =
        MaskPattern::all().skip(1).collect::<Vec<_>>().into_par_iter().map(score).collect();

    #[cfg(not(feature = "parallel"))]
    let rest: Vec<(u32, MaskPattern)> = MaskPattern::all().skip(1).map(score).collect();

    let (pen, best_mask) = rest.into_iter().fold(first, std::cmp::min);

    qr.apply_mask(best_mask);
    (best_mask, pen)
}

pub fn compute_total_penalty(qr: &QR) -> u32 {
    let adj_pen = compute_adjacent_penalty(qr);
    let blk_pen = compute_block_penalty(qr);
    let fp_pen_h = compute_finder_pattern_penalty(qr, true);
    let fp_pen_v = compute_finder_pattern_penalty(qr, false);
    let bal_pen = compute_balance_penalty(qr);
    adj_pen + blk_pen + fp_pen_h + fp_pen_v + bal_pen
}

// Rule 1: runs of 5 or more same colored modules in a row or column
fn compute_adjacent_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i16;
    let mut pen = 0;
    for i in 0..w {
        pen += compute_run_penalty((0..w).map(|j| *qr.get(i, j)));
        pen += compute_run_penalty((0..w).map(|j| *qr.get(j, i)));
    }
    pen
}

fn compute_run_penalty(line: impl Iterator<Item = Color>) -> u32 {
    let mut pen = 0;
    let mut prev = None;
    let mut run_len = 0;
    for clr in line {
        if prev == Some(clr) {
            run_len += 1;
        } else {
            prev = Some(clr);
            run_len = 1;
        }
        match run_len {
            5 => pen += 3,
            6.. => pen += 1,
            _ => {}
        }
    }
    pen
}

// Rule 2: 2x2 blocks of same colored modules
fn compute_block_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let clr = *qr.get(r, c);
            if clr == *qr.get(r + 1, c) && clr == *qr.get(r, c + 1) && clr == *qr.get(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// Rule 3: 1:1:3:1:1 finder-like patterns with 4 light modules on either side.
// Modules beyond the symbol edge belong to the quiet zone and count as light.
fn compute_finder_pattern_penalty(qr: &QR, is_hor: bool) -> u32 {
    use Color::{Dark as D, Light as L};
    static PATTERN_LEAD: [Color; 11] = [L, L, L, L, D, L, D, D, D, L, D];
    static PATTERN_TRAIL: [Color; 11] = [D, L, D, D, D, L, D, L, L, L, L];

    let mut pen = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        let get = |j: i16| -> Color {
            if j < 0 || j >= w {
                Color::Light
            } else if is_hor {
                *qr.get(i, j)
            } else {
                *qr.get(j, i)
            }
        };
        for j in -4..w - 6 {
            let window = (j..j + 11).map(get);
            if window.clone().eq(PATTERN_LEAD.iter().copied()) {
                pen += 40;
            }
            if window.eq(PATTERN_TRAIL.iter().copied()) {
                pen += 40;
            }
        }
    }
    pen
}

// Rule 4: deviation of the dark module ratio from 50%, in whole 5% steps
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark = qr.count_dark_modules();
    let w = qr.width();
    let total = w * w;
    let dev = (dark * 100).abs_diff(total * 50);
    (dev / (total * 5) * 10) as u32
}
