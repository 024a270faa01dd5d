use super::metadata::Version;

// Iterator for placing data in encoding region of QR
//------------------------------------------------------------------------------

/// Walks the symbol in 2 column strips from the bottom right corner, alternating
/// upward and downward, right column before left. The vertical timing column
/// is skipped. Function modules are yielded too and must be skipped by callers.
pub struct EncRegionIter {
    width: i16,
    // Right column of current strip
    right: i16,
    // Steps taken along the strip
    vert: i16,
    // 0 for right column, 1 for left
    j: i16,
}

impl EncRegionIter {
    pub const fn new(version: Version) -> Self {
        let w = version.width() as i16;
        Self { width: w, right: w - 1, vert: 0, j: 0 }
    }
}

impl Iterator for EncRegionIter {
    type Item = (i16, i16);
    fn next(&mut self) -> Option<Self::Item> {
        if self.right < 1 {
            return None;
        }

        let c = self.right - self.j;
        let upward = (self.right + 1) & 2 == 0;
        let r = if upward { self.width - 1 - self.vert } else { self.vert };

        self.j += 1;
        if self.j == 2 {
            self.j = 0;
            self.vert += 1;
            if self.vert == self.width {
                self.vert = 0;
                self.right -= 2;
                if self.right == VERT_TIMING_COL {
                    self.right -= 1;
                }
            }
        }

        Some((r, c))
    }
}


// Global constants
//------------------------------------------------------------------------------

const VERT_TIMING_COL: i16 = 6;
