use std::ops::{Add, AddAssign, Div, Mul, MulAssign};

// Galois field element of GF(256) over x^8 + x^4 + x^3 + x^2 + 1, with α = 2
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct G(pub u8);

impl G {
    pub fn gen_pow(i: usize) -> Self {
        Self(EXP_TABLE[i % 255])
    }

    pub fn log(self) -> usize {
        debug_assert!(self.0 != 0, "Log of zero is undefined");
        LOG_TABLE[self.0 as usize] as usize
    }
}

impl From<G> for u8 {
    fn from(g: G) -> Self {
        g.0
    }
}

impl Add for G {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul for G {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.0 == 0 || rhs.0 == 0 {
            return Self(0);
        }
        Self::gen_pow(self.log() + rhs.log())
    }
}

impl MulAssign for G {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for G {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        debug_assert!(rhs.0 != 0, "Division by zero");
        if self.0 == 0 {
            return Self(0);
        }
        Self::gen_pow(self.log() + 255 - rhs.log())
    }
}


// Global constants
//------------------------------------------------------------------------------

const PRIMITIVE_POLYNOMIAL: u16 = 0b1_0001_1101;

static EXP_TABLE: [u8; 256] = build_exp_table();

static LOG_TABLE: [u8; 256] = build_log_table();

const fn build_exp_table() -> [u8; 256] {
    let mut table = [0; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 256 {
        table[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLYNOMIAL;
        }
        i += 1;
    }
    table
}

const fn build_log_table() -> [u8; 256] {
    let exp = build_exp_table();
    let mut table = [0; 256];
    let mut i = 0;
    while i < 255 {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}
