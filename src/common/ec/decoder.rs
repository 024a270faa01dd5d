use super::{encoder::Block, galois::G};

// Rectifier
//------------------------------------------------------------------------------

impl Block {
    /// Corrects up to ec_len / 2 erroneous codewords in place. Returns the data
    /// codewords, or None if the block holds more errors than it can correct.
    pub fn rectify(&mut self) -> Option<&[u8]> {
        // Compute syndromes
        let synd = match self.syndromes() {
            Ok(()) => return Some(self.data()),
            Err(s) => s,
        };

        // Error locator polynomial
        let (sig, err_cnt) = berlekamp_massey(&synd);
        let err_loc = self.chien_search(&sig);
        if err_loc.len() != err_cnt {
            return None;
        }

        // Sigma derivative
        let dsig: Vec<G> = sig.iter().skip(1).step_by(2).flat_map(|&s| [s, G(0)]).collect();

        // Error evaluator
        let omg = omega(&synd, &sig);

        // Rectify errors by XORing data with magnitude
        let len = self.len();
        for e in err_loc {
            let x = G::gen_pow(e);
            let xinv = G::gen_pow(255 - e);
            let mag = x * eval_poly(&omg, xinv) / eval_poly(&dsig, xinv);
            self.data[len - 1 - e] = (G(self.data[len - 1 - e]) + mag).into();
        }

        match self.syndromes() {
            Ok(()) => Some(self.data()),
            Err(_) => None,
        }
    }

    fn syndromes(&self) -> Result<(), Vec<G>> {
        let poly: Vec<G> = self.full().iter().rev().map(|&b| G(b)).collect();
        let synd: Vec<G> = (0..self.ec_len()).map(|i| eval_poly(&poly, G::gen_pow(i))).collect();

        if synd.iter().all(|&s| s.0 == 0) {
            Ok(())
        } else {
            Err(synd)
        }
    }

    // Degrees e where sigma(α^-e) is zero
    fn chien_search(&self, sig: &[G]) -> Vec<usize> {
        (0..self.len()).filter(|&e| eval_poly(sig, G::gen_pow(255 - e)).0 == 0).collect()
    }
}

// Sigma polynomial along with its degree
fn berlekamp_massey(synd: &[G]) -> (Vec<G>, usize) {
    let deg = synd.len();
    let mut l = 0usize;
    let mut m = 1usize;
    let mut b = G(1);
    let mut cx = vec![G(0); deg + 1];
    let mut bx = vec![G(0); deg + 1];
    cx[0] = G(1);
    bx[0] = G(1);

    for n in 0..deg {
        // Calculate discrepancy
        let mut d = synd[n];
        for i in 1..=l {
            d += cx[i] * synd[n - i];
        }

        if d.0 == 0 {
            m += 1;
            continue;
        }

        let tx = cx.clone();
        let scale = d / b;
        for i in 0..=deg - m {
            cx[i + m] += scale * bx[i];
        }

        if 2 * l <= n {
            bx = tx;
            l = n + 1 - l;
            b = d;
            m = 1;
        } else {
            m += 1;
        }
    }
    (cx, l)
}

// Error evaluator polynomial: synd * sigma mod x^ec_len
fn omega(synd: &[G], sig: &[G]) -> Vec<G> {
    let deg = synd.len();
    let mut omg = vec![G(0); deg];
    for (i, &s) in synd.iter().enumerate() {
        for (j, &c) in sig.iter().take(deg - i).enumerate() {
            omg[i + j] += s * c;
        }
    }
    omg
}

// Evaluates polynomial with coefficients in ascending order of degree
fn eval_poly(poly: &[G], x: G) -> G {
    let mut res = G(0);
    let mut xpow = G(1);
    for &coeff in poly {
        res += coeff * xpow;
        xpow *= x;
    }
    res
}

#[cfg(test)]
mod ec_rectifier_tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use test_case::test_case;

    use super::super::{encoder::Block, generator_polynomial};

    #[test_case(&[32, 91, 11, 45, 89, 123, 77, 44, 56, 99, 202], &[32, 91, 11, 45, 89, 46, 77, 44, 56, 99, 202])]
    #[test_case(&[32, 91, 11, 45, 89, 123, 77, 44, 56, 99, 202], &[32, 91, 11, 45, 89, 46, 77, 44, 56, 99, 249])]
    fn test_rectifier(data: &[u8], bad: &[u8]) {
        let mut blk = Block::new(data, &generator_polynomial(4));
        blk.full_mut()[..11].copy_from_slice(bad);
        let rect = blk.rectify();
        assert_eq!(rect, Some(data));
    }

    #[test]
    fn test_rectifier_ecc_errors() {
        let data = [16, 32, 12, 86, 97, 128, 236, 17, 236, 17, 236, 17, 236, 17, 236, 17];
        let mut blk = Block::new(&data, &generator_polynomial(10));
        blk.full_mut()[16] ^= 0xFF;
        blk.full_mut()[25] ^= 0x01;
        blk.full_mut()[3] ^= 0x42;
        assert_eq!(blk.rectify(), Some(&data[..]));
    }

    #[test_case(&[32, 91, 11, 45, 89, 123, 77, 44, 56, 99, 202], &[138, 91, 161, 45, 243, 46, 231, 44, 146, 99, 202])]
    fn test_rectifier_fail(data: &[u8], bad: &[u8]) {
        let mut blk = Block::new(data, &generator_polynomial(4));
        blk.full_mut()[..11].copy_from_slice(bad);
        assert_ne!(blk.rectify(), Some(data));
    }

    proptest! {
        #[test]
        fn proptest_rectify_within_capacity(
            data in prop::collection::vec(any::<u8>(), 1..=60),
            ecc_count in prop::sample::select(vec![7usize, 10, 13, 15, 18, 22, 26, 30]),
            errors in prop::collection::vec((any::<prop::sample::Index>(), 1..=255u8), 0..=15),
        ) {
            let mut blk = Block::new(&data, &generator_polynomial(ecc_count));
            let len = blk.len();

            // Distinct positions, at most half the ecc count
            let errors: BTreeMap<usize, u8> =
                errors.into_iter().map(|(i, e)| (i.index(len), e)).collect();
            for (&pos, &err) in errors.iter().take(ecc_count / 2) {
                blk.full_mut()[pos] ^= err;
            }

            prop_assert_eq!(blk.rectify(), Some(&data[..]));
        }
    }
}
