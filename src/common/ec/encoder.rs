use super::galois::G;
use crate::common::{
    error::{QRError, QRResult},
    metadata::{ECLevel, Version},
};

// Block
//------------------------------------------------------------------------------

/// Data codewords of one block followed by their error correction codewords
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct Block {
    pub(super) data: Vec<u8>,
    // Data length
    pub(super) dlen: usize,
}

impl Block {
    pub fn new(raw: &[u8], gen_poly: &[G]) -> Self {
        let mut block = Self { data: raw.to_vec(), dlen: raw.len() };
        let ecc = ecc_per_block(raw, gen_poly);
        block.data.extend(ecc);
        block
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[cfg(test)]
    pub fn ec_len(&self) -> usize {
        self.len() - self.dlen
    }

    #[cfg(test)]
    pub fn full(&self) -> &[u8] {
        &self.data
    }

    #[cfg(test)]
    pub fn full_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlen]
    }

    pub fn ecc(&self) -> &[u8] {
        &self.data[self.dlen..]
    }
}

// ECC: Error Correction Codeword generator
//------------------------------------------------------------------------------

pub(crate) fn ecc(data: &[u8], ver: Version, ecl: ECLevel) -> QRResult<Vec<Block>> {
    let data_blocks = blockify(data, ver, ecl)?;
    let gen_poly = generator_polynomial(ver.ecc_per_block(ecl));
    Ok(data_blocks.into_iter().map(|b| Block::new(b, &gen_poly)).collect())
}

pub(crate) fn blockify(data: &[u8], ver: Version, ecl: ECLevel) -> QRResult<Vec<&[u8]>> {
    let (block1_size, block1_count, block2_size, block2_count) =
        ver.data_codewords_per_block(ecl)?;

    let total_blocks = block1_count + block2_count;
    let total_block1_size = block1_size * block1_count;
    let total_size = total_block1_size + block2_size * block2_count;

    if total_size != data.len() {
        return Err(QRError::InvalidBlockLayout);
    }

    let mut data_blocks = Vec::with_capacity(total_blocks);
    data_blocks.extend(data[..total_block1_size].chunks(block1_size));
    if block2_size > 0 {
        data_blocks.extend(data[total_block1_size..].chunks(block2_size));
    }
    Ok(data_blocks)
}

/// Coefficients of (x - α^0)(x - α^1)...(x - α^(n-1)), highest degree first
pub(crate) fn generator_polynomial(ecc_count: usize) -> Vec<G> {
    let mut poly = Vec::with_capacity(ecc_count + 1);
    poly.push(G(1));
    for i in 0..ecc_count {
        let root = G::gen_pow(i);
        poly.push(G(0));
        for j in (1..poly.len()).rev() {
            let prev = poly[j - 1];
            poly[j] += prev * root;
        }
    }
    poly
}

// Performs polynomial long division with data polynomial(num)
// and generator polynomial(den) to compute remainder polynomial,
// the coefficients of which are the ecc
fn ecc_per_block(block: &[u8], gen_poly: &[G]) -> Vec<u8> {
    let len = block.len();
    let ecc_count = gen_poly.len() - 1;

    let mut res: Vec<G> = block.iter().map(|&b| G(b)).collect();
    res.resize(len + ecc_count, G(0));

    for i in 0..len {
        let lead_coeff = res[i];
        if lead_coeff.0 == 0 {
            continue;
        }
        for (u, &v) in res[i + 1..].iter_mut().zip(gen_poly[1..].iter()) {
            *u += lead_coeff * v;
        }
    }

    res[len..].iter().map(|&g| g.into()).collect()
}
