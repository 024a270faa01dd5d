//! Reference decoder for finished symbols. It reads the module matrix directly,
//! so it checks the encoder's layout against an independent reading of the
//! standard rather than against the encoder's own tables.

use qrforge::{ECLevel, Version, QR};

#[derive(Debug)]
pub struct Decoded {
    pub version: Version,
    pub ec_level: ECLevel,
    pub mask: u8,
    pub modes: Vec<u8>,
    pub data: Vec<u8>,
}

pub fn decode(qr: &QR) -> Result<Decoded, String> {
    let w = qr.width();
    if w < 21 || (w - 17) % 4 != 0 {
        return Err(format!("Invalid width {w}"));
    }
    let version = Version::new((w - 17) / 4).map_err(|e| e.to_string())?;

    let (ec_level, mask) = read_format_info(qr)?;
    if *version >= 7 {
        read_version_info(qr, version)?;
    }

    let codewords = read_codewords(qr, version, mask)?;
    let data = deinterleave(&codewords, version, ec_level)?;
    let (modes, data) = parse_segments(&data, version)?;

    Ok(Decoded { version, ec_level, mask, modes, data })
}

// Format & version info
//------------------------------------------------------------------------------

fn read_bits(qr: &QR, coords: &[(usize, usize)]) -> u32 {
    coords.iter().fold(0, |acc, &(r, c)| (acc << 1) | qr.is_dark(r as i16, c as i16) as u32)
}

fn bch(data: u32, data_len: u32, poly: u32, gen_deg: u32) -> u32 {
    let mut rem = data << gen_deg;
    for i in (gen_deg..gen_deg + data_len).rev() {
        if rem & (1 << i) != 0 {
            rem ^= poly << (i - gen_deg);
        }
    }
    (data << gen_deg) | rem
}

pub fn format_code(ecl: ECLevel, mask: u8) -> u32 {
    let ecl_bits = match ecl {
        ECLevel::L => 0b01,
        ECLevel::M => 0b00,
        ECLevel::Q => 0b11,
        ECLevel::H => 0b10,
    };
    bch((ecl_bits << 3) | mask as u32, 5, 0b10100110111, 10) ^ 0b101010000010010
}

pub fn version_code(ver: usize) -> u32 {
    bch(ver as u32, 6, 0b1111100100101, 12)
}

fn read_format_info(qr: &QR) -> Result<(ECLevel, u8), String> {
    let w = qr.width();

    // Most significant bit first
    let mut main: Vec<(usize, usize)> = (0..6).map(|c| (8, c)).collect();
    main.extend([(8, 7), (8, 8), (7, 8)]);
    main.extend((0..6).rev().map(|r| (r, 8)));

    let mut side: Vec<(usize, usize)> = (w - 7..w).rev().map(|r| (r, 8)).collect();
    side.extend((w - 8..w).map(|c| (8, c)));

    let main = read_bits(qr, &main);
    let side = read_bits(qr, &side);
    if main != side {
        return Err(format!("Format info copies differ: {main:015b} vs {side:015b}"));
    }

    for ecl in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
        for mask in 0..8 {
            if format_code(ecl, mask) == main {
                return Ok((ecl, mask));
            }
        }
    }
    Err(format!("Invalid format info {main:015b}"))
}

fn read_version_info(qr: &QR, ver: Version) -> Result<(), String> {
    let w = qr.width();
    let tr: Vec<(usize, usize)> = (0..18).rev().map(|i| (i / 3, w - 11 + i % 3)).collect();
    let bl: Vec<(usize, usize)> = (0..18).rev().map(|i| (w - 11 + i % 3, i / 3)).collect();
    let exp = version_code(*ver);
    for (name, coords) in [("top right", tr), ("bottom left", bl)] {
        let info = read_bits(qr, &coords);
        if info != exp {
            return Err(format!("Version info {name} is {info:018b}, expected {exp:018b}"));
        }
    }
    Ok(())
}

// Data modules
//------------------------------------------------------------------------------

pub fn is_reserved(ver: Version, r: usize, c: usize) -> bool {
    let w = ver.width();

    // Finders, separators and format info
    if (r < 9 && c < 9) || (r < 9 && c >= w - 8) || (r >= w - 8 && c < 9) {
        return true;
    }
    // Timing
    if r == 6 || c == 6 {
        return true;
    }
    // Version info
    if *ver >= 7 && ((r < 6 && c >= w - 11 && c < w - 8) || (c < 6 && r >= w - 11 && r < w - 8))
    {
        return true;
    }
    // Alignment
    let poses = alignment_centres(ver);
    let last = poses.len().saturating_sub(1);
    for (i, &ar) in poses.iter().enumerate() {
        for (j, &ac) in poses.iter().enumerate() {
            if (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0) {
                continue;
            }
            if r.abs_diff(ar) <= 2 && c.abs_diff(ac) <= 2 {
                return true;
            }
        }
    }
    false
}

// Centres from the standard's spacing rule
fn alignment_centres(ver: Version) -> Vec<usize> {
    let v = *ver;
    if v == 1 {
        return Vec::new();
    }
    let count = v / 7 + 2;
    let step = if v == 32 { 26 } else { (v * 4 + count * 2 + 1) / (count * 2 - 2) * 2 };
    let mut res = vec![6];
    let last = ver.width() - 7;
    for i in (0..count - 1).rev() {
        res.push(last - i * step);
    }
    res
}

fn mask_bit(mask: u8, r: usize, c: usize) -> bool {
    match mask {
        0 => (r + c) % 2 == 0,
        1 => r % 2 == 0,
        2 => c % 3 == 0,
        3 => (r + c) % 3 == 0,
        4 => (r / 2 + c / 3) % 2 == 0,
        5 => (r * c) % 2 + (r * c) % 3 == 0,
        6 => ((r * c) % 2 + (r * c) % 3) % 2 == 0,
        _ => ((r + c) % 2 + (r * c) % 3) % 2 == 0,
    }
}

fn read_codewords(qr: &QR, ver: Version, mask: u8) -> Result<Vec<u8>, String> {
    let w = ver.width();
    let mut bits = Vec::with_capacity(w * w);
    let mut right = w as isize - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        let upward = (right + 1) & 2 == 0;
        for vert in 0..w {
            let r = if upward { w - 1 - vert } else { vert };
            for j in 0..2 {
                let c = right as usize - j;
                if !is_reserved(ver, r, c) {
                    bits.push(qr.is_dark(r as i16, c as i16) ^ mask_bit(mask, r, c));
                }
            }
        }
        right -= 2;
    }

    let total = ver.total_codewords();
    if bits.len() != total * 8 + ver.remainder_bits() {
        return Err(format!("Found {} data modules for {total} codewords", bits.len()));
    }
    Ok(bits[..total * 8]
        .chunks(8)
        .map(|b| b.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8))
        .collect())
}

// Blocks
//------------------------------------------------------------------------------

fn deinterleave(codewords: &[u8], ver: Version, ecl: ECLevel) -> Result<Vec<u8>, String> {
    let (sz1, cnt1, sz2, cnt2) = ver.data_codewords_per_block(ecl).map_err(|e| e.to_string())?;
    let ec_len = ver.ecc_per_block(ecl);
    let sizes: Vec<usize> = [sz1].repeat(cnt1).into_iter().chain([sz2].repeat(cnt2)).collect();
    let mut blocks: Vec<Vec<u8>> = sizes.iter().map(|&s| Vec::with_capacity(s + ec_len)).collect();

    let mut it = codewords.iter().copied();
    let max_sz = sz1.max(sz2);
    for i in 0..max_sz {
        for (b, &s) in blocks.iter_mut().zip(&sizes) {
            if i < s {
                b.push(it.next().ok_or("Ran out of data codewords")?);
            }
        }
    }
    for _ in 0..ec_len {
        for b in blocks.iter_mut() {
            b.push(it.next().ok_or("Ran out of ecc codewords")?);
        }
    }
    if it.next().is_some() {
        return Err("Codewords left after de-interleaving".to_string());
    }

    let divisor = generator(ec_len);
    let mut data = Vec::new();
    for (b, &s) in blocks.iter().zip(&sizes) {
        let (d, ecc) = b.split_at(s);
        if rs_remainder(d, &divisor) != ecc {
            return Err(format!("Ecc mismatch in block of {s} data codewords"));
        }
        data.extend_from_slice(d);
    }
    Ok(data)
}

fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut res = 0;
    while b != 0 {
        if b & 1 != 0 {
            res ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= 0x1D;
        }
        b >>= 1;
    }
    res
}

// Highest degree first, leading 1 dropped
fn generator(deg: usize) -> Vec<u8> {
    let mut poly = vec![0u8; deg];
    poly[deg - 1] = 1;
    let mut root = 1u8;
    for _ in 0..deg {
        for j in 0..deg {
            poly[j] = gf_mul(poly[j], root);
            if j + 1 < deg {
                poly[j] ^= poly[j + 1];
            }
        }
        root = gf_mul(root, 2);
    }
    poly
}

fn rs_remainder(data: &[u8], divisor: &[u8]) -> Vec<u8> {
    let mut res = vec![0u8; divisor.len()];
    for &b in data {
        let factor = b ^ res.remove(0);
        res.push(0);
        for (r, &g) in res.iter_mut().zip(divisor) {
            *r ^= gf_mul(g, factor);
        }
    }
    res
}

// Segments
//------------------------------------------------------------------------------

const ALPHANUMERIC: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl BitReader<'_> {
    fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    fn read(&mut self, n: usize) -> Result<u32, String> {
        if n > self.remaining() {
            return Err(format!("Read of {n} bits past end"));
        }
        let mut res = 0;
        for _ in 0..n {
            let bit = (self.data[self.pos >> 3] >> (7 - (self.pos & 7))) & 1;
            res = (res << 1) | bit as u32;
            self.pos += 1;
        }
        Ok(res)
    }
}

fn parse_segments(data: &[u8], ver: Version) -> Result<(Vec<u8>, Vec<u8>), String> {
    let range = match *ver {
        1..=9 => 0,
        10..=26 => 1,
        _ => 2,
    };
    let mut reader = BitReader { data, pos: 0 };
    let mut modes = Vec::new();
    let mut out = Vec::new();

    while reader.remaining() >= 4 {
        let mode = reader.read(4)? as u8;
        match mode {
            0 => break,
            1 => {
                let mut n = reader.read([10, 12, 14][range])? as usize;
                while n >= 3 {
                    out.extend(format!("{:03}", reader.read(10)?).bytes());
                    n -= 3;
                }
                match n {
                    2 => out.extend(format!("{:02}", reader.read(7)?).bytes()),
                    1 => out.extend(format!("{}", reader.read(4)?).bytes()),
                    _ => {}
                }
            }
            2 => {
                let mut n = reader.read([9, 11, 13][range])? as usize;
                while n >= 2 {
                    let v = reader.read(11)? as usize;
                    out.push(ALPHANUMERIC[v / 45]);
                    out.push(ALPHANUMERIC[v % 45]);
                    n -= 2;
                }
                if n == 1 {
                    out.push(ALPHANUMERIC[reader.read(6)? as usize]);
                }
            }
            4 => {
                let n = reader.read([8, 16, 16][range])?;
                for _ in 0..n {
                    out.push(reader.read(8)? as u8);
                }
            }
            m => return Err(format!("Unknown mode indicator {m:04b}")),
        }
        modes.push(mode);
    }
    Ok((modes, out))
}

#[test]
fn test_reference_tables() {
    // Spot checks against the published tables
    assert_eq!(format_code(ECLevel::M, 0), 0b101010000010010);
    assert_eq!(format_code(ECLevel::L, 4), 0b110011000101111);
    assert_eq!(version_code(7), 0x07C94);
    assert_eq!(version_code(40), 0x28C69);
    for v in Version::all() {
        let exp: Vec<usize> = v.alignment_pattern().iter().map(|&p| p as usize).collect();
        assert_eq!(alignment_centres(v), exp, "Alignment centres for version {}", *v);
    }
}
