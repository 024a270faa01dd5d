mod qr;

pub use qr::{Module, QR};

use std::ops::Deref;

use crate::common::{
    bitstream::BitStream,
    codec::{encode, encode_with_version, Mode},
    ec::{ecc, Block},
    error::QRResult,
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};

/// Configures and runs the encoding pipeline.
///
/// ```
/// use qrforge::{ECLevel, QRBuilder, Version};
///
/// let qr = QRBuilder::new(b"HELLO WORLD")
///     .version(Version::new(2).unwrap())
///     .ec_level(ECLevel::Q)
///     .build()
///     .unwrap();
/// assert_eq!(qr.width(), 25);
/// ```
#[derive(Debug, Clone)]
pub struct QRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
    mode: Option<Mode>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::M, mask: None, mode: None }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn unset_mask(&mut self) -> &mut Self {
        self.mask = None;
        self
    }

    /// Forces the encoding mode. Building fails with `UnsupportedMode` if the
    /// data has a character outside the mode's alphabet.
    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    pub fn unset_mode(&mut self) -> &mut Self {
        self.mode = None;
        self
    }

    pub fn metadata(&self) -> String {
        let ver = self.version.map_or("Auto".to_string(), |v| v.to_string());
        let mask = self.mask.map_or("Auto".to_string(), |m| m.to_string());
        let mode = self.mode.map_or("Auto".to_string(), |m| format!("{m:?}"));
        format!(
            "{{ Version: {ver}, Ec level: {:?}, Mode: {mode}, Mask: {mask} }}",
            self.ec_level
        )
    }
}


impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        let mut qr = self.build_unmasked()?;

        let (mask, pen) = match self.mask {
            Some(m) => {
                qr.apply_mask(m);
                (m, None)
            }
            None => {
                let (m, pen) = apply_best_mask(&mut qr);
                (m, Some(pen))
            }
        };
        qr.embed_metadata();
        debug_assert!(!qr.grid().contains(&Module::Empty), "Empty module found in finished QR");

        match pen {
            Some(pen) => log::debug!("Selected mask {mask} with penalty {pen}"),
            None => log::debug!("Applied fixed mask {mask}"),
        }
        log::trace!(
            "Dark modules: {} of {}",
            qr.count_dark_modules(),
            qr.width() * qr.width()
        );

        Ok(qr)
    }

    // Runs every stage up to and including data placement
    pub(crate) fn build_unmasked(&self) -> QRResult<QR> {
        log::trace!("Generating QR {}", self.metadata());

        let (encoded_data, version, mode) = match self.version {
            Some(v) => {
                let (bs, mode) = encode_with_version(self.data, self.ec_level, v, self.mode)?;
                (bs, v, mode)
            }
            None => encode(self.data, self.ec_level, self.mode)?,
        };
        log::debug!(
            "Encoded {} bytes as {mode:?} in version {version} at level {:?}",
            self.data.len(),
            self.ec_level
        );

        let payload = Self::payload(encoded_data.data(), version, self.ec_level)?;

        let mut qr = QR::new(version, self.ec_level, mode);

        log::trace!("Drawing function patterns");
        qr.draw_all_function_patterns();

        log::trace!("Drawing encoding region");
        qr.draw_encoding_region(payload)?;

        Ok(qr)
    }

    // Data codewords split into blocks, followed by interleaved data and
    // interleaved error correction codewords
    fn payload(data: &[u8], version: Version, ec_level: ECLevel) -> QRResult<BitStream> {
        log::trace!("Computing error correction codewords");
        let blocks = ecc(data, version, ec_level)?;
        log::trace!(
            "{} blocks with {} ecc each, correcting up to {} codewords",
            blocks.len(),
            version.ecc_per_block(ec_level),
            Self::ec_capacity(version, ec_level)
        );

        let data_blocks: Vec<&[u8]> = blocks.iter().map(Block::data).collect();
        let ecc_blocks: Vec<&[u8]> = blocks.iter().map(Block::ecc).collect();

        let mut payload = BitStream::new(version.total_codewords() << 3);
        payload.extend(&Self::interleave(&data_blocks));
        payload.extend(&Self::interleave(&ecc_blocks));
        debug_assert_eq!(
            payload.len(),
            version.total_codewords() << 3,
            "Payload length differs from total codewords"
        );
        Ok(payload)
    }

    /// Number of erroneous codewords the symbol can correct. The smallest
    /// symbols reserve a few ecc codewords for misdecode protection.
    pub fn ec_capacity(version: Version, ec_level: ECLevel) -> usize {
        let p = match (*version, ec_level) {
            (1, ECLevel::L) => 3,
            (2, ECLevel::L) | (1, ECLevel::M) => 2,
            (1, _) | (3, ECLevel::L) => 1,
            _ => 0,
        };

        let ec_bytes = version.block_count(ec_level) * version.ecc_per_block(ec_level);
        (ec_bytes - p) / 2
    }

    /// Takes the i-th codeword of every block in turn. Blocks shorter than `i`
    /// are skipped.
    pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}
