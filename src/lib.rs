//! # qrforge
//!
//! A Rust library for encoding data into QR code symbols, with Reed-Solomon error
//! correction and standard mask selection.
//!
//! The encoder produces the finished module matrix. Rendering it to an image, adding
//! the quiet zone and writing files are left to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use qrforge::{encode, ECLevel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = encode(b"Hello, World!", ECLevel::M)?;
//!
//! // true for dark modules
//! let grid = qr.to_bool_grid();
//! assert_eq!(grid.len(), qr.width());
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use qrforge::{ECLevel, MaskPattern, Mode, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::new(b"HELLO WORLD")
//!     .version(Version::new(2)?)        // If not provided, finds smallest version to fit data
//!     .ec_level(ECLevel::Q)             // If not provided, defaults to ECLevel::M
//!     .mode(Mode::Alphanumeric)         // If not provided, picks the narrowest mode
//!     .mask(MaskPattern::new(3)?)       // If not provided, finds best mask based on penalty score
//!     .build()?;
//!
//! assert_eq!(qr.width(), 25);
//! assert!(qr.is_dark(0, 0));
//! # Ok(())
//! # }
//! ```
//!
//! ## QR Code Components
//!
//! ### Versions
//! Versions 1-40, with sizes from 21x21 to 177x177 modules.
//!
//! ### Error Correction Levels
//! - **L (Low)**: ~7% error correction
//! - **M (Medium)**: ~15% error correction
//! - **Q (Quartile)**: ~25% error correction
//! - **H (High)**: ~30% error correction
//!
//! ### Modes
//! - **Numeric**: digits `0-9`
//! - **Alphanumeric**: digits, uppercase letters, space and `$%*+-./:`
//! - **Byte**: any data
//!
//! ## Features
//!
//! - `parallel`: scores the 8 mask candidates on the rayon thread pool.

#![allow(clippy::items_after_test_module, clippy::suspicious_arithmetic_impl)]

pub mod builder;
pub(crate) mod common;

pub use builder::{Module, QRBuilder, QR};
pub use common::codec::Mode;
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{Color, ECLevel, Version};

/// Encodes `data` at `ec_level` in the smallest fitting version, using the
/// narrowest mode and the lowest penalty mask.
pub fn encode(data: &[u8], ec_level: ECLevel) -> QRResult<QR> {
    QRBuilder::new(data).ec_level(ec_level).build()
}
