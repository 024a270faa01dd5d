use std::fmt::{Display, Error, Formatter};

// Error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    // Caller errors
    CapacityExceeded,
    UnsupportedMode,
    InvalidVersion,
    InvalidMaskPattern,

    // Constant table inconsistencies
    InvalidBlockLayout,
    MatrixOverflow,
    MatrixUnderflow,
}

impl Display for QRError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let msg = match *self {
            Self::CapacityExceeded => "Data exceeds the capacity of every allowed version",
            Self::UnsupportedMode => "Data contains characters outside the mode's alphabet",
            Self::InvalidVersion => "Invalid version",
            Self::InvalidMaskPattern => "Invalid mask pattern",
            Self::InvalidBlockLayout => "Block layout disagrees with capacity table",
            Self::MatrixOverflow => "Payload has more bits than the encoding region",
            Self::MatrixUnderflow => "Payload leaves encoding region cells unfilled",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for QRError {}

pub type QRResult<T> = Result<T, QRError>;
