//! Errors reported by the bridge and the primary/detail codes they collapse into.

use crate::hex;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// The primary outcome of an operation.
///
/// Values match the engine's own return codes so they can be passed through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Code {
    Ok = 0,
    BadArguments = 1,
    InternalError = 2,
    AllocationFailure = 3,
}

impl Code {
    /// Interprets a raw primary code, treating unrecognized values as [Code::InternalError].
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::Ok,
            1 => Self::BadArguments,
            3 => Self::AllocationFailure,
            _ => Self::InternalError,
        }
    }
}

/// Narrows the cause of a failed trusted setup load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SettingsError {
    Unknown = 1,
    BadPrecompute = 2,
    BadG1MonomialLength = 3,
    BadG1LagrangeLength = 4,
    BadG2MonomialLength = 5,
    BadG1Monomial = 6,
    BadG1Lagrange = 7,
    BadG2Monomial = 8,
    BadLagrange = 9,
    BadComputeRoots = 10,
    BadBitReverse = 11,
    BadFk20Init = 12,
}

impl SettingsError {
    /// Interprets a raw detail code (zero means "no detail").
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0 => return None,
            2 => Self::BadPrecompute,
            3 => Self::BadG1MonomialLength,
            4 => Self::BadG1LagrangeLength,
            5 => Self::BadG2MonomialLength,
            6 => Self::BadG1Monomial,
            7 => Self::BadG1Lagrange,
            8 => Self::BadG2Monomial,
            9 => Self::BadLagrange,
            10 => Self::BadComputeRoots,
            11 => Self::BadBitReverse,
            12 => Self::BadFk20Init,
            _ => Self::Unknown,
        })
    }
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::Unknown => "unknown error",
            Self::BadPrecompute => "invalid precompute value",
            Self::BadG1MonomialLength => "incorrect g1 monomial length",
            Self::BadG1LagrangeLength => "incorrect g1 lagrange length",
            Self::BadG2MonomialLength => "incorrect g2 monomial length",
            Self::BadG1Monomial => "invalid g1 monomial point",
            Self::BadG1Lagrange => "invalid g1 lagrange point",
            Self::BadG2Monomial => "invalid g2 monomial point",
            Self::BadLagrange => "setup is not in lagrange form",
            Self::BadComputeRoots => "unable to compute roots of unity",
            Self::BadBitReverse => "unable to bit-reverse lagrange points",
            Self::BadFk20Init => "unable to initialize multiproof tables",
        };
        f.write_str(msg)
    }
}

/// Errors that can occur when using the bridge.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::Error),
    #[error("invalid length: expected {0} bytes, found {1}")]
    InvalidLength(usize, usize),
    #[error("mismatched lengths: {0}")]
    MismatchedLengths(&'static str),
    #[error("cell index out of range: {0}")]
    CellIndexOutOfRange(u64),
    #[error("insufficient cells: {0} < {1}")]
    InsufficientCells(usize, usize),
    #[error("too many cells: {0} > {1}")]
    TooManyCells(usize, usize),
    #[error("trusted setup not loaded")]
    NotLoaded,
    #[error("null pointer")]
    NullPointer,
    #[error("trusted setup too large: more than {0} bytes")]
    SetupTooLarge(usize),
    #[error("unable to read trusted setup: {0}")]
    Io(#[from] std::io::Error),
    #[error("trusted setup rejected ({0:?}): {1}")]
    Setup(Code, SettingsError),
    #[error("engine rejected arguments")]
    Rejected,
    #[error("unable to allocate memory")]
    Allocation,
    #[error("engine failure")]
    Internal,
}

impl Error {
    /// Collapses the error into its primary [Code].
    pub fn code(&self) -> Code {
        match self {
            Self::Hex(hex::Error::Allocation(_)) | Self::Allocation => Code::AllocationFailure,
            Self::Hex(_)
            | Self::InvalidLength(..)
            | Self::MismatchedLengths(_)
            | Self::CellIndexOutOfRange(_)
            | Self::InsufficientCells(..)
            | Self::TooManyCells(..)
            | Self::NotLoaded
            | Self::NullPointer
            | Self::SetupTooLarge(_)
            | Self::Rejected => Code::BadArguments,
            Self::Io(err) => match err.kind() {
                std::io::ErrorKind::InvalidData
                | std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::NotFound => Code::BadArguments,
                std::io::ErrorKind::OutOfMemory => Code::AllocationFailure,
                _ => Code::InternalError,
            },
            Self::Setup(code, _) => *code,
            Self::Internal => Code::InternalError,
        }
    }

    /// Returns the trusted setup detail, if this error came from loading raw setup points.
    pub fn detail(&self) -> Option<SettingsError> {
        match self {
            Self::Setup(_, detail) => Some(*detail),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Error::from(hex::Error::OddLength(1)).code(), Code::BadArguments);
        assert_eq!(
            Error::from(hex::Error::Allocation(10)).code(),
            Code::AllocationFailure
        );
        assert_eq!(Error::InvalidLength(48, 47).code(), Code::BadArguments);
        assert_eq!(Error::NotLoaded.code(), Code::BadArguments);
        assert_eq!(Error::Allocation.code(), Code::AllocationFailure);
        assert_eq!(Error::Internal.code(), Code::InternalError);
        assert_eq!(
            Error::Setup(Code::BadArguments, SettingsError::BadPrecompute).code(),
            Code::BadArguments
        );
    }

    #[test]
    fn test_io_codes() {
        let invalid = std::io::Error::new(std::io::ErrorKind::InvalidData, "not utf-8");
        assert_eq!(Error::from(invalid).code(), Code::BadArguments);
        let broken = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert_eq!(Error::from(broken).code(), Code::InternalError);
    }

    #[test]
    fn test_detail_only_for_setup() {
        assert_eq!(
            Error::Setup(Code::BadArguments, SettingsError::BadLagrange).detail(),
            Some(SettingsError::BadLagrange)
        );
        assert_eq!(Error::Rejected.detail(), None);
    }

    #[test]
    fn test_raw_code_round_trip() {
        for code in [
            Code::Ok,
            Code::BadArguments,
            Code::InternalError,
            Code::AllocationFailure,
        ] {
            assert_eq!(Code::from_u16(code as u16), code);
        }
        assert_eq!(Code::from_u16(42), Code::InternalError);

        for raw in 1..=12u16 {
            assert_eq!(SettingsError::from_u16(raw).unwrap() as u16, raw);
        }
        assert_eq!(SettingsError::from_u16(0), None);
        assert_eq!(SettingsError::from_u16(99), Some(SettingsError::Unknown));
    }
}
