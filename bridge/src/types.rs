//! Fixed-size values exchanged with the engine.
//!
//! Every value is length-checked when it is constructed, so once a [Blob], [Cell], or
//! [FixedBytes] exists it is known to have the size the engine expects.

use crate::{hex, Error, BYTES_PER_BLOB, BYTES_PER_CELL};
use std::{
    fmt::{Debug, Display, Formatter},
    ops::{Deref, DerefMut},
};

/// A small fixed-length byte array (field elements, commitments, and proofs).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FixedBytes<const N: usize>([u8; N]);

/// A serialized field element (evaluation points and claimed values).
pub type Bytes32 = FixedBytes<32>;

/// A compressed G1 point (a commitment or a proof).
pub type Bytes48 = FixedBytes<48>;

impl<const N: usize> FixedBytes<N> {
    /// Creates a new [FixedBytes] from an array of length `N`.
    pub const fn new(value: [u8; N]) -> Self {
        Self(value)
    }

    /// Decodes a value from hex, accepting an optional `0x` prefix.
    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        let mut value = [0u8; N];
        hex::decode_into(hex::strip_prefix(hex), &mut value)?;
        Ok(Self(value))
    }

    /// Encodes the value as upper-case hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> From<[u8; N]> for FixedBytes<N> {
    fn from(value: [u8; N]) -> Self {
        Self(value)
    }
}

impl<const N: usize> TryFrom<&[u8]> for FixedBytes<N> {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; N] = value
            .try_into()
            .map_err(|_| Error::InvalidLength(N, value.len()))?;
        Ok(Self(array))
    }
}

impl<const N: usize> AsRef<[u8]> for FixedBytes<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Deref for FixedBytes<N> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Debug for FixedBytes<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl<const N: usize> Display for FixedBytes<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Implements a heap-allocated fixed-length byte value (too large to pass around on the stack).
macro_rules! boxed_bytes {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Eq, PartialEq, Hash)]
        pub struct $name(Box<[u8; $len]>);

        impl $name {
            /// Returns a value with every byte set to zero.
            pub fn zeroed() -> Self {
                Self(Box::new([0u8; $len]))
            }

            /// Decodes a value from hex, accepting an optional `0x` prefix.
            pub fn from_hex(hex: &str) -> Result<Self, Error> {
                let mut value = Self::zeroed();
                hex::decode_into(hex::strip_prefix(hex), &mut value.0[..])?;
                Ok(value)
            }

            /// Encodes the value as upper-case hex.
            pub fn to_hex(&self) -> String {
                hex::encode(&self.0[..])
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = Error;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                if value.len() != $len {
                    return Err(Error::InvalidLength($len, value.len()));
                }
                let mut out = Self::zeroed();
                out.0.copy_from_slice(value);
                Ok(out)
            }
        }

        impl TryFrom<Vec<u8>> for $name {
            type Error = Error;

            fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
                let found = value.len();
                let boxed: Box<[u8; $len]> = value
                    .into_boxed_slice()
                    .try_into()
                    .map_err(|_| Error::InvalidLength($len, found))?;
                Ok(Self(boxed))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0[..]
            }
        }

        impl Deref for $name {
            type Target = [u8];
            fn deref(&self) -> &[u8] {
                &self.0[..]
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut [u8] {
                &mut self.0[..]
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                // Large values are abbreviated to their leading bytes.
                write!(f, "{}({}..)", stringify!($name), hex::encode(&self.0[..8]))
            }
        }
    };
}

boxed_bytes!(
    /// The polynomial data a commitment is computed over.
    Blob,
    BYTES_PER_BLOB
);

boxed_bytes!(
    /// A chunk of an extended (erasure-coded) blob.
    Cell,
    BYTES_PER_CELL
);
