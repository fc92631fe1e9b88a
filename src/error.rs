//! Error types for the wgdos-codec crate.
//!
//! This module provides a unified error type [`Error`] that covers every
//! failure kind the codec can raise: bitstream primitives, the IBM/IEEE
//! float converters, the WGDOS row/field codec, the RLE codec, and the
//! packing dispatcher.

use thiserror::Error;

/// Unified error type for all WGDOS/RLE/bitstream operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A bit width passed to a bitstream primitive was out of range.
    #[error("invalid bit width: {bits} (must be in 1..=32)")]
    InvalidBitWidth {
        /// The bit width that was rejected.
        bits: u32,
    },

    /// `bitstuff` was asked to write a value that doesn't fit in `nbits`.
    #[error("value {value} does not fit in {nbits} bits")]
    ValueTooLarge {
        /// The value that was too large.
        value: u32,
        /// The number of bits it was supposed to fit in.
        nbits: u8,
    },

    /// A WGDOS row needed more than 31 bits per value to represent its
    /// data spread at the requested accuracy.
    #[error("packing accuracy too fine for the data spread in this row")]
    InvalidPackingAccuracy,

    /// `wgdos_pack` was asked to pack a field with one column or fewer.
    #[error("field has {ncols} column(s); WGDOS packing requires at least 2")]
    NotTwoDimensional {
        /// The rejected column count.
        ncols: usize,
    },

    /// A decoder found the packed bytes internally inconsistent.
    #[error("format error: {message}")]
    FormatError {
        /// Description of the inconsistency.
        message: String,
    },

    /// The RLE encoder's output would not fit in the caller-supplied
    /// capacity.
    #[error("RLE output exceeds declared capacity ({capacity} elements)")]
    BufferTooSmall {
        /// The capacity that was exceeded.
        capacity: usize,
    },

    /// The packing dispatcher was given a `pack_code` it doesn't know.
    #[error("unrecognized packing code: {code}")]
    UnrecognizedPackingCode {
        /// The offending code.
        code: i32,
    },
}

impl Error {
    /// Build an [`Error::InvalidBitWidth`].
    #[must_use]
    pub fn invalid_bit_width(bits: u32) -> Self {
        Self::InvalidBitWidth { bits }
    }

    /// Build an [`Error::ValueTooLarge`].
    #[must_use]
    pub fn value_too_large(value: u32, nbits: u8) -> Self {
        Self::ValueTooLarge { value, nbits }
    }

    /// Build an [`Error::NotTwoDimensional`].
    #[must_use]
    pub fn not_two_dimensional(ncols: usize) -> Self {
        Self::NotTwoDimensional { ncols }
    }

    /// Build an [`Error::FormatError`] from any displayable message.
    #[must_use]
    pub fn format_error(message: impl Into<String>) -> Self {
        Self::FormatError {
            message: message.into(),
        }
    }

    /// Build an [`Error::BufferTooSmall`].
    #[must_use]
    pub fn buffer_too_small(capacity: usize) -> Self {
        Self::BufferTooSmall { capacity }
    }

    /// Build an [`Error::UnrecognizedPackingCode`].
    #[must_use]
    pub fn unrecognized_packing_code(code: i32) -> Self {
        Self::UnrecognizedPackingCode { code }
    }
}

/// Result type for WGDOS/RLE/bitstream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of an IBM⇄IEEE float conversion over an array of words.
///
/// Conversion never fails outright — a bad value saturates or underflows
/// rather than erroring — but callers may want to know whether that
/// happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionStatus {
    /// Every value converted cleanly.
    #[default]
    Ok,
    /// At least one value was rounded (IEEE → IBM only).
    Rounded,
    /// At least one value saturated to Inf/NaN or the IBM max magnitude.
    Saturated,
}

impl ConversionStatus {
    /// Combine two statuses, keeping the more severe one.
    ///
    /// Severity order: `Saturated > Rounded > Ok`.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        use ConversionStatus::{Ok, Rounded, Saturated};
        match (self, other) {
            (Saturated, _) | (_, Saturated) => Saturated,
            (Rounded, _) | (_, Rounded) => Rounded,
            (Ok, Ok) => Ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_picks_most_severe() {
        assert_eq!(
            ConversionStatus::Ok.combine(ConversionStatus::Rounded),
            ConversionStatus::Rounded
        );
        assert_eq!(
            ConversionStatus::Rounded.combine(ConversionStatus::Saturated),
            ConversionStatus::Saturated
        );
        assert_eq!(
            ConversionStatus::Saturated.combine(ConversionStatus::Ok),
            ConversionStatus::Saturated
        );
        assert_eq!(ConversionStatus::Ok.combine(ConversionStatus::Ok), ConversionStatus::Ok);
    }

    #[test]
    fn constructors_build_expected_variants() {
        assert_eq!(Error::invalid_bit_width(0), Error::InvalidBitWidth { bits: 0 });
        assert_eq!(
            Error::value_too_large(10, 3),
            Error::ValueTooLarge { value: 10, nbits: 3 }
        );
        assert_eq!(
            Error::not_two_dimensional(1),
            Error::NotTwoDimensional { ncols: 1 }
        );
        assert_eq!(
            Error::unrecognized_packing_code(7),
            Error::UnrecognizedPackingCode { code: 7 }
        );
    }
}
