//! # wgdos-codec
//!
//! Pack and unpack 2-D floating-point meteorological fields using the
//! Met Office's WGDOS lossy compression scheme, plus two auxiliary
//! codecs: run-length encoding of missing-data floats, and straight
//! byte-order normalization.
//!
//! This crate is the CORE codec only: it operates purely on in-memory
//! buffers and consumes a logging callback and call-chain context for
//! diagnostics. It does not read or write files, does not know about the
//! PP field "lookup" header layout that carries these payloads on disk,
//! and never touches process exit status.
//!
//! ## Quick start
//!
//! ```
//! use wgdos_codec::{wgdos_pack, wgdos_unpack};
//!
//! let mdi = -1.0e30_f32;
//! let data = [1.0, 1.25, 1.5, 1.75, 2.0, mdi, 0.0, 2.5];
//! let packed = wgdos_pack(&data, 4, 2, mdi, -2)?;
//! let unpacked = wgdos_unpack(&packed, data.len(), mdi)?;
//! assert_eq!(&unpacked[0..4], &data[0..4]);
//! # Ok::<(), wgdos_codec::Error>(())
//! ```
//!
//! ## Dispatching on a pack code
//!
//! Callers that hold a `pack_code` from a PP field lookup (out of scope
//! for this crate, but commonly `0`, `1`, or `4`) use [`pack_ppfield`] and
//! [`unpack_ppfield`] instead of calling a specific codec directly:
//!
//! ```
//! use wgdos_codec::{pack_ppfield, unpack_ppfield, PackCode};
//!
//! let mdi = -9999.0_f32;
//! let data = [3.0, mdi, mdi, mdi, 9.0];
//! let (packed, status) = pack_ppfield(&data, 5, 1, mdi, PackCode::Rle, 0);
//! assert!(status.is_ok());
//! let unpacked = unpack_ppfield(&packed, PackCode::Rle, mdi, data.len())?;
//! assert_eq!(unpacked, data);
//! # Ok::<(), wgdos_codec::Error>(())
//! ```
//!
//! ## Module map
//!
//! - [`bitstream`] — bit-level extract/stuff primitives shared by the row
//!   codec.
//! - [`float::ibm`] — IBM32 ⇄ IEEE-754 single precision conversion.
//! - [`rle`] — run-length encoding of missing-data runs.
//! - [`wgdos::row`] / [`wgdos::field`] — the WGDOS row and field codec.
//! - [`packing`] — the `pack_code` dispatcher.
//! - [`diag`] — the diagnostics context (severity, call chain, log sink).
//! - [`error`] — the unified [`Error`] type and [`ConversionStatus`].

pub mod bitstream;
pub mod diag;
pub mod error;
pub mod float;
pub mod packing;
pub mod rle;
pub mod wgdos;

pub use bitstream::{bitstuff, extract_bitmap, extract_nbit_words, fill_bitmap, Polarity};
pub use diag::{Diagnostics, Logger, Severity};
pub use error::{ConversionStatus, Error, Result};
pub use float::{ibm32_to_ieee32, ieee32_to_ibm32};
pub use packing::{pack_ppfield, unpack_ppfield, PackCode, PackStatus};
pub use rle::{runlen_decode, runlen_encode};
pub use wgdos::{wgdos_pack, wgdos_unpack, wgdos_unpack_lenient, RowDiagnostic};

/// Wire-format constants at the crate's external boundary.
pub mod constants {
    /// `pack_code` value for the raw, byte-order-normalized representation.
    pub const PACK_CODE_UNPACKED: i32 = 0;
    /// `pack_code` value for the WGDOS scheme.
    pub const PACK_CODE_WGDOS: i32 = 1;
    /// `pack_code` value for the run-length-encoded scheme.
    pub const PACK_CODE_RLE: i32 = 4;
    /// Sentinel `bits_per_value` the WGDOS encoder reports when a row's
    /// spread can't be represented at the requested accuracy.
    pub const INVALID_PACKING_ACCURACY: u8 = 31;
    /// Width, in bits, of one packed numeric storage unit.
    pub const PP_BITS_PER_NUMERIC: u32 = 32;
    /// Width, in bytes, of one packed numeric storage unit.
    pub const PP_BYTES_PER_NUMERIC: usize = 4;
}
