//! Packing dispatcher: routes a `pack_code` to the WGDOS or RLE codec, or
//! straight byte-order normalization, and guarantees the output is always
//! big-endian even on failure.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::rle::{runlen_decode, runlen_encode};
use crate::wgdos::{wgdos_pack, wgdos_unpack};

/// The packing scheme a field is stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackCode {
    /// Raw 32-bit values, byte-order normalized only.
    Unpacked,
    /// WGDOS row-oriented bit-packed format.
    Wgdos,
    /// Run-length encoding of missing-data runs.
    Rle,
}

impl TryFrom<i32> for PackCode {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Unpacked),
            1 => Ok(Self::Wgdos),
            4 => Ok(Self::Rle),
            other => Err(Error::unrecognized_packing_code(other)),
        }
    }
}

impl From<PackCode> for i32 {
    fn from(code: PackCode) -> Self {
        match code {
            PackCode::Unpacked => 0,
            PackCode::Wgdos => 1,
            PackCode::Rle => 4,
        }
    }
}

impl TryFrom<u8> for PackCode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Self::try_from(i32::from(code))
    }
}

/// Outcome of [`pack_ppfield`].
#[derive(Debug, Clone, PartialEq)]
pub enum PackStatus {
    /// Packing succeeded; the output holds the packed representation.
    Ok,
    /// Packing failed; the output still holds a valid big-endian unpacked
    /// representation of `data`, carrying the failure that occurred.
    Failed(Error),
}

impl PackStatus {
    /// `true` if packing succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

fn host_floats_to_big_endian_bytes(data: &[f32]) -> Vec<u8> {
    let mut out = vec![0u8; data.len() * 4];
    for (chunk, &value) in out.chunks_exact_mut(4).zip(data) {
        BigEndian::write_u32(chunk, value.to_bits());
    }
    out
}

fn big_endian_bytes_to_host_floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_bits(BigEndian::read_u32(chunk)))
        .collect()
}

/// Pack `data` (a `nrows x ncols` field, or a flat array for RLE/unpacked)
/// under `code`, returning the packed bytes and whether packing succeeded.
///
/// On failure the returned buffer always holds `data` copied through as a
/// valid big-endian unpacked representation, so callers can persist it
/// without a second pass regardless of the status.
#[must_use]
pub fn pack_ppfield(data: &[f32], ncols: usize, nrows: usize, mdi: f32, code: PackCode, bpacc: i32) -> (Vec<u8>, PackStatus) {
    let fallback = || host_floats_to_big_endian_bytes(data);

    match code {
        PackCode::Unpacked => (fallback(), PackStatus::Ok),
        PackCode::Wgdos => match wgdos_pack(data, ncols, nrows, mdi, bpacc) {
            Ok(packed) => (packed, PackStatus::Ok),
            Err(err) => (fallback(), PackStatus::Failed(err)),
        },
        PackCode::Rle => match runlen_encode(data, mdi, data.len()) {
            Ok(encoded) => (host_floats_to_big_endian_bytes(&encoded), PackStatus::Ok),
            Err(err) => (fallback(), PackStatus::Failed(err)),
        },
    }
}

/// Unpack `packed` under `code` into `unpacked_len` floats.
///
/// # Errors
///
/// Propagates the underlying codec's error: [`Error::FormatError`] from
/// WGDOS or RLE decoding, or [`Error::UnrecognizedPackingCode`] if `code`
/// doesn't correspond to a known scheme (unreachable given a valid
/// [`PackCode`], but surfaced here since the boundary accepts raw codes).
pub fn unpack_ppfield(packed: &[u8], code: PackCode, mdi: f32, unpacked_len: usize) -> Result<Vec<f32>> {
    match code {
        PackCode::Unpacked => Ok(big_endian_bytes_to_host_floats(packed)),
        PackCode::Wgdos => wgdos_unpack(packed, unpacked_len, mdi),
        PackCode::Rle => {
            let host_order = big_endian_bytes_to_host_floats(packed);
            runlen_decode(&host_order, unpacked_len, mdi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MDI: f32 = -9999.0;

    #[test]
    fn pack_code_round_trips_through_i32() {
        for code in [PackCode::Unpacked, PackCode::Wgdos, PackCode::Rle] {
            let raw: i32 = code.into();
            assert_eq!(PackCode::try_from(raw).unwrap(), code);
        }
    }

    #[test]
    fn pack_code_rejects_unknown_value() {
        assert!(matches!(
            PackCode::try_from(7),
            Err(Error::UnrecognizedPackingCode { code: 7 })
        ));
    }

    #[test]
    fn pack_code_accepts_u8_wire_values() {
        assert_eq!(PackCode::try_from(1u8).unwrap(), PackCode::Wgdos);
        assert!(matches!(
            PackCode::try_from(9u8),
            Err(Error::UnrecognizedPackingCode { code: 9 })
        ));
    }

    #[test]
    fn unpacked_dispatch_is_idempotent() {
        let data = [1.0_f32, -2.5, 3.75, f32::MIN_POSITIVE];
        let (packed, status) = pack_ppfield(&data, 4, 1, MDI, PackCode::Unpacked, 0);
        assert!(status.is_ok());
        let unpacked = unpack_ppfield(&packed, PackCode::Unpacked, MDI, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn wgdos_dispatch_round_trips() {
        let data = [1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let (packed, status) = pack_ppfield(&data, 3, 2, MDI, PackCode::Wgdos, 0);
        assert!(status.is_ok());
        let unpacked = unpack_ppfield(&packed, PackCode::Wgdos, MDI, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn wgdos_dispatch_failure_falls_back_to_unpacked_big_endian() {
        let data = [1.0_f32, 2.0, 3.0];
        let (packed, status) = pack_ppfield(&data, 1, 3, MDI, PackCode::Wgdos, 0);
        assert!(matches!(status, PackStatus::Failed(Error::NotTwoDimensional { ncols: 1 })));
        let recovered = unpack_ppfield(&packed, PackCode::Unpacked, MDI, data.len()).unwrap();
        assert_eq!(recovered, data);
    }

    #[test]
    fn rle_dispatch_round_trips() {
        let data = [3.0_f32, MDI, MDI, MDI, 9.0];
        let (packed, status) = pack_ppfield(&data, 5, 1, MDI, PackCode::Rle, 0);
        assert!(status.is_ok());
        let unpacked = unpack_ppfield(&packed, PackCode::Rle, MDI, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }
}
