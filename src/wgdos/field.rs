//! WGDOS field codec: the 12-byte field header plus a sequence of rows.
//!
//! Owns row selection policy (the zero-bitmap heuristic), quantization, and
//! the word-alignment rules that tie rows together into one packed buffer.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::wgdos::row::{
    bitmaps_byte_len, decode_row_header, encode_row_header, expand_broken_row_to_data, expand_row_to_data,
    extract_row_data, pack_row_data, read_bitmaps, row_data_byte_len, write_bitmaps, Bitmaps, RowHeader,
    ROW_HEADER_BYTES,
};

/// Size in bytes of the WGDOS field header.
pub const FIELD_HEADER_BYTES: usize = 12;

/// Decoded WGDOS field header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldHeader {
    /// Total packed length, in 32-bit words, not counting this header.
    pub total_length: u32,
    /// Signed log2 of the absolute quantization accuracy.
    pub precision: i32,
    /// Number of columns in each row.
    pub pts_in_row: u16,
    /// Number of rows in the field.
    pub rows_in_field: u16,
}

impl FieldHeader {
    /// Decode a field header from the front of `data` and validate it
    /// against `expected_len` (`rows*cols`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatError`] if `data` is too short, if either
    /// dimension is zero, or if `rows_in_field * pts_in_row != expected_len`.
    pub fn decode(data: &[u8], expected_len: usize) -> Result<Self> {
        if data.len() < FIELD_HEADER_BYTES {
            return Err(Error::format_error("WGDOS field header truncated"));
        }
        let total_length = BigEndian::read_u32(&data[0..4]);
        let precision = BigEndian::read_i32(&data[4..8]);
        let pts_in_row = BigEndian::read_u16(&data[8..10]);
        let rows_in_field = BigEndian::read_u16(&data[10..12]);

        if pts_in_row == 0 || rows_in_field == 0 {
            return Err(Error::format_error("WGDOS field header has a zero dimension"));
        }
        let unpacked_len = usize::from(pts_in_row) * usize::from(rows_in_field);
        if unpacked_len != expected_len {
            return Err(Error::format_error(format!(
                "WGDOS field is {pts_in_row}x{rows_in_field} ({unpacked_len} values), \
                 expected {expected_len}"
            )));
        }

        Ok(Self {
            total_length,
            precision,
            pts_in_row,
            rows_in_field,
        })
    }

    /// The absolute quantization step `2^precision`, computed in `f64` and
    /// narrowed to `f32`.
    #[must_use]
    pub fn accuracy(self) -> f32 {
        2f64.powi(self.precision) as f32
    }

    fn encode(self) -> [u8; FIELD_HEADER_BYTES] {
        let mut out = [0u8; FIELD_HEADER_BYTES];
        BigEndian::write_u32(&mut out[0..4], self.total_length);
        BigEndian::write_i32(&mut out[4..8], self.precision);
        BigEndian::write_u16(&mut out[8..10], self.pts_in_row);
        BigEndian::write_u16(&mut out[10..12], self.rows_in_field);
        out
    }
}

/// One row's encoding plan: which columns are special, and the minimal bit
/// width and base value for the rest.
struct RowPlan {
    missing: Vec<bool>,
    missing_count: usize,
    zero: Vec<bool>,
    zero_count: usize,
    minval: f32,
    bpp: u8,
    digits: Vec<u32>,
}

/// Decide the zero-bitmap heuristic and compute the quantization plan for
/// one row. The zeros bitmap is used only when zeros are present, the
/// remaining minimum is strictly positive, and the remaining spread
/// doesn't blow the range back open.
fn plan_row(row: &[f32], mdi: f32, accuracy: f32) -> Result<RowPlan> {
    let ncols = row.len();
    let missing: Vec<bool> = row.iter().map(|&v| v == mdi).collect();
    let missing_count = missing.iter().filter(|&&b| b).count();

    let mut zero_candidate_count = 0usize;
    let mut nz_min = f32::INFINITY;
    let mut nz_max = f32::NEG_INFINITY;
    for (i, &v) in row.iter().enumerate() {
        if missing[i] {
            continue;
        }
        if v == 0.0 {
            zero_candidate_count += 1;
        } else {
            if v < nz_min {
                nz_min = v;
            }
            if v > nz_max {
                nz_max = v;
            }
        }
    }

    let use_zero_bitmap = zero_candidate_count > 0
        && nz_min > 0.0
        && (nz_max - nz_min) <= nz_max / std::f32::consts::SQRT_2;

    let zero: Vec<bool> = if use_zero_bitmap {
        row.iter().enumerate().map(|(i, &v)| !missing[i] && v == 0.0).collect()
    } else {
        vec![false; ncols]
    };
    let zero_count = if use_zero_bitmap { zero_candidate_count } else { 0 };

    let mut values = Vec::with_capacity(ncols - missing_count - zero_count);
    for (i, &v) in row.iter().enumerate() {
        if missing[i] || (zero_count > 0 && zero[i]) {
            continue;
        }
        values.push(v);
    }

    let (minval, maxval) = if values.is_empty() {
        (0.0_f32, 0.0_f32)
    } else {
        let mut mn = values[0];
        let mut mx = values[0];
        for &v in &values[1..] {
            if v < mn {
                mn = v;
            }
            if v > mx {
                mx = v;
            }
        }
        (mn, mx)
    };

    let bpp = bits_per_value(minval, maxval, accuracy)?;

    // digits = floor((value - minval) / accuracy), computed in single
    // precision only so the same field packs to the same bytes regardless
    // of host FPU extended-precision behavior.
    let digits: Vec<u32> = if bpp == 0 {
        vec![0; values.len()]
    } else {
        values.iter().map(|&v| ((v - minval) / accuracy) as u32).collect()
    };

    Ok(RowPlan {
        missing,
        missing_count,
        zero,
        zero_count,
        minval,
        bpp,
        digits,
    })
}

/// Minimum `b` such that `ceil((maxval-minval)/accuracy) < 2^b`, capped at
/// 31. Fails if the interval needs 32+ bits.
fn bits_per_value(minval: f32, maxval: f32, accuracy: f32) -> Result<u8> {
    if maxval <= minval {
        return Ok(0);
    }
    let diff = f64::from(maxval) - f64::from(minval);
    let spread = (diff / f64::from(accuracy)).ceil();
    if !spread.is_finite() || spread >= 2f64.powi(32) {
        return Err(Error::InvalidPackingAccuracy);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut s = spread as u64;
    let mut bpp = 0u32;
    while s > 0 {
        s >>= 1;
        bpp += 1;
    }
    if bpp > 31 {
        return Err(Error::InvalidPackingAccuracy);
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(bpp as u8)
}

fn encode_row(plan: &RowPlan, ncols: usize) -> Result<Vec<u8>> {
    let header = encode_row_header(plan.minval, plan.bpp, ncols, plan.zero_count, plan.missing_count)?;

    let mut out = Vec::with_capacity(ROW_HEADER_BYTES);
    out.extend_from_slice(&header);

    if plan.missing_count > 0 || plan.zero_count > 0 {
        let missing_bits: &[bool] = if plan.missing_count > 0 { &plan.missing } else { &[] };
        let zero_bits = if plan.zero_count > 0 { Some(plan.zero.as_slice()) } else { None };
        out.extend_from_slice(&write_bitmaps(missing_bits, zero_bits));
    }

    out.extend_from_slice(&pack_row_data(&plan.digits, plan.bpp)?);
    Ok(out)
}

/// Pack a `nrows x ncols` field of floats into a WGDOS byte stream.
///
/// `bpacc` is the signed log2 of the absolute accuracy the caller wants
/// preserved (`accuracy = 2^bpacc`).
///
/// # Errors
///
/// Returns [`Error::NotTwoDimensional`] if `ncols <= 1`, or
/// [`Error::InvalidPackingAccuracy`] if any row needs more than 31 bits per
/// value at the requested accuracy.
pub fn wgdos_pack(data: &[f32], ncols: usize, nrows: usize, mdi: f32, bpacc: i32) -> Result<Vec<u8>> {
    if ncols <= 1 {
        return Err(Error::not_two_dimensional(ncols));
    }
    let pts_in_row = u16::try_from(ncols).map_err(|_| Error::format_error(format!("ncols {ncols} exceeds u16::MAX")))?;
    let rows_in_field = u16::try_from(nrows).map_err(|_| Error::format_error(format!("nrows {nrows} exceeds u16::MAX")))?;

    let accuracy = 2f64.powi(bpacc) as f32;
    let mut out = vec![0u8; FIELD_HEADER_BYTES];

    for row in data.chunks_exact(ncols).take(nrows) {
        let plan = plan_row(row, mdi, accuracy)?;
        out.extend_from_slice(&encode_row(&plan, ncols)?);
    }

    let total_length = u32::try_from((out.len() - FIELD_HEADER_BYTES) / 4).unwrap_or(u32::MAX);
    let header = FieldHeader {
        total_length,
        precision: bpacc,
        pts_in_row,
        rows_in_field,
    };
    out[0..FIELD_HEADER_BYTES].copy_from_slice(&header.encode());

    Ok(out)
}

/// One row's recovered diagnostics from [`wgdos_unpack_lenient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowDiagnostic {
    /// Index of the affected row.
    pub row: usize,
    /// Number of bytes the row header declared (`nop*4 + 8`).
    pub expected_bytes: usize,
    /// Number of bytes actually available for this row before the field
    /// ran out or the next row's header would begin.
    pub actual_bytes: usize,
    /// Count of non-special outputs that happened to equal `mdi`.
    pub mdi_clashes: usize,
}

/// Decode one row's header plus any bitmaps, returning the pieces needed to
/// extract and expand its packed values.
fn decode_row_prefix(data: &[u8], ncols: usize) -> Result<(RowHeader, Bitmaps, usize)> {
    let header = decode_row_header(data)?;
    let bitmap_len = bitmaps_byte_len(ncols, header.missing_data_present, header.zeros_bitmap_present);
    if data.len() < ROW_HEADER_BYTES + bitmap_len {
        return Err(Error::format_error("WGDOS row bitmaps truncated"));
    }
    let bitmaps = read_bitmaps(
        &data[ROW_HEADER_BYTES..],
        ncols,
        header.missing_data_present,
        header.zeros_bitmap_present,
    );
    Ok((header, bitmaps, bitmap_len))
}

/// Unpack a WGDOS byte stream back into `expected_len` floats.
///
/// # Errors
///
/// Returns [`Error::FormatError`] if the field header, any row header, or
/// the total consumed byte count is inconsistent with the packed bytes.
pub fn wgdos_unpack(packed: &[u8], expected_len: usize, mdi: f32) -> Result<Vec<f32>> {
    let header = FieldHeader::decode(packed, expected_len)?;
    let accuracy = header.accuracy();
    let ncols = usize::from(header.pts_in_row);
    let nrows = usize::from(header.rows_in_field);

    let mut out = Vec::with_capacity(expected_len);
    let mut offset = FIELD_HEADER_BYTES;

    for _ in 0..nrows {
        let row_start = offset;
        let row_data = packed.get(row_start..).ok_or_else(|| Error::format_error("WGDOS row truncated"))?;
        let (row_header, bitmaps, bitmap_len) = decode_row_prefix(row_data, ncols)?;

        let ndata = ncols - bitmaps.missing_count - bitmaps.zero_count;
        let data_start = ROW_HEADER_BYTES + bitmap_len;
        let full_data_len = row_data_byte_len(ndata, row_header.bits_per_value);
        if row_data.len() < data_start + full_data_len {
            return Err(Error::format_error("WGDOS row packed digits truncated"));
        }
        let digits = extract_row_data(&row_data[data_start..data_start + full_data_len], ndata, row_header.bits_per_value)?;

        let (row_values, _clashes) = expand_row_to_data(mdi, accuracy, row_header.base, &bitmaps, &digits);
        out.extend_from_slice(&row_values);

        let consumed = data_start + full_data_len;
        let expected_consumed = usize::from(row_header.nop) * 4 + ROW_HEADER_BYTES;
        if consumed != expected_consumed {
            return Err(Error::format_error(format!(
                "WGDOS row consumed {consumed} bytes, header declared {expected_consumed}"
            )));
        }
        offset += consumed;
    }

    let total_consumed = offset - FIELD_HEADER_BYTES;
    if total_consumed / 4 != header.total_length as usize {
        return Err(Error::format_error(format!(
            "WGDOS field declared total_length {} words, consumed {} words",
            header.total_length,
            total_consumed / 4
        )));
    }

    Ok(out)
}

/// Like [`wgdos_unpack`], but continues past a row whose packed length
/// doesn't match its header: the remainder of that row's non-special
/// columns is filled with `mdi`, and one [`RowDiagnostic`] is collected per
/// row (recovered or not) instead of the field aborting.
///
/// A row's header and bitmaps are still trusted; only the digit stream is
/// treated as possibly truncated.
///
/// # Errors
///
/// Returns [`Error::FormatError`] only for failures that make recovery
/// impossible: a malformed field header, or a row header/bitmap read that
/// runs past the end of the buffer.
pub fn wgdos_unpack_lenient(packed: &[u8], expected_len: usize, mdi: f32) -> Result<(Vec<f32>, Vec<RowDiagnostic>)> {
    let header = FieldHeader::decode(packed, expected_len)?;
    let accuracy = header.accuracy();
    let ncols = usize::from(header.pts_in_row);
    let nrows = usize::from(header.rows_in_field);

    let mut out = Vec::with_capacity(expected_len);
    let mut diagnostics = Vec::new();
    let mut offset = FIELD_HEADER_BYTES;

    for row_idx in 0..nrows {
        let row_start = offset;
        let row_data = packed.get(row_start..).ok_or_else(|| Error::format_error("WGDOS row header truncated"))?;
        let (row_header, bitmaps, bitmap_len) = decode_row_prefix(row_data, ncols)?;

        let ndata = ncols - bitmaps.missing_count - bitmaps.zero_count;
        let data_start = ROW_HEADER_BYTES + bitmap_len;
        let available = row_data.len().saturating_sub(data_start);
        let full_data_len = row_data_byte_len(ndata, row_header.bits_per_value);
        let expected_consumed = usize::from(row_header.nop) * 4 + ROW_HEADER_BYTES;

        let (row_values, clashes, actual_bytes) = if available >= full_data_len {
            let digits = extract_row_data(&row_data[data_start..], ndata, row_header.bits_per_value)?;
            let (values, clashes) = expand_row_to_data(mdi, accuracy, row_header.base, &bitmaps, &digits);
            (values, clashes, data_start + full_data_len)
        } else {
            let good_digits = if row_header.bits_per_value == 0 {
                ndata
            } else {
                available * 8 / usize::from(row_header.bits_per_value)
            };
            let good_bytes = (good_digits * usize::from(row_header.bits_per_value)).div_ceil(8).min(available);
            let digits = extract_row_data(&row_data[data_start..data_start + good_bytes], good_digits, row_header.bits_per_value)?;
            let (values, clashes) = expand_broken_row_to_data(mdi, accuracy, row_header.base, &bitmaps, &digits, good_digits);
            (values, clashes, data_start + available)
        };

        out.extend_from_slice(&row_values);
        if actual_bytes != expected_consumed {
            diagnostics.push(RowDiagnostic {
                row: row_idx,
                expected_bytes: expected_consumed,
                actual_bytes,
                mdi_clashes: clashes,
            });
        }
        offset += actual_bytes;
    }

    Ok((out, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MDI: f32 = -1.0e30;

    #[test]
    fn field_header_round_trips() {
        let header = FieldHeader {
            total_length: 42,
            precision: -2,
            pts_in_row: 4,
            rows_in_field: 2,
        };
        let bytes = header.encode();
        let decoded = FieldHeader::decode(&bytes, 8).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn field_header_rejects_length_mismatch() {
        let header = FieldHeader {
            total_length: 0,
            precision: 0,
            pts_in_row: 4,
            rows_in_field: 2,
        };
        let bytes = header.encode();
        assert!(matches!(FieldHeader::decode(&bytes, 7), Err(Error::FormatError { .. })));
    }

    #[test]
    fn pack_rejects_single_column_field() {
        let data = [1.0, 2.0, 3.0];
        let result = wgdos_pack(&data, 1, 3, MDI, 0);
        assert!(matches!(result, Err(Error::NotTwoDimensional { ncols: 1 })));
    }

    #[test]
    fn wgdos_round_trip_matches_scenario_s6() {
        let data = [1.0, 1.25, 1.5, 1.75, 2.0, MDI, 0.0, 2.5];
        let packed = wgdos_pack(&data, 4, 2, MDI, -2).unwrap();
        let unpacked = wgdos_unpack(&packed, 8, MDI).unwrap();

        assert_eq!(&unpacked[0..4], &data[0..4]);
        assert_eq!(unpacked[5], MDI);
        for (got, want) in unpacked.iter().zip(data.iter()) {
            if *want == MDI {
                continue;
            }
            assert!((got - want).abs() <= 0.25, "{got} vs {want}");
        }
    }

    #[test]
    fn wgdos_round_trip_constant_row_uses_zero_bpp() {
        let data = [5.0_f32; 6];
        let packed = wgdos_pack(&data, 3, 2, MDI, 0).unwrap();
        let unpacked = wgdos_unpack(&packed, 6, MDI).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn wgdos_round_trip_all_missing_row() {
        let data = [MDI, MDI, MDI, MDI];
        let packed = wgdos_pack(&data, 2, 2, MDI, 0).unwrap();
        let unpacked = wgdos_unpack(&packed, 4, MDI).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn unpack_rejects_truncated_row() {
        let data = [1.0, 2.0, 3.0, 1_000_000.0];
        let packed = wgdos_pack(&data, 2, 2, MDI, -4).unwrap();
        let truncated = &packed[..packed.len() - 1];
        assert!(matches!(
            wgdos_unpack(truncated, 4, MDI),
            Err(Error::FormatError { .. })
        ));
    }

    #[test]
    fn unpack_lenient_recovers_truncated_row_with_mdi_fill() {
        let data = [1.0, 2.0, 3.0, 1_000_000.0];
        let packed = wgdos_pack(&data, 2, 2, MDI, -4).unwrap();
        let truncated = &packed[..packed.len() - 1];
        let (values, diagnostics) = wgdos_unpack_lenient(truncated, 4, MDI).unwrap();
        assert_eq!(values.len(), 4);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn pack_fails_when_accuracy_too_fine_for_spread() {
        let data = [0.0_f32, 1.0e20];
        let result = wgdos_pack(&data, 2, 1, MDI, -30);
        assert!(matches!(result, Err(Error::InvalidPackingAccuracy)));
    }
}
