//! Run-length encoding of missing-data runs in a float array.
//!
//! A maximal run of the missing-data indicator `mdi` is collapsed into the
//! pair `(mdi, run_length)`, where `run_length` is stored as a float
//! holding a positive integer. Every other value is copied through
//! unchanged.

use crate::error::{Error, Result};

/// Replace runs of `mdi` in `input` with `(mdi, run_length)` pairs.
///
/// `out_cap` is the maximum number of elements the caller is willing to
/// allocate for the result; encoding fails rather than silently growing
/// past it.
///
/// # Errors
///
/// Returns [`Error::BufferTooSmall`] if the encoded output would exceed
/// `out_cap`. The capacity check accounts for the final pending run being
/// flushed, so it cannot pass a check only to overrun by one pair while
/// flushing.
pub fn runlen_encode(input: &[f32], mdi: f32, out_cap: usize) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(out_cap.min(input.len()));
    let mut run: u32 = 0;

    for &value in input {
        if value == mdi {
            run += 1;
            continue;
        }
        flush_run(&mut out, &mut run, mdi, out_cap)?;
        if out.len() + 1 > out_cap {
            return Err(Error::buffer_too_small(out_cap));
        }
        out.push(value);
    }
    flush_run(&mut out, &mut run, mdi, out_cap)?;

    Ok(out)
}

fn flush_run(out: &mut Vec<f32>, run: &mut u32, mdi: f32, out_cap: usize) -> Result<()> {
    if *run == 0 {
        return Ok(());
    }
    if out.len() + 2 > out_cap {
        return Err(Error::buffer_too_small(out_cap));
    }
    out.push(mdi);
    #[allow(clippy::cast_precision_loss)]
    out.push(*run as f32);
    *run = 0;
    Ok(())
}

/// Expand a run-length-encoded array back to `expected_len` elements.
///
/// # Errors
///
/// Returns [`Error::FormatError`] if a run length is outside
/// `1..expected_len`, or if the total expanded count does not equal
/// `expected_len` exactly.
pub fn runlen_decode(packed: &[f32], expected_len: usize, mdi: f32) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut i = 0;
    while i < packed.len() {
        let value = packed[i];
        if value == mdi {
            let run_len = packed.get(i + 1).ok_or_else(|| {
                Error::format_error("RLE run marker at end of input with no length word")
            })?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let run = *run_len as i64;
            if run < 1 || run as usize >= expected_len {
                return Err(Error::format_error(format!(
                    "RLE run length {run} out of range 1..{expected_len}"
                )));
            }
            let run = run as usize;
            if out.len() + run > expected_len {
                return Err(Error::format_error(format!(
                    "RLE expansion exceeds expected length {expected_len}"
                )));
            }
            out.resize(out.len() + run, mdi);
            i += 2;
        } else {
            if out.len() + 1 > expected_len {
                return Err(Error::format_error(format!(
                    "RLE expansion exceeds expected length {expected_len}"
                )));
            }
            out.push(value);
            i += 1;
        }
    }

    if out.len() != expected_len {
        return Err(Error::format_error(format!(
            "RLE decoded {} values, expected {expected_len}",
            out.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MDI: f32 = -9999.0;

    #[test]
    fn encode_decode_round_trip() {
        let data = [1.0, 2.0, MDI, MDI, MDI, 3.0, MDI, 4.0];
        let encoded = runlen_encode(&data, MDI, data.len() + 4).unwrap();
        let decoded = runlen_decode(&encoded, data.len(), MDI).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn encode_with_no_mdi_copies_through() {
        let data = [1.0, 2.0, 3.0];
        let encoded = runlen_encode(&data, MDI, 3).unwrap();
        assert_eq!(encoded, data);
    }

    #[test]
    fn encode_with_trailing_run_flushes() {
        let data = [1.0, MDI, MDI];
        let encoded = runlen_encode(&data, MDI, 3).unwrap();
        assert_eq!(encoded, vec![1.0, MDI, 2.0]);
    }

    #[test]
    fn encode_fails_when_capacity_too_small_for_final_flush() {
        // Pending run of 2 MDIs needs 2 more slots but cap only allows 1.
        let data = [1.0, MDI, MDI];
        let result = runlen_encode(&data, MDI, 2);
        assert!(matches!(result, Err(Error::BufferTooSmall { capacity: 2 })));
    }

    #[test]
    fn decode_rejects_run_length_zero() {
        let encoded = [MDI, 0.0, 1.0];
        let result = runlen_decode(&encoded, 3, MDI);
        assert!(matches!(result, Err(Error::FormatError { .. })));
    }

    #[test]
    fn decode_rejects_run_length_at_or_above_expected_len() {
        let encoded = [MDI, 3.0];
        let result = runlen_decode(&encoded, 3, MDI);
        assert!(matches!(result, Err(Error::FormatError { .. })));
    }

    #[test]
    fn decode_rejects_mismatched_total_length() {
        let encoded = [1.0, 2.0];
        let result = runlen_decode(&encoded, 3, MDI);
        assert!(matches!(result, Err(Error::FormatError { .. })));
    }
}
