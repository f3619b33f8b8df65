//! The marshal variable-length integer ("long") codec.
//!
//! Small magnitudes fit in the length byte itself: `0` is `0x00`,
//! `1..=122` is `x + 5` and `-123..=-1` is `x - 5` as a signed byte.
//! Everything else is a signed length byte `±n` (n in 1..=4) followed by
//! `n` little-endian bytes, sign-extended at the `n`-byte boundary when the
//! length byte is negative.

use crate::error::{MarshalError, MarshalResult};

/// Widest payload of a long, in bytes.
pub const MAX_LONG_BYTES: usize = 4;

/// Append the encoding of `value` to `buf`.
pub(crate) fn encode_long(buf: &mut Vec<u8>, value: i32) {
    let x = i64::from(value);
    if x == 0 {
        buf.push(0);
        return;
    }
    if 0 < x && x < 123 {
        buf.push((x + 5) as u8);
        return;
    }
    if -124 < x && x < 0 {
        buf.push(((x - 5) & 0xFF) as u8);
        return;
    }

    let mut bytes = [0u8; MAX_LONG_BYTES];
    let mut len = 0;
    let mut rest = x;
    loop {
        bytes[len] = (rest & 0xFF) as u8;
        rest >>= 8;
        len += 1;
        if rest == 0 || rest == -1 || len == MAX_LONG_BYTES {
            break;
        }
    }

    let len_byte = if x > 0 { len as u8 } else { (256 - len) as u8 };
    buf.push(len_byte);
    buf.extend_from_slice(&bytes[..len]);
}

/// Number of payload bytes that follow the given length byte.
pub(crate) fn long_payload_len(first: u8) -> usize {
    match first as i8 {
        0 | 5..=127 | -128..=-5 => 0,
        c => c.unsigned_abs() as usize,
    }
}

/// Decode a long from the front of `data`. Returns (value, bytes_consumed).
pub(crate) fn decode_long(data: &[u8]) -> MarshalResult<(i64, usize)> {
    let Some(&first) = data.first() else {
        return Err(MarshalError::TruncatedInput { offset: 0 });
    };
    let c = i64::from(first as i8);
    match c {
        0 => Ok((0, 1)),
        5..=127 => Ok((c - 5, 1)),
        -128..=-5 => Ok((c + 5, 1)),
        _ => {
            let n = long_payload_len(first);
            if data.len() < 1 + n {
                return Err(MarshalError::TruncatedInput {
                    offset: data.len() as u64,
                });
            }
            let mut x: i64 = if c < 0 { -1 << (8 * n) } else { 0 };
            for (i, &byte) in data[1..=n].iter().enumerate() {
                x |= i64::from(byte) << (8 * i);
            }
            Ok((x, 1 + n))
        }
    }
}
