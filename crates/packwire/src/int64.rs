//! Bridging between native 64-bit integers and the arbitrary-precision
//! fallback.
//!
//! uint64/int64 payloads are handled as two big-endian 32-bit halves. The
//! decimal-string conversions below work on 16-bit limbs with 32-bit
//! intermediates only, so the fallback path never relies on 64-bit
//! arithmetic.

use std::fmt::Write as _;
use std::str::FromStr;

use malachite::Integer;
use packwire_buffers::Reader;

use crate::error::{MsgPackError, Result};
use crate::value::Value;

const GROUP: u32 = 10_000;

/// Big-endian 16-bit limbs of a 64-bit magnitude.
type Limbs = [u32; 4];

fn limbs_from_halves(hi: u32, lo: u32) -> Limbs {
    [hi >> 16, hi & 0xffff, lo >> 16, lo & 0xffff]
}

fn limbs_to_halves(limbs: Limbs) -> (u32, u32) {
    ((limbs[0] << 16) | limbs[1], (limbs[2] << 16) | limbs[3])
}

fn negate(hi: u32, lo: u32) -> (u32, u32) {
    let lo = (!lo).wrapping_add(1);
    let hi = (!hi).wrapping_add(u32::from(lo == 0));
    (hi, lo)
}

/// Formats the 64-bit value held in `hi`/`lo` as a decimal string.
///
/// With `signed`, the halves are read as two's complement.
pub fn halves_to_decimal(hi: u32, lo: u32, signed: bool) -> String {
    let negative = signed && hi & 0x8000_0000 != 0;
    let (hi, lo) = if negative { negate(hi, lo) } else { (hi, lo) };

    let mut limbs = limbs_from_halves(hi, lo);
    let mut groups = Vec::with_capacity(5);
    while limbs.iter().any(|&limb| limb != 0) {
        let mut rem = 0u32;
        for limb in limbs.iter_mut() {
            let cur = (rem << 16) | *limb;
            *limb = cur / GROUP;
            rem = cur % GROUP;
        }
        groups.push(rem);
    }

    let mut out = String::with_capacity(21);
    if negative {
        out.push('-');
    }
    match groups.split_last() {
        None => out.push('0'),
        Some((head, rest)) => {
            let _ = write!(out, "{head}");
            for group in rest.iter().rev() {
                let _ = write!(out, "{group:04}");
            }
        }
    }
    out
}

/// Parses a decimal integer into the big-endian halves of its 64-bit form.
///
/// Non-negative input must fit `u64`; negative input must fit `i64` and is
/// returned in two's complement.
pub fn decimal_to_halves(s: &str) -> Result<(u32, u32)> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MsgPackError::InvalidInteger(s.to_owned()));
    }

    let mut limbs: Limbs = [0; 4];
    for digit in digits.bytes() {
        let mut carry = u32::from(digit - b'0');
        for limb in limbs.iter_mut().rev() {
            let cur = *limb * 10 + carry;
            *limb = cur & 0xffff;
            carry = cur >> 16;
        }
        if carry != 0 {
            return Err(MsgPackError::IntegerOverflow);
        }
    }

    let (hi, lo) = limbs_to_halves(limbs);
    if !negative {
        return Ok((hi, lo));
    }
    // Magnitude may be at most 2^63.
    if hi > 0x8000_0000 || (hi == 0x8000_0000 && lo != 0) {
        return Err(MsgPackError::IntegerOverflow);
    }
    Ok(negate(hi, lo))
}

fn parse_big(decimal: &str) -> Result<Value> {
    Integer::from_str(decimal)
        .map(Value::BigInt)
        .map_err(|_| MsgPackError::InvalidInteger(decimal.to_owned()))
}

/// Builds the value of a uint64 payload.
pub fn uint64_value(hi: u32, lo: u32, big_int_fallback: bool) -> Result<Value> {
    if big_int_fallback {
        return parse_big(&halves_to_decimal(hi, lo, false));
    }
    let v = (u64::from(hi) << 32) | u64::from(lo);
    Ok(i64::try_from(v).map_or(Value::UInt(v), Value::Int))
}

/// Builds the value of an int64 payload.
pub fn int64_value(hi: u32, lo: u32, big_int_fallback: bool) -> Result<Value> {
    if big_int_fallback {
        return parse_big(&halves_to_decimal(hi, lo, true));
    }
    let v = ((u64::from(hi) << 32) | u64::from(lo)) as i64;
    Ok(Value::Int(v))
}

/// Reads the 8-byte body of a uint64 tag.
pub fn read_uint64(reader: &mut Reader<'_>, big_int_fallback: bool) -> Result<Value> {
    let hi = reader.u32()?;
    let lo = reader.u32()?;
    uint64_value(hi, lo, big_int_fallback)
}

/// Reads the 8-byte body of an int64 tag.
pub fn read_int64(reader: &mut Reader<'_>, big_int_fallback: bool) -> Result<Value> {
    let hi = reader.u32()?;
    let lo = reader.u32()?;
    int64_value(hi, lo, big_int_fallback)
}

/// Returns the value as `i64` when it is within the native range.
pub fn bigint_to_i64(n: &Integer) -> Option<i64> {
    i64::try_from(n).ok()
}

/// True when the value can be written as a uint64 payload.
pub fn bigint_fits_u64(n: &Integer) -> bool {
    u64::try_from(n).is_ok()
}
