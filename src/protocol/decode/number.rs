//! Packed decimal (BCD) and digit-text codecs.
//!
//! A packed decimal of `n` bytes holds `2n - 1` digit nibbles followed by a
//! sign nibble (`C` positive, `D` negative). The decimal point position is
//! not stored; it comes from the field's declared decimals.

use crate::error::{Error, Result};
use crate::protocol::constants::{BCD_SIGN_NEGATIVE, BCD_SIGN_POSITIVE, BCD_SIGN_UNSIGNED};

/// Parsed decimal text: sign plus digits with an implied scale.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DecimalDigits {
    negative: bool,
    integer: String,
    fraction: String,
}

fn parse_decimal(text: &str) -> Result<DecimalDigits> {
    let text = text.trim();
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if integer.is_empty() && fraction.is_empty() {
        return Err(Error::type_conversion(format!("{:?} is not a number", text)));
    }
    if !integer.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::type_conversion(format!("{:?} is not a number", text)));
    }
    Ok(DecimalDigits {
        negative,
        integer: integer.to_string(),
        fraction: fraction.to_string(),
    })
}

/// Scale digits to `decimals` places, rounding half away from zero.
///
/// Returns the unscaled digit string without leading zeros ("" for zero).
fn scale_digits(value: &DecimalDigits, decimals: usize) -> String {
    let mut fraction = value.fraction.clone();
    let round_up = fraction.len() > decimals && fraction.as_bytes()[decimals] >= b'5';
    fraction.truncate(decimals);
    while fraction.len() < decimals {
        fraction.push('0');
    }

    let mut digits: Vec<u8> = value
        .integer
        .bytes()
        .chain(fraction.bytes())
        .map(|b| b - b'0')
        .collect();

    if round_up {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == 9 {
                *d = 0;
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let start = digits.iter().position(|&d| d != 0).unwrap_or(digits.len());
    digits[start..].iter().map(|d| (b'0' + d) as char).collect()
}

/// Encode decimal text into a packed decimal slot.
///
/// Extra fraction digits are rounded half away from zero. Fails if the
/// integer part does not fit in the slot.
pub fn encode_bcd(text: &str, decimals: u32, slot: &mut [u8]) -> Result<()> {
    if slot.is_empty() {
        return Err(Error::type_conversion("packed decimal slot is empty"));
    }
    let parsed = parse_decimal(text)?;
    let digits = scale_digits(&parsed, decimals as usize);
    let capacity = slot.len() * 2 - 1;
    if digits.len() > capacity {
        return Err(Error::type_conversion(format!(
            "{} overflows a packed decimal of {} digits with {} decimals",
            text.trim(),
            capacity,
            decimals
        )));
    }

    let sign = if parsed.negative && !digits.is_empty() {
        BCD_SIGN_NEGATIVE
    } else {
        BCD_SIGN_POSITIVE
    };

    let mut nibbles = vec![0u8; capacity - digits.len()];
    nibbles.extend(digits.bytes().map(|b| b - b'0'));
    nibbles.push(sign);

    for (dst, pair) in slot.iter_mut().zip(nibbles.chunks_exact(2)) {
        *dst = (pair[0] << 4) | pair[1];
    }
    Ok(())
}

/// Decode a packed decimal slot to text with exactly `decimals` fraction digits.
pub fn decode_bcd(slot: &[u8], decimals: u32) -> Result<String> {
    if slot.is_empty() {
        return Err(Error::type_conversion("packed decimal slot is empty"));
    }
    let mut digits = Vec::with_capacity(slot.len() * 2);
    for &byte in slot {
        digits.push(byte >> 4);
        digits.push(byte & 0x0F);
    }
    let sign = digits.pop().unwrap_or(BCD_SIGN_POSITIVE);
    let negative = match sign {
        0x0B | BCD_SIGN_NEGATIVE => true,
        0x0A | BCD_SIGN_POSITIVE | 0x0E | BCD_SIGN_UNSIGNED => false,
        other => {
            return Err(Error::type_conversion(format!(
                "invalid packed decimal sign nibble {:#x}",
                other
            )))
        }
    };
    if let Some(bad) = digits.iter().find(|&&d| d > 9) {
        return Err(Error::type_conversion(format!(
            "invalid packed decimal digit nibble {:#x}",
            bad
        )));
    }

    let decimals = decimals as usize;
    while digits.len() <= decimals {
        digits.insert(0, 0);
    }
    let split = digits.len() - decimals;
    let first = digits[..split]
        .iter()
        .position(|&d| d != 0)
        .unwrap_or(split - 1);
    let is_zero = digits.iter().all(|&d| d == 0);

    let mut result = String::with_capacity(digits.len() + 2);
    if negative && !is_zero {
        result.push('-');
    }
    for d in &digits[first..split] {
        result.push((b'0' + d) as char);
    }
    if decimals > 0 {
        result.push('.');
        for d in &digits[split..] {
            result.push((b'0' + d) as char);
        }
    }
    Ok(result)
}

/// Validate digit text and left-pad it with zeros to `width`.
pub fn pad_num(text: &str, width: usize) -> Result<String> {
    let text = text.trim();
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::type_conversion(format!(
            "{:?} contains non-digit characters",
            text
        )));
    }
    if text.len() > width {
        return Err(Error::type_conversion(format!(
            "{} digits exceed field width {}",
            text.len(),
            width
        )));
    }
    Ok(format!("{:0>width$}", text, width = width))
}
