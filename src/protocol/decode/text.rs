//! Fixed-width text codec.
//!
//! Narrow slots hold one byte per character and accept the ISO-8859-1
//! repertoire. Wide slots hold UTF-16LE code units. Both are right-padded
//! with blanks.

use crate::error::{Error, Result};
use crate::protocol::constants::BLANK;
use crate::protocol::types::Encoding;

/// Width of a text slot in characters (code units for wide slots).
pub fn text_width(slot_len: usize, encoding: Encoding) -> usize {
    slot_len / encoding.bytes_per_char()
}

/// Encode text into a fixed-width slot, padding with blanks.
///
/// Fails if the text does not fit; it is never truncated.
pub fn encode_text(text: &str, encoding: Encoding, slot: &mut [u8]) -> Result<()> {
    let width = text_width(slot.len(), encoding);
    match encoding {
        Encoding::Narrow => {
            let count = text.chars().count();
            if count > width {
                return Err(Error::type_conversion(format!(
                    "text of {} characters exceeds field width {}",
                    count, width
                )));
            }
            for (dst, c) in slot.iter_mut().zip(text.chars()) {
                let code = c as u32;
                if code > 0xFF {
                    return Err(Error::type_conversion(format!(
                        "character {:?} cannot be represented in the narrow encoding",
                        c
                    )));
                }
                *dst = code as u8;
            }
            for dst in slot.iter_mut().skip(count) {
                *dst = BLANK as u8;
            }
        }
        Encoding::Wide => {
            let units: Vec<u16> = text.encode_utf16().collect();
            if units.len() > width {
                return Err(Error::type_conversion(format!(
                    "text of {} code units exceeds field width {}",
                    units.len(),
                    width
                )));
            }
            let padding = std::iter::repeat(BLANK).take(width - units.len());
            for (dst, unit) in slot.chunks_exact_mut(2).zip(units.into_iter().chain(padding)) {
                dst.copy_from_slice(&unit.to_le_bytes());
            }
        }
    }
    Ok(())
}

/// Fill a text slot with one repeated character.
pub fn fill_text(unit: u16, encoding: Encoding, slot: &mut [u8]) {
    match encoding {
        Encoding::Narrow => slot.fill(unit as u8),
        Encoding::Wide => {
            for dst in slot.chunks_exact_mut(2) {
                dst.copy_from_slice(&unit.to_le_bytes());
            }
        }
    }
}

/// Decode a fixed-width text slot, including its padding.
pub fn decode_text(slot: &[u8], encoding: Encoding) -> Result<String> {
    match encoding {
        Encoding::Narrow => Ok(slot.iter().map(|&b| b as char).collect()),
        Encoding::Wide => {
            if slot.len() % 2 != 0 {
                return Err(Error::type_conversion(format!(
                    "wide text slot has odd length {}",
                    slot.len()
                )));
            }
            let units: Vec<u16> = slot
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|e| Error::type_conversion(format!("invalid UTF-16 text: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_narrow_pads_with_blanks() {
        let mut slot = [0u8; 5];
        encode_text("AB", Encoding::Narrow, &mut slot).unwrap();
        assert_eq!(&slot, b"AB   ");
        assert_eq!(decode_text(&slot, Encoding::Narrow).unwrap(), "AB   ");
    }

    #[test]
    fn test_encode_wide_little_endian() {
        let mut slot = [0u8; 6];
        encode_text("Ä", Encoding::Wide, &mut slot).unwrap();
        assert_eq!(slot, [0xC4, 0x00, 0x20, 0x00, 0x20, 0x00]);
        assert_eq!(decode_text(&slot, Encoding::Wide).unwrap(), "Ä  ");
    }

    #[test]
    fn test_encode_too_long() {
        let mut slot = [0u8; 3];
        assert!(encode_text("ABCD", Encoding::Narrow, &mut slot).is_err());
        let mut slot = [0u8; 6];
        assert!(encode_text("ABCD", Encoding::Wide, &mut slot).is_err());
    }

    #[test]
    fn test_encode_narrow_rejects_wide_characters() {
        let mut slot = [0u8; 4];
        assert!(encode_text("日本", Encoding::Narrow, &mut slot).is_err());
    }

    #[test]
    fn test_exact_width_fits() {
        let mut slot = [0u8; 8];
        encode_text("ABCD", Encoding::Wide, &mut slot).unwrap();
        assert_eq!(decode_text(&slot, Encoding::Wide).unwrap(), "ABCD");
    }

    #[test]
    fn test_decode_wide_odd_length() {
        assert!(decode_text(&[0x41, 0x00, 0x42], Encoding::Wide).is_err());
    }
}
