//! Restricted alphabets (X.891 8.3, 9.3, C.22.3.3).
//!
//! Ein Restricted-Alphabet-String wird als Folge von Zeichenwerten mit
//! fester Bitbreite kodiert, MSB zuerst. Endet die Bitfolge nicht auf
//! einer Oktettgrenze, folgt der Terminator (alle Bits 1) und der Rest
//! des Oktetts wird mit Einsen aufgefuellt. Das ist die einzige Stelle
//! des Formats, die nicht oktett-ausgerichtet ist; gepackt wird daher
//! hier auf fertigen Puffern, nicht im Stream selbst.

use crate::error::{Error, Result};

/// Built-in alphabet 1: numeric (X.891 9.3.1).
pub const NUMERIC: &str = "0123456789-+.e ";

/// Built-in alphabet 2: date and time (X.891 9.3.2).
pub const DATE_TIME: &str = "0123456789-:TZ ";

/// Wire identifiers of the built-in alphabets (X.891 9.3).
pub const NUMERIC_ID: u32 = 1;
pub const DATE_TIME_ID: u32 = 2;
/// First identifier available to application alphabets; smaller values
/// above 2 are reserved (X.891 8.3).
pub const APPLICATION_ID_BASE: u32 = 32;

/// Bits per character value: enough to express every character index
/// plus the all-ones terminator.
pub fn bits_per_character(alphabet_len: usize) -> u32 {
    debug_assert!(alphabet_len >= 2);
    usize::BITS - alphabet_len.leading_zeros()
}

/// True if every character of `text` is expressible in `alphabet`.
pub fn encodable(text: &str, alphabet: &str) -> bool {
    text.chars().all(|c| alphabet.chars().any(|a| a == c))
}

/// Packs `text` into character values of fixed bit width.
///
/// Returns an error for characters outside the alphabet. The result is
/// empty iff `text` is empty; callers must not put an empty string on
/// the wire (minimum encoded length is 1).
pub fn encode(text: &str, alphabet: &str) -> Result<Vec<u8>> {
    let chars: Vec<char> = alphabet.chars().collect();
    if chars.len() < 2 {
        return Err(Error::InvalidAlphabet);
    }
    let bits = bits_per_character(chars.len());
    let terminator: u32 = (1 << bits) - 1;

    let mut out = Vec::with_capacity(text.len() * bits as usize / 8 + 1);
    let mut acc: u32 = 0;
    let mut filled: u32 = 0;

    for c in text.chars() {
        let v = chars
            .iter()
            .position(|&a| a == c)
            .ok_or(Error::CharacterOutsideAlphabet(c))? as u32;
        acc = (acc << bits) | v;
        filled += bits;
        while filled >= 8 {
            filled -= 8;
            out.push((acc >> filled) as u8);
        }
    }
    if filled > 0 {
        // Terminator, dann mit Einsen bis zur Oktettgrenze auffuellen.
        acc = (acc << bits) | terminator;
        filled += bits;
        while filled >= 8 {
            filled -= 8;
            out.push((acc >> filled) as u8);
        }
        if filled > 0 {
            let pad = 8 - filled;
            out.push(((acc << pad) as u8) | ((1u32 << pad) - 1) as u8);
        }
    }
    Ok(out)
}

/// Unpacks character values back into text.
pub fn decode(octets: &[u8], alphabet: &str) -> Result<String> {
    let chars: Vec<char> = alphabet.chars().collect();
    if chars.len() < 2 {
        return Err(Error::InvalidAlphabet);
    }
    let bits = bits_per_character(chars.len());
    let terminator: u32 = (1 << bits) - 1;
    let total_bits = octets.len() as u32 * 8;

    let mut text = String::new();
    let mut cursor: u32 = 0;
    while cursor + bits <= total_bits {
        let v = read_bits(octets, cursor, bits);
        cursor += bits;
        if v == terminator {
            // Alles hinter dem Terminator muss Fuellung aus Einsen sein.
            while cursor < total_bits {
                if read_bits(octets, cursor, 1) != 1 {
                    return Err(Error::AlphabetValueOutOfRange {
                        value: terminator,
                        size: chars.len(),
                    });
                }
                cursor += 1;
            }
            return Ok(text);
        }
        let c = *chars.get(v as usize).ok_or(Error::AlphabetValueOutOfRange {
            value: v,
            size: chars.len(),
        })?;
        text.push(c);
    }
    // Oktett-ausgerichteter Fall ohne Terminator: Restbits muessen leer sein.
    if cursor < total_bits && read_bits(octets, cursor, total_bits - cursor) != (1 << (total_bits - cursor)) - 1 {
        return Err(Error::AlphabetValueOutOfRange { value: 0, size: chars.len() });
    }
    Ok(text)
}

fn read_bits(octets: &[u8], start: u32, count: u32) -> u32 {
    let mut v = 0u32;
    for i in start..start + count {
        let octet = octets[(i / 8) as usize];
        let bit = (octet >> (7 - (i % 8))) & 1;
        v = (v << 1) | bit as u32;
    }
    v
}
