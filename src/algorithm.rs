//! Encoding algorithms (X.891 clause 10).
//!
//! Die eingebauten Algorithmen 1..=10 wandeln typisierte Werte in ihre
//! Oktettform (big-endian) und zurueck; jeder besitzt zusaetzlich eine
//! Zeichenform fuer Adapter, die Textinhalte erwarten.
//! Anwendungsalgorithmen (Kennung >= 32) transportieren rohe Oktette
//! und werden ueber registrierte Codecs zugaenglich gemacht.

use core::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{Error, Result};

/// Wire identifiers of the built-in algorithms (X.891 10.3).
pub const HEXADECIMAL_ID: u32 = 1;
pub const BASE64_ID: u32 = 2;
pub const SHORT_ID: u32 = 3;
pub const INT_ID: u32 = 4;
pub const LONG_ID: u32 = 5;
pub const BOOLEAN_ID: u32 = 6;
pub const FLOAT_ID: u32 = 7;
pub const DOUBLE_ID: u32 = 8;
pub const UUID_ID: u32 = 9;
pub const CDATA_ID: u32 = 10;
/// First identifier available to application algorithms; 11..=31 are
/// reserved by the standard.
pub const APPLICATION_ID_BASE: u32 = 32;

/// Codec for an application-defined encoding algorithm, registered
/// under its URI.
pub trait EncodingAlgorithm: fmt::Debug + Send + Sync {
    /// Converts the octet form into a character representation.
    fn octets_to_characters(&self, octets: &[u8]) -> Result<String>;
    /// Converts the character representation back into octets.
    fn characters_to_octets(&self, text: &str) -> Result<Vec<u8>>;
}

/// Decoded payload of an algorithm-encoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum AlgorithmData {
    Hexadecimal(Vec<u8>),
    Base64(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Boolean(Vec<bool>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Uuid(Vec<u128>),
    Cdata(Arc<str>),
    /// Data of an application algorithm: 0-based index into the
    /// encoding-algorithm vocabulary table plus the raw octets.
    Application { index: usize, data: Vec<u8> },
}

impl AlgorithmData {
    /// The wire identifier this payload is encoded under.
    pub fn algorithm_id(&self) -> u32 {
        match self {
            Self::Hexadecimal(_) => HEXADECIMAL_ID,
            Self::Base64(_) => BASE64_ID,
            Self::Short(_) => SHORT_ID,
            Self::Int(_) => INT_ID,
            Self::Long(_) => LONG_ID,
            Self::Boolean(_) => BOOLEAN_ID,
            Self::Float(_) => FLOAT_ID,
            Self::Double(_) => DOUBLE_ID,
            Self::Uuid(_) => UUID_ID,
            Self::Cdata(_) => CDATA_ID,
            Self::Application { index, .. } => APPLICATION_ID_BASE + *index as u32,
        }
    }

    /// Serialises the payload into its octet form (X.891 10.5-10.9,
    /// multi-element values big-endian, booleans bit-packed).
    pub fn to_octets(&self) -> Vec<u8> {
        match self {
            Self::Hexadecimal(o) | Self::Base64(o) => o.clone(),
            Self::Short(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            Self::Int(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            Self::Long(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            Self::Boolean(v) => encode_booleans(v),
            Self::Float(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            Self::Double(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            Self::Uuid(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            Self::Cdata(s) => s.as_bytes().to_vec(),
            Self::Application { data, .. } => data.clone(),
        }
    }

    /// Parses the octet form of a built-in algorithm.
    ///
    /// Application identifiers are resolved by the decoder against the
    /// vocabulary table and never reach this function.
    pub fn from_octets(id: u32, octets: &[u8]) -> Result<Self> {
        match id {
            HEXADECIMAL_ID => Ok(Self::Hexadecimal(octets.to_vec())),
            BASE64_ID => Ok(Self::Base64(octets.to_vec())),
            SHORT_ID => Ok(Self::Short(chunked(octets, 2)?
                .map(|c| i16::from_be_bytes([c[0], c[1]]))
                .collect())),
            INT_ID => Ok(Self::Int(chunked(octets, 4)?
                .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect())),
            LONG_ID => Ok(Self::Long(chunked(octets, 8)?
                .map(|c| {
                    let mut b = [0u8; 8];
                    b.copy_from_slice(c);
                    i64::from_be_bytes(b)
                })
                .collect())),
            BOOLEAN_ID => Ok(Self::Boolean(decode_booleans(octets)?)),
            FLOAT_ID => Ok(Self::Float(chunked(octets, 4)?
                .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect())),
            DOUBLE_ID => Ok(Self::Double(chunked(octets, 8)?
                .map(|c| {
                    let mut b = [0u8; 8];
                    b.copy_from_slice(c);
                    f64::from_be_bytes(b)
                })
                .collect())),
            UUID_ID => Ok(Self::Uuid(chunked(octets, 16)?
                .map(|c| {
                    let mut b = [0u8; 16];
                    b.copy_from_slice(c);
                    u128::from_be_bytes(b)
                })
                .collect())),
            CDATA_ID => {
                let s = core::str::from_utf8(octets).map_err(|_| Error::InvalidUtf8)?;
                Ok(Self::Cdata(Arc::from(s)))
            }
            other => Err(Error::AlgorithmNotSupported(other)),
        }
    }

    /// The character representation (X.891 10.2: every built-in
    /// algorithm defines one).
    pub fn to_characters(&self) -> Result<String> {
        match self {
            Self::Hexadecimal(o) => {
                let mut s = String::with_capacity(o.len() * 2);
                for b in o {
                    let _ = write!(s, "{b:02x}");
                }
                Ok(s)
            }
            Self::Base64(o) => Ok(BASE64.encode(o)),
            Self::Short(v) => Ok(join_values(v)),
            Self::Int(v) => Ok(join_values(v)),
            Self::Long(v) => Ok(join_values(v)),
            Self::Boolean(v) => Ok(v
                .iter()
                .map(|b| if *b { "true" } else { "false" })
                .collect::<Vec<_>>()
                .join(" ")),
            Self::Float(v) => Ok(join_values(v)),
            Self::Double(v) => Ok(join_values(v)),
            Self::Uuid(v) => Ok(v.iter().map(|u| format_uuid(*u)).collect::<Vec<_>>().join(" ")),
            Self::Cdata(s) => Ok(s.to_string()),
            Self::Application { .. } => Err(Error::InvalidAlgorithmData(
                "application algorithm data has no built-in character form".into(),
            )),
        }
    }

    /// Parses the character representation of a built-in algorithm.
    pub fn from_characters(id: u32, text: &str) -> Result<Self> {
        match id {
            HEXADECIMAL_ID => Ok(Self::Hexadecimal(parse_hex(text)?)),
            BASE64_ID => {
                let compact: String = text.split_whitespace().collect();
                BASE64
                    .decode(compact.as_bytes())
                    .map(Self::Base64)
                    .map_err(|e| Error::InvalidAlgorithmData(e.to_string()))
            }
            SHORT_ID => parse_values(text).map(Self::Short),
            INT_ID => parse_values(text).map(Self::Int),
            LONG_ID => parse_values(text).map(Self::Long),
            BOOLEAN_ID => text
                .split_whitespace()
                .map(|t| match t {
                    "true" | "1" => Ok(true),
                    "false" | "0" => Ok(false),
                    other => Err(Error::InvalidAlgorithmData(format!("not a boolean: '{other}'"))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Boolean),
            FLOAT_ID => parse_values(text).map(Self::Float),
            DOUBLE_ID => parse_values(text).map(Self::Double),
            UUID_ID => text
                .split_whitespace()
                .map(parse_uuid)
                .collect::<Result<Vec<_>>>()
                .map(Self::Uuid),
            CDATA_ID => Ok(Self::Cdata(Arc::from(text))),
            other => Err(Error::AlgorithmNotSupported(other)),
        }
    }
}

fn chunked(octets: &[u8], element_size: usize) -> Result<core::slice::ChunksExact<'_, u8>> {
    if octets.len() % element_size != 0 {
        return Err(Error::InvalidAlgorithmDataLength {
            length: octets.len(),
            element_size,
        });
    }
    Ok(octets.chunks_exact(element_size))
}

fn join_values<T: ToString>(values: &[T]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

fn parse_values<T: core::str::FromStr>(text: &str) -> Result<Vec<T>>
where
    T::Err: fmt::Display,
{
    text.split_whitespace()
        .map(|t| t.parse().map_err(|e: T::Err| Error::InvalidAlgorithmData(e.to_string())))
        .collect()
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    // Byteweise statt ueber Teil-Slices: Eingabetext kann beliebiges
    // UTF-8 enthalten.
    let digits = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| match b {
            b'0'..=b'9' => Ok(b - b'0'),
            b'a'..=b'f' => Ok(b - b'a' + 10),
            b'A'..=b'F' => Ok(b - b'A' + 10),
            other => Err(Error::InvalidAlgorithmData(format!("not a hex digit: 0x{other:02x}"))),
        })
        .collect::<Result<Vec<u8>>>()?;
    if digits.len() % 2 != 0 {
        return Err(Error::InvalidAlgorithmData("odd number of hex digits".into()));
    }
    Ok(digits.chunks_exact(2).map(|pair| pair[0] << 4 | pair[1]).collect())
}

fn format_uuid(u: u128) -> String {
    let h = format!("{u:032x}");
    format!("{}-{}-{}-{}-{}", &h[0..8], &h[8..12], &h[12..16], &h[16..20], &h[20..32])
}

fn parse_uuid(text: &str) -> Result<u128> {
    let compact: String = text.chars().filter(|c| *c != '-').collect();
    if compact.len() != 32 {
        return Err(Error::InvalidAlgorithmData(format!("not a UUID: '{text}'")));
    }
    u128::from_str_radix(&compact, 16).map_err(|e| Error::InvalidAlgorithmData(e.to_string()))
}

/// Bit-packs booleans: the first four bits hold the count of unused
/// bits in the last octet, the values follow MSB-first (X.891 10.7).
fn encode_booleans(values: &[bool]) -> Vec<u8> {
    let total_bits = 4 + values.len();
    let octets = total_bits.div_ceil(8);
    let unused = octets * 8 - total_bits;

    let mut out = vec![0u8; octets];
    out[0] = (unused as u8) << 4;
    for (i, v) in values.iter().enumerate() {
        if *v {
            let bit = 4 + i;
            out[bit / 8] |= 0x80 >> (bit % 8);
        }
    }
    // Fuellbits bleiben 0.
    out
}

fn decode_booleans(octets: &[u8]) -> Result<Vec<bool>> {
    let first = *octets.first().ok_or(Error::InvalidAlgorithmDataLength {
        length: 0,
        element_size: 1,
    })?;
    let unused = (first >> 4) as usize;
    let total_bits = octets.len() * 8;
    if 4 + unused > total_bits || unused > 7 && octets.len() > 1 {
        return Err(Error::InvalidAlgorithmData("unused-bit count exceeds data".into()));
    }
    let count = total_bits - 4 - unused;
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let bit = 4 + i;
        values.push(octets[bit / 8] & (0x80 >> (bit % 8)) != 0);
    }
    Ok(values)
}
