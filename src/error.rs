//! Central error types for the Fast Infoset implementation.
//!
//! Each variant references the relevant ITU-T X.891 (ISO/IEC 24824-1) clause.

use core::fmt;

/// All error conditions raised by the Fast Infoset codec.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The leading XML declaration is not one of the permitted `finf`
    /// declarations (X.891 12.3).
    InvalidDeclaration,
    /// The stream does not start with the magic number `E0 00 00 01`
    /// (X.891 12.2, 12.4).
    InvalidHeader,
    /// An optional document component is present that this implementation
    /// does not process (X.891 7.2: notations, unparsed entities,
    /// character-encoding-scheme, standalone, version).
    UnsupportedDocumentComponent(&'static str),
    /// The stream ended before a complete structure was decoded.
    PrematureEndOfStream,
    /// An octet does not match any production of the active grammar
    /// (X.891 C.2-C.8).
    InvalidToken {
        /// Der Oktettwert der nicht passte.
        octet: u8,
        /// Decoder context in which the octet was read.
        context: &'static str,
    },
    /// A terminator octet appeared where no open structure remains
    /// (X.891 C.2.12).
    InvalidTerminator,
    /// A vocabulary-table index lies outside the populated range
    /// (X.891 8.2).
    IndexOutOfRange {
        /// Der Index aus dem Stream (1-basiert).
        index: usize,
        /// Number of entries currently in the table.
        size: usize,
        /// Which vocabulary table was addressed.
        table: &'static str,
    },
    /// A qualified name carries a prefix but no namespace name
    /// (X.891 7.16, C.18).
    PrefixWithoutNamespace,
    /// Two attributes of one element have the same expanded name
    /// (XML well-formedness; X.891 7.4).
    DuplicateAttribute(String),
    /// Events were submitted to the encoder in an order no infoset can
    /// produce (X.891 7.1-7.13).
    OrderingViolation {
        /// Was erwartet wurde.
        expected: &'static str,
        /// Was gefunden wurde.
        found: &'static str,
    },
    /// An octet string is not valid UTF-8 (X.891 C.22.3.1).
    InvalidUtf8,
    /// An octet string is not valid UTF-16BE (X.891 C.22.3.2).
    InvalidUtf16,
    /// A restricted-alphabet character value does not address a character
    /// of the alphabet (X.891 C.22.3.3).
    AlphabetValueOutOfRange {
        /// Decoded character value.
        value: u32,
        /// Number of characters in the alphabet.
        size: usize,
    },
    /// A character cannot be expressed in the selected restricted
    /// alphabet (X.891 C.22.3.3).
    CharacterOutsideAlphabet(char),
    /// A restricted alphabet must contain at least two characters
    /// (X.891 8.3).
    InvalidAlphabet,
    /// A restricted-alphabet identifier is reserved or addresses no
    /// table entry (X.891 8.3, 9.3).
    AlphabetNotSupported(u32),
    /// The octet length of encoding-algorithm data is not a multiple of
    /// the algorithm's element size (X.891 10.5-10.9).
    InvalidAlgorithmDataLength {
        /// Length of the encoded octet string.
        length: usize,
        /// Required element size in octets.
        element_size: usize,
    },
    /// Encoding-algorithm data could not be converted between its octet
    /// and character forms (X.891 10.2-10.10).
    InvalidAlgorithmData(String),
    /// An encoding-algorithm identifier is reserved or addresses no table
    /// entry (X.891 10.3).
    AlgorithmNotSupported(u32),
    /// No codec has been registered for an application encoding-algorithm
    /// URI (X.891 10.4).
    AlgorithmNotRegistered(String),
    /// The stream references an external vocabulary that has not been
    /// registered with the decoder (X.891 7.2.13).
    ExternalVocabularyNotRegistered(String),
    /// A dynamic vocabulary table reached its configured maximum size.
    ///
    /// Schutz gegen praeparierte Streams, die Tabellen unbegrenzt
    /// wachsen lassen wuerden.
    TableMaximumExceeded {
        /// Configured maximum number of entries.
        maximum: usize,
        /// Which vocabulary table overflowed.
        table: &'static str,
    },
    /// An initial-vocabulary component is invalid: empty string item or
    /// unresolvable name-surrogate index (X.891 12.6, C.16-C.17).
    InvalidInitialVocabulary(&'static str),
    /// Octets remain after the document terminator (X.891 12.11).
    TrailingOctets(usize),
    /// Ein IO-Fehler beim Schreiben des Fast-Infoset-Streams.
    IoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDeclaration => write!(f, "invalid XML declaration for a fast infoset document (X.891 12.3)"),
            Self::InvalidHeader => write!(f, "stream does not start with the fast infoset magic number (X.891 12.2)"),
            Self::UnsupportedDocumentComponent(name) => write!(f, "optional document component '{name}' is not supported (X.891 7.2)"),
            Self::PrematureEndOfStream => write!(f, "premature end of fast infoset stream"),
            Self::InvalidToken { octet, context } => write!(f, "octet {octet:#04x} matches no production while decoding {context} (X.891 Annex C)"),
            Self::InvalidTerminator => write!(f, "terminator with no open structure (X.891 C.2.12)"),
            Self::IndexOutOfRange { index, size, table } => write!(f, "index {index} exceeds {table} table of size {size} (X.891 8.2)"),
            Self::PrefixWithoutNamespace => write!(f, "qualified name has a prefix but no namespace name (X.891 7.16)"),
            Self::DuplicateAttribute(name) => write!(f, "duplicate attribute '{name}' (X.891 7.4)"),
            Self::OrderingViolation { expected, found } => write!(f, "event ordering violation: expected {expected}, found {found}"),
            Self::InvalidUtf8 => write!(f, "octet string is not valid UTF-8 (X.891 C.22.3.1)"),
            Self::InvalidUtf16 => write!(f, "octet string is not valid UTF-16BE (X.891 C.22.3.2)"),
            Self::AlphabetValueOutOfRange { value, size } => write!(f, "restricted-alphabet value {value} exceeds alphabet of {size} characters (X.891 C.22.3.3)"),
            Self::CharacterOutsideAlphabet(c) => write!(f, "character {c:?} is not in the restricted alphabet (X.891 C.22.3.3)"),
            Self::InvalidAlphabet => write!(f, "restricted alphabet must contain at least two characters (X.891 8.3)"),
            Self::AlphabetNotSupported(id) => write!(f, "restricted alphabet {id} is reserved or unknown (X.891 8.3)"),
            Self::InvalidAlgorithmDataLength { length, element_size } => write!(f, "algorithm data length {length} is not a multiple of {element_size} (X.891 clause 10)"),
            Self::InvalidAlgorithmData(msg) => write!(f, "invalid encoding-algorithm data (X.891 clause 10): {msg}"),
            Self::AlgorithmNotSupported(id) => write!(f, "encoding algorithm {id} is reserved or unknown (X.891 10.3)"),
            Self::AlgorithmNotRegistered(uri) => write!(f, "no codec registered for encoding algorithm '{uri}' (X.891 10.4)"),
            Self::ExternalVocabularyNotRegistered(uri) => write!(f, "external vocabulary '{uri}' is not registered (X.891 7.2.13)"),
            Self::TableMaximumExceeded { maximum, table } => write!(f, "{table} table exceeds configured maximum of {maximum} entries"),
            Self::InvalidInitialVocabulary(what) => write!(f, "invalid initial vocabulary: {what} (X.891 12.6)"),
            Self::TrailingOctets(n) => write!(f, "{n} octets remain after the document terminator (X.891 12.11)"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
