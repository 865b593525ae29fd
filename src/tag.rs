//! Dispatch tables over leading octets.
//!
//! Der Decoder klassifiziert jedes fuehrende Oktett mit einem einzigen
//! Tabellenzugriff statt mit Bitmasken-Kaskaden. Die Tabellen werden
//! zur Compile-Zeit aus den Bitlayouts von X.891 Annex C aufgebaut;
//! die Feinheiten (Restbits von Indizes und Laengen) parst danach der
//! jeweilige Leser.

/// Classification of an octet in children context (C.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildTag {
    /// Element, name index 1..=32 (C.3.7.2 small).
    ElementIndexSmall,
    /// Element, name index 33..=2080.
    ElementIndexMedium,
    /// Element, name index 2081..=526368.
    ElementIndexLarge,
    /// Element, name index 526369..=1574944.
    ElementIndexXLarge,
    /// Element with namespace attributes (C.3.4).
    ElementNamespaces,
    /// Element with literal qualified name (C.3.7.1).
    ElementLiteral,
    /// Character chunk, UTF-8 literal (C.3.7.3, C.7).
    CharactersUtf8,
    /// Character chunk, UTF-16 literal.
    CharactersUtf16,
    /// Character chunk in a restricted alphabet.
    CharactersAlphabet,
    /// Character chunk holding encoding-algorithm data.
    CharactersAlgorithm,
    /// Character chunk, table index 1..=16 (C.28 small).
    CharactersIndexSmall,
    /// Character chunk, table index 17..=1040.
    CharactersIndexMedium,
    /// Character chunk, table index 1041..=263184.
    CharactersIndexLarge,
    /// Character chunk, table index 263185..=1311760.
    CharactersIndexXLarge,
    /// Unexpanded entity reference (C.3.6).
    EntityReference,
    /// Processing instruction (C.3.8, C.5).
    ProcessingInstruction,
    /// Comment (C.3.9, C.8).
    Comment,
    /// End of element or document (C.2.12).
    Terminator,
    /// Two terminators in one octet.
    DoubleTerminator,
    /// No production matches.
    Illegal,
}

/// Classification of an octet in attribute context (C.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTag {
    /// Name index 1..=64 (C.17 small on first bit).
    IndexSmall,
    /// Name index 65..=8256.
    IndexMedium,
    /// Name index 8257..=1056832.
    IndexLarge,
    /// Literal qualified name (C.17.3).
    Literal,
    /// End of the attribute list.
    Terminator,
    /// End of attribute list and of the element.
    DoubleTerminator,
    /// No production matches.
    Illegal,
}

/// Classification of the first octet of a non-identifying string value
/// (C.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    /// Literal UTF-8 string.
    LiteralUtf8,
    /// Literal UTF-16 string.
    LiteralUtf16,
    /// Restricted-alphabet string.
    LiteralAlphabet,
    /// Encoding-algorithm data.
    LiteralAlgorithm,
    /// Table index 1..=64 (C.25 small).
    IndexSmall,
    /// Table index 65..=8256.
    IndexMedium,
    /// Table index 8257..=1056832.
    IndexLarge,
    /// The empty string (octet FF).
    Empty,
    /// No production matches.
    Illegal,
}

const fn classify_child(b: u8) -> ChildTag {
    if b < 0x80 {
        // Element (C.3.7): Bit 2 ist das Attributflag, Bits 3-8 der
        // Namensteil nach C.18.
        return match b & 0x3F {
            0x00..=0x1F => ChildTag::ElementIndexSmall,
            0x20..=0x27 => ChildTag::ElementIndexMedium,
            0x28..=0x2F => ChildTag::ElementIndexLarge,
            0x30 => ChildTag::ElementIndexXLarge,
            0x38 => ChildTag::ElementNamespaces,
            0x3C..=0x3F => ChildTag::ElementLiteral,
            _ => ChildTag::Illegal,
        };
    }
    if b < 0xC0 {
        // Character chunk (C.3.7.3, C.7): Bit 3 unterscheidet Literal
        // von Tabellenindex.
        if b & 0x20 == 0 {
            return match (b >> 2) & 0x03 {
                0 => ChildTag::CharactersUtf8,
                1 => ChildTag::CharactersUtf16,
                2 => ChildTag::CharactersAlphabet,
                _ => ChildTag::CharactersAlgorithm,
            };
        }
        return match b & 0x1F {
            0x00..=0x0F => ChildTag::CharactersIndexSmall,
            0x10..=0x13 => ChildTag::CharactersIndexMedium,
            0x14..=0x17 => ChildTag::CharactersIndexLarge,
            0x18 => ChildTag::CharactersIndexXLarge,
            _ => ChildTag::Illegal,
        };
    }
    match b {
        0xC8..=0xCB => ChildTag::EntityReference,
        0xE1 => ChildTag::ProcessingInstruction,
        0xE2 => ChildTag::Comment,
        0xF0 => ChildTag::Terminator,
        0xFF => ChildTag::DoubleTerminator,
        _ => ChildTag::Illegal,
    }
}

const fn classify_attribute(b: u8) -> AttributeTag {
    match b {
        0x00..=0x3F => AttributeTag::IndexSmall,
        0x40..=0x5F => AttributeTag::IndexMedium,
        0x60..=0x6F => AttributeTag::IndexLarge,
        0x78..=0x7B => AttributeTag::Literal,
        0xF0 => AttributeTag::Terminator,
        0xFF => AttributeTag::DoubleTerminator,
        _ => AttributeTag::Illegal,
    }
}

const fn classify_value(b: u8) -> ValueTag {
    if b == 0xFF {
        return ValueTag::Empty;
    }
    if b < 0x80 {
        // Literal (C.14.3): Bit 2 Add-to-table, Bits 3-4 die
        // Darstellung nach C.19.
        return match (b >> 4) & 0x03 {
            0 => ValueTag::LiteralUtf8,
            1 => ValueTag::LiteralUtf16,
            2 => ValueTag::LiteralAlphabet,
            _ => ValueTag::LiteralAlgorithm,
        };
    }
    match b {
        0x80..=0xBF => ValueTag::IndexSmall,
        0xC0..=0xDF => ValueTag::IndexMedium,
        0xE0..=0xEF => ValueTag::IndexLarge,
        _ => ValueTag::Illegal,
    }
}

const fn build_child_table() -> [ChildTag; 256] {
    let mut table = [ChildTag::Illegal; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = classify_child(i as u8);
        i += 1;
    }
    table
}

const fn build_attribute_table() -> [AttributeTag; 256] {
    let mut table = [AttributeTag::Illegal; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = classify_attribute(i as u8);
        i += 1;
    }
    table
}

const fn build_value_table() -> [ValueTag; 256] {
    let mut table = [ValueTag::Illegal; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = classify_value(i as u8);
        i += 1;
    }
    table
}

/// Children context: one entry per leading octet.
pub static CHILD: [ChildTag; 256] = build_child_table();

/// Attribute context.
pub static ATTRIBUTE: [AttributeTag; 256] = build_attribute_table();

/// Non-identifying string values (attribute values, comments, PI data).
pub static VALUE: [ValueTag; 256] = build_value_table();
