//! Document header: declaration, magic number, presence flags
//! (X.891 clause 12, C.2).

use crate::buffer::OctetReader;
use crate::error::{Error, Result};

/// Magic number every fast infoset document starts with (X.891 12.2).
pub const MAGIC: [u8; 4] = [0xE0, 0x00, 0x00, 0x01];

/// XML declaration identifying a fast infoset document (X.891 12.3).
pub const XML_DECLARATION: &[u8] = b"<?xml encoding='finf'?>";

/// Terminator of an element, attribute list or document (C.2.12).
pub const TERMINATOR: u8 = 0xF0;
/// Two adjacent terminators collapsed into one octet (C.2.12).
pub const DOUBLE_TERMINATOR: u8 = 0xFF;

// Presence octet of the Document type (C.2.3). Bit 1 is padding and
// must be zero.
pub const FLAG_ADDITIONAL_DATA: u8 = 0x40;
pub const FLAG_INITIAL_VOCABULARY: u8 = 0x20;
pub const FLAG_NOTATIONS: u8 = 0x10;
pub const FLAG_UNPARSED_ENTITIES: u8 = 0x08;
pub const FLAG_CHARACTER_ENCODING_SCHEME: u8 = 0x04;
pub const FLAG_STANDALONE: u8 = 0x02;
pub const FLAG_VERSION: u8 = 0x01;

/// Consumes the optional XML declaration and the magic number, returns
/// the presence octet.
pub(crate) fn read_header(r: &mut OctetReader<'_>) -> Result<u8> {
    if r.starts_with(b"<?xml") {
        skip_declaration(r)?;
    }
    let magic = r.read_slice(4)?;
    if magic != MAGIC {
        return Err(Error::InvalidHeader);
    }
    let presence = r.read()?;
    if presence & 0x80 != 0 {
        return Err(Error::InvalidHeader);
    }
    if presence & FLAG_NOTATIONS != 0 {
        return Err(Error::UnsupportedDocumentComponent("notations"));
    }
    if presence & FLAG_UNPARSED_ENTITIES != 0 {
        return Err(Error::UnsupportedDocumentComponent("unparsed-entities"));
    }
    if presence & FLAG_CHARACTER_ENCODING_SCHEME != 0 {
        return Err(Error::UnsupportedDocumentComponent("character-encoding-scheme"));
    }
    if presence & FLAG_STANDALONE != 0 {
        return Err(Error::UnsupportedDocumentComponent("standalone"));
    }
    if presence & FLAG_VERSION != 0 {
        return Err(Error::UnsupportedDocumentComponent("version"));
    }
    Ok(presence)
}

/// Skips a leading `<?xml ...?>` declaration after checking that it
/// declares the `finf` encoding.
fn skip_declaration(r: &mut OctetReader<'_>) -> Result<()> {
    // Die Deklaration ist kurz; 64 Oktette decken alle erlaubten
    // Varianten (mit version und standalone) ab.
    let mut decl = Vec::new();
    loop {
        if decl.len() > 64 {
            return Err(Error::InvalidDeclaration);
        }
        let b = r.read().map_err(|_| Error::InvalidDeclaration)?;
        decl.push(b);
        if decl.ends_with(b"?>") {
            break;
        }
    }
    let has_finf = decl
        .windows(6)
        .any(|w| w == b"'finf'" || w == b"\"finf\"");
    if !has_finf {
        return Err(Error::InvalidDeclaration);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_magic() {
        let mut r = OctetReader::new(&[0xE0, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(read_header(&mut r).unwrap(), 0);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn declaration_then_magic() {
        let mut data = XML_DECLARATION.to_vec();
        data.extend_from_slice(&MAGIC);
        data.push(FLAG_INITIAL_VOCABULARY);
        let mut r = OctetReader::new(&data);
        assert_eq!(read_header(&mut r).unwrap(), FLAG_INITIAL_VOCABULARY);
    }

    #[test]
    fn declaration_with_version_and_double_quotes() {
        let mut data = b"<?xml version=\"1.0\" encoding=\"finf\"?>".to_vec();
        data.extend_from_slice(&MAGIC);
        data.push(0x00);
        let mut r = OctetReader::new(&data);
        assert_eq!(read_header(&mut r).unwrap(), 0);
    }

    #[test]
    fn declaration_without_finf_rejected() {
        let mut data = b"<?xml version='1.0' encoding='utf-8'?>".to_vec();
        data.extend_from_slice(&MAGIC);
        data.push(0x00);
        let mut r = OctetReader::new(&data);
        assert_eq!(read_header(&mut r), Err(Error::InvalidDeclaration));
    }

    #[test]
    fn wrong_magic_rejected() {
        let mut r = OctetReader::new(&[0xE0, 0x00, 0x00, 0x02, 0x00]);
        assert_eq!(read_header(&mut r), Err(Error::InvalidHeader));
    }

    #[test]
    fn reserved_presence_bit_rejected() {
        let mut r = OctetReader::new(&[0xE0, 0x00, 0x00, 0x01, 0x80]);
        assert_eq!(read_header(&mut r), Err(Error::InvalidHeader));
    }

    #[test]
    fn unsupported_components_named() {
        for (flag, name) in [
            (FLAG_NOTATIONS, "notations"),
            (FLAG_UNPARSED_ENTITIES, "unparsed-entities"),
            (FLAG_CHARACTER_ENCODING_SCHEME, "character-encoding-scheme"),
            (FLAG_STANDALONE, "standalone"),
            (FLAG_VERSION, "version"),
        ] {
            let bytes = [0xE0, 0x00, 0x00, 0x01, flag];
            let mut r = OctetReader::new(&bytes);
            assert_eq!(read_header(&mut r), Err(Error::UnsupportedDocumentComponent(name)));
        }
    }

    #[test]
    fn truncated_stream() {
        let mut r = OctetReader::new(&[0xE0, 0x00]);
        assert_eq!(read_header(&mut r), Err(Error::PrematureEndOfStream));
    }
}
