use std::sync::Arc;

use super::*;
use crate::vocabulary::NameSurrogate;

/// Haengt den Header (Magic, Presence-Oktett 0) vor den Rumpf.
fn doc(body: &[u8]) -> Vec<u8> {
    let mut data = vec![0xE0, 0x00, 0x00, 0x01, 0x00];
    data.extend_from_slice(body);
    data
}

fn local(name: &str) -> Arc<QualifiedName> {
    Arc::new(QualifiedName::local(name))
}

#[test]
fn empty_element() {
    // <doc/>: Literal-Element, Local-Name "doc", Element- und
    // Dokument-Terminator zu FF kombiniert.
    let data = doc(&[0x3C, 0x02, b'd', b'o', b'c', 0xFF]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events,
        vec![
            FiEvent::StartDocument,
            FiEvent::StartElement(local("doc")),
            FiEvent::EndElement,
            FiEvent::EndDocument,
        ]
    );
}

#[test]
fn element_with_text() {
    // "hello" als UTF-8-Chunk mit Add-Bit, C.24-Laenge 5.
    let data = doc(&[0x3C, 0x02, b'd', b'o', b'c', 0x92, 0x02, b'h', b'e', b'l', b'l', b'o', 0xFF]);
    let events = decode(&data).unwrap();
    assert_eq!(events[2], FiEvent::Characters(ChContent { data: CharacterData::text("hello") }));
}

#[test]
fn repeated_element_uses_name_index() {
    // Zweites <doc> als Index 1 (Oktett 0x00), danach zwei einzelne
    // Terminatoren fuer das aeussere Element und das Dokument.
    let data = doc(&[
        0x3C, 0x02, b'd', b'o', b'c', // <doc> literal
        0x00, 0xF0, // <doc/> via index 1
        0xF0, 0xF0, // </doc>, Dokumentende
    ]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events,
        vec![
            FiEvent::StartDocument,
            FiEvent::StartElement(local("doc")),
            FiEvent::StartElement(local("doc")),
            FiEvent::EndElement,
            FiEvent::EndElement,
            FiEvent::EndDocument,
        ]
    );
}

#[test]
fn repeated_text_uses_chunk_index() {
    let data = doc(&[
        0x3C, 0x00, b'a', // <a>
        0x91, b'h', b'i', // "hi" mit Add-Bit
        0xA0, // Index 1
        0xFF,
    ]);
    let events = decode(&data).unwrap();
    assert_eq!(events[2], events[3]);
    if let FiEvent::Characters(ch) = &events[2] {
        assert_eq!(ch.data.as_text(), Some("hi"));
    } else {
        panic!("expected characters");
    }
}

#[test]
fn attribute_with_literal_value() {
    // <a x="1"/>: Attributflag, Literal-Attributname, UTF-8-Wert mit
    // Add-Bit; FF schliesst Attributliste und Element.
    let data = doc(&[0x7C, 0x00, b'a', 0x78, 0x00, b'x', 0x40, b'1', 0xFF, 0xF0]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events,
        vec![
            FiEvent::StartDocument,
            FiEvent::StartElement(local("a")),
            FiEvent::Attribute(AtContent {
                qname: local("x"),
                value: CharacterData::text("1"),
            }),
            FiEvent::EndElement,
            FiEvent::EndDocument,
        ]
    );
}

#[test]
fn empty_attribute_value() {
    let data = doc(&[0x7C, 0x00, b'a', 0x78, 0x00, b'x', 0xFF, 0xFF, 0xF0]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events[2],
        FiEvent::Attribute(AtContent { qname: local("x"), value: CharacterData::text("") })
    );
}

#[test]
fn duplicate_attribute_rejected() {
    // x="1" zweimal: beim zweiten Vorkommen per Index 1.
    let data = doc(&[
        0x7C, 0x00, b'a', // <a> mit Attributen
        0x78, 0x00, b'x', 0x40, b'1', // x="1" literal
        0x00, 0x40, b'2', // x="2" via Namensindex
        0xFF, 0xF0,
    ]);
    assert_eq!(decode(&data), Err(Error::DuplicateAttribute("x".into())));
}

#[test]
fn namespace_attributes_precede_element_name() {
    // <p:e xmlns:p="urn:x"/>: NS-Attribut mit Praefix und Namespace,
    // dann das Namensoktett mit Literal-QName.
    let data = doc(&[
        0x38, // Element mit NS-Attributen, keine Attribute
        0xCF, // xmlns-Attribut, p=1 n=1
        0x00, b'p', // Praefix "p" literal
        0x04, b'u', b'r', b'n', b':', b'x', // Namespace "urn:x"
        0xF0, // Ende der NS-Attribute
        0x3F, // Namensoktett: Literal-QName, p=1 n=1
        0x80, // Praefix via Index 1
        0x80, // Namespace via Index 1
        0x00, b'e', // Local-Name "e"
        0xFF,
    ]);
    let events = decode(&data).unwrap();
    let q = QualifiedName::new("p", "urn:x", "e");
    assert_eq!(events[1], FiEvent::StartElement(Arc::new(q)));
    assert_eq!(
        events[2],
        FiEvent::NamespaceAttribute(NsContent {
            prefix: Arc::from("p"),
            namespace_name: Arc::from("urn:x"),
        })
    );
}

#[test]
fn utf16_chunk() {
    // "hi" in UTF-16BE: 00 68 00 69.
    let data = doc(&[0x3C, 0x00, b'a', 0x86, 0x01, 0x00, 0x68, 0x00, 0x69, 0xFF]);
    let events = decode(&data).unwrap();
    assert_eq!(events[2], FiEvent::Characters(ChContent { data: CharacterData::text("hi") }));
}

#[test]
fn numeric_alphabet_chunk() {
    // "12345" im Numeric-Alphabet: Nibbles 1 2 3 4 5 F.
    let data = doc(&[0x3C, 0x00, b'a', 0x88, 0x02, 0x00, 0x12, 0x34, 0x5F, 0xFF]);
    let events = decode(&data).unwrap();
    assert_eq!(events[2], FiEvent::Characters(ChContent { data: CharacterData::text("12345") }));
}

#[test]
fn numeric_alphabet_attribute_value() {
    // x="123": Alphabet-Wert, id 1, Oktette 12 3F.
    let data = doc(&[0x7C, 0x00, b'a', 0x78, 0x00, b'x', 0x20, 0x01, 0x12, 0x3F, 0xFF, 0xF0]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events[2],
        FiEvent::Attribute(AtContent { qname: local("x"), value: CharacterData::text("123") })
    );
}

#[test]
fn reserved_alphabet_rejected() {
    // Alphabet-Kennung 7 ist reserviert.
    let data = doc(&[0x3C, 0x00, b'a', 0x88, 0x18, 0x12, 0xFF]);
    assert_eq!(decode(&data), Err(Error::AlphabetNotSupported(7)));
}

#[test]
fn int_algorithm_chunk() {
    // Algorithmus 4 (int), ein Element: 00 00 00 01.
    let data = doc(&[0x3C, 0x00, b'a', 0x8C, 0x0E, 0x01, 0x00, 0x00, 0x00, 0x01, 0xFF]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events[2],
        FiEvent::Characters(ChContent {
            data: CharacterData::Typed(AlgorithmData::Int(vec![1])),
        })
    );
}

#[test]
fn boolean_algorithm_chunk() {
    // Algorithmus 6 (boolean): 4 ungenutzte Bits, Werte 1 0 1 0.
    let data = doc(&[0x3C, 0x00, b'a', 0x8C, 0x14, 0x0A, 0xFF]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events[2],
        FiEvent::Characters(ChContent {
            data: CharacterData::Typed(AlgorithmData::Boolean(vec![true, false, true, false])),
        })
    );
}

#[test]
fn algorithm_with_bad_length_rejected() {
    // int verlangt Vielfache von 4 Oktetten.
    let data = doc(&[0x3C, 0x00, b'a', 0x8C, 0x0D, 0x00, 0x00, 0x01, 0xFF]);
    assert_eq!(
        decode(&data),
        Err(Error::InvalidAlgorithmDataLength { length: 2, element_size: 4 })
    );
}

#[test]
fn comment_and_processing_instruction() {
    let data = doc(&[
        0xE1, 0x02, b'x', b'm', b'l', 0x02, b'a', b'=', b'b', // <?xml a=b?>
        0xE2, 0x01, b'h', b'i', // <!--hi-->
        0x3C, 0x00, b'a', 0xFF,
    ]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events[1],
        FiEvent::ProcessingInstruction(PiContent {
            target: Arc::from("xml"),
            data: Arc::from("a=b"),
        })
    );
    assert_eq!(events[2], FiEvent::Comment(CmContent { text: Arc::from("hi") }));
}

#[test]
fn unexpanded_entity_reference() {
    let data = doc(&[
        0x3C, 0x00, b'a', // <a>
        0xCA, // ER mit System-Identifier
        0x02, b'e', b'n', b't', // Name "ent"
        0x04, b'u', b'r', b'n', b':', b's', // System "urn:s"
        0xFF,
    ]);
    let events = decode(&data).unwrap();
    assert_eq!(
        events[2],
        FiEvent::UnexpandedEntityReference(ErContent {
            name: Arc::from("ent"),
            system_identifier: Some(Arc::from("urn:s")),
            public_identifier: None,
        })
    );
}

#[test]
fn xml_declaration_accepted() {
    let mut data = document::XML_DECLARATION.to_vec();
    data.extend_from_slice(&doc(&[0x3C, 0x00, b'a', 0xFF]));
    assert!(decode(&data).is_ok());
}

#[test]
fn trailing_octets_rejected() {
    let data = doc(&[0x3C, 0x00, b'a', 0xFF, 0x00]);
    assert_eq!(decode(&data), Err(Error::TrailingOctets(1)));
}

#[test]
fn truncated_stream_rejected() {
    let data = doc(&[0x3C, 0x02, b'd']);
    assert_eq!(decode(&data), Err(Error::PrematureEndOfStream));
}

#[test]
fn double_terminator_at_document_level_rejected() {
    let data = doc(&[0x3C, 0x00, b'a', 0xF0, 0xFF]);
    assert_eq!(decode(&data), Err(Error::InvalidTerminator));
}

#[test]
fn illegal_child_octet_rejected() {
    let data = doc(&[0xC0]);
    assert_eq!(decode(&data), Err(Error::InvalidToken { octet: 0xC0, context: "children" }));
}

#[test]
fn name_index_out_of_range() {
    // Index 2, aber nur ein Element-Name in der Tabelle.
    let data = doc(&[0x3C, 0x00, b'a', 0x01, 0xF0, 0xF0, 0xF0]);
    assert_eq!(
        decode(&data),
        Err(Error::IndexOutOfRange { index: 2, size: 1, table: "element-name" })
    );
}

#[test]
fn initial_vocabulary_local_names_and_elements() {
    // Initialvokabular: Local-Names ["doc"], Element-Surrogat darauf.
    let mut data = vec![0xE0, 0x00, 0x00, 0x01, document::FLAG_INITIAL_VOCABULARY];
    data.extend_from_slice(&[
        0x00, 0x82, // Presence: local-name + element-surrogate
        0x00, // ein Local-Name
        0x02, b'd', b'o', b'c', // "doc"
        0x00, // ein Surrogat
        0x00, // kein Praefix, kein Namespace
        0x00, // Local-Name-Index 1
    ]);
    data.extend_from_slice(&[0x00, 0xFF]); // <doc/> via Index 1
    let events = decode(&data).unwrap();
    assert_eq!(events[1], FiEvent::StartElement(local("doc")));
}

#[test]
fn initial_vocabulary_with_nonzero_padding_rejected() {
    let data = vec![0xE0, 0x00, 0x00, 0x01, document::FLAG_INITIAL_VOCABULARY, 0x80, 0x00];
    assert_eq!(
        decode(&data),
        Err(Error::InvalidInitialVocabulary("non-zero padding bits"))
    );
}

#[test]
fn unregistered_external_vocabulary_rejected() {
    let mut data = vec![0xE0, 0x00, 0x00, 0x01, document::FLAG_INITIAL_VOCABULARY];
    data.extend_from_slice(&[0x10, 0x00, 0x05, b'u', b'r', b'n', b':', b'e', b'v']);
    assert_eq!(
        decode(&data),
        Err(Error::ExternalVocabularyNotRegistered("urn:ev".into()))
    );
}

#[test]
fn external_vocabulary_supplies_names() {
    let iv = InitialVocabulary {
        local_names: vec!["doc".into()],
        element_names: vec![NameSurrogate {
            prefix_index: None,
            namespace_index: None,
            local_name_index: 0,
        }],
        ..Default::default()
    };
    let mut d = Decoder::new(FiOptions::default());
    d.register_external_vocabulary("urn:ev", &iv).unwrap();

    let mut data = vec![0xE0, 0x00, 0x00, 0x01, document::FLAG_INITIAL_VOCABULARY];
    data.extend_from_slice(&[0x10, 0x00, 0x05, b'u', b'r', b'n', b':', b'e', b'v']);
    data.extend_from_slice(&[0x00, 0xFF]); // <doc/> via Index 1
    let events = d.decode(&data).unwrap();
    assert_eq!(events[1], FiEvent::StartElement(local("doc")));

    // Das Parent-Vokabular uebersteht das naechste Dokument nicht von
    // selbst: ohne Referenz ist die Tabelle wieder leer.
    let plain = doc(&[0x00, 0xFF]);
    assert!(matches!(d.decode(&plain), Err(Error::IndexOutOfRange { .. })));
}

#[test]
fn additional_data_after_document() {
    let mut data = vec![0xE0, 0x00, 0x00, 0x01, document::FLAG_ADDITIONAL_DATA];
    data.extend_from_slice(&[0x3C, 0x00, b'a', 0xFF]);
    data.extend_from_slice(&[
        0x00, // ein Datum
        0x06, b'u', b'r', b'n', b':', b'a', b'p', b'p', // Kennung
        0x01, 0xDE, 0xAD, // zwei Oktette Nutzdaten
    ]);
    let mut d = Decoder::new(FiOptions::default());
    d.decode(&data).unwrap();
    assert_eq!(
        d.additional_data(),
        &[AdditionalDatum { id: "urn:app".into(), data: vec![0xDE, 0xAD] }]
    );
}

#[test]
fn application_algorithm_requires_registration() {
    // Algorithmus-URI im Initialvokabular, Kennung 32, kein Codec.
    let mut data = vec![0xE0, 0x00, 0x00, 0x01, document::FLAG_INITIAL_VOCABULARY];
    data.extend_from_slice(&[
        0x04, 0x00, // Presence: encoding-algorithms
        0x00, // eine URI
        0x04, b'u', b'r', b'n', b':', b'q', // "urn:q"
    ]);
    data.extend_from_slice(&[0x3C, 0x00, b'a', 0x8C, 0x7D, b'h', b'i', 0xFF]);
    assert_eq!(
        decode(&data),
        Err(Error::AlgorithmNotRegistered("urn:q".into()))
    );
}

#[derive(Debug)]
struct Passthrough;

impl EncodingAlgorithm for Passthrough {
    fn octets_to_characters(&self, octets: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(octets).into_owned())
    }

    fn characters_to_octets(&self, text: &str) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}

#[test]
fn application_algorithm_with_registered_codec() {
    let mut data = vec![0xE0, 0x00, 0x00, 0x01, document::FLAG_INITIAL_VOCABULARY];
    data.extend_from_slice(&[
        0x04, 0x00,
        0x00,
        0x04, b'u', b'r', b'n', b':', b'q',
    ]);
    data.extend_from_slice(&[0x3C, 0x00, b'a', 0x8C, 0x7D, b'h', b'i', 0xFF]);

    let mut d = Decoder::new(FiOptions::default());
    d.register_encoding_algorithm("urn:q", Arc::new(Passthrough));
    let events = d.decode(&data).unwrap();
    assert_eq!(
        events[2],
        FiEvent::Characters(ChContent {
            data: CharacterData::Typed(AlgorithmData::Application {
                index: 0,
                data: b"hi".to_vec(),
            }),
        })
    );
    let codec = d.encoding_algorithm("urn:q").unwrap();
    assert_eq!(codec.octets_to_characters(b"hi").unwrap(), "hi");
}

#[test]
fn string_interning_shares_allocations() {
    // Zweimal "hello" literal (ohne Add-Bit): mit Interning teilen sich
    // beide Chunks eine Allokation.
    let data = doc(&[
        0x3C, 0x00, b'a',
        0x82, 0x02, b'h', b'e', b'l', b'l', b'o',
        0x82, 0x02, b'h', b'e', b'l', b'l', b'o',
        0xFF,
    ]);
    let mut d = Decoder::new(FiOptions::default().with_string_interning(true));
    let events = d.decode(&data).unwrap();
    let (a, b) = match (&events[2], &events[3]) {
        (FiEvent::Characters(a), FiEvent::Characters(b)) => (&a.data, &b.data),
        _ => panic!("expected two character chunks"),
    };
    match (a, b) {
        (CharacterData::Text(a), CharacterData::Text(b)) => {
            assert!(Arc::ptr_eq(a, b));
        }
        _ => panic!("expected text"),
    }
}

#[test]
fn table_maximum_guards_decoder_tables() {
    // Maximum 1: das zweite Literal ueberschreitet die Chunk-Tabelle.
    let data = doc(&[
        0x3C, 0x00, b'a',
        0x91, b'x', b'y',
        0x91, b'y', b'z',
        0xFF,
    ]);
    let mut d = Decoder::new(FiOptions::default().with_table_maximum(1));
    assert!(matches!(d.decode(&data), Err(Error::TableMaximumExceeded { .. })));
}

// --- Integer- und Laengenformen ---

#[test]
fn index_tiers() {
    let mut r = OctetReader::new(&[]);
    assert_eq!(decode_index(0x00, &mut r).unwrap(), 1);
    assert_eq!(decode_index(0x3F, &mut r).unwrap(), 64);

    let mut r = OctetReader::new(&[0x00]);
    assert_eq!(decode_index(0x40, &mut r).unwrap(), 65);
    let mut r = OctetReader::new(&[0xFF]);
    assert_eq!(decode_index(0x5F, &mut r).unwrap(), 8256);
    let mut r = OctetReader::new(&[0x00, 0x00]);
    assert_eq!(decode_index(0x60, &mut r).unwrap(), 8257);
    let mut r = OctetReader::new(&[0xFF, 0xFF]);
    assert_eq!(decode_index(0x6F, &mut r).unwrap(), 1_056_832);
}

#[test]
fn chunk_index_tiers() {
    let mut r = OctetReader::new(&[]);
    assert_eq!(decode_chunk_index(0xA0, &mut r).unwrap(), 1);
    assert_eq!(decode_chunk_index(0xAF, &mut r).unwrap(), 16);

    let mut r = OctetReader::new(&[0x00]);
    assert_eq!(decode_chunk_index(0xB0, &mut r).unwrap(), 17);
    let mut r = OctetReader::new(&[0x00, 0x00]);
    assert_eq!(decode_chunk_index(0xB4, &mut r).unwrap(), 1041);
    let mut r = OctetReader::new(&[0x00, 0x00, 0x00]);
    assert_eq!(decode_chunk_index(0xB8, &mut r).unwrap(), 263_185);
    let mut r = OctetReader::new(&[0x0F, 0xFF, 0xFF]);
    assert_eq!(decode_chunk_index(0xB8, &mut r).unwrap(), 1_311_760);
    // Die vier Fuellbits des XLarge-Falls muessen null sein.
    let mut r = OctetReader::new(&[0x10, 0x00, 0x00]);
    assert!(decode_chunk_index(0xB8, &mut r).is_err());
}

#[test]
fn element_name_index_tiers() {
    let mut d = Decoder::new(FiOptions::default());
    // Leere Tabelle: jeder Tier muss bis zur Indexberechnung kommen und
    // dann an der Tabelle scheitern, nicht am Oktettlayout.
    let mut r = OctetReader::new(&[]);
    assert_eq!(
        d.decode_element_name(0x00, &mut r),
        Err(Error::IndexOutOfRange { index: 1, size: 0, table: "element-name" })
    );
    let mut r = OctetReader::new(&[0x00]);
    assert_eq!(
        d.decode_element_name(0x20, &mut r),
        Err(Error::IndexOutOfRange { index: 33, size: 0, table: "element-name" })
    );
    let mut r = OctetReader::new(&[0x00, 0x00]);
    assert_eq!(
        d.decode_element_name(0x28, &mut r),
        Err(Error::IndexOutOfRange { index: 2081, size: 0, table: "element-name" })
    );
    let mut r = OctetReader::new(&[0x0F, 0xFF, 0xFF]);
    assert_eq!(
        d.decode_element_name(0x30, &mut r),
        Err(Error::IndexOutOfRange { index: 1_574_944, size: 0, table: "element-name" })
    );
}

#[test]
fn c22_length_tiers() {
    let mut r = OctetReader::new(&[]);
    assert_eq!(decode_c22_length(0x00, &mut r).unwrap(), 1);
    assert_eq!(decode_c22_length(0x3F, &mut r).unwrap(), 64);
    let mut r = OctetReader::new(&[0x00]);
    assert_eq!(decode_c22_length(0x40, &mut r).unwrap(), 65);
    let mut r = OctetReader::new(&[0xFF]);
    assert_eq!(decode_c22_length(0x40, &mut r).unwrap(), 320);
    let mut r = OctetReader::new(&[0x00, 0x00, 0x00, 0x00]);
    assert_eq!(decode_c22_length(0x60, &mut r).unwrap(), 321);
}

#[test]
fn c23_length_tiers() {
    let mut r = OctetReader::new(&[]);
    assert_eq!(decode_c23_length(0x00, &mut r).unwrap(), 1);
    assert_eq!(decode_c23_length(0x07, &mut r).unwrap(), 8);
    let mut r = OctetReader::new(&[0x00]);
    assert_eq!(decode_c23_length(0x08, &mut r).unwrap(), 9);
    let mut r = OctetReader::new(&[0xFF]);
    assert_eq!(decode_c23_length(0x08, &mut r).unwrap(), 264);
    let mut r = OctetReader::new(&[0x00, 0x00, 0x00, 0x00]);
    assert_eq!(decode_c23_length(0x0C, &mut r).unwrap(), 265);
}

#[test]
fn c24_length_tiers() {
    let mut r = OctetReader::new(&[]);
    assert_eq!(decode_c24_length(0x00, &mut r).unwrap(), 1);
    assert_eq!(decode_c24_length(0x01, &mut r).unwrap(), 2);
    let mut r = OctetReader::new(&[0x00]);
    assert_eq!(decode_c24_length(0x02, &mut r).unwrap(), 3);
    let mut r = OctetReader::new(&[0xFF]);
    assert_eq!(decode_c24_length(0x02, &mut r).unwrap(), 258);
    let mut r = OctetReader::new(&[0x00, 0x00, 0x00, 0x00]);
    assert_eq!(decode_c24_length(0x03, &mut r).unwrap(), 259);
}

#[test]
fn sequence_count_tiers() {
    assert_eq!(decode_sequence_count(&mut OctetReader::new(&[0x00])).unwrap(), 1);
    assert_eq!(decode_sequence_count(&mut OctetReader::new(&[0x7F])).unwrap(), 128);
    assert_eq!(
        decode_sequence_count(&mut OctetReader::new(&[0x80, 0x00, 0x00])).unwrap(),
        129
    );
    assert_eq!(
        decode_sequence_count(&mut OctetReader::new(&[0x8F, 0xFF, 0xFF])).unwrap(),
        1_048_704
    );
    assert!(decode_sequence_count(&mut OctetReader::new(&[0x90, 0x00, 0x00])).is_err());
}
