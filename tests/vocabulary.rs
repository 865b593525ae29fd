//! Initialvokabulare, externe Vokabulare und Tabellengrenzen.

use std::sync::Arc;

use rufis::{
    decode, encode, AtContent, ChContent, CharacterData, Decoder, Encoder, Error, FiEvent,
    FiOptions, InitialVocabulary, NameSurrogate, NsContent, QualifiedName,
};

fn local(name: &str) -> Arc<QualifiedName> {
    Arc::new(QualifiedName::local(name))
}

fn invoice_vocabulary() -> InitialVocabulary {
    InitialVocabulary {
        prefixes: vec!["inv".into()],
        namespace_names: vec!["urn:invoice".into()],
        local_names: vec!["invoice".into(), "total".into(), "currency".into()],
        attribute_values: vec!["EUR".into()],
        character_chunks: vec!["0.00".into()],
        element_names: vec![
            NameSurrogate {
                prefix_index: Some(0),
                namespace_index: Some(0),
                local_name_index: 0,
            },
            NameSurrogate {
                prefix_index: Some(0),
                namespace_index: Some(0),
                local_name_index: 1,
            },
        ],
        attribute_names: vec![NameSurrogate {
            prefix_index: None,
            namespace_index: None,
            local_name_index: 2,
        }],
        ..Default::default()
    }
}

fn invoice_events() -> Vec<FiEvent> {
    let invoice = Arc::new(QualifiedName::new("inv", "urn:invoice", "invoice"));
    let total = Arc::new(QualifiedName::new("inv", "urn:invoice", "total"));
    vec![
        FiEvent::StartDocument,
        FiEvent::StartElement(invoice),
        FiEvent::NamespaceAttribute(NsContent {
            prefix: Arc::from("inv"),
            namespace_name: Arc::from("urn:invoice"),
        }),
        FiEvent::StartElement(total),
        FiEvent::Attribute(AtContent {
            qname: local("currency"),
            value: CharacterData::text("EUR"),
        }),
        FiEvent::Characters(ChContent { data: CharacterData::text("0.00") }),
        FiEvent::EndElement,
        FiEvent::EndElement,
        FiEvent::EndDocument,
    ]
}

#[test]
fn initial_vocabulary_round_trip() {
    let options = FiOptions::default().with_initial_vocabulary(invoice_vocabulary());
    let events = invoice_events();
    let octets = encode(&events, &options).unwrap();
    assert_eq!(decode(&octets).unwrap(), events);
}

#[test]
fn initial_vocabulary_moves_strings_out_of_the_body() {
    let options = FiOptions::default().with_initial_vocabulary(invoice_vocabulary());
    let events = invoice_events();
    let with_iv = encode(&events, &options).unwrap();

    // Jeder Name steht genau einmal im Vokabularblock; der Rumpf
    // traegt nur Indizes.
    for needle in [&b"urn:invoice"[..], b"total", b"currency", b"EUR", b"0.00"] {
        let hits = with_iv.windows(needle.len()).filter(|w| *w == needle).count();
        assert_eq!(hits, 1, "{}", String::from_utf8_lossy(needle));
    }
}

#[test]
fn external_vocabulary_round_trip() {
    let iv = invoice_vocabulary();
    let events = invoice_events();

    let mut enc = Encoder::new(FiOptions::default());
    enc.set_external_vocabulary("urn:vocab:1", &iv).unwrap();
    let octets = enc.encode(&events).unwrap();

    // Die Namen stehen nicht im Strom, nur die URI.
    assert!(!octets.windows(7).any(|w| w == b"invoice"));

    let mut dec = Decoder::new(FiOptions::default());
    dec.register_external_vocabulary("urn:vocab:1", &iv).unwrap();
    assert_eq!(dec.decode(&octets).unwrap(), events);
}

#[test]
fn external_vocabulary_unknown_to_decoder() {
    let iv = invoice_vocabulary();
    let mut enc = Encoder::new(FiOptions::default());
    enc.set_external_vocabulary("urn:invoice:vocab", &iv).unwrap();
    let octets = enc.encode(&invoice_events()).unwrap();
    assert_eq!(
        decode(&octets),
        Err(Error::ExternalVocabularyNotRegistered("urn:invoice:vocab".into()))
    );
}

#[test]
fn external_vocabulary_is_shorter_than_inline() {
    let iv = invoice_vocabulary();
    let events = invoice_events();

    let inline = encode(
        &events,
        &FiOptions::default().with_initial_vocabulary(iv.clone()),
    )
    .unwrap();

    let mut enc = Encoder::new(FiOptions::default());
    enc.set_external_vocabulary("urn:iv", &iv).unwrap();
    let external = enc.encode(&events).unwrap();
    assert!(external.len() < inline.len());
}

#[test]
fn value_tables_stop_growing_at_the_maximum() {
    // Maximum 8: Namen belegen einen Teil, die Attributwerte den Rest.
    // Sobald die Wert-Tabelle voll ist, schreibt der Encoder ohne
    // Add-Bit weiter und der Decoder bleibt synchron.
    let options = FiOptions::default().with_table_maximum(8);
    let mut events = vec![FiEvent::StartDocument, FiEvent::StartElement(local("r"))];
    for i in 0..20 {
        events.push(FiEvent::StartElement(local("e")));
        events.push(FiEvent::Attribute(AtContent {
            qname: local("x"),
            value: CharacterData::text(&format!("value-{i}")),
        }));
        events.push(FiEvent::EndElement);
    }
    events.push(FiEvent::EndElement);
    events.push(FiEvent::EndDocument);

    let octets = encode(&events, &options).unwrap();
    assert_eq!(Decoder::new(options).decode(&octets).unwrap(), events);
}

#[test]
fn name_table_overflow_is_an_error() {
    // Identifying-Strings werden zwingend eingefuegt: laeuft die
    // Local-Name-Tabelle voll, bricht der Encoder ab.
    let options = FiOptions::default().with_table_maximum(2);
    let mut events = vec![FiEvent::StartDocument, FiEvent::StartElement(local("r"))];
    for i in 0..5 {
        events.push(FiEvent::StartElement(local(&format!("n{i}"))));
        events.push(FiEvent::EndElement);
    }
    events.push(FiEvent::EndElement);
    events.push(FiEvent::EndDocument);
    assert!(matches!(
        encode(&events, &options),
        Err(Error::TableMaximumExceeded { .. })
    ));
}

#[test]
fn vocabulary_applies_per_document() {
    let options = FiOptions::default().with_initial_vocabulary(invoice_vocabulary());
    let mut enc = Encoder::new(options.clone());
    let events = invoice_events();
    let first = enc.encode(&events).unwrap();
    let second = enc.encode(&events).unwrap();
    assert_eq!(first, second);
    let mut dec = Decoder::new(options);
    assert_eq!(dec.decode(&first).unwrap(), events);
    assert_eq!(dec.decode(&second).unwrap(), events);
}

#[test]
fn invalid_initial_vocabulary_rejected_by_encoder() {
    let iv = InitialVocabulary {
        local_names: vec!["n".into()],
        element_names: vec![NameSurrogate {
            prefix_index: Some(3),
            namespace_index: None,
            local_name_index: 0,
        }],
        ..Default::default()
    };
    let options = FiOptions::default().with_initial_vocabulary(iv);
    let events = vec![
        FiEvent::StartDocument,
        FiEvent::StartElement(local("n")),
        FiEvent::EndElement,
        FiEvent::EndDocument,
    ];
    assert_eq!(
        encode(&events, &options),
        Err(Error::InvalidInitialVocabulary("name surrogate index"))
    );
}
