//! Fast Infoset decoder.
//!
//! Der Decoder laeuft token-getrieben ueber den Oktettstrom: das
//! fuehrende Oktett wird ueber die Tabellen in `tag` klassifiziert,
//! der zugehoerige Leser konsumiert den Rest der Struktur. Elemente
//! werden nicht rekursiv, sondern mit einem Tiefenzaehler dekodiert.

use std::sync::Arc;

use log::{debug, trace};

use crate::algorithm::{AlgorithmData, EncodingAlgorithm, APPLICATION_ID_BASE};
use crate::alphabet;
use crate::buffer::OctetReader;
use crate::document::{self, TERMINATOR};
use crate::duplicate_attribute::DuplicateAttributeVerifier;
use crate::error::{Error, Result};
use crate::event::{
    AtContent, CharacterData, ChContent, CmContent, ErContent, FiEvent, NsContent, PiContent,
};
use crate::options::{AdditionalDatum, FiOptions};
use crate::qname::QualifiedName;
use crate::tag::{AttributeTag, ChildTag, ValueTag, ATTRIBUTE, CHILD, VALUE};
use crate::value_array::ValueArray;
use crate::vocabulary::{FrozenParserVocabulary, InitialVocabulary, ParserVocabulary};
use crate::{FastHashMap, FastHashSet};

/// Decodes one document with default options.
pub fn decode(data: &[u8]) -> Result<Vec<FiEvent>> {
    Decoder::new(FiOptions::default()).decode(data)
}

/// Selector for the eight dynamic string tables.
#[derive(Debug, Clone, Copy)]
enum StrTable {
    Prefix,
    NamespaceName,
    LocalName,
    OtherNcname,
    OtherUri,
    AttributeValue,
    CharacterChunk,
    OtherString,
}

/// Stateful decoder; reusable across documents.
///
/// Externe Vokabulare und Algorithmus-Codecs werden einmal registriert
/// und gelten dann fuer alle folgenden `decode`-Aufrufe.
pub struct Decoder {
    options: FiOptions,
    vocabulary: ParserVocabulary,
    external_vocabularies: FastHashMap<String, Arc<FrozenParserVocabulary>>,
    algorithms: FastHashMap<String, Arc<dyn EncodingAlgorithm>>,
    duplicates: DuplicateAttributeVerifier,
    interner: FastHashSet<Arc<str>>,
    additional_data: Vec<AdditionalDatum>,
    empty: Arc<str>,
}

impl Decoder {
    pub fn new(options: FiOptions) -> Self {
        let vocabulary = ParserVocabulary::new(options.table_maximum());
        Self {
            options,
            vocabulary,
            external_vocabularies: FastHashMap::default(),
            algorithms: FastHashMap::default(),
            duplicates: DuplicateAttributeVerifier::new(),
            interner: FastHashSet::default(),
            additional_data: Vec::new(),
            empty: Arc::from(""),
        }
    }

    /// Makes an external vocabulary available under its URI; documents
    /// referencing it decode against the frozen tables as parent layer.
    pub fn register_external_vocabulary(
        &mut self,
        uri: &str,
        vocabulary: &InitialVocabulary,
    ) -> Result<()> {
        let frozen = FrozenParserVocabulary::from_initial(vocabulary)?;
        self.external_vocabularies.insert(uri.to_owned(), Arc::new(frozen));
        Ok(())
    }

    /// Registers a codec for an application encoding algorithm.
    pub fn register_encoding_algorithm(&mut self, uri: &str, codec: Arc<dyn EncodingAlgorithm>) {
        self.algorithms.insert(uri.to_owned(), codec);
    }

    /// The registered codec for a URI, if any.
    pub fn encoding_algorithm(&self, uri: &str) -> Option<&Arc<dyn EncodingAlgorithm>> {
        self.algorithms.get(uri)
    }

    /// Additional-data items of the most recently decoded document.
    pub fn additional_data(&self) -> &[AdditionalDatum] {
        &self.additional_data
    }

    /// Decodes a complete document into its event sequence.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<FiEvent>> {
        trace!("decoding fast infoset document, {} octets", data.len());
        self.vocabulary = ParserVocabulary::new(self.options.table_maximum());
        self.additional_data.clear();

        let mut r = OctetReader::new(data);
        let presence = document::read_header(&mut r)?;
        if presence & document::FLAG_INITIAL_VOCABULARY != 0 {
            self.decode_initial_vocabulary(&mut r)?;
        }

        let mut events = vec![FiEvent::StartDocument];
        self.decode_children(&mut r, &mut events)?;

        if presence & document::FLAG_ADDITIONAL_DATA != 0 {
            self.decode_additional_data(&mut r)?;
        }
        if r.remaining() > 0 {
            return Err(Error::TrailingOctets(r.remaining()));
        }
        events.push(FiEvent::EndDocument);
        Ok(events)
    }

    // --- Initial vocabulary (X.891 12.6, C.2.5) ---

    fn decode_initial_vocabulary(&mut self, r: &mut OctetReader<'_>) -> Result<()> {
        let b1 = r.read()?;
        let b2 = r.read()?;
        if b1 & 0xE0 != 0 {
            return Err(Error::InvalidInitialVocabulary("non-zero padding bits"));
        }

        if b1 & 0x10 != 0 {
            // Externes Vokabular zuerst: es bildet die Parent-Schicht
            // unter allen In-Dokument-Eintraegen.
            let lead = r.read()?;
            if lead & 0x80 != 0 {
                return Err(Error::InvalidInitialVocabulary("external vocabulary URI"));
            }
            let len = decode_c22_length(lead, r)?;
            let octets = r.read_slice(len)?;
            let uri = core::str::from_utf8(octets).map_err(|_| Error::InvalidUtf8)?;
            let frozen = self
                .external_vocabularies
                .get(uri)
                .cloned()
                .ok_or_else(|| Error::ExternalVocabularyNotRegistered(uri.to_owned()))?;
            debug!("attaching external vocabulary '{uri}'");
            self.vocabulary.attach(&frozen);
        }

        if b1 & 0x08 != 0 {
            for _ in 0..decode_sequence_count(r)? {
                let a = self.decode_vocabulary_string(r)?;
                if a.chars().count() < 2 {
                    return Err(Error::InvalidAlphabet);
                }
                self.vocabulary.restricted_alphabet.add(a)?;
            }
        }
        if b1 & 0x04 != 0 {
            for _ in 0..decode_sequence_count(r)? {
                let uri = self.decode_vocabulary_string(r)?;
                self.vocabulary.encoding_algorithm.add(uri)?;
            }
        }
        if b1 & 0x02 != 0 {
            self.decode_string_component(r, StrTable::Prefix)?;
        }
        if b1 & 0x01 != 0 {
            self.decode_string_component(r, StrTable::NamespaceName)?;
        }
        if b2 & 0x80 != 0 {
            self.decode_string_component(r, StrTable::LocalName)?;
        }
        if b2 & 0x40 != 0 {
            self.decode_string_component(r, StrTable::OtherNcname)?;
        }
        if b2 & 0x20 != 0 {
            self.decode_string_component(r, StrTable::OtherUri)?;
        }
        if b2 & 0x10 != 0 {
            self.decode_string_component(r, StrTable::AttributeValue)?;
        }
        if b2 & 0x08 != 0 {
            self.decode_string_component(r, StrTable::CharacterChunk)?;
        }
        if b2 & 0x04 != 0 {
            self.decode_string_component(r, StrTable::OtherString)?;
        }
        if b2 & 0x02 != 0 {
            for _ in 0..decode_sequence_count(r)? {
                let q = self.decode_name_surrogate(r)?;
                self.vocabulary.element_name.add(q)?;
            }
        }
        if b2 & 0x01 != 0 {
            for _ in 0..decode_sequence_count(r)? {
                let q = self.decode_name_surrogate(r)?;
                self.vocabulary.attribute_name.add(q)?;
            }
        }
        debug!(
            "initial vocabulary: {} local names, {} element names",
            self.vocabulary.local_name.size(),
            self.vocabulary.element_name.size()
        );
        Ok(())
    }

    fn decode_string_component(&mut self, r: &mut OctetReader<'_>, t: StrTable) -> Result<()> {
        for _ in 0..decode_sequence_count(r)? {
            let s = self.decode_vocabulary_string(r)?;
            self.table_mut(t).add(s)?;
        }
        Ok(())
    }

    fn decode_vocabulary_string(&mut self, r: &mut OctetReader<'_>) -> Result<Arc<str>> {
        let lead = r.read()?;
        if lead & 0x80 != 0 {
            return Err(Error::InvalidInitialVocabulary("string item lead octet"));
        }
        let len = decode_c22_length(lead, r)?;
        let octets = r.read_slice(len)?;
        self.decode_utf8(octets)
    }

    fn decode_name_surrogate(&mut self, r: &mut OctetReader<'_>) -> Result<Arc<QualifiedName>> {
        let presence = r.read()?;
        if presence & 0xFC != 0 {
            return Err(Error::InvalidInitialVocabulary("name surrogate presence octet"));
        }
        let prefix = if presence & 0x02 != 0 {
            let idx = decode_surrogate_index(r)?;
            Arc::clone(self.vocabulary.prefix.get(idx - 1)?)
        } else {
            Arc::clone(&self.empty)
        };
        let namespace = if presence & 0x01 != 0 {
            let idx = decode_surrogate_index(r)?;
            Arc::clone(self.vocabulary.namespace_name.get(idx - 1)?)
        } else {
            Arc::clone(&self.empty)
        };
        let idx = decode_surrogate_index(r)?;
        let local = Arc::clone(self.vocabulary.local_name.get(idx - 1)?);
        let q = QualifiedName::from_parts(prefix, namespace, local);
        if !q.has_valid_shape() {
            return Err(Error::PrefixWithoutNamespace);
        }
        Ok(Arc::new(q))
    }

    // --- Children (C.3) ---

    fn decode_children(&mut self, r: &mut OctetReader<'_>, events: &mut Vec<FiEvent>) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let b = r.read()?;
            match CHILD[b as usize] {
                ChildTag::ElementIndexSmall
                | ChildTag::ElementIndexMedium
                | ChildTag::ElementIndexLarge
                | ChildTag::ElementIndexXLarge
                | ChildTag::ElementNamespaces
                | ChildTag::ElementLiteral => {
                    let ended = self.decode_element(b, r, events)?;
                    if ended {
                        events.push(FiEvent::EndElement);
                    } else {
                        depth += 1;
                    }
                }
                ChildTag::CharactersUtf8 => {
                    let data = self.decode_chunk_string(b, r, false)?;
                    events.push(FiEvent::Characters(ChContent { data }));
                }
                ChildTag::CharactersUtf16 => {
                    let data = self.decode_chunk_string(b, r, true)?;
                    events.push(FiEvent::Characters(ChContent { data }));
                }
                ChildTag::CharactersAlphabet => {
                    let add = b & 0x10 != 0;
                    let o2 = r.read()?;
                    let id = (((b & 0x03) as u32) << 6 | (o2 >> 2) as u32) + 1;
                    let len = decode_c24_length(o2 & 0x03, r)?;
                    let octets = r.read_slice(len)?;
                    let data = self.decode_alphabet_chunk(id, octets, add, StrTable::CharacterChunk)?;
                    events.push(FiEvent::Characters(ChContent { data }));
                }
                ChildTag::CharactersAlgorithm => {
                    let o2 = r.read()?;
                    let id = (((b & 0x03) as u32) << 6 | (o2 >> 2) as u32) + 1;
                    let len = decode_c24_length(o2 & 0x03, r)?;
                    let octets = r.read_slice(len)?;
                    let data = self.decode_algorithm_chunk(id, octets)?;
                    events.push(FiEvent::Characters(ChContent { data }));
                }
                ChildTag::CharactersIndexSmall
                | ChildTag::CharactersIndexMedium
                | ChildTag::CharactersIndexLarge
                | ChildTag::CharactersIndexXLarge => {
                    let idx = decode_chunk_index(b, r)?;
                    let s = Arc::clone(self.vocabulary.character_chunk.get(idx - 1)?);
                    events.push(FiEvent::Characters(ChContent { data: CharacterData::Text(s) }));
                }
                ChildTag::EntityReference => {
                    let system = b & 0x02 != 0;
                    let public = b & 0x01 != 0;
                    let name = self.decode_identifying_string(r, StrTable::OtherNcname)?;
                    let system_identifier = if system {
                        Some(self.decode_identifying_string(r, StrTable::OtherUri)?)
                    } else {
                        None
                    };
                    let public_identifier = if public {
                        Some(self.decode_identifying_string(r, StrTable::OtherUri)?)
                    } else {
                        None
                    };
                    events.push(FiEvent::UnexpandedEntityReference(ErContent {
                        name,
                        system_identifier,
                        public_identifier,
                    }));
                }
                ChildTag::ProcessingInstruction => {
                    let target = self.decode_identifying_string(r, StrTable::OtherNcname)?;
                    let data = self.decode_text_value(r, "processing-instruction data")?;
                    events.push(FiEvent::ProcessingInstruction(PiContent { target, data }));
                }
                ChildTag::Comment => {
                    let text = self.decode_text_value(r, "comment")?;
                    events.push(FiEvent::Comment(CmContent { text }));
                }
                ChildTag::Terminator => {
                    if depth == 0 {
                        return Ok(());
                    }
                    events.push(FiEvent::EndElement);
                    depth -= 1;
                }
                ChildTag::DoubleTerminator => match depth {
                    0 => return Err(Error::InvalidTerminator),
                    1 => {
                        events.push(FiEvent::EndElement);
                        return Ok(());
                    }
                    _ => {
                        events.push(FiEvent::EndElement);
                        events.push(FiEvent::EndElement);
                        depth -= 2;
                    }
                },
                ChildTag::Illegal => {
                    return Err(Error::InvalidToken { octet: b, context: "children" });
                }
            }
        }
    }

    /// Decodes one element start including namespace attributes and the
    /// attribute list. Returns true if the attribute list was closed by
    /// the double terminator, which also ends the element.
    fn decode_element(
        &mut self,
        b: u8,
        r: &mut OctetReader<'_>,
        events: &mut Vec<FiEvent>,
    ) -> Result<bool> {
        let has_attributes = b & 0x40 != 0;

        let mut namespaces = Vec::new();
        let qname = if CHILD[b as usize] == ChildTag::ElementNamespaces {
            loop {
                let nb = r.read()?;
                if nb == TERMINATOR {
                    break;
                }
                if nb & 0xFC != 0xCC {
                    return Err(Error::InvalidToken { octet: nb, context: "namespace attributes" });
                }
                let prefix = if nb & 0x02 != 0 {
                    self.decode_identifying_string(r, StrTable::Prefix)?
                } else {
                    Arc::clone(&self.empty)
                };
                let namespace_name = if nb & 0x01 != 0 {
                    self.decode_identifying_string(r, StrTable::NamespaceName)?
                } else {
                    Arc::clone(&self.empty)
                };
                namespaces.push(NsContent { prefix, namespace_name });
            }
            let name_octet = r.read()?;
            // Bits 1-2 des Namensoktetts sind hier Fuellung.
            self.decode_element_name(name_octet & 0x3F, r)?
        } else {
            self.decode_element_name(b & 0x3F, r)?
        };

        events.push(FiEvent::StartElement(Arc::clone(&qname)));
        for ns in namespaces {
            events.push(FiEvent::NamespaceAttribute(ns));
        }

        if !has_attributes {
            return Ok(false);
        }

        self.duplicates.reset();
        loop {
            let ab = r.read()?;
            let aname = match ATTRIBUTE[ab as usize] {
                AttributeTag::Terminator => return Ok(false),
                AttributeTag::DoubleTerminator => return Ok(true),
                AttributeTag::IndexSmall | AttributeTag::IndexMedium | AttributeTag::IndexLarge => {
                    let idx = decode_index(ab, r)?;
                    Arc::clone(self.vocabulary.attribute_name.get(idx - 1)?)
                }
                AttributeTag::Literal => self.decode_literal_qname(ab, r, false)?,
                AttributeTag::Illegal => {
                    return Err(Error::InvalidToken { octet: ab, context: "attributes" });
                }
            };
            self.duplicates.check(&aname)?;
            let value = self.decode_value(r, StrTable::AttributeValue)?;
            events.push(FiEvent::Attribute(AtContent { qname: aname, value }));
        }
    }

    /// Element name per C.18 on the third bit; `low6` is the name part
    /// of the leading octet.
    fn decode_element_name(
        &mut self,
        low6: u8,
        r: &mut OctetReader<'_>,
    ) -> Result<Arc<QualifiedName>> {
        let idx = match low6 {
            0x00..=0x1F => (low6 as usize) + 1,
            0x20..=0x27 => (((low6 & 0x07) as usize) << 8 | r.read()? as usize) + 33,
            0x28..=0x2F => (((low6 & 0x07) as usize) << 16 | r.read_u16()? as usize) + 2081,
            0x30 => {
                let o = r.read()?;
                if o & 0xF0 != 0 {
                    return Err(Error::InvalidToken { octet: o, context: "element name index" });
                }
                (((o & 0x0F) as usize) << 16 | r.read_u16()? as usize) + 526_369
            }
            0x3C..=0x3F => return self.decode_literal_qname(low6, r, true),
            _ => return Err(Error::InvalidToken { octet: low6, context: "element name" }),
        };
        Ok(Arc::clone(self.vocabulary.element_name.get(idx - 1)?))
    }

    /// Literal qualified name (C.18.3, C.17.3): presence bits for prefix
    /// and namespace sit in the two lowest bits of the leading octet.
    fn decode_literal_qname(
        &mut self,
        lead: u8,
        r: &mut OctetReader<'_>,
        element: bool,
    ) -> Result<Arc<QualifiedName>> {
        let has_prefix = lead & 0x02 != 0;
        let has_namespace = lead & 0x01 != 0;
        if has_prefix && !has_namespace {
            return Err(Error::PrefixWithoutNamespace);
        }
        let prefix = if has_prefix {
            self.decode_identifying_string(r, StrTable::Prefix)?
        } else {
            Arc::clone(&self.empty)
        };
        let namespace = if has_namespace {
            self.decode_identifying_string(r, StrTable::NamespaceName)?
        } else {
            Arc::clone(&self.empty)
        };
        let local = self.decode_identifying_string(r, StrTable::LocalName)?;
        let q = Arc::new(QualifiedName::from_parts(prefix, namespace, local));
        if element {
            self.vocabulary.element_name.add(Arc::clone(&q))?;
        } else {
            self.vocabulary.attribute_name.add(Arc::clone(&q))?;
        }
        Ok(q)
    }

    // --- Strings and values ---

    /// Identifying string (C.13): table hit or literal with mandatory
    /// table insertion.
    fn decode_identifying_string(
        &mut self,
        r: &mut OctetReader<'_>,
        t: StrTable,
    ) -> Result<Arc<str>> {
        let b = r.read()?;
        if b & 0x80 != 0 {
            let idx = decode_index(b & 0x7F, r)?;
            return Ok(Arc::clone(self.table_mut(t).get(idx - 1)?));
        }
        let len = decode_c22_length(b, r)?;
        let octets = r.read_slice(len)?;
        let s = self.decode_utf8(octets)?;
        self.table_mut(t).add(Arc::clone(&s))?;
        Ok(s)
    }

    /// Non-identifying string value (C.14) for attribute values,
    /// comments and processing-instruction data.
    fn decode_value(&mut self, r: &mut OctetReader<'_>, t: StrTable) -> Result<CharacterData> {
        let b = r.read()?;
        match VALUE[b as usize] {
            ValueTag::Empty => Ok(CharacterData::Text(Arc::clone(&self.empty))),
            ValueTag::IndexSmall | ValueTag::IndexMedium | ValueTag::IndexLarge => {
                let idx = decode_index(b & 0x7F, r)?;
                Ok(CharacterData::Text(Arc::clone(self.table_mut(t).get(idx - 1)?)))
            }
            ValueTag::LiteralUtf8 | ValueTag::LiteralUtf16 => {
                let add = b & 0x40 != 0;
                let len = decode_c23_length(b & 0x0F, r)?;
                let octets = r.read_slice(len)?;
                let s = if VALUE[b as usize] == ValueTag::LiteralUtf16 {
                    self.decode_utf16(octets)?
                } else {
                    self.decode_utf8(octets)?
                };
                if add {
                    self.table_mut(t).add(Arc::clone(&s))?;
                }
                Ok(CharacterData::Text(s))
            }
            ValueTag::LiteralAlphabet => {
                let add = b & 0x40 != 0;
                let o2 = r.read()?;
                let id = (((b & 0x0F) as u32) << 4 | (o2 >> 4) as u32) + 1;
                let len = decode_c23_length(o2 & 0x0F, r)?;
                let octets = r.read_slice(len)?;
                self.decode_alphabet_chunk(id, octets, add, t)
            }
            ValueTag::LiteralAlgorithm => {
                let o2 = r.read()?;
                let id = (((b & 0x0F) as u32) << 4 | (o2 >> 4) as u32) + 1;
                let len = decode_c23_length(o2 & 0x0F, r)?;
                let octets = r.read_slice(len)?;
                self.decode_algorithm_chunk(id, octets)
            }
            ValueTag::Illegal => Err(Error::InvalidToken { octet: b, context: "string value" }),
        }
    }

    /// A value position that only admits text (comments, PI data).
    fn decode_text_value(
        &mut self,
        r: &mut OctetReader<'_>,
        context: &'static str,
    ) -> Result<Arc<str>> {
        match self.decode_value(r, StrTable::OtherString)? {
            CharacterData::Text(s) => Ok(s),
            CharacterData::ApplicationAlphabet { text, .. } => Ok(text),
            CharacterData::Typed(_) => {
                Err(Error::InvalidToken { octet: 0xE0, context })
            }
        }
    }

    /// Literal character chunk in UTF-8 or UTF-16 (C.7.3).
    fn decode_chunk_string(
        &mut self,
        b: u8,
        r: &mut OctetReader<'_>,
        utf16: bool,
    ) -> Result<CharacterData> {
        let add = b & 0x10 != 0;
        let len = decode_c24_length(b & 0x03, r)?;
        let octets = r.read_slice(len)?;
        let s = if utf16 { self.decode_utf16(octets)? } else { self.decode_utf8(octets)? };
        if add {
            self.vocabulary.character_chunk.add(Arc::clone(&s))?;
        }
        Ok(CharacterData::Text(s))
    }

    fn decode_alphabet_chunk(
        &mut self,
        id: u32,
        octets: &[u8],
        add: bool,
        t: StrTable,
    ) -> Result<CharacterData> {
        let data = match id {
            alphabet::NUMERIC_ID => {
                let s = alphabet::decode(octets, alphabet::NUMERIC)?;
                CharacterData::Text(self.intern(s))
            }
            alphabet::DATE_TIME_ID => {
                let s = alphabet::decode(octets, alphabet::DATE_TIME)?;
                CharacterData::Text(self.intern(s))
            }
            id if id >= alphabet::APPLICATION_ID_BASE => {
                let index = (id - alphabet::APPLICATION_ID_BASE) as usize;
                let chars = Arc::clone(self.vocabulary.restricted_alphabet.get(index)?);
                let s = alphabet::decode(octets, &chars)?;
                CharacterData::ApplicationAlphabet { index, text: self.intern(s) }
            }
            other => return Err(Error::AlphabetNotSupported(other)),
        };
        if add {
            let text = match &data {
                CharacterData::Text(s) => Arc::clone(s),
                CharacterData::ApplicationAlphabet { text, .. } => Arc::clone(text),
                // Alphabet-Chunks tragen immer Text.
                CharacterData::Typed(_) => Arc::clone(&self.empty),
            };
            self.table_mut(t).add(text)?;
        }
        Ok(data)
    }

    fn decode_algorithm_chunk(&mut self, id: u32, octets: &[u8]) -> Result<CharacterData> {
        if id >= APPLICATION_ID_BASE {
            let index = (id - APPLICATION_ID_BASE) as usize;
            let uri = Arc::clone(self.vocabulary.encoding_algorithm.get(index)?);
            if !self.algorithms.contains_key(&*uri as &str) {
                return Err(Error::AlgorithmNotRegistered(uri.to_string()));
            }
            return Ok(CharacterData::Typed(AlgorithmData::Application {
                index,
                data: octets.to_vec(),
            }));
        }
        Ok(CharacterData::Typed(AlgorithmData::from_octets(id, octets)?))
    }

    // --- Additional data (7.2.2) ---

    fn decode_additional_data(&mut self, r: &mut OctetReader<'_>) -> Result<()> {
        for _ in 0..decode_sequence_count(r)? {
            let lead = r.read()?;
            if lead & 0x80 != 0 {
                return Err(Error::InvalidToken { octet: lead, context: "additional data id" });
            }
            let len = decode_c22_length(lead, r)?;
            let id = core::str::from_utf8(r.read_slice(len)?)
                .map_err(|_| Error::InvalidUtf8)?
                .to_owned();
            let lead = r.read()?;
            if lead & 0x80 != 0 {
                return Err(Error::InvalidToken { octet: lead, context: "additional data" });
            }
            let len = decode_c22_length(lead, r)?;
            let data = r.read_slice(len)?.to_vec();
            self.additional_data.push(AdditionalDatum { id, data });
        }
        Ok(())
    }

    // --- Helpers ---

    fn table_mut(&mut self, t: StrTable) -> &mut ValueArray<Arc<str>> {
        match t {
            StrTable::Prefix => &mut self.vocabulary.prefix,
            StrTable::NamespaceName => &mut self.vocabulary.namespace_name,
            StrTable::LocalName => &mut self.vocabulary.local_name,
            StrTable::OtherNcname => &mut self.vocabulary.other_ncname,
            StrTable::OtherUri => &mut self.vocabulary.other_uri,
            StrTable::AttributeValue => &mut self.vocabulary.attribute_value,
            StrTable::CharacterChunk => &mut self.vocabulary.character_chunk,
            StrTable::OtherString => &mut self.vocabulary.other_string,
        }
    }

    fn decode_utf8(&mut self, octets: &[u8]) -> Result<Arc<str>> {
        let s = core::str::from_utf8(octets).map_err(|_| Error::InvalidUtf8)?;
        Ok(self.intern_str(s))
    }

    fn decode_utf16(&mut self, octets: &[u8]) -> Result<Arc<str>> {
        if octets.len() % 2 != 0 {
            return Err(Error::InvalidUtf16);
        }
        let units: Vec<u16> = octets
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        let s = String::from_utf16(&units).map_err(|_| Error::InvalidUtf16)?;
        Ok(self.intern(s))
    }

    fn intern(&mut self, s: String) -> Arc<str> {
        if !self.options.string_interning() {
            return Arc::from(s);
        }
        self.intern_str(&s)
    }

    /// With interning enabled, repeated equal strings share one
    /// allocation. Long strings stay unshared, the set would otherwise
    /// grow without bound on document-sized text.
    fn intern_str(&mut self, s: &str) -> Arc<str> {
        if !self.options.string_interning() || s.len() > 64 {
            return Arc::from(s);
        }
        if let Some(existing) = self.interner.get(s) {
            return Arc::clone(existing);
        }
        let a: Arc<str> = Arc::from(s);
        self.interner.insert(Arc::clone(&a));
        a
    }
}

// --- Integer and length forms of X.891 Annex C ---

/// Index on the second bit of its octet (C.25/C.17); `b` carries the
/// seven remaining bits. Returns the 1-based index.
fn decode_index(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    match b {
        0x00..=0x3F => Ok(b as usize + 1),
        0x40..=0x5F => Ok((((b & 0x1F) as usize) << 8 | r.read()? as usize) + 65),
        0x60..=0x6F => Ok((((b & 0x0F) as usize) << 16 | r.read_u16()? as usize) + 8257),
        _ => Err(Error::InvalidToken { octet: b, context: "vocabulary index" }),
    }
}

/// Character-chunk index per C.28 on the fourth bit; `b` is the full
/// leading octet (101x xxxx).
fn decode_chunk_index(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    match b & 0x1F {
        0x00..=0x0F => Ok((b & 0x0F) as usize + 1),
        0x10..=0x13 => Ok((((b & 0x03) as usize) << 8 | r.read()? as usize) + 17),
        0x14..=0x17 => Ok((((b & 0x03) as usize) << 16 | r.read_u16()? as usize) + 1041),
        0x18 => {
            let o = r.read()?;
            if o & 0xF0 != 0 {
                return Err(Error::InvalidToken { octet: o, context: "character-chunk index" });
            }
            Ok((((o & 0x0F) as usize) << 16 | r.read_u16()? as usize) + 263_185)
        }
        _ => Err(Error::InvalidToken { octet: b, context: "character-chunk index" }),
    }
}

/// Length of a non-empty octet string on the second bit (C.22).
fn decode_c22_length(b: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    match b {
        0x00..=0x3F => Ok(b as usize + 1),
        0x40 => Ok(r.read()? as usize + 65),
        0x60 => Ok(r.read_u32()? as usize + 321),
        _ => Err(Error::InvalidToken { octet: b, context: "octet string length" }),
    }
}

/// Length on the fifth bit (C.23); `nibble` holds the low four bits of
/// the current octet.
fn decode_c23_length(nibble: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    match nibble {
        0x00..=0x07 => Ok(nibble as usize + 1),
        0x08 => Ok(r.read()? as usize + 9),
        0x0C => Ok(r.read_u32()? as usize + 265),
        _ => Err(Error::InvalidToken { octet: nibble, context: "string length" }),
    }
}

/// Length on the seventh bit (C.24); `two` holds the low two bits of
/// the current octet.
fn decode_c24_length(two: u8, r: &mut OctetReader<'_>) -> Result<usize> {
    match two {
        0x00 | 0x01 => Ok(two as usize + 1),
        0x02 => Ok(r.read()? as usize + 3),
        _ => Ok(r.read_u32()? as usize + 259),
    }
}

/// Index inside a name surrogate (C.16): same layout as C.25, but the
/// leading bit is padding and must be zero.
fn decode_surrogate_index(r: &mut OctetReader<'_>) -> Result<usize> {
    let b = r.read()?;
    if b & 0x80 != 0 {
        return Err(Error::InvalidInitialVocabulary("name surrogate index"));
    }
    decode_index(b, r)
}

/// Sequence count per C.21.
fn decode_sequence_count(r: &mut OctetReader<'_>) -> Result<usize> {
    let b = r.read()?;
    if b < 0x80 {
        return Ok(b as usize + 1);
    }
    if b & 0xF0 != 0x80 {
        return Err(Error::InvalidToken { octet: b, context: "sequence count" });
    }
    Ok((((b & 0x0F) as usize) << 16 | r.read_u16()? as usize) + 129)
}

#[cfg(test)]
mod tests;
