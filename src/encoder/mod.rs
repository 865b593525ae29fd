//! Fast Infoset encoder.
//!
//! Der Encoder ist die Umkehrung der Decoder-Grammatik: fuer jede
//! Struktur entscheidet er zwischen Tabellenindex und Literal und haelt
//! dabei die Einfuegereihenfolge exakt so, wie der Decoder sie beim
//! Lesen nachvollzieht.
//!
//! `StartElement` wird gepuffert, bis das erste Nicht-Attribut-Ereignis
//! folgt: erst dann steht fest, ob das Attributflag im fuehrenden
//! Oktett gesetzt werden muss. Terminator-Oktette werden beim Schreiben
//! des zweiten Terminators in Folge zu `FF` zusammengelegt; das Oktett
//! bleibt dafuer ueber die Mark des Writers angepinnt.

use std::sync::Arc;

use log::trace;

use crate::algorithm::AlgorithmData;
use crate::alphabet;
use crate::buffer::OctetWriter;
use crate::document::{DOUBLE_TERMINATOR, MAGIC, TERMINATOR, XML_DECLARATION};
use crate::document::{FLAG_ADDITIONAL_DATA, FLAG_INITIAL_VOCABULARY};
use crate::error::{Error, Result};
use crate::event::{AtContent, CharacterData, FiEvent, NsContent};
use crate::key_map::StringIntMap;
use crate::options::{CharacterEncodingScheme, FiOptions};
use crate::qname::QualifiedName;
use crate::vocabulary::{FrozenSerializerVocabulary, InitialVocabulary, SerializerVocabulary};

/// Encodes one document with the given options.
pub fn encode(events: &[FiEvent], options: &FiOptions) -> Result<Vec<u8>> {
    Encoder::new(options.clone()).encode(events)
}

/// Selector for the dynamic string maps; character chunks run over
/// their own table in the vocabulary.
#[derive(Debug, Clone, Copy)]
enum StrMap {
    Prefix,
    NamespaceName,
    LocalName,
    OtherNcname,
    OtherUri,
    AttributeValue,
    OtherString,
}

/// Chosen literal representation of a text value (C.19).
enum TextForm {
    Utf8,
    Utf16,
    Alphabet(u32),
}

/// Buffered element start, flushed on the first non-attribute event.
struct PendingElement {
    qname: Arc<QualifiedName>,
    namespaces: Vec<NsContent>,
    attributes: Vec<AtContent>,
}

/// Stateful encoder; reusable across documents.
pub struct Encoder {
    options: FiOptions,
    vocabulary: SerializerVocabulary,
    external: Option<(String, Arc<FrozenSerializerVocabulary>)>,
    w: OctetWriter,
    pending: Option<PendingElement>,
    depth: usize,
    terminator_pos: Option<usize>,
    started: bool,
    finished: bool,
}

impl Encoder {
    pub fn new(options: FiOptions) -> Self {
        let vocabulary = SerializerVocabulary::new(options.table_maximum());
        Self {
            options,
            vocabulary,
            external: None,
            w: OctetWriter::new(),
            pending: None,
            depth: 0,
            terminator_pos: None,
            started: false,
            finished: false,
        }
    }

    /// References an external vocabulary: its entries become the frozen
    /// parent layer and the document carries only the URI.
    ///
    /// Decoder-Seite muss dasselbe Vokabular unter derselben URI
    /// registriert haben.
    pub fn set_external_vocabulary(&mut self, uri: &str, vocabulary: &InitialVocabulary) -> Result<()> {
        let frozen = FrozenSerializerVocabulary::from_initial(vocabulary)?;
        self.external = Some((uri.to_owned(), Arc::new(frozen)));
        Ok(())
    }

    /// Encodes a complete event sequence into a fast infoset stream.
    pub fn encode(&mut self, events: &[FiEvent]) -> Result<Vec<u8>> {
        self.begin_document()?;
        for ev in events {
            self.encode_event(ev)?;
        }
        self.check_finished()?;
        Ok(std::mem::take(&mut self.w).into_vec())
    }

    /// Streaming variant: drains finished octets into the sink after
    /// every event.
    pub fn encode_to<W: std::io::Write>(&mut self, events: &[FiEvent], sink: &mut W) -> Result<()> {
        self.begin_document()?;
        for ev in events {
            self.encode_event(ev)?;
            self.w.drain_to(sink)?;
        }
        self.check_finished()?;
        self.w.clear_mark();
        self.w.drain_to(sink)?;
        self.w = OctetWriter::new();
        Ok(())
    }

    fn begin_document(&mut self) -> Result<()> {
        self.vocabulary = SerializerVocabulary::new(self.options.table_maximum());
        if let Some((_, frozen)) = &self.external {
            self.vocabulary.attach(frozen);
        }
        if let Some(iv) = self.options.initial_vocabulary() {
            self.vocabulary.populate(iv)?;
        }
        self.w = OctetWriter::new();
        self.pending = None;
        self.depth = 0;
        self.terminator_pos = None;
        self.started = false;
        self.finished = false;
        Ok(())
    }

    fn check_finished(&self) -> Result<()> {
        if !self.finished {
            return Err(Error::OrderingViolation {
                expected: "EndDocument",
                found: "end of events",
            });
        }
        Ok(())
    }

    fn encode_event(&mut self, ev: &FiEvent) -> Result<()> {
        if self.finished {
            return Err(Error::OrderingViolation { expected: "nothing", found: ev.kind() });
        }
        if !self.started && !matches!(ev, FiEvent::StartDocument) {
            return Err(Error::OrderingViolation { expected: "StartDocument", found: ev.kind() });
        }
        match ev {
            FiEvent::StartDocument => {
                if self.started {
                    return Err(Error::OrderingViolation {
                        expected: "content",
                        found: "StartDocument",
                    });
                }
                self.started = true;
                self.write_header()
            }
            FiEvent::StartElement(qname) => {
                self.flush_pending()?;
                self.pending = Some(PendingElement {
                    qname: Arc::clone(qname),
                    namespaces: Vec::new(),
                    attributes: Vec::new(),
                });
                Ok(())
            }
            FiEvent::NamespaceAttribute(ns) => {
                let pending = self.pending.as_mut().ok_or(Error::OrderingViolation {
                    expected: "StartElement",
                    found: "NamespaceAttribute",
                })?;
                if !pending.attributes.is_empty() {
                    return Err(Error::OrderingViolation {
                        expected: "Attribute",
                        found: "NamespaceAttribute",
                    });
                }
                pending.namespaces.push(ns.clone());
                Ok(())
            }
            FiEvent::Attribute(at) => {
                let pending = self.pending.as_mut().ok_or(Error::OrderingViolation {
                    expected: "StartElement",
                    found: "Attribute",
                })?;
                pending.attributes.push(at.clone());
                Ok(())
            }
            FiEvent::Characters(ch) => {
                self.flush_pending()?;
                self.encode_characters(&ch.data)
            }
            FiEvent::Comment(cm) => {
                self.flush_pending()?;
                self.w.push(0xE2);
                self.encode_value(&CharacterData::Text(Arc::clone(&cm.text)), StrMap::OtherString)
            }
            FiEvent::ProcessingInstruction(pi) => {
                self.flush_pending()?;
                self.w.push(0xE1);
                self.encode_identifying(StrMap::OtherNcname, &pi.target)?;
                self.encode_value(&CharacterData::Text(Arc::clone(&pi.data)), StrMap::OtherString)
            }
            FiEvent::UnexpandedEntityReference(er) => {
                self.flush_pending()?;
                let s = er.system_identifier.is_some() as u8;
                let p = er.public_identifier.is_some() as u8;
                self.w.push(0xC8 | s << 1 | p);
                self.encode_identifying(StrMap::OtherNcname, &er.name)?;
                if let Some(system) = &er.system_identifier {
                    self.encode_identifying(StrMap::OtherUri, system)?;
                }
                if let Some(public) = &er.public_identifier {
                    self.encode_identifying(StrMap::OtherUri, public)?;
                }
                Ok(())
            }
            FiEvent::EndElement => {
                self.flush_pending()?;
                if self.depth == 0 {
                    return Err(Error::OrderingViolation {
                        expected: "StartElement",
                        found: "EndElement",
                    });
                }
                self.write_terminator();
                self.depth -= 1;
                Ok(())
            }
            FiEvent::EndDocument => {
                self.flush_pending()?;
                if self.depth != 0 {
                    return Err(Error::OrderingViolation {
                        expected: "EndElement",
                        found: "EndDocument",
                    });
                }
                self.write_terminator();
                self.write_additional_data()?;
                self.finished = true;
                Ok(())
            }
        }
    }

    // --- Header and document components ---

    fn write_header(&mut self) -> Result<()> {
        trace!("encoding fast infoset document");
        if self.options.emits_xml_declaration() {
            self.w.extend(XML_DECLARATION);
        }
        self.w.extend(&MAGIC);

        let has_vocabulary = self.external.is_some()
            || self.options.initial_vocabulary().is_some_and(|iv| !iv.is_empty());
        let mut presence = 0u8;
        if !self.options.additional_data().is_empty() {
            presence |= FLAG_ADDITIONAL_DATA;
        }
        if has_vocabulary {
            presence |= FLAG_INITIAL_VOCABULARY;
        }
        self.w.push(presence);
        if has_vocabulary {
            self.write_initial_vocabulary()?;
        }
        Ok(())
    }

    fn write_initial_vocabulary(&mut self) -> Result<()> {
        let empty = InitialVocabulary::default();
        let iv = self.options.initial_vocabulary().unwrap_or(&empty).clone();
        let external_uri = self.external.as_ref().map(|(uri, _)| uri.clone());

        let mut b1 = 0u8;
        let mut b2 = 0u8;
        if external_uri.is_some() {
            b1 |= 0x10;
        }
        if !iv.restricted_alphabets.is_empty() {
            b1 |= 0x08;
        }
        if !iv.encoding_algorithms.is_empty() {
            b1 |= 0x04;
        }
        if !iv.prefixes.is_empty() {
            b1 |= 0x02;
        }
        if !iv.namespace_names.is_empty() {
            b1 |= 0x01;
        }
        if !iv.local_names.is_empty() {
            b2 |= 0x80;
        }
        if !iv.other_ncnames.is_empty() {
            b2 |= 0x40;
        }
        if !iv.other_uris.is_empty() {
            b2 |= 0x20;
        }
        if !iv.attribute_values.is_empty() {
            b2 |= 0x10;
        }
        if !iv.character_chunks.is_empty() {
            b2 |= 0x08;
        }
        if !iv.other_strings.is_empty() {
            b2 |= 0x04;
        }
        if !iv.element_names.is_empty() {
            b2 |= 0x02;
        }
        if !iv.attribute_names.is_empty() {
            b2 |= 0x01;
        }
        self.w.push(b1);
        self.w.push(b2);

        if let Some(uri) = &external_uri {
            self.write_octet_string_c22(uri.as_bytes());
        }
        self.write_string_component(&iv.restricted_alphabets);
        self.write_string_component(&iv.encoding_algorithms);
        self.write_string_component(&iv.prefixes);
        self.write_string_component(&iv.namespace_names);
        self.write_string_component(&iv.local_names);
        self.write_string_component(&iv.other_ncnames);
        self.write_string_component(&iv.other_uris);
        self.write_string_component(&iv.attribute_values);
        self.write_string_component(&iv.character_chunks);
        self.write_string_component(&iv.other_strings);
        self.write_surrogate_component(&iv.element_names)?;
        self.write_surrogate_component(&iv.attribute_names)?;
        Ok(())
    }

    fn write_string_component(&mut self, items: &[String]) {
        if items.is_empty() {
            return;
        }
        self.write_sequence_count(items.len());
        for s in items {
            self.write_octet_string_c22(s.as_bytes());
        }
    }

    fn write_surrogate_component(
        &mut self,
        items: &[crate::vocabulary::NameSurrogate],
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.write_sequence_count(items.len());
        for s in items {
            let p = s.prefix_index.is_some() as u8;
            let n = s.namespace_index.is_some() as u8;
            self.w.push(p << 1 | n);
            if let Some(i) = s.prefix_index {
                self.write_index(0x00, i + 1)?;
            }
            if let Some(i) = s.namespace_index {
                self.write_index(0x00, i + 1)?;
            }
            self.write_index(0x00, s.local_name_index + 1)?;
        }
        Ok(())
    }

    fn write_additional_data(&mut self) -> Result<()> {
        if self.options.additional_data().is_empty() {
            return Ok(());
        }
        let data = self.options.additional_data().to_vec();
        self.write_sequence_count(data.len());
        for datum in &data {
            self.write_octet_string_c22(datum.id.as_bytes());
            self.write_octet_string_c22(&datum.data);
        }
        Ok(())
    }

    // --- Elements and attributes ---

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            self.emit_element(pending)?;
            self.depth += 1;
        }
        Ok(())
    }

    fn emit_element(&mut self, pending: PendingElement) -> Result<()> {
        let has_attributes = !pending.attributes.is_empty();
        let attrs_bit = if has_attributes { 0x40 } else { 0x00 };

        if pending.namespaces.is_empty() {
            self.emit_element_name(&pending.qname, attrs_bit)?;
        } else {
            self.w.push(0x38 | attrs_bit);
            for ns in &pending.namespaces {
                let p = !ns.prefix.is_empty() as u8;
                let n = !ns.namespace_name.is_empty() as u8;
                self.w.push(0xCC | p << 1 | n);
                if p != 0 {
                    self.encode_identifying(StrMap::Prefix, &ns.prefix)?;
                }
                if n != 0 {
                    self.encode_identifying(StrMap::NamespaceName, &ns.namespace_name)?;
                }
            }
            self.w.push(TERMINATOR);
            // Das Attributflag steht bereits im fuehrenden Oktett; im
            // Namensoktett sind die Bits 1-2 Fuellung.
            self.emit_element_name(&pending.qname, 0x00)?;
        }

        if has_attributes {
            for at in &pending.attributes {
                self.encode_attribute_name(&at.qname)?;
                self.encode_value(&at.value, StrMap::AttributeValue)?;
            }
            self.write_terminator();
        }
        Ok(())
    }

    /// Element name per C.18 on the third bit; `lead` carries the
    /// attribute flag (or padding zeroes).
    fn emit_element_name(&mut self, qname: &Arc<QualifiedName>, lead: u8) -> Result<()> {
        if let Some(idx) = self.vocabulary.element_name.obtain_index(qname) {
            return self.write_element_name_index(lead, idx + 1);
        }
        if !qname.has_valid_shape() {
            return Err(Error::PrefixWithoutNamespace);
        }
        let p = !qname.prefix.is_empty() as u8;
        let n = !qname.namespace_name.is_empty() as u8;
        self.w.push(lead | 0x3C | p << 1 | n);
        if p != 0 {
            self.encode_identifying(StrMap::Prefix, &qname.prefix)?;
        }
        if n != 0 {
            self.encode_identifying(StrMap::NamespaceName, &qname.namespace_name)?;
        }
        self.encode_identifying(StrMap::LocalName, &qname.local_name)?;
        self.vocabulary.element_name.add(Arc::clone(qname))?;
        Ok(())
    }

    fn write_element_name_index(&mut self, lead: u8, index: usize) -> Result<()> {
        match index {
            1..=32 => self.w.push(lead | (index - 1) as u8),
            33..=2080 => {
                let d = index - 33;
                self.w.push(lead | 0x20 | (d >> 8) as u8);
                self.w.push(d as u8);
            }
            2081..=526_368 => {
                let d = index - 2081;
                self.w.push(lead | 0x28 | (d >> 16) as u8);
                self.w.extend(&(d as u16).to_be_bytes());
            }
            526_369..=1_574_944 => {
                let d = index - 526_369;
                self.w.push(lead | 0x30);
                self.w.push((d >> 16) as u8);
                self.w.extend(&(d as u16).to_be_bytes());
            }
            _ => {
                return Err(Error::IndexOutOfRange {
                    index,
                    size: 1_574_944,
                    table: "element-name",
                })
            }
        }
        Ok(())
    }

    fn encode_attribute_name(&mut self, qname: &Arc<QualifiedName>) -> Result<()> {
        if let Some(idx) = self.vocabulary.attribute_name.obtain_index(qname) {
            return self.write_index(0x00, idx + 1);
        }
        if !qname.has_valid_shape() {
            return Err(Error::PrefixWithoutNamespace);
        }
        let p = !qname.prefix.is_empty() as u8;
        let n = !qname.namespace_name.is_empty() as u8;
        self.w.push(0x78 | p << 1 | n);
        if p != 0 {
            self.encode_identifying(StrMap::Prefix, &qname.prefix)?;
        }
        if n != 0 {
            self.encode_identifying(StrMap::NamespaceName, &qname.namespace_name)?;
        }
        self.encode_identifying(StrMap::LocalName, &qname.local_name)?;
        self.vocabulary.attribute_name.add(Arc::clone(qname))?;
        Ok(())
    }

    // --- Strings and values ---

    /// Identifying string (C.13): index on a table hit, otherwise
    /// literal with mandatory table insertion.
    fn encode_identifying(&mut self, m: StrMap, value: &str) -> Result<()> {
        if let Some(idx) = self.string_map(m).obtain_index(value) {
            return self.write_index(0x80, idx + 1);
        }
        self.write_octet_string_c22(value.as_bytes());
        self.string_map_mut(m).add(Arc::from(value))?;
        Ok(())
    }

    /// Non-identifying string value (C.14): empty form, index form or
    /// literal, with the add-to-table decision driven by the size gates.
    fn encode_value(&mut self, value: &CharacterData, m: StrMap) -> Result<()> {
        match value {
            CharacterData::Text(s) => {
                if s.is_empty() {
                    self.w.push(0xFF);
                    return Ok(());
                }
                let gated = self.within_attribute_gates(s);
                if gated {
                    if let Some(idx) = self.string_map(m).obtain_index(s) {
                        return self.write_index(0x80, idx + 1);
                    }
                }
                let add = gated && !self.string_map(m).is_full();
                if add {
                    self.string_map_mut(m).add(Arc::from(&**s))?;
                }
                match self.choose_text_form(s) {
                    TextForm::Utf8 => self.write_value_string(add, 0, s.as_bytes()),
                    TextForm::Utf16 => {
                        let octets = utf16_octets(s);
                        self.write_value_string(add, 1, &octets)
                    }
                    TextForm::Alphabet(id) => {
                        let octets = alphabet::encode(s, builtin_alphabet(id))?;
                        self.write_value_packed(add, 2, id, &octets)
                    }
                }
                Ok(())
            }
            CharacterData::ApplicationAlphabet { index, text } => {
                if text.is_empty() {
                    self.w.push(0xFF);
                    return Ok(());
                }
                let chars = Arc::clone(self.vocabulary.restricted_alphabet.get(*index)?);
                let octets = alphabet::encode(text, &chars)?;
                let id = alphabet::APPLICATION_ID_BASE + *index as u32;
                self.write_value_packed(false, 2, id, &octets);
                Ok(())
            }
            CharacterData::Typed(data) => {
                let octets = self.algorithm_octets(data)?;
                self.write_value_packed(false, 3, data.algorithm_id(), &octets);
                Ok(())
            }
        }
    }

    /// Literal value with C.23 length in the low nibble of the leading
    /// octet (UTF-8/UTF-16 forms).
    fn write_value_string(&mut self, add: bool, scheme: u8, octets: &[u8]) {
        let lead = (add as u8) << 6 | scheme << 4;
        self.push_c23(lead, octets.len());
        self.w.extend(octets);
    }

    /// Literal value in alphabet or algorithm form: the identifier
    /// minus 1 spans the octet boundary (C.19.4, C.29).
    fn write_value_packed(&mut self, add: bool, scheme: u8, id: u32, octets: &[u8]) {
        debug_assert!((1..=256).contains(&id));
        let id8 = (id - 1) as u8;
        let lead = (add as u8) << 6 | scheme << 4 | id8 >> 4;
        self.w.push(lead);
        self.push_c23((id8 & 0x0F) << 4, octets.len());
        self.w.extend(octets);
    }

    fn push_c23(&mut self, high: u8, len: usize) {
        match len {
            1..=8 => self.w.push(high | (len - 1) as u8),
            9..=264 => {
                self.w.push(high | 0x08);
                self.w.push((len - 9) as u8);
            }
            _ => {
                self.w.push(high | 0x0C);
                self.w.extend(&((len - 265) as u32).to_be_bytes());
            }
        }
    }

    // --- Character chunks (C.7) ---

    fn encode_characters(&mut self, data: &CharacterData) -> Result<()> {
        match data {
            CharacterData::Text(s) => {
                // Leere Chunks haben keine Drahtform und werden
                // ausgelassen.
                if s.is_empty() {
                    return Ok(());
                }
                let gated = self.within_chunk_gates(s);
                if gated {
                    if let Some(idx) = self.vocabulary.character_chunk.obtain_index(s) {
                        return self.write_chunk_index(idx + 1);
                    }
                }
                let add = gated && !self.vocabulary.character_chunk.is_full();
                if add {
                    self.vocabulary.character_chunk.add(Arc::from(&**s))?;
                }
                match self.choose_text_form(s) {
                    TextForm::Utf8 => self.write_chunk_string(add, 0, s.as_bytes()),
                    TextForm::Utf16 => {
                        let octets = utf16_octets(s);
                        self.write_chunk_string(add, 1, &octets)
                    }
                    TextForm::Alphabet(id) => {
                        let octets = alphabet::encode(s, builtin_alphabet(id))?;
                        self.write_chunk_packed(add, 2, id, &octets)
                    }
                }
                Ok(())
            }
            CharacterData::ApplicationAlphabet { index, text } => {
                if text.is_empty() {
                    return Ok(());
                }
                let chars = Arc::clone(self.vocabulary.restricted_alphabet.get(*index)?);
                let octets = alphabet::encode(text, &chars)?;
                let id = alphabet::APPLICATION_ID_BASE + *index as u32;
                self.write_chunk_packed(false, 2, id, &octets);
                Ok(())
            }
            CharacterData::Typed(data) => {
                let octets = self.algorithm_octets(data)?;
                self.write_chunk_packed(false, 3, data.algorithm_id(), &octets);
                Ok(())
            }
        }
    }

    fn write_chunk_string(&mut self, add: bool, scheme: u8, octets: &[u8]) {
        let lead = 0x80 | (add as u8) << 4 | scheme << 2;
        self.push_c24(lead, octets.len());
        self.w.extend(octets);
    }

    fn write_chunk_packed(&mut self, add: bool, scheme: u8, id: u32, octets: &[u8]) {
        debug_assert!((1..=256).contains(&id));
        let id8 = (id - 1) as u8;
        let lead = 0x80 | (add as u8) << 4 | scheme << 2 | id8 >> 6;
        self.w.push(lead);
        self.push_c24((id8 & 0x3F) << 2, octets.len());
        self.w.extend(octets);
    }

    fn push_c24(&mut self, high: u8, len: usize) {
        match len {
            1..=2 => self.w.push(high | (len - 1) as u8),
            3..=258 => {
                self.w.push(high | 0x02);
                self.w.push((len - 3) as u8);
            }
            _ => {
                self.w.push(high | 0x03);
                self.w.extend(&((len - 259) as u32).to_be_bytes());
            }
        }
    }

    fn write_chunk_index(&mut self, index: usize) -> Result<()> {
        match index {
            1..=16 => self.w.push(0xA0 | (index - 1) as u8),
            17..=1040 => {
                let d = index - 17;
                self.w.push(0xB0 | (d >> 8) as u8);
                self.w.push(d as u8);
            }
            1041..=263_184 => {
                let d = index - 1041;
                self.w.push(0xB4 | (d >> 16) as u8);
                self.w.extend(&(d as u16).to_be_bytes());
            }
            263_185..=1_311_760 => {
                let d = index - 263_185;
                self.w.push(0xB8);
                self.w.push((d >> 16) as u8);
                self.w.extend(&(d as u16).to_be_bytes());
            }
            _ => {
                return Err(Error::IndexOutOfRange {
                    index,
                    size: 1_311_760,
                    table: "character-chunk",
                })
            }
        }
        Ok(())
    }

    // --- Shared forms ---

    /// Index on the second bit (C.25) or, with `lead == 0`, the same
    /// layout used for attribute names (C.17) and surrogate indices.
    fn write_index(&mut self, lead: u8, index: usize) -> Result<()> {
        match index {
            1..=64 => self.w.push(lead | (index - 1) as u8),
            65..=8256 => {
                let d = index - 65;
                self.w.push(lead | 0x40 | (d >> 8) as u8);
                self.w.push(d as u8);
            }
            8257..=1_056_832 => {
                let d = index - 8257;
                self.w.push(lead | 0x60 | (d >> 16) as u8);
                self.w.extend(&(d as u16).to_be_bytes());
            }
            _ => {
                return Err(Error::IndexOutOfRange {
                    index,
                    size: 1_056_832,
                    table: "vocabulary",
                })
            }
        }
        Ok(())
    }

    /// Non-empty octet string with C.22 length, leading bit zero.
    fn write_octet_string_c22(&mut self, octets: &[u8]) {
        debug_assert!(!octets.is_empty());
        match octets.len() {
            1..=64 => self.w.push((octets.len() - 1) as u8),
            65..=320 => {
                self.w.push(0x40);
                self.w.push((octets.len() - 65) as u8);
            }
            _ => {
                self.w.push(0x60);
                self.w.extend(&((octets.len() - 321) as u32).to_be_bytes());
            }
        }
        self.w.extend(octets);
    }

    fn write_sequence_count(&mut self, count: usize) {
        if count <= 128 {
            self.w.push((count - 1) as u8);
            return;
        }
        let d = count - 129;
        self.w.push(0x80 | (d >> 16) as u8);
        self.w.extend(&(d as u16).to_be_bytes());
    }

    /// Writes an element/attribute-list/document terminator, collapsing
    /// two adjacent terminators into the `FF` octet.
    fn write_terminator(&mut self) {
        if let Some(pos) = self.terminator_pos {
            if pos + 1 == self.w.len() && self.w.octet_at(pos) == TERMINATOR {
                self.w.rewrite_octet(pos, DOUBLE_TERMINATOR);
                self.w.clear_mark();
                self.terminator_pos = None;
                return;
            }
        }
        let pos = self.w.set_mark();
        self.w.push(TERMINATOR);
        self.terminator_pos = Some(pos);
    }

    fn algorithm_octets(&self, data: &AlgorithmData) -> Result<Vec<u8>> {
        if let AlgorithmData::Application { index, .. } = data {
            // Die URI muss im Vokabular stehen, sonst kann kein Decoder
            // die Kennung aufloesen.
            self.vocabulary.encoding_algorithm.get(*index)?;
        }
        let octets = data.to_octets();
        if octets.is_empty() {
            return Err(Error::InvalidAlgorithmData("empty octet string".into()));
        }
        Ok(octets)
    }

    fn choose_text_form(&self, s: &str) -> TextForm {
        if self.options.uses_builtin_restricted_alphabets() {
            if alphabet::encodable(s, alphabet::NUMERIC) {
                return TextForm::Alphabet(alphabet::NUMERIC_ID);
            }
            if alphabet::encodable(s, alphabet::DATE_TIME) {
                return TextForm::Alphabet(alphabet::DATE_TIME_ID);
            }
        }
        match self.options.character_encoding_scheme() {
            CharacterEncodingScheme::Utf8 => TextForm::Utf8,
            CharacterEncodingScheme::Utf16 => TextForm::Utf16,
        }
    }

    fn within_attribute_gates(&self, s: &str) -> bool {
        (self.options.min_attribute_value_size()..=self.options.max_attribute_value_size())
            .contains(&s.len())
    }

    fn within_chunk_gates(&self, s: &str) -> bool {
        (self.options.min_character_chunk_size()..=self.options.max_character_chunk_size())
            .contains(&s.len())
    }

    fn string_map(&self, m: StrMap) -> &StringIntMap {
        match m {
            StrMap::Prefix => &self.vocabulary.prefix,
            StrMap::NamespaceName => &self.vocabulary.namespace_name,
            StrMap::LocalName => &self.vocabulary.local_name,
            StrMap::OtherNcname => &self.vocabulary.other_ncname,
            StrMap::OtherUri => &self.vocabulary.other_uri,
            StrMap::AttributeValue => &self.vocabulary.attribute_value,
            StrMap::OtherString => &self.vocabulary.other_string,
        }
    }

    fn string_map_mut(&mut self, m: StrMap) -> &mut StringIntMap {
        match m {
            StrMap::Prefix => &mut self.vocabulary.prefix,
            StrMap::NamespaceName => &mut self.vocabulary.namespace_name,
            StrMap::LocalName => &mut self.vocabulary.local_name,
            StrMap::OtherNcname => &mut self.vocabulary.other_ncname,
            StrMap::OtherUri => &mut self.vocabulary.other_uri,
            StrMap::AttributeValue => &mut self.vocabulary.attribute_value,
            StrMap::OtherString => &mut self.vocabulary.other_string,
        }
    }
}

fn utf16_octets(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
}

fn builtin_alphabet(id: u32) -> &'static str {
    if id == alphabet::DATE_TIME_ID {
        alphabet::DATE_TIME
    } else {
        alphabet::NUMERIC
    }
}
