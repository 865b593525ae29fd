//! Vocabulary tables (X.891 clause 8).
//!
//! Ein Vokabular buendelt die dreizehn Tabellen eines Dokuments:
//! Alphabete, Algorithmen, acht String-Tabellen und die beiden
//! Namenstabellen. Der Decoder haelt ein `ParserVocabulary`
//! (Index → Wert), der Encoder ein `SerializerVocabulary`
//! (Wert → Index). Beide Seiten muessen dieselbe Einfuegereihenfolge
//! sehen, sonst laufen die Indizes auseinander.
//!
//! Externe Vokabulare werden einmal gebaut, eingefroren und dann als
//! unveraenderliche Parent-Schicht unter beliebig viele Codec-Instanzen
//! gehaengt; `clear` zwischen Dokumenten leert nur die lokale Schicht.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::key_map::{LocalNameQualifiedNamesMap, StringIntMap};
use crate::qname::QualifiedName;
use crate::value_array::{ValueArray, DEFAULT_TABLE_MAXIMUM};

/// Reference from a name surrogate into the string tables (0-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSurrogate {
    pub prefix_index: Option<usize>,
    pub namespace_index: Option<usize>,
    pub local_name_index: usize,
}

/// Declarative description of vocabulary content, used both for the
/// in-document initial vocabulary (X.891 12.6) and for registered
/// external vocabularies (X.891 7.2.13).
///
/// Indizes in den Surrogaten beziehen sich auf die Listen dieses
/// Vokabulars, 0-basiert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialVocabulary {
    pub restricted_alphabets: Vec<String>,
    pub encoding_algorithms: Vec<String>,
    pub prefixes: Vec<String>,
    pub namespace_names: Vec<String>,
    pub local_names: Vec<String>,
    pub other_ncnames: Vec<String>,
    pub other_uris: Vec<String>,
    pub attribute_values: Vec<String>,
    pub character_chunks: Vec<String>,
    pub other_strings: Vec<String>,
    pub element_names: Vec<NameSurrogate>,
    pub attribute_names: Vec<NameSurrogate>,
}

impl InitialVocabulary {
    pub fn is_empty(&self) -> bool {
        self.restricted_alphabets.is_empty()
            && self.encoding_algorithms.is_empty()
            && self.prefixes.is_empty()
            && self.namespace_names.is_empty()
            && self.local_names.is_empty()
            && self.other_ncnames.is_empty()
            && self.other_uris.is_empty()
            && self.attribute_values.is_empty()
            && self.character_chunks.is_empty()
            && self.other_strings.is_empty()
            && self.element_names.is_empty()
            && self.attribute_names.is_empty()
    }
}

/// Decoder-side tables: stream index to value.
#[derive(Debug, Clone)]
pub struct ParserVocabulary {
    pub restricted_alphabet: ValueArray<Arc<str>>,
    pub encoding_algorithm: ValueArray<Arc<str>>,
    pub prefix: ValueArray<Arc<str>>,
    pub namespace_name: ValueArray<Arc<str>>,
    pub local_name: ValueArray<Arc<str>>,
    pub other_ncname: ValueArray<Arc<str>>,
    pub other_uri: ValueArray<Arc<str>>,
    pub attribute_value: ValueArray<Arc<str>>,
    pub character_chunk: ValueArray<Arc<str>>,
    pub other_string: ValueArray<Arc<str>>,
    pub element_name: ValueArray<Arc<QualifiedName>>,
    pub attribute_name: ValueArray<Arc<QualifiedName>>,
}

impl Default for ParserVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_MAXIMUM)
    }
}

impl ParserVocabulary {
    pub fn new(maximum: usize) -> Self {
        Self {
            restricted_alphabet: ValueArray::new("restricted-alphabet", 224),
            encoding_algorithm: ValueArray::new("encoding-algorithm", 224),
            prefix: ValueArray::new("prefix", maximum),
            namespace_name: ValueArray::new("namespace-name", maximum),
            local_name: ValueArray::new("local-name", maximum),
            other_ncname: ValueArray::new("other-ncname", maximum),
            other_uri: ValueArray::new("other-uri", maximum),
            attribute_value: ValueArray::new("attribute-value", maximum),
            character_chunk: ValueArray::new("character-chunk", maximum),
            other_string: ValueArray::new("other-string", maximum),
            element_name: ValueArray::new("element-name", maximum),
            attribute_name: ValueArray::new("attribute-name", maximum),
        }
    }

    /// Adds every component of an initial vocabulary to the dynamic
    /// (clearable) segment of the tables.
    pub fn populate(&mut self, iv: &InitialVocabulary) -> Result<()> {
        for a in &iv.restricted_alphabets {
            if a.chars().count() < 2 {
                return Err(Error::InvalidAlphabet);
            }
            self.restricted_alphabet.add(Arc::from(a.as_str()))?;
        }
        for uri in &iv.encoding_algorithms {
            add_string(&mut self.encoding_algorithm, uri)?;
        }
        for s in &iv.prefixes {
            add_string(&mut self.prefix, s)?;
        }
        for s in &iv.namespace_names {
            add_string(&mut self.namespace_name, s)?;
        }
        for s in &iv.local_names {
            add_string(&mut self.local_name, s)?;
        }
        for s in &iv.other_ncnames {
            add_string(&mut self.other_ncname, s)?;
        }
        for s in &iv.other_uris {
            add_string(&mut self.other_uri, s)?;
        }
        for s in &iv.attribute_values {
            add_string(&mut self.attribute_value, s)?;
        }
        for s in &iv.character_chunks {
            add_string(&mut self.character_chunk, s)?;
        }
        for s in &iv.other_strings {
            add_string(&mut self.other_string, s)?;
        }
        for surrogate in &iv.element_names {
            let q = self.resolve_surrogate(surrogate)?;
            self.element_name.add(q)?;
        }
        for surrogate in &iv.attribute_names {
            let q = self.resolve_surrogate(surrogate)?;
            self.attribute_name.add(q)?;
        }
        Ok(())
    }

    fn resolve_surrogate(&self, s: &NameSurrogate) -> Result<Arc<QualifiedName>> {
        let prefix = match s.prefix_index {
            Some(i) => Arc::clone(self.prefix.get(i)?),
            None => Arc::from(""),
        };
        // Namespace-Namen werden immer gegen die Namespace-Tabelle
        // aufgeloest (X.891 C.16.5).
        let namespace = match s.namespace_index {
            Some(i) => Arc::clone(self.namespace_name.get(i)?),
            None => Arc::from(""),
        };
        let local = Arc::clone(self.local_name.get(s.local_name_index)?);
        let q = QualifiedName::from_parts(prefix, namespace, local);
        if !q.has_valid_shape() {
            return Err(Error::PrefixWithoutNamespace);
        }
        Ok(Arc::new(q))
    }

    /// Forgets all per-document entries; frozen parents survive.
    pub fn clear(&mut self) {
        self.restricted_alphabet.clear();
        self.encoding_algorithm.clear();
        self.prefix.clear();
        self.namespace_name.clear();
        self.local_name.clear();
        self.other_ncname.clear();
        self.other_uri.clear();
        self.attribute_value.clear();
        self.character_chunk.clear();
        self.other_string.clear();
        self.element_name.clear();
        self.attribute_name.clear();
    }

    pub fn attach(&mut self, parent: &FrozenParserVocabulary) {
        self.restricted_alphabet.set_read_only(Arc::clone(&parent.restricted_alphabet));
        self.encoding_algorithm.set_read_only(Arc::clone(&parent.encoding_algorithm));
        self.prefix.set_read_only(Arc::clone(&parent.prefix));
        self.namespace_name.set_read_only(Arc::clone(&parent.namespace_name));
        self.local_name.set_read_only(Arc::clone(&parent.local_name));
        self.other_ncname.set_read_only(Arc::clone(&parent.other_ncname));
        self.other_uri.set_read_only(Arc::clone(&parent.other_uri));
        self.attribute_value.set_read_only(Arc::clone(&parent.attribute_value));
        self.character_chunk.set_read_only(Arc::clone(&parent.character_chunk));
        self.other_string.set_read_only(Arc::clone(&parent.other_string));
        self.element_name.set_read_only(Arc::clone(&parent.element_name));
        self.attribute_name.set_read_only(Arc::clone(&parent.attribute_name));
    }
}

fn add_string(table: &mut ValueArray<Arc<str>>, s: &str) -> Result<usize> {
    if s.is_empty() {
        return Err(Error::InvalidInitialVocabulary("empty string item"));
    }
    table.add(Arc::from(s))
}

/// Immutable snapshot of a fully built parser vocabulary, shareable
/// across decoders and threads.
#[derive(Debug, Clone)]
pub struct FrozenParserVocabulary {
    restricted_alphabet: Arc<[Arc<str>]>,
    encoding_algorithm: Arc<[Arc<str>]>,
    prefix: Arc<[Arc<str>]>,
    namespace_name: Arc<[Arc<str>]>,
    local_name: Arc<[Arc<str>]>,
    other_ncname: Arc<[Arc<str>]>,
    other_uri: Arc<[Arc<str>]>,
    attribute_value: Arc<[Arc<str>]>,
    character_chunk: Arc<[Arc<str>]>,
    other_string: Arc<[Arc<str>]>,
    element_name: Arc<[Arc<QualifiedName>]>,
    attribute_name: Arc<[Arc<QualifiedName>]>,
}

impl FrozenParserVocabulary {
    pub fn from_initial(iv: &InitialVocabulary) -> Result<Self> {
        let mut v = ParserVocabulary::default();
        v.populate(iv)?;
        Ok(Self {
            restricted_alphabet: v.restricted_alphabet.snapshot(),
            encoding_algorithm: v.encoding_algorithm.snapshot(),
            prefix: v.prefix.snapshot(),
            namespace_name: v.namespace_name.snapshot(),
            local_name: v.local_name.snapshot(),
            other_ncname: v.other_ncname.snapshot(),
            other_uri: v.other_uri.snapshot(),
            attribute_value: v.attribute_value.snapshot(),
            character_chunk: v.character_chunk.snapshot(),
            other_string: v.other_string.snapshot(),
            element_name: v.element_name.snapshot(),
            attribute_name: v.attribute_name.snapshot(),
        })
    }
}

/// Encoder-side tables: value to stream index.
#[derive(Debug, Clone)]
pub struct SerializerVocabulary {
    /// Alphabete und Algorithmen werden auch beim Encoder per Index
    /// angesprochen, daher hier als Arrays.
    pub restricted_alphabet: ValueArray<Arc<str>>,
    pub encoding_algorithm: ValueArray<Arc<str>>,
    pub prefix: StringIntMap,
    pub namespace_name: StringIntMap,
    pub local_name: StringIntMap,
    pub other_ncname: StringIntMap,
    pub other_uri: StringIntMap,
    pub attribute_value: StringIntMap,
    pub character_chunk: StringIntMap,
    pub other_string: StringIntMap,
    pub element_name: LocalNameQualifiedNamesMap,
    pub attribute_name: LocalNameQualifiedNamesMap,
}

impl Default for SerializerVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_MAXIMUM)
    }
}

impl SerializerVocabulary {
    pub fn new(maximum: usize) -> Self {
        Self {
            restricted_alphabet: ValueArray::new("restricted-alphabet", 224),
            encoding_algorithm: ValueArray::new("encoding-algorithm", 224),
            prefix: StringIntMap::new("prefix", maximum),
            namespace_name: StringIntMap::new("namespace-name", maximum),
            local_name: StringIntMap::new("local-name", maximum),
            other_ncname: StringIntMap::new("other-ncname", maximum),
            other_uri: StringIntMap::new("other-uri", maximum),
            attribute_value: StringIntMap::new("attribute-value", maximum),
            character_chunk: StringIntMap::new("character-chunk", maximum),
            other_string: StringIntMap::new("other-string", maximum),
            element_name: LocalNameQualifiedNamesMap::new("element-name", maximum),
            attribute_name: LocalNameQualifiedNamesMap::new("attribute-name", maximum),
        }
    }

    /// Mirror of [`ParserVocabulary::populate`]: same entries, same
    /// order, same indices.
    pub fn populate(&mut self, iv: &InitialVocabulary) -> Result<()> {
        for a in &iv.restricted_alphabets {
            if a.chars().count() < 2 {
                return Err(Error::InvalidAlphabet);
            }
            self.restricted_alphabet.add(Arc::from(a.as_str()))?;
        }
        for uri in &iv.encoding_algorithms {
            check_non_empty(uri)?;
            self.encoding_algorithm.add(Arc::from(uri.as_str()))?;
        }
        for s in &iv.prefixes {
            check_non_empty(s)?;
            self.prefix.add(Arc::from(s.as_str()))?;
        }
        for s in &iv.namespace_names {
            check_non_empty(s)?;
            self.namespace_name.add(Arc::from(s.as_str()))?;
        }
        for s in &iv.local_names {
            check_non_empty(s)?;
            self.local_name.add(Arc::from(s.as_str()))?;
        }
        for s in &iv.other_ncnames {
            check_non_empty(s)?;
            self.other_ncname.add(Arc::from(s.as_str()))?;
        }
        for s in &iv.other_uris {
            check_non_empty(s)?;
            self.other_uri.add(Arc::from(s.as_str()))?;
        }
        for s in &iv.attribute_values {
            check_non_empty(s)?;
            self.attribute_value.add(Arc::from(s.as_str()))?;
        }
        for s in &iv.character_chunks {
            check_non_empty(s)?;
            self.character_chunk.add(Arc::from(s.as_str()))?;
        }
        for s in &iv.other_strings {
            check_non_empty(s)?;
            self.other_string.add(Arc::from(s.as_str()))?;
        }
        for surrogate in &iv.element_names {
            let q = resolve_surrogate_against(iv, surrogate)?;
            self.element_name.add(q)?;
        }
        for surrogate in &iv.attribute_names {
            let q = resolve_surrogate_against(iv, surrogate)?;
            self.attribute_name.add(q)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.restricted_alphabet.clear();
        self.encoding_algorithm.clear();
        self.prefix.clear();
        self.namespace_name.clear();
        self.local_name.clear();
        self.other_ncname.clear();
        self.other_uri.clear();
        self.attribute_value.clear();
        self.character_chunk.clear();
        self.other_string.clear();
        self.element_name.clear();
        self.attribute_name.clear();
    }

    pub fn attach(&mut self, parent: &FrozenSerializerVocabulary) {
        self.restricted_alphabet.set_read_only(Arc::clone(&parent.restricted_alphabet));
        self.encoding_algorithm.set_read_only(Arc::clone(&parent.encoding_algorithm));
        self.prefix.set_parent(Arc::clone(&parent.prefix));
        self.namespace_name.set_parent(Arc::clone(&parent.namespace_name));
        self.local_name.set_parent(Arc::clone(&parent.local_name));
        self.other_ncname.set_parent(Arc::clone(&parent.other_ncname));
        self.other_uri.set_parent(Arc::clone(&parent.other_uri));
        self.attribute_value.set_parent(Arc::clone(&parent.attribute_value));
        self.character_chunk.set_parent(Arc::clone(&parent.character_chunk));
        self.other_string.set_parent(Arc::clone(&parent.other_string));
        self.element_name.set_parent(Arc::clone(&parent.element_name));
        self.attribute_name.set_parent(Arc::clone(&parent.attribute_name));
    }
}

fn check_non_empty(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::InvalidInitialVocabulary("empty string item"));
    }
    Ok(())
}

fn resolve_surrogate_against(
    iv: &InitialVocabulary,
    s: &NameSurrogate,
) -> Result<Arc<QualifiedName>> {
    let lookup = |list: &[String], idx: usize| -> Result<Arc<str>> {
        list.get(idx)
            .map(|s| Arc::from(s.as_str()))
            .ok_or(Error::InvalidInitialVocabulary("name surrogate index"))
    };
    let prefix = match s.prefix_index {
        Some(i) => lookup(&iv.prefixes, i)?,
        None => Arc::from(""),
    };
    let namespace = match s.namespace_index {
        Some(i) => lookup(&iv.namespace_names, i)?,
        None => Arc::from(""),
    };
    let local = lookup(&iv.local_names, s.local_name_index)?;
    let q = QualifiedName::from_parts(prefix, namespace, local);
    if !q.has_valid_shape() {
        return Err(Error::PrefixWithoutNamespace);
    }
    Ok(Arc::new(q))
}

/// Immutable snapshot of a fully built serializer vocabulary.
#[derive(Debug, Clone)]
pub struct FrozenSerializerVocabulary {
    restricted_alphabet: Arc<[Arc<str>]>,
    encoding_algorithm: Arc<[Arc<str>]>,
    prefix: Arc<StringIntMap>,
    namespace_name: Arc<StringIntMap>,
    local_name: Arc<StringIntMap>,
    other_ncname: Arc<StringIntMap>,
    other_uri: Arc<StringIntMap>,
    attribute_value: Arc<StringIntMap>,
    character_chunk: Arc<StringIntMap>,
    other_string: Arc<StringIntMap>,
    element_name: Arc<LocalNameQualifiedNamesMap>,
    attribute_name: Arc<LocalNameQualifiedNamesMap>,
}

impl FrozenSerializerVocabulary {
    pub fn from_initial(iv: &InitialVocabulary) -> Result<Self> {
        let mut v = SerializerVocabulary::default();
        v.populate(iv)?;
        Ok(Self {
            restricted_alphabet: v.restricted_alphabet.snapshot(),
            encoding_algorithm: v.encoding_algorithm.snapshot(),
            prefix: Arc::new(v.prefix),
            namespace_name: Arc::new(v.namespace_name),
            local_name: Arc::new(v.local_name),
            other_ncname: Arc::new(v.other_ncname),
            other_uri: Arc::new(v.other_uri),
            attribute_value: Arc::new(v.attribute_value),
            character_chunk: Arc::new(v.character_chunk),
            other_string: Arc::new(v.other_string),
            element_name: Arc::new(v.element_name),
            attribute_name: Arc::new(v.attribute_name),
        })
    }
}
