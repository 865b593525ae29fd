//! Codec configuration.
//!
//! `FiOptions` steuert beide Richtungen: Encoder-Politik (Deklaration,
//! Zeichencodierung, Tabellen-Schwellwerte, Initialvokabular) und
//! Decoder-Schutzgrenzen (Tabellenmaximum). Die Builder-Methoden sind
//! verkettbar; Getter und Setter existieren daneben fuer Code, der die
//! Optionen schrittweise aufbaut.

use crate::value_array::DEFAULT_TABLE_MAXIMUM;
use crate::vocabulary::InitialVocabulary;

/// Character encoding scheme for literal strings (X.891 7.2.7, C.19).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterEncodingScheme {
    #[default]
    Utf8,
    Utf16,
}

/// One additional-data item: application id plus opaque octets
/// (X.891 7.2.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalDatum {
    pub id: String,
    pub data: Vec<u8>,
}

/// Options for encoding and decoding fast infoset documents.
#[derive(Debug, Clone, PartialEq)]
pub struct FiOptions {
    character_encoding_scheme: CharacterEncodingScheme,
    emit_xml_declaration: bool,
    string_interning: bool,
    table_maximum: usize,
    min_attribute_value_size: usize,
    max_attribute_value_size: usize,
    min_character_chunk_size: usize,
    max_character_chunk_size: usize,
    use_builtin_restricted_alphabets: bool,
    initial_vocabulary: Option<InitialVocabulary>,
    additional_data: Vec<AdditionalDatum>,
}

impl Default for FiOptions {
    fn default() -> Self {
        Self {
            character_encoding_scheme: CharacterEncodingScheme::Utf8,
            emit_xml_declaration: false,
            string_interning: false,
            table_maximum: DEFAULT_TABLE_MAXIMUM,
            min_attribute_value_size: 0,
            max_attribute_value_size: 32,
            min_character_chunk_size: 0,
            max_character_chunk_size: 32,
            use_builtin_restricted_alphabets: false,
            initial_vocabulary: None,
            additional_data: Vec::new(),
        }
    }
}

impl FiOptions {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Getter ---

    pub fn character_encoding_scheme(&self) -> CharacterEncodingScheme {
        self.character_encoding_scheme
    }

    pub fn emits_xml_declaration(&self) -> bool {
        self.emit_xml_declaration
    }

    pub fn string_interning(&self) -> bool {
        self.string_interning
    }

    /// Upper bound on dynamic vocabulary-table sizes; streams that push
    /// past it are rejected.
    pub fn table_maximum(&self) -> usize {
        self.table_maximum
    }

    pub fn min_attribute_value_size(&self) -> usize {
        self.min_attribute_value_size
    }

    pub fn max_attribute_value_size(&self) -> usize {
        self.max_attribute_value_size
    }

    pub fn min_character_chunk_size(&self) -> usize {
        self.min_character_chunk_size
    }

    pub fn max_character_chunk_size(&self) -> usize {
        self.max_character_chunk_size
    }

    pub fn uses_builtin_restricted_alphabets(&self) -> bool {
        self.use_builtin_restricted_alphabets
    }

    pub fn initial_vocabulary(&self) -> Option<&InitialVocabulary> {
        self.initial_vocabulary.as_ref()
    }

    pub fn additional_data(&self) -> &[AdditionalDatum] {
        &self.additional_data
    }

    // --- Builder ---

    pub fn with_character_encoding_scheme(mut self, scheme: CharacterEncodingScheme) -> Self {
        self.character_encoding_scheme = scheme;
        self
    }

    /// Prepends `<?xml encoding='finf'?>` to the stream (X.891 12.3).
    pub fn with_xml_declaration(mut self, emit: bool) -> Self {
        self.emit_xml_declaration = emit;
        self
    }

    /// Dedupes literal strings the decoder produces, so repeated equal
    /// strings share one allocation.
    pub fn with_string_interning(mut self, interning: bool) -> Self {
        self.string_interning = interning;
        self
    }

    pub fn with_table_maximum(mut self, maximum: usize) -> Self {
        self.table_maximum = maximum;
        self
    }

    /// Attribute values outside `min..=max` octets are written literally
    /// and never indexed.
    pub fn with_attribute_value_size_limits(mut self, min: usize, max: usize) -> Self {
        self.min_attribute_value_size = min;
        self.max_attribute_value_size = max;
        self
    }

    /// Character chunks outside `min..=max` octets are written literally
    /// and never indexed.
    pub fn with_character_chunk_size_limits(mut self, min: usize, max: usize) -> Self {
        self.min_character_chunk_size = min;
        self.max_character_chunk_size = max;
        self
    }

    /// Lets the encoder pick the built-in numeric and date-time
    /// alphabets for values they can express (X.891 9.3).
    pub fn with_builtin_restricted_alphabets(mut self, enabled: bool) -> Self {
        self.use_builtin_restricted_alphabets = enabled;
        self
    }

    pub fn with_initial_vocabulary(mut self, vocabulary: InitialVocabulary) -> Self {
        self.initial_vocabulary = Some(vocabulary);
        self
    }

    pub fn with_additional_datum(mut self, id: &str, data: Vec<u8>) -> Self {
        self.additional_data.push(AdditionalDatum { id: id.into(), data });
        self
    }

    // --- Setter ---

    pub fn set_character_encoding_scheme(&mut self, scheme: CharacterEncodingScheme) {
        self.character_encoding_scheme = scheme;
    }

    pub fn set_table_maximum(&mut self, maximum: usize) {
        self.table_maximum = maximum;
    }

    pub fn set_initial_vocabulary(&mut self, vocabulary: Option<InitialVocabulary>) {
        self.initial_vocabulary = vocabulary;
    }
}
