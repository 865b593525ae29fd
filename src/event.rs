//! Infoset events and their content payloads.
//!
//! Der Codec arbeitet auf einem flachen Ereignisstrom: ein Dokument ist
//! `StartDocument .. EndDocument`, Elemente klammern ihre Kinder mit
//! `StartElement`/`EndElement`. Namespace-Attribute und Attribute folgen
//! unmittelbar auf ihr `StartElement`, in dieser Reihenfolge.

use std::sync::Arc;

use crate::algorithm::AlgorithmData;
use crate::qname::QualifiedName;

/// Content of a namespace attribute (X.891 7.12).
///
/// Both fields may be empty: an empty namespace name undeclares the
/// prefix (or the default namespace).
#[derive(Debug, Clone, PartialEq)]
pub struct NsContent {
    pub prefix: Arc<str>,
    pub namespace_name: Arc<str>,
}

/// Content of an attribute information item (X.891 7.4).
#[derive(Debug, Clone, PartialEq)]
pub struct AtContent {
    pub qname: Arc<QualifiedName>,
    pub value: CharacterData,
}

/// Content of a character chunk (X.891 7.5).
#[derive(Debug, Clone, PartialEq)]
pub struct ChContent {
    pub data: CharacterData,
}

/// Content of a comment information item (X.891 7.7).
#[derive(Debug, Clone, PartialEq)]
pub struct CmContent {
    pub text: Arc<str>,
}

/// Content of a processing instruction (X.891 7.8).
#[derive(Debug, Clone, PartialEq)]
pub struct PiContent {
    pub target: Arc<str>,
    pub data: Arc<str>,
}

/// Content of an unexpanded entity reference (X.891 7.9).
#[derive(Debug, Clone, PartialEq)]
pub struct ErContent {
    pub name: Arc<str>,
    pub system_identifier: Option<Arc<str>>,
    pub public_identifier: Option<Arc<str>>,
}

/// A character-data value: attribute values and character chunks.
///
/// Der Decoder liefert `Text` für alle eingebauten Darstellungen
/// (UTF-8, UTF-16, numerische und Datums-Alphabete, Tabellentreffer),
/// `ApplicationAlphabet` für Anwendungs-Alphabete und `Typed` für
/// Encoding-Algorithm-Daten.
#[derive(Debug, Clone, PartialEq)]
pub enum CharacterData {
    /// Plain text.
    Text(Arc<str>),
    /// Text to be written with the application restricted alphabet at
    /// the given table index (0-based).
    ApplicationAlphabet { index: usize, text: Arc<str> },
    /// Data of a built-in or registered encoding algorithm.
    Typed(AlgorithmData),
}

impl CharacterData {
    pub fn text(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }

    /// The textual form, if this value carries one directly.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::ApplicationAlphabet { text, .. } => Some(text),
            Self::Typed(_) => None,
        }
    }
}

/// One event of the fast infoset document stream.
#[derive(Debug, Clone, PartialEq)]
pub enum FiEvent {
    StartDocument,
    EndDocument,
    StartElement(Arc<QualifiedName>),
    EndElement,
    /// Namespace attribute of the most recent `StartElement`.
    NamespaceAttribute(NsContent),
    /// Attribute of the most recent `StartElement`.
    Attribute(AtContent),
    Characters(ChContent),
    Comment(CmContent),
    ProcessingInstruction(PiContent),
    UnexpandedEntityReference(ErContent),
}

impl FiEvent {
    /// Short name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartDocument => "StartDocument",
            Self::EndDocument => "EndDocument",
            Self::StartElement(_) => "StartElement",
            Self::EndElement => "EndElement",
            Self::NamespaceAttribute(_) => "NamespaceAttribute",
            Self::Attribute(_) => "Attribute",
            Self::Characters(_) => "Characters",
            Self::Comment(_) => "Comment",
            Self::ProcessingInstruction(_) => "ProcessingInstruction",
            Self::UnexpandedEntityReference(_) => "UnexpandedEntityReference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_element_konstruktion() {
        let ev = FiEvent::StartElement(Arc::new(QualifiedName::local("book")));
        assert_eq!(ev.kind(), "StartElement");
    }

    #[test]
    fn attribute_traegt_wert() {
        let at = AtContent {
            qname: Arc::new(QualifiedName::local("id")),
            value: CharacterData::text("42"),
        };
        assert_eq!(at.value.as_text(), Some("42"));
    }

    #[test]
    fn typed_value_has_no_text() {
        let v = CharacterData::Typed(AlgorithmData::Int(vec![1, 2]));
        assert_eq!(v.as_text(), None);
    }

    #[test]
    fn application_alphabet_text() {
        let v = CharacterData::ApplicationAlphabet { index: 0, text: Arc::from("abba") };
        assert_eq!(v.as_text(), Some("abba"));
    }

    #[test]
    fn events_vergleichbar() {
        assert_eq!(FiEvent::EndElement, FiEvent::EndElement);
        assert_ne!(FiEvent::StartDocument, FiEvent::EndDocument);
    }
}
