//! Fast-Infoset-Codec: die binaere Infoset-Kodierung nach
//! ITU-T X.891 / ISO/IEC 24824-1.
//!
//! Dokumente werden als flacher Ereignisstrom ([`FiEvent`]) gelesen und
//! geschrieben; die Vokabulartabellen, ueber die das Format wiederholte
//! Namen und Werte als Indizes kodiert, verwalten Encoder und Decoder
//! selbst und halten sie auf beiden Seiten synchron.
//!
//! ```
//! use std::sync::Arc;
//! use rufis::{decode, encode, CharacterData, ChContent, FiEvent, FiOptions, QualifiedName};
//!
//! let events = vec![
//!     FiEvent::StartDocument,
//!     FiEvent::StartElement(Arc::new(QualifiedName::local("greeting"))),
//!     FiEvent::Characters(ChContent { data: CharacterData::text("hello") }),
//!     FiEvent::EndElement,
//!     FiEvent::EndDocument,
//! ];
//!
//! let octets = encode(&events, &FiOptions::default())?;
//! assert_eq!(decode(&octets)?, events);
//! # Ok::<(), rufis::Error>(())
//! ```
//!
//! Wiederverwendbare Vokabulare (X.891 7.2.13), Anwendungs-Alphabete
//! und registrierte Encoding-Algorithmen laufen ueber die zustands-
//! behafteten Typen [`Encoder`] und [`Decoder`].

pub mod algorithm;
pub mod alphabet;
mod buffer;
pub mod decoder;
mod document;
mod duplicate_attribute;
pub mod encoder;
pub mod error;
pub mod event;
mod key_map;
pub mod options;
pub mod qname;
mod tag;
mod value_array;
pub mod vocabulary;

pub use algorithm::{AlgorithmData, EncodingAlgorithm};
pub use decoder::{decode, Decoder};
pub use encoder::{encode, Encoder};
pub use error::{Error, Result};
pub use event::{
    AtContent, CharacterData, ChContent, CmContent, ErContent, FiEvent, NsContent, PiContent,
};
pub use options::{AdditionalDatum, CharacterEncodingScheme, FiOptions};
pub use qname::QualifiedName;
pub use vocabulary::{InitialVocabulary, NameSurrogate};

/// Hash map over ahash, wie ueberall im Crate.
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
pub(crate) type FastHashSet<T> = hashbrown::HashSet<T, ahash::RandomState>;
