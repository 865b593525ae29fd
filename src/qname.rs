//! Qualified names.
//!
//! Ein `QualifiedName` traegt Praefix, Namespace-Name und Local-Name.
//! Die Identitaet (für Hashing und Duplikat-Erkennung) ist der expanded
//! name, also Namespace + Local-Name; das Praefix geht aber in die
//! Gleichheit ein, weil die Homonym-Listen der Element-/Attributtabellen
//! Eintraege mit gleichem expanded name, aber verschiedenem Praefix,
//! getrennt indizieren (X.891 8.5, C.18).

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use ahash::AHasher;

/// A qualified name of an element or attribute information item.
#[derive(Debug)]
pub struct QualifiedName {
    /// Prefix, empty when absent.
    pub prefix: Arc<str>,
    /// Namespace name, empty when absent.
    pub namespace_name: Arc<str>,
    /// Local name, never empty.
    pub local_name: Arc<str>,
    /// Precomputed hash of the expanded name.
    identity: u64,
    /// `prefix:local` string, built on first use.
    qualified: OnceLock<Arc<str>>,
}

impl QualifiedName {
    pub fn new(prefix: &str, namespace_name: &str, local_name: &str) -> Self {
        Self::from_parts(Arc::from(prefix), Arc::from(namespace_name), Arc::from(local_name))
    }

    /// Constructs a name from already shared parts (the decoder reuses
    /// vocabulary-table entries here).
    pub fn from_parts(prefix: Arc<str>, namespace_name: Arc<str>, local_name: Arc<str>) -> Self {
        let identity = expanded_name_identity(&namespace_name, &local_name);
        Self { prefix, namespace_name, local_name, identity, qualified: OnceLock::new() }
    }

    /// Name without namespace: `QualifiedName::local("version")`.
    pub fn local(local_name: &str) -> Self {
        Self::new("", "", local_name)
    }

    /// Hash over namespace name and local name only.
    #[inline]
    pub fn identity(&self) -> u64 {
        self.identity
    }

    /// True when the name shape is legal: a prefix requires a namespace
    /// name (X.891 7.16).
    #[inline]
    pub fn has_valid_shape(&self) -> bool {
        self.prefix.is_empty() || !self.namespace_name.is_empty()
    }

    /// Two names with the same expanded name (namespace + local).
    #[inline]
    pub fn same_expanded_name(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.namespace_name == other.namespace_name
            && self.local_name == other.local_name
    }

    /// The `prefix:local-name` form, built lazily and cached.
    pub fn qualified_name(&self) -> &str {
        self.qualified.get_or_init(|| {
            if self.prefix.is_empty() {
                Arc::clone(&self.local_name)
            } else {
                Arc::from(format!("{}:{}", self.prefix, self.local_name))
            }
        })
    }
}

impl Clone for QualifiedName {
    fn clone(&self) -> Self {
        Self {
            prefix: Arc::clone(&self.prefix),
            namespace_name: Arc::clone(&self.namespace_name),
            local_name: Arc::clone(&self.local_name),
            identity: self.identity,
            qualified: OnceLock::new(),
        }
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.local_name == other.local_name
            && self.namespace_name == other.namespace_name
            && self.prefix == other.prefix
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.identity);
    }
}

fn expanded_name_identity(namespace_name: &str, local_name: &str) -> u64 {
    let mut h = AHasher::default();
    namespace_name.hash(&mut h);
    local_name.hash(&mut h);
    h.finish()
}
