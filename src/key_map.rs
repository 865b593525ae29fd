//! Key-to-index maps (encoder side).
//!
//! Die Encoder-Haelfte der Vokabulartabellen: Werte werden auf den Index
//! abgebildet, unter dem die Decoder-Seite sie ablegen wird. Wie bei
//! `ValueArray` belegt ein eingefrorenes Parent-Vokabular die niedrigen
//! Indizes und uebersteht `clear`.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::qname::QualifiedName;
use crate::FastHashMap;

/// String-to-index map for the ten string tables (X.891 8.2, 8.4).
#[derive(Debug, Clone, Default)]
pub struct StringIntMap {
    map: FastHashMap<Arc<str>, usize>,
    next_index: usize,
    parent: Option<Arc<StringIntMap>>,
    maximum: usize,
    name: &'static str,
}

impl StringIntMap {
    pub fn new(name: &'static str, maximum: usize) -> Self {
        Self { map: FastHashMap::default(), next_index: 0, parent: None, maximum, name }
    }

    /// Number of entries, parent layer included.
    #[inline]
    pub fn size(&self) -> usize {
        self.next_index
    }

    /// The 0-based index a previous `add` assigned, if any. Parent
    /// entries win: their indices were fixed when the parent froze.
    pub fn obtain_index(&self, key: &str) -> Option<usize> {
        if let Some(parent) = &self.parent {
            if let Some(idx) = parent.obtain_index(key) {
                return Some(idx);
            }
        }
        self.map.get(key).copied()
    }

    /// Assigns the next index to the key.
    pub fn add(&mut self, key: Arc<str>) -> Result<usize> {
        if self.next_index >= self.maximum {
            return Err(Error::TableMaximumExceeded { maximum: self.maximum, table: self.name });
        }
        let idx = self.next_index;
        self.map.insert(key, idx);
        self.next_index += 1;
        Ok(idx)
    }

    /// True when no further entry may be assigned an index.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.next_index >= self.maximum
    }

    pub fn set_parent(&mut self, parent: Arc<StringIntMap>) {
        debug_assert!(self.map.is_empty(), "parent attached after local insertions");
        self.next_index = parent.size();
        self.parent = Some(parent);
    }

    /// Drops local entries; indexing continues behind the parent.
    pub fn clear(&mut self) {
        self.map.clear();
        self.next_index = self.parent.as_ref().map_or(0, |p| p.size());
    }
}

/// One interned qualified name with its table index.
#[derive(Debug, Clone)]
pub struct QualifiedNameEntry {
    pub qname: Arc<QualifiedName>,
    pub index: usize,
}

/// Qualified-name-to-index map for the element and attribute name
/// tables (X.891 8.5).
///
/// Eintraege sind Homonym-Listen pro Local-Name: derselbe Local-Name
/// kann unter mehreren Praefix/Namespace-Kombinationen indiziert sein,
/// der Treffer verlangt Gleichheit aller drei Bestandteile.
#[derive(Debug, Clone, Default)]
pub struct LocalNameQualifiedNamesMap {
    map: FastHashMap<Arc<str>, Vec<QualifiedNameEntry>>,
    next_index: usize,
    parent: Option<Arc<LocalNameQualifiedNamesMap>>,
    maximum: usize,
    name: &'static str,
}

impl LocalNameQualifiedNamesMap {
    pub fn new(name: &'static str, maximum: usize) -> Self {
        Self {
            map: FastHashMap::default(),
            next_index: 0,
            parent: None,
            maximum,
            name,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.next_index
    }

    pub fn obtain_index(&self, qname: &QualifiedName) -> Option<usize> {
        if let Some(parent) = &self.parent {
            if let Some(idx) = parent.obtain_index(qname) {
                return Some(idx);
            }
        }
        let homonyms = self.map.get(&*qname.local_name)?;
        homonyms.iter().find(|e| *e.qname == *qname).map(|e| e.index)
    }

    pub fn add(&mut self, qname: Arc<QualifiedName>) -> Result<usize> {
        if self.next_index >= self.maximum {
            return Err(Error::TableMaximumExceeded { maximum: self.maximum, table: self.name });
        }
        let idx = self.next_index;
        self.map
            .entry(Arc::clone(&qname.local_name))
            .or_default()
            .push(QualifiedNameEntry { qname, index: idx });
        self.next_index += 1;
        Ok(idx)
    }

    pub fn set_parent(&mut self, parent: Arc<LocalNameQualifiedNamesMap>) {
        debug_assert!(self.map.is_empty(), "parent attached after local insertions");
        self.next_index = parent.size();
        self.parent = Some(parent);
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.next_index = self.parent.as_ref().map_or(0, |p| p.size());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_map_assigns_sequential_indices() {
        let mut m = StringIntMap::new("test", 8);
        assert_eq!(m.add(Arc::from("a")).unwrap(), 0);
        assert_eq!(m.add(Arc::from("b")).unwrap(), 1);
        assert_eq!(m.obtain_index("b"), Some(1));
        assert_eq!(m.obtain_index("c"), None);
    }

    #[test]
    fn string_map_parent_indices_stable() {
        let mut parent = StringIntMap::new("test", 8);
        parent.add(Arc::from("p")).unwrap();
        let parent = Arc::new(parent);

        let mut m = StringIntMap::new("test", 8);
        m.set_parent(Arc::clone(&parent));
        assert_eq!(m.obtain_index("p"), Some(0));
        assert_eq!(m.add(Arc::from("l")).unwrap(), 1);

        m.clear();
        assert_eq!(m.obtain_index("p"), Some(0));
        assert_eq!(m.obtain_index("l"), None);
        assert_eq!(m.add(Arc::from("n")).unwrap(), 1);
    }

    #[test]
    fn string_map_maximum() {
        let mut m = StringIntMap::new("test", 1);
        m.add(Arc::from("a")).unwrap();
        assert!(matches!(m.add(Arc::from("b")), Err(Error::TableMaximumExceeded { .. })));
    }

    #[test]
    fn homonyme_unterscheiden_sich_durch_praefix() {
        let mut m = LocalNameQualifiedNamesMap::new("element", 8);
        let a = Arc::new(QualifiedName::new("a", "urn:x", "n"));
        let b = Arc::new(QualifiedName::new("b", "urn:x", "n"));
        let ia = m.add(Arc::clone(&a)).unwrap();
        let ib = m.add(Arc::clone(&b)).unwrap();
        assert_ne!(ia, ib);
        assert_eq!(m.obtain_index(&a), Some(ia));
        assert_eq!(m.obtain_index(&b), Some(ib));
    }

    #[test]
    fn qname_map_miss_on_unknown_namespace() {
        let mut m = LocalNameQualifiedNamesMap::new("element", 8);
        m.add(Arc::new(QualifiedName::new("", "urn:x", "n"))).unwrap();
        assert_eq!(m.obtain_index(&QualifiedName::new("", "urn:y", "n")), None);
    }

    #[test]
    fn qname_map_parent_survives_clear() {
        let mut parent = LocalNameQualifiedNamesMap::new("element", 8);
        let p = Arc::new(QualifiedName::local("root"));
        parent.add(Arc::clone(&p)).unwrap();
        let parent = Arc::new(parent);

        let mut m = LocalNameQualifiedNamesMap::new("element", 8);
        m.set_parent(parent);
        m.add(Arc::new(QualifiedName::local("child"))).unwrap();
        m.clear();
        assert_eq!(m.obtain_index(&p), Some(0));
        assert_eq!(m.size(), 1);
    }
}
