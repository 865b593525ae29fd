//! Append-only index-to-value tables (decoder side).
//!
//! Eine `ValueArray` ist die Decoder-Haelfte einer Vokabulartabelle:
//! Streamindizes werden auf Werte abgebildet. Eine optionale, eingefrorene
//! Parent-Schicht (externes Vokabular) belegt die niedrigen Indizes und
//! bleibt über `clear` hinweg stabil; nur das lokale Segment wird pro
//! Dokument geleert.

use std::sync::Arc;

use crate::error::{Error, Result};

/// Default cap for dynamic tables: the largest index the C.25/C.27/C.28
/// wire forms can address is above 2^20, so a 2^20 cap never rejects a
/// stream an honest encoder can produce.
pub const DEFAULT_TABLE_MAXIMUM: usize = 1 << 20;

const INITIAL_CAPACITY: usize = 16;

/// Index-addressed table with a frozen parent layer.
#[derive(Debug, Clone)]
pub struct ValueArray<T> {
    read_only: Option<Arc<[T]>>,
    local: Vec<T>,
    maximum: usize,
    name: &'static str,
}

impl<T: Clone> ValueArray<T> {
    pub fn new(name: &'static str, maximum: usize) -> Self {
        Self { read_only: None, local: Vec::new(), maximum, name }
    }

    /// Number of entries, parent layer included.
    #[inline]
    pub fn size(&self) -> usize {
        self.read_only_size() + self.local.len()
    }

    #[inline]
    fn read_only_size(&self) -> usize {
        self.read_only.as_ref().map_or(0, |p| p.len())
    }

    /// Looks up a 0-based index across parent and local segments.
    pub fn get(&self, index: usize) -> Result<&T> {
        let ro = self.read_only_size();
        if index < ro {
            // unwrap-frei: ro > 0 impliziert read_only ist Some
            if let Some(parent) = &self.read_only {
                return Ok(&parent[index]);
            }
        }
        self.local.get(index - ro).ok_or(Error::IndexOutOfRange {
            index: index + 1,
            size: self.size(),
            table: self.name,
        })
    }

    /// Appends a value and returns its 0-based index.
    ///
    /// Wachstum in 3/2-Schritten statt Verdopplung: Tabellen feindlicher
    /// Streams sollen den Speicher nicht schneller belegen als noetig.
    pub fn add(&mut self, value: T) -> Result<usize> {
        if self.size() >= self.maximum {
            return Err(Error::TableMaximumExceeded { maximum: self.maximum, table: self.name });
        }
        if self.local.len() == self.local.capacity() {
            let additional = (self.local.capacity() / 2).max(INITIAL_CAPACITY);
            self.local.reserve_exact(additional);
        }
        self.local.push(value);
        Ok(self.size() - 1)
    }

    /// Installs the frozen parent layer. Only legal on an empty local
    /// segment, otherwise parent indices would shift.
    pub fn set_read_only(&mut self, parent: Arc<[T]>) {
        debug_assert!(self.local.is_empty(), "parent attached after local insertions");
        self.read_only = Some(parent);
    }

    /// Clears the local segment; the parent layer survives.
    pub fn clear(&mut self) {
        self.local.clear();
    }

    /// Flattens parent and local segments into a fresh frozen layer.
    pub fn snapshot(&self) -> Arc<[T]> {
        let mut all = Vec::with_capacity(self.size());
        if let Some(parent) = &self.read_only {
            all.extend(parent.iter().cloned());
        }
        all.extend(self.local.iter().cloned());
        Arc::from(all)
    }
}
