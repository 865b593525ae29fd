//! Duplicate-attribute detection (X.891 7.4, XML well-formedness).
//!
//! Pro Element wird jeder Attributname gegen die bereits gesehenen
//! geprueft. Die Struktur ist eine Arena mit Iterationsstempeln:
//! `reset` ist O(1), kein Slot wird zwischen Elementen freigegeben
//! oder neu alloziert, Ketten laufen ueber Indizes statt Zeigern.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::qname::QualifiedName;

const BUCKET_COUNT: usize = 64;
const SLOT_BATCH: usize = 16;
const NO_SLOT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    stamp: u64,
    head: u32,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    qname: Option<Arc<QualifiedName>>,
    next: u32,
}

/// Per-element duplicate check over expanded attribute names.
#[derive(Debug)]
pub struct DuplicateAttributeVerifier {
    buckets: Vec<Bucket>,
    slots: Vec<Slot>,
    used: usize,
    iteration: u64,
}

impl Default for DuplicateAttributeVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateAttributeVerifier {
    pub fn new() -> Self {
        Self {
            buckets: vec![Bucket { stamp: 0, head: NO_SLOT }; BUCKET_COUNT],
            slots: Vec::new(),
            used: 0,
            iteration: 0,
        }
    }

    /// Starts the attribute list of a new element. Stale buckets and
    /// slots are invalidated by the stamp, not by clearing.
    pub fn reset(&mut self) {
        self.iteration += 1;
        self.used = 0;
    }

    /// Records one attribute name; errors if this element already has
    /// an attribute with the same expanded name.
    pub fn check(&mut self, qname: &Arc<QualifiedName>) -> Result<()> {
        let bucket = (qname.identity() as usize) & (BUCKET_COUNT - 1);
        let mut head = NO_SLOT;
        if self.buckets[bucket].stamp == self.iteration {
            head = self.buckets[bucket].head;
            let mut cursor = head;
            while cursor != NO_SLOT {
                let slot = &self.slots[cursor as usize];
                if let Some(seen) = &slot.qname {
                    if seen.same_expanded_name(qname) {
                        return Err(Error::DuplicateAttribute(
                            qname.qualified_name().to_string(),
                        ));
                    }
                }
                cursor = slot.next;
            }
        }

        if self.used == self.slots.len() {
            self.slots.resize(self.slots.len() + SLOT_BATCH, Slot::default());
        }
        self.slots[self.used] = Slot { qname: Some(Arc::clone(qname)), next: head };
        self.buckets[bucket] = Bucket { stamp: self.iteration, head: self.used as u32 };
        self.used += 1;
        Ok(())
    }
}
