//! OrderedHashTable: bucket array plus chained, append-only data region.
//!
//! Layout of `slots`:
//!
//! ```text
//! [ bucket 0 | ... | bucket B-1 | entry 0 | entry 1 | ... | entry C-1 ]
//!                                 ^ bucket_count
//! entry i = [ key, (value,) chain ] at offset bucket_count + i * entry_size
//! ```
//!
//! Bucket and chain slots hold `Value::Smi(index)` or `Value::Smi(NOT_FOUND)`.
//! New entries are appended at index `element_count + deleted_count` and
//! become the head of their bucket's chain. Entries never move; deletion
//! overwrites key and value with `Value::Hole` in place. Iterating the data
//! region in index order therefore yields live entries in insertion order.

use crate::heap::{Heap, TableRef};
use crate::layout::{CollectionKind, TableLayout, NOT_FOUND};
use crate::value::Value;
use log::trace;

#[derive(Debug, Clone)]
pub struct OrderedHashTable {
    layout: &'static TableLayout,
    capacity: usize,
    bucket_count: usize,
    element_count: usize,
    deleted_count: usize,
    slots: Box<[Value]>,
}

#[inline]
fn encode_link(index: Option<usize>) -> Value {
    match index {
        Some(i) => Value::Smi(i as i32),
        None => Value::Smi(NOT_FOUND),
    }
}

#[inline]
fn decode_link(v: Value) -> Option<usize> {
    match v {
        Value::Smi(NOT_FOUND) => None,
        Value::Smi(i) if i >= 0 => Some(i as usize),
        other => panic!("corrupted ordered hash table: link slot holds {:?}", other),
    }
}

impl OrderedHashTable {
    /// Fresh table with every bucket empty and every data slot `Undefined`.
    pub(crate) fn with_capacity(kind: CollectionKind, capacity: usize) -> Self {
        let layout = TableLayout::for_kind(kind);
        assert!(capacity.is_power_of_two(), "table capacity must be a power of two");
        assert!(
            capacity >= layout.min_capacity && capacity <= layout.max_capacity,
            "table capacity {} out of range",
            capacity
        );
        let bucket_count = layout.bucket_count(capacity);
        let length = layout.table_length(capacity);
        let mut slots = Vec::with_capacity(length);
        slots.resize(bucket_count, encode_link(None));
        slots.resize(length, Value::Undefined);
        Self {
            layout,
            capacity,
            bucket_count,
            element_count: 0,
            deleted_count: 0,
            slots: slots.into_boxed_slice(),
        }
    }

    /// Minimum-capacity table for `kind`.
    pub fn allocate(kind: CollectionKind) -> Self {
        Self::with_capacity(kind, TableLayout::for_kind(kind).min_capacity)
    }

    pub fn kind(&self) -> CollectionKind {
        self.layout.kind
    }

    pub fn layout(&self) -> &'static TableLayout {
        self.layout
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        self.element_count
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted_count
    }

    /// Entries appended so far, live or deleted.
    #[inline]
    pub fn used_entries(&self) -> usize {
        self.element_count + self.deleted_count
    }

    pub fn is_full(&self) -> bool {
        self.used_entries() >= self.capacity
    }

    #[inline]
    pub fn bucket_for_hash(&self, hash: u32) -> usize {
        (hash as usize) & (self.bucket_count - 1)
    }

    #[inline]
    pub fn bucket_head(&self, bucket: usize) -> Option<usize> {
        decode_link(self.slots[bucket])
    }

    /// Absolute offset of entry `index` within the slot array.
    #[inline]
    pub fn entry_offset(&self, index: usize) -> usize {
        self.bucket_count + index * self.layout.entry_size
    }

    #[inline]
    pub fn key_at(&self, offset: usize) -> Value {
        self.slots[offset]
    }

    /// Value slot of the entry at `offset`. For sets this is the key itself.
    #[inline]
    pub fn value_at(&self, offset: usize) -> Value {
        self.slots[offset + self.layout.value_offset]
    }

    #[inline]
    pub fn chain_next(&self, offset: usize) -> Option<usize> {
        decode_link(self.slots[offset + self.layout.chain_offset])
    }

    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Fatal check run at every chain step.
    #[inline]
    pub(crate) fn check_chain_index(&self, index: usize) {
        if index >= self.used_entries() {
            chain_out_of_range(index, self.used_entries());
        }
    }

    /// Appends an entry and links it at the head of its bucket chain.
    /// Returns the entry's offset. The caller guarantees the table is not full.
    pub(crate) fn append(&mut self, hash: u32, key: Value, value: Value) -> usize {
        assert!(!self.is_full(), "append into a full ordered hash table");
        let index = self.used_entries();
        let bucket = self.bucket_for_hash(hash);
        let offset = self.entry_offset(index);
        let previous_head = self.slots[bucket];
        self.slots[offset] = key;
        if self.layout.payload_len > 1 {
            self.slots[offset + self.layout.value_offset] = value;
        }
        self.slots[offset + self.layout.chain_offset] = previous_head;
        self.slots[bucket] = encode_link(Some(index));
        self.element_count += 1;
        offset
    }

    pub(crate) fn set_value_at(&mut self, offset: usize, value: Value) {
        debug_assert!(self.layout.payload_len > 1);
        self.slots[offset + self.layout.value_offset] = value;
    }

    /// Turns the entry at `offset` into a tombstone. It stays on its chain.
    pub(crate) fn mark_deleted(&mut self, offset: usize) {
        debug_assert!(self.slots[offset] != Value::Hole);
        self.slots[offset] = Value::Hole;
        if self.layout.payload_len > 1 {
            self.slots[offset + self.layout.value_offset] = Value::Hole;
        }
        self.element_count -= 1;
        self.deleted_count += 1;
    }

    /// Live entries in insertion order.
    pub fn live_entries(&self) -> LiveEntries<'_> {
        LiveEntries {
            table: self,
            next_index: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn corrupt_bucket_for_test(&mut self, bucket: usize, index: usize) {
        self.slots[bucket] = encode_link(Some(index));
    }

    /// Panics unless every structural invariant holds.
    pub fn assert_consistent(&self) {
        let used = self.used_entries();
        assert!(self.capacity.is_power_of_two());
        assert_eq!(self.bucket_count, self.capacity / self.layout.load_factor);
        assert!(used <= self.capacity);
        assert_eq!(self.slots.len(), self.layout.table_length(self.capacity));

        let mut seen = vec![false; used];
        for bucket in 0..self.bucket_count {
            let mut entry = self.bucket_head(bucket);
            let mut steps = 0;
            while let Some(index) = entry {
                assert!(index < used, "chain index {} beyond {} used entries", index, used);
                assert!(!seen[index], "entry {} linked twice", index);
                seen[index] = true;
                steps += 1;
                assert!(steps <= used, "cyclic chain in bucket {}", bucket);
                entry = self.chain_next(self.entry_offset(index));
            }
        }
        assert!(seen.iter().all(|s| *s), "unreachable entry in data region");

        let live = (0..used)
            .filter(|i| self.key_at(self.entry_offset(*i)) != Value::Hole)
            .count();
        assert_eq!(live, self.element_count);
        for slot in &self.slots[self.entry_offset(used)..] {
            assert_eq!(*slot, Value::Undefined);
        }
    }
}

#[cold]
#[inline(never)]
fn chain_out_of_range(index: usize, used: usize) -> ! {
    panic!(
        "corrupted ordered hash table: chain index {} not below {} used entries",
        index, used
    );
}

/// One live entry as seen by [`OrderedHashTable::live_entries`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LiveEntry {
    pub index: usize,
    pub key: Value,
    pub value: Value,
}

pub struct LiveEntries<'a> {
    table: &'a OrderedHashTable,
    next_index: usize,
}

impl<'a> Iterator for LiveEntries<'a> {
    type Item = LiveEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.table.used_entries() {
            let index = self.next_index;
            self.next_index += 1;
            let offset = self.table.entry_offset(index);
            let key = self.table.key_at(offset);
            if key != Value::Hole {
                return Some(LiveEntry {
                    index,
                    key,
                    value: self.table.value_at(offset),
                });
            }
        }
        None
    }
}

impl Heap {
    /// Allocates a minimum-capacity table for `kind`.
    ///
    /// Any other handle the caller obtained from a shell must be reloaded
    /// from that shell afterwards.
    pub fn allocate_table(&mut self, kind: CollectionKind) -> TableRef {
        let table = OrderedHashTable::allocate(kind);
        trace!(
            "allocated {} table: capacity={} buckets={} length={}",
            kind.name(),
            table.capacity(),
            table.bucket_count(),
            table.slots().len()
        );
        self.alloc_table(table)
    }
}
