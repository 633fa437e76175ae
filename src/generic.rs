//! Full-equivalence lookup over the table layout.
//!
//! Keys that the integer fast path does not handle are resolved here, via
//! the [`TableRoutines`] seam. The default implementation compares keys with
//! SameValueZero: strict equality, except that NaN equals NaN and the two
//! zeros are equal.

use crate::hash::hash_key;
use crate::heap::Heap;
use crate::table::OrderedHashTable;
use crate::value::Value;

/// Read-only lookup routines operating on a validated table.
pub trait TableRoutines {
    /// Stored value for `key`, or `Value::Undefined` when absent.
    fn get(&self, heap: &Heap, table: &OrderedHashTable, key: Value) -> Value;

    /// Whether `key` is present. `payload_len` is the number of payload
    /// slots per entry the caller expects (2 for maps, 1 for sets).
    fn has(&self, heap: &Heap, table: &OrderedHashTable, key: Value, payload_len: usize) -> bool;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SameValueZeroRoutines;

impl TableRoutines for SameValueZeroRoutines {
    fn get(&self, heap: &Heap, table: &OrderedHashTable, key: Value) -> Value {
        match find_entry(heap, table, key, hash_key(heap, key)) {
            Some(offset) => table.value_at(offset),
            None => Value::Undefined,
        }
    }

    fn has(&self, heap: &Heap, table: &OrderedHashTable, key: Value, payload_len: usize) -> bool {
        assert_eq!(
            payload_len,
            table.layout().payload_len,
            "lookup entry size does not match the {} table layout",
            table.kind().name()
        );
        find_entry(heap, table, key, hash_key(heap, key)).is_some()
    }
}

/// SameValueZero equality.
pub fn same_value_zero(heap: &Heap, a: Value, b: Value) -> bool {
    if a == Value::Hole || b == Value::Hole {
        return false;
    }
    if a == b {
        return true;
    }
    if let (Some(x), Some(y)) = (heap.number_value(a), heap.number_value(b)) {
        return x == y || (x.is_nan() && y.is_nan());
    }
    match (heap.string_value(a), heap.string_value(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Walks the chain for `hash` and returns the offset of the entry whose key
/// is SameValueZero-equal to `key`.
pub fn find_entry(heap: &Heap, table: &OrderedHashTable, key: Value, hash: u32) -> Option<usize> {
    let mut entry = table.bucket_head(table.bucket_for_hash(hash));
    while let Some(index) = entry {
        table.check_chain_index(index);
        let offset = table.entry_offset(index);
        if same_value_zero(heap, table.key_at(offset), key) {
            return Some(offset);
        }
        entry = table.chain_next(offset);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_key;
    use crate::heap::HeapObject;
    use crate::layout::CollectionKind;

    fn insert(heap: &Heap, t: &mut OrderedHashTable, key: Value, value: Value) {
        let h = hash_key(heap, key);
        t.append(h, key, value);
    }

    /// Invariant: NaN finds NaN, and -0 finds +0, under SameValueZero.
    #[test]
    fn nan_and_signed_zero_equivalence() {
        let mut heap = Heap::new();
        let nan_a = Value::Heap(heap.alloc(HeapObject::Number(f64::NAN)));
        let nan_b = Value::Heap(heap.alloc(HeapObject::Number(f64::NAN)));
        let neg_zero = Value::Heap(heap.alloc(HeapObject::Number(-0.0)));
        let mut t = OrderedHashTable::allocate(CollectionKind::Map);
        insert(&heap, &mut t, nan_a, Value::Smi(1));
        insert(&heap, &mut t, Value::Smi(0), Value::Smi(2));

        let r = SameValueZeroRoutines;
        assert_eq!(r.get(&heap, &t, nan_b), Value::Smi(1));
        assert_eq!(r.get(&heap, &t, neg_zero), Value::Smi(2));
        assert!(r.has(&heap, &t, nan_b, 2));
        assert!(!r.has(&heap, &t, Value::Null, 2));
    }

    /// Invariant: strings compare by content, other objects by identity.
    #[test]
    fn strings_by_content_objects_by_identity() {
        let mut heap = Heap::new();
        let s1 = Value::Heap(heap.alloc(HeapObject::String("a".into())));
        let s2 = Value::Heap(heap.alloc(HeapObject::String("a".into())));
        let t1 = heap.allocate_table(CollectionKind::Set).raw();
        let t2 = heap.allocate_table(CollectionKind::Set).raw();
        assert!(same_value_zero(&heap, s1, s2));
        assert!(same_value_zero(&heap, Value::Heap(t1), Value::Heap(t1)));
        assert!(!same_value_zero(&heap, Value::Heap(t1), Value::Heap(t2)));
        assert!(!same_value_zero(&heap, Value::Hole, Value::Hole));
        assert!(!same_value_zero(&heap, Value::Smi(1), Value::Boolean(true)));
    }

    /// Invariant: deleted entries are skipped during the chain walk.
    #[test]
    fn tombstoned_key_is_not_found() {
        let heap = Heap::new();
        let mut t = OrderedHashTable::allocate(CollectionKind::Set);
        let h = hash_key(&heap, Value::Smi(5));
        let off = t.append(h, Value::Smi(5), Value::Undefined);
        t.mark_deleted(off);
        assert!(!SameValueZeroRoutines.has(&heap, &t, Value::Smi(5), 1));
    }

    #[test]
    #[should_panic(expected = "entry size")]
    fn mismatched_entry_size_is_fatal() {
        let heap = Heap::new();
        let t = OrderedHashTable::allocate(CollectionKind::Set);
        SameValueZeroRoutines.has(&heap, &t, Value::Smi(1), 2);
    }
}
