//! Integer fast path for map lookups.
//!
//! Used when the lookup key is a small integer. A small integer can only be
//! equal to a stored small integer with the same value or to a boxed number
//! with the same numeric value, so the walk never needs the generic
//! equivalence routine.

use crate::hash::smi_hash;
use crate::heap::Heap;
use crate::table::OrderedHashTable;
use crate::value::KeyClass;

/// Returns the data-region offset of the entry whose key equals `key`.
///
/// The offset addresses the entry's key slot; `table.value_at(offset)` reads
/// its value without walking the chain again.
pub fn find_smi_entry(heap: &Heap, table: &OrderedHashTable, key: i32) -> Option<usize> {
    let bucket = table.bucket_for_hash(smi_hash(key));
    let mut entry = table.bucket_head(bucket);
    while let Some(index) = entry {
        table.check_chain_index(index);
        let offset = table.entry_offset(index);
        match heap.classify(table.key_at(offset)) {
            KeyClass::SmallInteger(candidate) if candidate == key => return Some(offset),
            KeyClass::SmallInteger(_) => {}
            // Plain float equality: -0.0 matches a key of 0.
            KeyClass::BoxedNumber(candidate) if candidate == key as f64 => return Some(offset),
            KeyClass::BoxedNumber(_) | KeyClass::Other => {}
        }
        entry = table.chain_next(offset);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::{SameValueZeroRoutines, TableRoutines};
    use crate::hash::hash_key;
    use crate::heap::HeapObject;
    use crate::layout::CollectionKind;
    use crate::value::Value;

    fn map_with(heap: &Heap, pairs: &[(Value, Value)]) -> OrderedHashTable {
        let mut t = OrderedHashTable::with_capacity(CollectionKind::Map, 16);
        for (k, v) in pairs {
            t.append(hash_key(heap, *k), *k, *v);
        }
        t
    }

    /// Invariant: a boxed 3.0 key is found by the small-integer 3, and both
    /// paths agree on it.
    #[test]
    fn boxed_integral_key_found_by_smi() {
        let mut heap = Heap::new();
        let boxed = Value::Heap(heap.alloc(HeapObject::Number(3.0)));
        let t = map_with(&heap, &[(boxed, Value::Smi(33))]);
        let off = find_smi_entry(&heap, &t, 3).expect("fast path finds boxed 3.0");
        assert_eq!(t.value_at(off), Value::Smi(33));
        assert!(SameValueZeroRoutines.has(&heap, &t, Value::Smi(3), 2));
    }

    /// Invariant: colliding keys in one chain resolve to the right entry, and
    /// misses walk off the end of the chain.
    #[test]
    fn walks_collisions_and_misses() {
        let mut heap = Heap::new();
        let s = Value::Heap(heap.alloc(HeapObject::String("7".into())));
        let pairs: Vec<(Value, Value)> = (0..8).map(|i| (Value::Smi(i), Value::Smi(i * 10))).collect();
        let mut t = map_with(&heap, &pairs);
        t.append(hash_key(&heap, s), s, Value::Smi(-1));
        for i in 0..8 {
            let off = find_smi_entry(&heap, &t, i).unwrap();
            assert_eq!(t.value_at(off), Value::Smi(i * 10));
        }
        assert_eq!(find_smi_entry(&heap, &t, 8), None);
        assert_eq!(find_smi_entry(&heap, &t, -1), None);
    }

    /// Invariant: non-integral and NaN boxed keys never match a small integer.
    #[test]
    fn non_integral_boxed_keys_do_not_match() {
        let mut heap = Heap::new();
        let half = Value::Heap(heap.alloc(HeapObject::Number(2.5)));
        let nan = Value::Heap(heap.alloc(HeapObject::Number(f64::NAN)));
        let t = map_with(&heap, &[(half, Value::Smi(1)), (nan, Value::Smi(2))]);
        assert_eq!(find_smi_entry(&heap, &t, 2), None);
        assert_eq!(find_smi_entry(&heap, &t, 3), None);
    }

    #[test]
    fn negative_zero_matches_zero() {
        let mut heap = Heap::new();
        let neg_zero = Value::Heap(heap.alloc(HeapObject::Number(-0.0)));
        let t = map_with(&heap, &[(neg_zero, Value::Boolean(true))]);
        let off = find_smi_entry(&heap, &t, 0).unwrap();
        assert_eq!(t.value_at(off), Value::Boolean(true));
    }

    #[test]
    #[should_panic(expected = "corrupted ordered hash table")]
    fn out_of_range_chain_index_is_fatal() {
        let heap = Heap::new();
        let mut t = map_with(&heap, &[(Value::Smi(1), Value::Smi(1))]);
        // Point the bucket holding key 1 at an entry that was never appended.
        let bucket = t.bucket_for_hash(smi_hash(1));
        t.corrupt_bucket_for_test(bucket, 3);
        find_smi_entry(&heap, &t, 1);
    }
}
