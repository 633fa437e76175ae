//! Table mutation: insertion, deletion, growth and compaction.
//!
//! Contract with the lookup paths: a table is never reshaped in place.
//! Growth, shrink, compaction and clear all build a new table and install it
//! on the shell in one step, releasing the old one. Entries inside a table
//! only ever get appended or tombstoned.

use crate::error::{Exception, MessageTemplate};
use crate::generic::find_entry;
use crate::hash::hash_key;
use crate::heap::{Heap, HeapRef, TableRef};
use crate::table::OrderedHashTable;
use crate::value::{KeyClass, Value};
use log::debug;

/// Folds both zeros to the small integer 0 so that -0 is never stored.
fn normalize_key(heap: &Heap, key: Value) -> Value {
    match heap.classify(key) {
        KeyClass::BoxedNumber(n) if n == 0.0 => Value::Smi(0),
        _ => key,
    }
}

/// Inserts or overwrites `key` in a map.
pub fn map_set(heap: &mut Heap, shell: HeapRef, key: Value, value: Value) -> Result<(), Exception> {
    insert(heap, shell, key, value)
}

/// Inserts `key` into a set if absent.
pub fn set_add(heap: &mut Heap, shell: HeapRef, key: Value) -> Result<(), Exception> {
    insert(heap, shell, key, Value::Undefined)
}

fn insert(heap: &mut Heap, shell: HeapRef, key: Value, value: Value) -> Result<(), Exception> {
    let key = normalize_key(heap, key);
    let hash = hash_key(heap, key);
    let table_ref = heap.shell_table(shell)?;
    let existing = {
        let table = heap.table(table_ref)?;
        find_entry(heap, table, key, hash).map(|offset| (offset, table.layout().payload_len))
    };
    if let Some((offset, payload_len)) = existing {
        if payload_len > 1 {
            heap.table_mut(table_ref)?.set_value_at(offset, value);
        }
        return Ok(());
    }
    let table_ref = ensure_growable(heap, shell)?;
    heap.table_mut(table_ref)?.append(hash, key, value);
    Ok(())
}

/// Tombstones `key`. Returns whether it was present.
pub fn delete(heap: &mut Heap, shell: HeapRef, key: Value) -> Result<bool, Exception> {
    let hash = hash_key(heap, key);
    let table_ref = heap.shell_table(shell)?;
    let found = {
        let table = heap.table(table_ref)?;
        find_entry(heap, table, key, hash)
    };
    let Some(offset) = found else {
        return Ok(false);
    };
    let table = heap.table_mut(table_ref)?;
    table.mark_deleted(offset);
    let (live, capacity, min_capacity) = (table.len(), table.capacity(), table.layout().min_capacity);
    if live < capacity / 4 && capacity / 2 >= min_capacity {
        rehash(heap, shell, capacity / 2)?;
    }
    Ok(true)
}

/// Replaces the shell's table with a fresh minimum-capacity one.
pub fn clear(heap: &mut Heap, shell: HeapRef) -> Result<(), Exception> {
    let kind = heap.table(heap.shell_table(shell)?)?.kind();
    let fresh = heap.allocate_table(kind);
    heap.replace_table(shell, fresh)?;
    debug!("cleared {} table", kind.name());
    Ok(())
}

/// Live entry count of the shell's current table.
pub fn size(heap: &Heap, shell: HeapRef) -> Result<usize, Exception> {
    Ok(heap.table(heap.shell_table(shell)?)?.len())
}

/// Makes room for one more entry, returning the table to append into.
///
/// A full table is rebuilt at the same capacity when at least half of it is
/// tombstones, and at twice the capacity otherwise.
fn ensure_growable(heap: &mut Heap, shell: HeapRef) -> Result<TableRef, Exception> {
    let table_ref = heap.shell_table(shell)?;
    let table = heap.table(table_ref)?;
    if !table.is_full() {
        return Ok(table_ref);
    }
    let capacity = table.capacity();
    let layout = table.layout();
    let new_capacity = if table.deleted_count() >= capacity / 2 {
        capacity
    } else {
        capacity * 2
    };
    if new_capacity > layout.max_capacity {
        return Err(Exception::range_error(
            MessageTemplate::CollectionSizeExceeded,
            &[layout.kind.name()],
        ));
    }
    rehash(heap, shell, new_capacity)
}

/// Rebuilds the shell's table at `new_capacity`, dropping tombstones and
/// keeping live entries in order.
fn rehash(heap: &mut Heap, shell: HeapRef, new_capacity: usize) -> Result<TableRef, Exception> {
    let old_ref = heap.shell_table(shell)?;
    let rebuilt = {
        let old = heap.table(old_ref)?;
        let mut rebuilt = OrderedHashTable::with_capacity(old.kind(), new_capacity);
        for entry in old.live_entries() {
            rebuilt.append(hash_key(heap, entry.key), entry.key, entry.value);
        }
        debug!(
            "rehashing {} table: capacity {} -> {}, {} live, {} tombstones dropped",
            old.kind().name(),
            old.capacity(),
            new_capacity,
            old.len(),
            old.deleted_count()
        );
        rebuilt
    };
    let new_ref = heap.alloc_table(rebuilt);
    heap.replace_table(shell, new_ref)?;
    Ok(new_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::HeapObject;
    use crate::layout::CollectionKind;
    use crate::lookup::find_smi_entry;
    use crate::object::{JsObject, ObjectClass};
    use crate::shell::CollectionShell;

    fn new_shell(heap: &mut Heap, kind: CollectionKind) -> HeapRef {
        let object = JsObject::new(ObjectClass::Collection(CollectionShell::new(kind)), None);
        let shell = heap.alloc(HeapObject::Object(object));
        let table = heap.allocate_table(kind);
        heap.replace_table(shell, table).unwrap();
        shell
    }

    fn keys(heap: &Heap, shell: HeapRef) -> Vec<Value> {
        let table = heap.table(heap.shell_table(shell).unwrap()).unwrap();
        table.live_entries().map(|e| e.key).collect()
    }

    /// Invariant: growth replaces the table, keeps insertion order, and
    /// invalidates the old table handle.
    #[test]
    fn growth_replaces_table_and_preserves_order() {
        let mut heap = Heap::new();
        let shell = new_shell(&mut heap, CollectionKind::Map);
        let first = heap.shell_table(shell).unwrap();
        for i in 0..20 {
            map_set(&mut heap, shell, Value::Smi(i), Value::Smi(i * 2)).unwrap();
        }
        let current = heap.shell_table(shell).unwrap();
        assert_ne!(first, current);
        assert!(heap.table(first).is_err());
        let table = heap.table(current).unwrap();
        assert_eq!(table.capacity(), 32);
        table.assert_consistent();
        assert_eq!(keys(&heap, shell), (0..20).map(Value::Smi).collect::<Vec<_>>());
        let off = find_smi_entry(&heap, table, 13).unwrap();
        assert_eq!(table.value_at(off), Value::Smi(26));
    }

    /// Invariant: overwriting an existing key keeps its position.
    #[test]
    fn overwrite_keeps_position() {
        let mut heap = Heap::new();
        let shell = new_shell(&mut heap, CollectionKind::Map);
        map_set(&mut heap, shell, Value::Smi(1), Value::Smi(1)).unwrap();
        map_set(&mut heap, shell, Value::Smi(2), Value::Smi(2)).unwrap();
        map_set(&mut heap, shell, Value::Smi(1), Value::Smi(9)).unwrap();
        assert_eq!(keys(&heap, shell), vec![Value::Smi(1), Value::Smi(2)]);
        assert_eq!(size(&heap, shell).unwrap(), 2);
    }

    /// Invariant: -0 is stored as 0, and set insertion deduplicates.
    #[test]
    fn negative_zero_normalized_and_sets_deduplicate() {
        let mut heap = Heap::new();
        let shell = new_shell(&mut heap, CollectionKind::Set);
        let neg_zero = Value::Heap(heap.alloc(HeapObject::Number(-0.0)));
        set_add(&mut heap, shell, neg_zero).unwrap();
        set_add(&mut heap, shell, Value::Smi(0)).unwrap();
        set_add(&mut heap, shell, Value::Smi(0)).unwrap();
        assert_eq!(keys(&heap, shell), vec![Value::Smi(0)]);
    }

    /// Invariant: a full table with many tombstones is compacted at the same
    /// capacity rather than grown.
    #[test]
    fn full_table_of_tombstones_compacts_in_place() {
        let mut heap = Heap::new();
        let shell = new_shell(&mut heap, CollectionKind::Set);
        for i in 0..4 {
            set_add(&mut heap, shell, Value::Smi(i)).unwrap();
        }
        assert!(delete(&mut heap, shell, Value::Smi(0)).unwrap());
        assert!(delete(&mut heap, shell, Value::Smi(1)).unwrap());
        let before = heap.shell_table(shell).unwrap();
        assert_eq!(heap.table(before).unwrap().deleted_count(), 2);
        set_add(&mut heap, shell, Value::Smi(7)).unwrap();
        let after = heap.table(heap.shell_table(shell).unwrap()).unwrap();
        assert_eq!(after.capacity(), 4);
        assert_eq!(after.deleted_count(), 0);
        after.assert_consistent();
        assert_eq!(keys(&heap, shell), vec![Value::Smi(2), Value::Smi(3), Value::Smi(7)]);
    }

    #[test]
    fn sparse_table_shrinks_after_delete() {
        let mut heap = Heap::new();
        let shell = new_shell(&mut heap, CollectionKind::Map);
        for i in 0..16 {
            map_set(&mut heap, shell, Value::Smi(i), Value::Undefined).unwrap();
        }
        assert_eq!(heap.table(heap.shell_table(shell).unwrap()).unwrap().capacity(), 16);
        for i in 0..13 {
            assert!(delete(&mut heap, shell, Value::Smi(i)).unwrap());
        }
        let table = heap.table(heap.shell_table(shell).unwrap()).unwrap();
        assert!(table.capacity() < 16);
        table.assert_consistent();
        assert_eq!(keys(&heap, shell), vec![Value::Smi(13), Value::Smi(14), Value::Smi(15)]);
        assert!(!delete(&mut heap, shell, Value::Smi(0)).unwrap());
    }

    #[test]
    fn clear_installs_fresh_minimum_table() {
        let mut heap = Heap::new();
        let shell = new_shell(&mut heap, CollectionKind::Map);
        for i in 0..10 {
            map_set(&mut heap, shell, Value::Smi(i), Value::Smi(i)).unwrap();
        }
        let old = heap.shell_table(shell).unwrap();
        clear(&mut heap, shell).unwrap();
        let table = heap.table(heap.shell_table(shell).unwrap()).unwrap();
        assert_eq!(table.capacity(), 4);
        assert!(table.is_empty());
        assert!(heap.table(old).is_err());
    }
}
