#![cfg(test)]

// Property tests for the table engine kept inside the crate so they can
// build tables and shells without going through the intrinsics.

use crate::generic::{SameValueZeroRoutines, TableRoutines};
use crate::heap::{Heap, HeapObject, HeapRef};
use crate::layout::CollectionKind;
use crate::lookup::find_smi_entry;
use crate::mutation;
use crate::object::{JsObject, ObjectClass};
use crate::shell::CollectionShell;
use crate::value::Value;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Set(i32, i32),
    // Insert with the key boxed as a heap number.
    SetBoxed(i32, i32),
    Delete(i32),
    Clear,
    Probe(i32),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = -24i32..24;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        1 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::SetBoxed(k, v)),
        3 => key.clone().prop_map(Op::Delete),
        1 => Just(Op::Clear),
        2 => key.prop_map(Op::Probe),
    ];
    proptest::collection::vec(op, 1..120)
}

fn new_shell(heap: &mut Heap, kind: CollectionKind) -> HeapRef {
    let object = JsObject::new(ObjectClass::Collection(CollectionShell::new(kind)), None);
    let shell = heap.alloc(HeapObject::Object(object));
    let table = heap.allocate_table(kind);
    heap.replace_table(shell, table).unwrap();
    shell
}

// Model: live entries in insertion order. Overwrites keep position.
fn model_set(model: &mut Vec<(i32, i32)>, k: i32, v: i32) {
    match model.iter_mut().find(|(mk, _)| *mk == k) {
        Some(entry) => entry.1 = v,
        None => model.push((k, v)),
    }
}

// Property: a map driven by random set/delete/clear sequences matches an
// insertion-ordered model.
// Invariants exercised:
// - Live iteration order equals insertion order among live entries.
// - The integer fast path and the delegate agree on every probe, including
//   keys stored as boxed numbers.
// - Table structure stays consistent across growth, shrink and compaction.
// - Each replaced table handle goes stale.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_map_matches_ordered_model(ops in arb_ops()) {
        let mut heap = Heap::new();
        let shell = new_shell(&mut heap, CollectionKind::Map);
        let mut model: Vec<(i32, i32)> = Vec::new();
        let routines = SameValueZeroRoutines;

        for op in ops {
            let before = heap.shell_table(shell).unwrap();
            match op {
                Op::Set(k, v) => {
                    mutation::map_set(&mut heap, shell, Value::Smi(k), Value::Smi(v)).unwrap();
                    model_set(&mut model, k, v);
                }
                Op::SetBoxed(k, v) => {
                    let boxed = Value::Heap(heap.alloc(HeapObject::Number(k as f64)));
                    mutation::map_set(&mut heap, shell, boxed, Value::Smi(v)).unwrap();
                    model_set(&mut model, k, v);
                }
                Op::Delete(k) => {
                    let removed = mutation::delete(&mut heap, shell, Value::Smi(k)).unwrap();
                    let pos = model.iter().position(|(mk, _)| *mk == k);
                    prop_assert_eq!(removed, pos.is_some());
                    if let Some(pos) = pos {
                        model.remove(pos);
                    }
                }
                Op::Clear => {
                    mutation::clear(&mut heap, shell).unwrap();
                    model.clear();
                }
                Op::Probe(k) => {
                    let table = heap.table(heap.shell_table(shell).unwrap()).unwrap();
                    let expected = model.iter().find(|(mk, _)| *mk == k).map(|(_, v)| Value::Smi(*v));
                    let fast = find_smi_entry(&heap, table, k).map(|off| table.value_at(off));
                    prop_assert_eq!(fast, expected);
                    let slow = routines.get(&heap, table, Value::Smi(k));
                    prop_assert_eq!(slow, expected.unwrap_or(Value::Undefined));
                    prop_assert_eq!(routines.has(&heap, table, Value::Smi(k), 2), expected.is_some());
                }
            }

            let current = heap.shell_table(shell).unwrap();
            if current != before {
                prop_assert!(heap.table(before).is_err(), "replaced table must be freed");
            }
            let table = heap.table(current).unwrap();
            table.assert_consistent();
            prop_assert_eq!(table.len(), model.len());
            let live: Vec<(i32, Value)> = table
                .live_entries()
                .map(|e| (heap.number_value(e.key).unwrap() as i32, e.value))
                .collect();
            let expected: Vec<(i32, Value)> = model.iter().map(|(k, v)| (*k, Value::Smi(*v))).collect();
            prop_assert_eq!(live, expected);
        }
    }
}

// Property: set insertion deduplicates by SameValueZero and keeps first
// insertion order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_set_dedup_keeps_first_order(keys in proptest::collection::vec(-16i32..16, 0..64)) {
        let mut heap = Heap::new();
        let shell = new_shell(&mut heap, CollectionKind::Set);
        let mut expected: Vec<i32> = Vec::new();
        for k in keys {
            mutation::set_add(&mut heap, shell, Value::Smi(k)).unwrap();
            if !expected.contains(&k) {
                expected.push(k);
            }
        }
        let table = heap.table(heap.shell_table(shell).unwrap()).unwrap();
        table.assert_consistent();
        let live: Vec<Value> = table.live_entries().map(|e| e.key).collect();
        prop_assert_eq!(live, expected.iter().copied().map(Value::Smi).collect::<Vec<_>>());
        for k in -16i32..16 {
            prop_assert_eq!(
                SameValueZeroRoutines.has(&heap, table, Value::Smi(k), 1),
                expected.contains(&k)
            );
        }
    }
}
