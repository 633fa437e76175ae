// Property tests through the public surface: prototype methods and the
// MapGet/MapHas/SetHas entry points, against an insertion-ordered model.
use ordered_hash_collections::{map_get, map_has, set_has, CollectionKind, Runtime, Value};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Key {
    Int(i32),
    Str(u8),
}

#[derive(Clone, Debug)]
enum Op {
    Set(Key, i32),
    Delete(Key),
    Clear,
}

fn arb_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        3 => (-12i32..12).prop_map(Key::Int),
        1 => (0u8..6).prop_map(Key::Str),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        5 => (arb_key(), any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        3 => arb_key().prop_map(Op::Delete),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..80)
}

fn same(a: &Key, b: &Key) -> bool {
    match (a, b) {
        (Key::Int(x), Key::Int(y)) => x == y,
        (Key::Str(x), Key::Str(y)) => x == y,
        _ => false,
    }
}

// Fresh value on every call; strings compare by content.
fn to_value(rt: &mut Runtime, k: &Key) -> Value {
    match k {
        Key::Int(i) => Value::Smi(*i),
        Key::Str(s) => rt.string(&format!("s{}", s)),
    }
}

fn call(rt: &mut Runtime, target: Value, name: &str, args: &[Value]) -> Value {
    let f = rt.get_property(target, name).unwrap();
    rt.call(f, target, args).unwrap()
}

// Property: a Map and a Set driven by the same operations agree with an
// ordered model after every step.
// Invariants exercised:
// - get/has parity with the model for every key in the domain.
// - size and iteration order match the model's live entries.
// - Set membership mirrors Map key membership.
proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_public_ops_match_model(ops in arb_ops()) {
        let mut rt = Runtime::new();
        let map = rt.new_collection(CollectionKind::Map, None).unwrap();
        let set = rt.new_collection(CollectionKind::Set, None).unwrap();
        let mut model: Vec<(Key, i32)> = Vec::new();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    let key = to_value(&mut rt, &k);
                    call(&mut rt, map, "set", &[key, Value::Smi(v)]);
                    call(&mut rt, set, "add", &[key]);
                    match model.iter_mut().find(|(mk, _)| same(mk, &k)) {
                        Some(entry) => entry.1 = v,
                        None => model.push((k, v)),
                    }
                }
                Op::Delete(k) => {
                    let key = to_value(&mut rt, &k);
                    let pos = model.iter().position(|(mk, _)| same(mk, &k));
                    let removed = call(&mut rt, map, "delete", &[key]);
                    prop_assert_eq!(removed, Value::Boolean(pos.is_some()));
                    call(&mut rt, set, "delete", &[key]);
                    if let Some(pos) = pos {
                        model.remove(pos);
                    }
                }
                Op::Clear => {
                    call(&mut rt, map, "clear", &[]);
                    call(&mut rt, set, "clear", &[]);
                    model.clear();
                }
            }

            let size = rt.get_property(map, "size").unwrap();
            prop_assert_eq!(size, Value::Smi(model.len() as i32));
            prop_assert_eq!(rt.get_property(set, "size").unwrap(), size);

            for i in -12i32..12 {
                let k = Key::Int(i);
                let expected = model.iter().find(|(mk, _)| same(mk, &k)).map(|(_, v)| *v);
                prop_assert_eq!(map_has(&rt, map, Value::Smi(i)).unwrap(), expected.is_some());
                prop_assert_eq!(set_has(&rt, set, Value::Smi(i)).unwrap(), expected.is_some());
                prop_assert_eq!(
                    map_get(&rt, map, Value::Smi(i)).unwrap(),
                    expected.map_or(Value::Undefined, Value::Smi)
                );
            }
            for s in 0u8..6 {
                let k = Key::Str(s);
                let probe = to_value(&mut rt, &k);
                let expected = model.iter().find(|(mk, _)| same(mk, &k)).map(|(_, v)| *v);
                prop_assert_eq!(
                    map_get(&rt, map, probe).unwrap(),
                    expected.map_or(Value::Undefined, Value::Smi)
                );
            }

            let order: Vec<String> = rt
                .collection_keys(map)
                .unwrap()
                .into_iter()
                .map(|k| rt.describe(k))
                .collect();
            let expected: Vec<String> = model
                .iter()
                .map(|(k, _)| match k {
                    Key::Int(i) => i.to_string(),
                    Key::Str(s) => format!("s{}", s),
                })
                .collect();
            prop_assert_eq!(&order, &expected);
            let set_order: Vec<String> = rt
                .collection_keys(set)
                .unwrap()
                .into_iter()
                .map(|k| rt.describe(k))
                .collect();
            prop_assert_eq!(set_order, expected);
        }
    }
}
