//! Intrinsic objects and the Map/Set prototype methods.
//!
//! [`map_get`], [`map_has`] and [`set_has`] are the read paths. They check
//! the receiver, load the receiver's current table, and then either walk the
//! chain with the integer fast path or hand the key to the runtime's
//! [`TableRoutines`](crate::generic::TableRoutines). Neither path mutates
//! the table.

use crate::error::{Exception, MessageTemplate};
use crate::heap::{Heap, HeapObject, HeapRef};
use crate::layout::CollectionKind;
use crate::lookup::find_smi_entry;
use crate::mutation;
use crate::object::{FunctionData, JsObject, ObjectClass, Property, PropertyKey};
use crate::runtime::{alloc_function, Intrinsics, Runtime};
use crate::value::Value;
use std::rc::Rc;

/// `Map.prototype.get`: the stored value for `key`, or undefined.
pub fn map_get(rt: &Runtime, receiver: Value, key: Value) -> Result<Value, Exception> {
    let shell = receiver_shell(rt, receiver, CollectionKind::Map, "Map.prototype.get")?;
    let heap = rt.heap();
    let table = heap.table(heap.shell_table(shell)?)?;
    Ok(match key {
        Value::Smi(k) => match find_smi_entry(heap, table, k) {
            Some(offset) => table.value_at(offset),
            None => Value::Undefined,
        },
        _ => rt.routines().get(heap, table, key),
    })
}

/// `Map.prototype.has`.
pub fn map_has(rt: &Runtime, receiver: Value, key: Value) -> Result<bool, Exception> {
    let shell = receiver_shell(rt, receiver, CollectionKind::Map, "Map.prototype.has")?;
    let heap = rt.heap();
    let table = heap.table(heap.shell_table(shell)?)?;
    Ok(match key {
        Value::Smi(k) => find_smi_entry(heap, table, k).is_some(),
        _ => rt
            .routines()
            .has(heap, table, key, CollectionKind::Map.layout().payload_len),
    })
}

/// `Set.prototype.has`. Always delegates; sets have no integer fast path.
pub fn set_has(rt: &Runtime, receiver: Value, key: Value) -> Result<bool, Exception> {
    let shell = receiver_shell(rt, receiver, CollectionKind::Set, "Set.prototype.has")?;
    let heap = rt.heap();
    let table = heap.table(heap.shell_table(shell)?)?;
    Ok(rt
        .routines()
        .has(heap, table, key, CollectionKind::Set.layout().payload_len))
}

fn receiver_shell(
    rt: &Runtime,
    receiver: Value,
    kind: CollectionKind,
    method: &str,
) -> Result<HeapRef, Exception> {
    match receiver.as_heap() {
        Some(r) if rt.heap().shell(r).map_or(false, |s| s.kind() == kind) => Ok(r),
        _ => Err(Exception::type_error(
            MessageTemplate::IncompatibleMethodReceiver,
            &[method, &rt.describe(receiver)],
        )),
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Undefined)
}

/// Populates a fresh heap with the objects a runtime starts with.
pub(crate) fn install(heap: &mut Heap) -> Intrinsics {
    let object_prototype = alloc_ordinary(heap, None);
    let function_prototype = alloc_ordinary(heap, Some(object_prototype));
    let array_prototype = alloc_ordinary(heap, Some(object_prototype));

    let (map_constructor, map_prototype) =
        install_collection(heap, CollectionKind::Map, object_prototype, function_prototype);
    let (set_constructor, set_prototype) =
        install_collection(heap, CollectionKind::Set, object_prototype, function_prototype);

    Intrinsics {
        object_prototype,
        function_prototype,
        array_prototype,
        map_constructor,
        map_prototype,
        set_constructor,
        set_prototype,
    }
}

fn alloc_ordinary(heap: &mut Heap, prototype: Option<HeapRef>) -> HeapRef {
    heap.alloc(HeapObject::Object(JsObject::new(ObjectClass::Ordinary, prototype)))
}

fn native<F>(heap: &mut Heap, function_prototype: HeapRef, name: &str, f: F) -> Value
where
    F: Fn(&mut Runtime, Value, &[Value]) -> Result<Value, Exception> + 'static,
{
    let data = FunctionData::new(name, Some(Rc::new(f)), None);
    Value::Heap(alloc_function(heap, data, function_prototype))
}

/// Freshly allocated intrinsics always resolve, so a failed lookup here
/// only skips the definition.
fn define(heap: &mut Heap, target: HeapRef, name: &str, property: Property) {
    if let Ok(object) = heap.object_mut(target) {
        object.define(PropertyKey::from(name), property);
    }
}

fn install_collection(
    heap: &mut Heap,
    kind: CollectionKind,
    object_prototype: HeapRef,
    function_prototype: HeapRef,
) -> (HeapRef, HeapRef) {
    let prototype = alloc_ordinary(heap, Some(object_prototype));

    let data = FunctionData::new(
        kind.name(),
        Some(Rc::new(move |rt: &mut Runtime, _this: Value, args: &[Value]| {
            rt.construct_collection(kind, None, args.first().copied())
        })),
        Some(Rc::new(move |rt: &mut Runtime, args: &[Value], new_target: Value| {
            rt.construct_collection(kind, Some(new_target), args.first().copied())
        })),
    );
    let constructor = alloc_function(heap, data, function_prototype);
    define(heap, constructor, "prototype", Property::Data(Value::Heap(prototype)));
    define(heap, prototype, "constructor", Property::Data(Value::Heap(constructor)));

    let mut methods: Vec<(&str, Value)> = Vec::new();
    match kind {
        CollectionKind::Map => {
            methods.push((
                "get",
                native(heap, function_prototype, "get", |rt, this, args| {
                    map_get(rt, this, arg(args, 0))
                }),
            ));
            methods.push((
                "has",
                native(heap, function_prototype, "has", |rt, this, args| {
                    map_has(rt, this, arg(args, 0)).map(Value::Boolean)
                }),
            ));
            methods.push((
                "set",
                native(heap, function_prototype, "set", |rt, this, args| {
                    let shell = receiver_shell(rt, this, CollectionKind::Map, "Map.prototype.set")?;
                    mutation::map_set(rt.heap_mut(), shell, arg(args, 0), arg(args, 1))?;
                    Ok(this)
                }),
            ));
        }
        CollectionKind::Set => {
            methods.push((
                "has",
                native(heap, function_prototype, "has", |rt, this, args| {
                    set_has(rt, this, arg(args, 0)).map(Value::Boolean)
                }),
            ));
            methods.push((
                "add",
                native(heap, function_prototype, "add", |rt, this, args| {
                    let shell = receiver_shell(rt, this, CollectionKind::Set, "Set.prototype.add")?;
                    mutation::set_add(rt.heap_mut(), shell, arg(args, 0))?;
                    Ok(this)
                }),
            ));
        }
    }
    let delete_name: &'static str = match kind {
        CollectionKind::Map => "Map.prototype.delete",
        CollectionKind::Set => "Set.prototype.delete",
    };
    methods.push((
        "delete",
        native(heap, function_prototype, "delete", move |rt, this, args| {
            let shell = receiver_shell(rt, this, kind, delete_name)?;
            mutation::delete(rt.heap_mut(), shell, arg(args, 0)).map(Value::Boolean)
        }),
    ));
    let clear_name: &'static str = match kind {
        CollectionKind::Map => "Map.prototype.clear",
        CollectionKind::Set => "Set.prototype.clear",
    };
    methods.push((
        "clear",
        native(heap, function_prototype, "clear", move |rt, this, _args| {
            let shell = receiver_shell(rt, this, kind, clear_name)?;
            mutation::clear(rt.heap_mut(), shell)?;
            Ok(Value::Undefined)
        }),
    ));
    for (name, method) in methods {
        define(heap, prototype, name, Property::Data(method));
    }

    let size_name: &'static str = match kind {
        CollectionKind::Map => "get Map.prototype.size",
        CollectionKind::Set => "get Set.prototype.size",
    };
    let size = native(heap, function_prototype, "get size", move |rt, this, _args| {
        let shell = receiver_shell(rt, this, kind, size_name)?;
        let live = mutation::size(rt.heap(), shell)?;
        // Bounded by the maximum capacity, which fits a small integer.
        Ok(Value::Smi(live as i32))
    });
    define(heap, prototype, "size", Property::Accessor { getter: size });

    (constructor, prototype)
}
