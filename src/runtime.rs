//! Runtime: the heap, the installed intrinsics, and the generic table
//! routines, plus the property, call and construct plumbing that user-level
//! code goes through.

use crate::builtins;
use crate::error::{Exception, MessageTemplate};
use crate::generic::{SameValueZeroRoutines, TableRoutines};
use crate::heap::{Heap, HeapError, HeapObject, HeapRef};
use crate::layout::CollectionKind;
use crate::object::{FunctionData, JsObject, ObjectClass, Property, PropertyKey};
use crate::value::{smi_from_f64, Value};
use std::rc::Rc;

/// Handles to the objects every runtime starts with.
#[derive(Copy, Clone, Debug)]
pub struct Intrinsics {
    pub object_prototype: HeapRef,
    pub function_prototype: HeapRef,
    pub array_prototype: HeapRef,
    pub map_constructor: HeapRef,
    pub map_prototype: HeapRef,
    pub set_constructor: HeapRef,
    pub set_prototype: HeapRef,
}

impl Intrinsics {
    pub fn constructor(&self, kind: CollectionKind) -> HeapRef {
        match kind {
            CollectionKind::Map => self.map_constructor,
            CollectionKind::Set => self.set_constructor,
        }
    }

    pub fn prototype(&self, kind: CollectionKind) -> HeapRef {
        match kind {
            CollectionKind::Map => self.map_prototype,
            CollectionKind::Set => self.set_prototype,
        }
    }
}

pub struct Runtime {
    heap: Heap,
    intrinsics: Intrinsics,
    routines: Rc<dyn TableRoutines>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_routines(Rc::new(SameValueZeroRoutines))
    }

    /// Runtime whose non-integer lookups go through `routines`.
    pub fn with_routines(routines: Rc<dyn TableRoutines>) -> Self {
        let mut heap = Heap::new();
        let intrinsics = builtins::install(&mut heap);
        Self {
            heap,
            intrinsics,
            routines,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn routines(&self) -> &dyn TableRoutines {
        &*self.routines
    }

    pub fn describe(&self, v: Value) -> String {
        self.heap.describe(v)
    }

    // ---- value construction ----

    /// Number value: a small integer when exactly representable, otherwise boxed.
    pub fn number(&mut self, n: f64) -> Value {
        match smi_from_f64(n) {
            Some(i) => Value::Smi(i),
            None => self.boxed_number(n),
        }
    }

    /// Always allocates a boxed number, even for integral values.
    pub fn boxed_number(&mut self, n: f64) -> Value {
        Value::Heap(self.heap.alloc(HeapObject::Number(n)))
    }

    pub fn string(&mut self, s: &str) -> Value {
        Value::Heap(self.heap.alloc(HeapObject::String(Rc::from(s))))
    }

    pub fn new_object(&mut self, prototype: Option<HeapRef>) -> Value {
        let prototype = prototype.or(Some(self.intrinsics.object_prototype));
        Value::Heap(
            self.heap
                .alloc(HeapObject::Object(JsObject::new(ObjectClass::Ordinary, prototype))),
        )
    }

    pub fn new_array(&mut self, elements: &[Value]) -> Value {
        let object = JsObject::new(
            ObjectClass::Array(elements.to_vec()),
            Some(self.intrinsics.array_prototype),
        );
        Value::Heap(self.heap.alloc(HeapObject::Object(object)))
    }

    /// Callable, non-constructible native function.
    pub fn new_function<F>(&mut self, name: &str, f: F) -> Value
    where
        F: Fn(&mut Runtime, Value, &[Value]) -> Result<Value, Exception> + 'static,
    {
        let data = FunctionData::new(name, Some(Rc::new(f)), None);
        Value::Heap(alloc_function(&mut self.heap, data, self.intrinsics.function_prototype))
    }

    /// Constructible native function; calling it without `new` fails.
    pub fn new_constructor<F>(&mut self, name: &str, f: F) -> Value
    where
        F: Fn(&mut Runtime, &[Value], Value) -> Result<Value, Exception> + 'static,
    {
        let data = FunctionData::new(name, None, Some(Rc::new(f)));
        Value::Heap(alloc_function(&mut self.heap, data, self.intrinsics.function_prototype))
    }

    // ---- properties ----

    pub fn is_object(&self, v: Value) -> bool {
        self.heap.is_object(v)
    }

    pub fn is_callable(&self, v: Value) -> bool {
        self.function_data(v).map_or(false, |f| f.call_fn().is_some())
    }

    pub fn is_constructor(&self, v: Value) -> bool {
        self.function_data(v).map_or(false, |f| f.construct_fn().is_some())
    }

    fn function_data(&self, v: Value) -> Option<&FunctionData> {
        let r = v.as_heap()?;
        self.heap.object(r).ok()?.as_function()
    }

    /// `[[Get]]`: walks the prototype chain, invoking getters with `target`
    /// as receiver. Non-object targets have no properties.
    pub fn get_property(
        &mut self,
        target: Value,
        key: impl Into<PropertyKey>,
    ) -> Result<Value, Exception> {
        let key = key.into();
        let mut current = match target {
            Value::Heap(r) if self.heap.is_object(target) => r,
            _ => return Ok(Value::Undefined),
        };
        loop {
            let object = self.heap.object(current)?;
            match object.own_property(&key) {
                Some(Property::Data(v)) => return Ok(v),
                Some(Property::Accessor { getter }) => return self.call(getter, target, &[]),
                None => {}
            }
            match object.prototype() {
                Some(p) => current = p,
                None => return Ok(Value::Undefined),
            }
        }
    }

    /// Defines an own data property on `target`.
    pub fn set_property(
        &mut self,
        target: Value,
        key: impl Into<PropertyKey>,
        value: Value,
    ) -> Result<(), Exception> {
        self.define_property(target, key.into(), Property::Data(value))
    }

    pub fn define_getter(
        &mut self,
        target: Value,
        key: impl Into<PropertyKey>,
        getter: Value,
    ) -> Result<(), Exception> {
        self.define_property(target, key.into(), Property::Accessor { getter })
    }

    fn define_property(
        &mut self,
        target: Value,
        key: PropertyKey,
        property: Property,
    ) -> Result<(), Exception> {
        let r = match target {
            Value::Heap(r) if self.heap.is_object(target) => r,
            _ => {
                return Err(Exception::type_error(
                    MessageTemplate::StrictCannotCreateProperty,
                    &[&key.to_string(), &self.describe(target)],
                ))
            }
        };
        self.heap.object_mut(r)?.define(key, property);
        Ok(())
    }

    // ---- calls ----

    pub fn call(&mut self, callee: Value, this: Value, args: &[Value]) -> Result<Value, Exception> {
        let f = match self.function_data(callee).and_then(|f| f.call_fn()) {
            Some(f) => Rc::clone(f),
            None => {
                return Err(Exception::type_error(
                    MessageTemplate::CalledNonCallable,
                    &[&self.describe(callee)],
                ))
            }
        };
        f(self, this, args)
    }

    pub fn construct(
        &mut self,
        constructor: Value,
        args: &[Value],
        new_target: Value,
    ) -> Result<Value, Exception> {
        let f = match self.function_data(constructor).and_then(|f| f.construct_fn()) {
            Some(f) => Rc::clone(f),
            None => {
                return Err(Exception::type_error(
                    MessageTemplate::NotConstructor,
                    &[&self.describe(constructor)],
                ))
            }
        };
        f(self, args, new_target)
    }

    // ---- collection conveniences ----

    /// `new Map(source)` / `new Set(source)` through the intrinsic constructor.
    pub fn new_collection(
        &mut self,
        kind: CollectionKind,
        source: Option<Value>,
    ) -> Result<Value, Exception> {
        let ctor = Value::Heap(self.intrinsics.constructor(kind));
        let args: Vec<Value> = source.into_iter().collect();
        self.construct(ctor, &args, ctor)
    }

    /// Live keys of a collection in iteration order.
    pub fn collection_keys(&self, collection: Value) -> Result<Vec<Value>, Exception> {
        Ok(self.collection_entries(collection)?.into_iter().map(|(k, _)| k).collect())
    }

    /// Live `(key, value)` pairs in iteration order; sets pair each key with itself.
    pub fn collection_entries(&self, collection: Value) -> Result<Vec<(Value, Value)>, Exception> {
        let shell = collection.as_heap().ok_or(HeapError::StaleHandle)?;
        let table = self.heap.table(self.heap.shell_table(shell)?)?;
        Ok(table.live_entries().map(|e| (e.key, e.value)).collect())
    }
}

pub(crate) fn alloc_function(heap: &mut Heap, data: FunctionData, prototype: HeapRef) -> HeapRef {
    let object = JsObject::new(ObjectClass::Function(data), Some(prototype));
    heap.alloc(HeapObject::Object(object))
}
