//! Managed heap: generational handles over a slot map.
//!
//! Every managed value lives in one slot and is addressed by a `HeapRef`.
//! Handles are non-owning; each access re-validates the handle, so a handle
//! to a freed slot (for instance a table replaced by growth) never aliases
//! whatever is allocated into that slot later.

use crate::object::{JsObject, ObjectClass};
use crate::table::OrderedHashTable;
use crate::value::{format_number, KeyClass, Value};
use slotmap::SlotMap;
use std::rc::Rc;
use thiserror::Error;

slotmap::new_key_type! {
    /// Generational handle to a heap slot.
    pub struct HeapRef;
}

/// Handle to a heap slot known to hold an [`OrderedHashTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TableRef(HeapRef);

impl TableRef {
    pub fn raw(self) -> HeapRef {
        self.0
    }
}

#[derive(Debug)]
pub enum HeapObject {
    Number(f64),
    String(Rc<str>),
    Object(JsObject),
    Table(OrderedHashTable),
}

impl HeapObject {
    fn kind_name(&self) -> &'static str {
        match self {
            HeapObject::Number(_) => "number",
            HeapObject::String(_) => "string",
            HeapObject::Object(_) => "object",
            HeapObject::Table(_) => "table",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum HeapError {
    #[error("stale heap handle")]
    StaleHandle,
    #[error("expected {expected}, found {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Default)]
pub struct Heap {
    slots: SlotMap<HeapRef, HeapObject>,
    allocations: u64,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live heap objects.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total allocations performed since creation.
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }

    pub fn alloc(&mut self, object: HeapObject) -> HeapRef {
        self.allocations += 1;
        self.slots.insert(object)
    }

    pub fn alloc_table(&mut self, table: OrderedHashTable) -> TableRef {
        TableRef(self.alloc(HeapObject::Table(table)))
    }

    /// Releases a slot. Every outstanding handle to it becomes stale.
    pub fn free(&mut self, r: HeapRef) -> Option<HeapObject> {
        self.slots.remove(r)
    }

    pub fn get(&self, r: HeapRef) -> Result<&HeapObject, HeapError> {
        self.slots.get(r).ok_or(HeapError::StaleHandle)
    }

    pub fn get_mut(&mut self, r: HeapRef) -> Result<&mut HeapObject, HeapError> {
        self.slots.get_mut(r).ok_or(HeapError::StaleHandle)
    }

    pub fn number(&self, r: HeapRef) -> Result<f64, HeapError> {
        match self.get(r)? {
            HeapObject::Number(n) => Ok(*n),
            other => Err(wrong_kind("number", other)),
        }
    }

    pub fn object(&self, r: HeapRef) -> Result<&JsObject, HeapError> {
        match self.get(r)? {
            HeapObject::Object(o) => Ok(o),
            other => Err(wrong_kind("object", other)),
        }
    }

    pub fn object_mut(&mut self, r: HeapRef) -> Result<&mut JsObject, HeapError> {
        match self.get_mut(r)? {
            HeapObject::Object(o) => Ok(o),
            other => Err(wrong_kind("object", other)),
        }
    }

    pub fn table(&self, r: TableRef) -> Result<&OrderedHashTable, HeapError> {
        match self.get(r.0)? {
            HeapObject::Table(t) => Ok(t),
            other => Err(wrong_kind("table", other)),
        }
    }

    pub fn table_mut(&mut self, r: TableRef) -> Result<&mut OrderedHashTable, HeapError> {
        match self.get_mut(r.0)? {
            HeapObject::Table(t) => Ok(t),
            other => Err(wrong_kind("table", other)),
        }
    }

    /// Recovers a typed table handle from a raw one.
    pub fn as_table_ref(&self, r: HeapRef) -> Result<TableRef, HeapError> {
        self.table(TableRef(r)).map(|_| TableRef(r))
    }

    /// Numeric value of a small integer or boxed number.
    pub fn number_value(&self, v: Value) -> Option<f64> {
        match self.classify(v) {
            KeyClass::SmallInteger(n) => Some(n as f64),
            KeyClass::BoxedNumber(n) => Some(n),
            KeyClass::Other => None,
        }
    }

    pub fn string_value(&self, v: Value) -> Option<&str> {
        match v {
            Value::Heap(r) => match self.get(r) {
                Ok(HeapObject::String(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    #[inline]
    pub fn classify(&self, v: Value) -> KeyClass {
        match v {
            Value::Smi(n) => KeyClass::SmallInteger(n),
            Value::Heap(r) => match self.slots.get(r) {
                Some(HeapObject::Number(n)) => KeyClass::BoxedNumber(*n),
                _ => KeyClass::Other,
            },
            _ => KeyClass::Other,
        }
    }

    pub fn is_object(&self, v: Value) -> bool {
        matches!(v, Value::Heap(r) if matches!(self.slots.get(r), Some(HeapObject::Object(_))))
    }

    pub fn to_boolean(&self, v: Value) -> bool {
        match v {
            Value::Undefined | Value::Null | Value::Hole => false,
            Value::Boolean(b) => b,
            Value::Smi(n) => n != 0,
            Value::Heap(r) => match self.slots.get(r) {
                Some(HeapObject::Number(n)) => *n != 0.0 && !n.is_nan(),
                Some(HeapObject::String(s)) => !s.is_empty(),
                Some(_) => true,
                None => false,
            },
        }
    }

    /// Short human-readable rendering used in exception messages.
    pub fn describe(&self, v: Value) -> String {
        match v {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Hole => "hole".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Smi(n) => n.to_string(),
            Value::Heap(r) => match self.slots.get(r) {
                None => "<stale>".to_string(),
                Some(HeapObject::Number(n)) => format_number(*n),
                Some(HeapObject::String(s)) => s.to_string(),
                Some(HeapObject::Table(_)) => "#<OrderedHashTable>".to_string(),
                Some(HeapObject::Object(o)) => match o.class() {
                    ObjectClass::Ordinary => "#<Object>".to_string(),
                    ObjectClass::Array(elements) => {
                        let parts: Vec<String> =
                            elements.iter().map(|e| self.describe(*e)).collect();
                        parts.join(",")
                    }
                    ObjectClass::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
                    ObjectClass::Collection(shell) => format!("#<{}>", shell.kind().name()),
                },
            },
        }
    }
}

fn wrong_kind(expected: &'static str, found: &HeapObject) -> HeapError {
    HeapError::WrongKind {
        expected,
        found: found.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CollectionKind;

    /// Invariant: freeing a slot invalidates its handle, and a later allocation
    /// reusing the slot does not make the old handle resolve again.
    #[test]
    fn stale_handle_does_not_alias_new_object() {
        let mut heap = Heap::new();
        let old = heap.alloc(HeapObject::Number(1.0));
        assert!(heap.free(old).is_some());
        let new = heap.alloc(HeapObject::Number(2.0));
        assert_ne!(old, new);
        assert_eq!(heap.number(old), Err(HeapError::StaleHandle));
        assert_eq!(heap.number(new), Ok(2.0));
    }

    #[test]
    fn typed_accessors_reject_wrong_kind() {
        let mut heap = Heap::new();
        let n = heap.alloc(HeapObject::Number(4.5));
        assert!(matches!(
            heap.as_table_ref(n),
            Err(HeapError::WrongKind { expected: "table", found: "number" })
        ));
        let t = heap.allocate_table(CollectionKind::Map);
        assert_eq!(heap.as_table_ref(t.raw()), Ok(t));
        assert!(heap.object(t.raw()).is_err());
    }

    #[test]
    fn classify_distinguishes_key_shapes() {
        let mut heap = Heap::new();
        let boxed = heap.alloc(HeapObject::Number(3.0));
        let s = heap.alloc(HeapObject::String(Rc::from("3")));
        assert_eq!(heap.classify(Value::Smi(3)), KeyClass::SmallInteger(3));
        assert_eq!(heap.classify(Value::Heap(boxed)), KeyClass::BoxedNumber(3.0));
        assert_eq!(heap.classify(Value::Heap(s)), KeyClass::Other);
        assert_eq!(heap.classify(Value::Undefined), KeyClass::Other);
        assert_eq!(heap.describe(Value::Heap(boxed)), "3");
        assert_eq!(heap.describe(Value::Heap(s)), "3");
    }
}
