//! Iterator protocol used to consume a construction source.

use crate::error::{Exception, MessageTemplate};
use crate::heap::HeapRef;
use crate::layout::CollectionKind;
use crate::object::ObjectClass;
use crate::runtime::Runtime;
use crate::value::Value;
use log::debug;
use std::collections::VecDeque;

/// An in-progress iteration over some source value.
#[derive(Debug)]
pub enum IteratorRecord {
    /// Dense array, indexed directly. The length is re-read every step, so
    /// elements appended during iteration are visited.
    Array { array: HeapRef, next_index: usize },
    /// Live entries of a Map or Set taken when iteration started.
    Snapshot {
        kind: CollectionKind,
        entries: VecDeque<(Value, Value)>,
    },
    /// Object with a callable `next`, resolved once up front.
    Protocol { iterator: Value, next: Value },
}

/// Returns an iterator over `source`, or `None` if it is not iterable.
pub fn get_iterator(rt: &mut Runtime, source: Value) -> Result<Option<IteratorRecord>, Exception> {
    let r = match source {
        Value::Heap(r) if rt.is_object(source) => r,
        _ => return Ok(None),
    };
    let object = rt.heap().object(r)?;
    match object.class() {
        ObjectClass::Array(_) => {
            return Ok(Some(IteratorRecord::Array {
                array: r,
                next_index: 0,
            }))
        }
        ObjectClass::Collection(shell) => {
            let kind = shell.kind();
            let entries = rt.collection_entries(source)?.into_iter().collect();
            return Ok(Some(IteratorRecord::Snapshot { kind, entries }));
        }
        ObjectClass::Ordinary | ObjectClass::Function(_) => {}
    }
    let next = rt.get_property(source, "next")?;
    if rt.is_callable(next) {
        Ok(Some(IteratorRecord::Protocol {
            iterator: source,
            next,
        }))
    } else {
        Ok(None)
    }
}

impl IteratorRecord {
    /// Next produced value, or `None` once exhausted.
    pub fn step(&mut self, rt: &mut Runtime) -> Result<Option<Value>, Exception> {
        match self {
            IteratorRecord::Array { array, next_index } => {
                let element = match rt.heap().object(*array)?.class() {
                    ObjectClass::Array(elements) => elements.get(*next_index).copied(),
                    _ => None,
                };
                if element.is_some() {
                    *next_index += 1;
                }
                Ok(element)
            }
            IteratorRecord::Snapshot { kind, entries } => match entries.pop_front() {
                None => Ok(None),
                Some((key, _)) if *kind == CollectionKind::Set => Ok(Some(key)),
                Some((key, value)) => Ok(Some(rt.new_array(&[key, value]))),
            },
            IteratorRecord::Protocol { iterator, next } => {
                let (iterator, next) = (*iterator, *next);
                let result = rt.call(next, iterator, &[])?;
                if !rt.is_object(result) {
                    return Err(Exception::type_error(
                        MessageTemplate::IteratorResultNotAnObject,
                        &[&rt.describe(result)],
                    ));
                }
                let done = rt.get_property(result, "done")?;
                if rt.heap().to_boolean(done) {
                    return Ok(None);
                }
                rt.get_property(result, "value").map(Some)
            }
        }
    }

    /// Runs the iterator's cleanup after `error`, then hands `error` back
    /// for the caller to propagate. Failures raised by the cleanup itself
    /// are discarded.
    pub fn close_on_exception(&mut self, rt: &mut Runtime, error: Exception) -> Exception {
        if let IteratorRecord::Protocol { iterator, .. } = self {
            let iterator = *iterator;
            debug!("closing iterator after failure: {}", error);
            if let Ok(ret) = rt.get_property(iterator, "return") {
                if rt.is_callable(ret) {
                    let _ = rt.call(ret, iterator, &[]);
                }
            }
        }
        error
    }
}
