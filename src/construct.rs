//! Building a Map or Set from constructor arguments.

use crate::error::{Exception, MessageTemplate};
use crate::iterator::get_iterator;
use crate::layout::CollectionKind;
use crate::runtime::Runtime;
use crate::value::Value;
use log::trace;

impl Runtime {
    /// `new Map(source)` / `new Set(source)` with an explicit new-target.
    ///
    /// `new_target` is `None` (or undefined) when the constructor was called
    /// as a plain function. The insertion method is read off the new shell
    /// once, before iteration starts, and that same function receives every
    /// element. On failure the iterator is closed and the partially filled
    /// shell is left to the caller's error path.
    pub fn construct_collection(
        &mut self,
        kind: CollectionKind,
        new_target: Option<Value>,
        source: Option<Value>,
    ) -> Result<Value, Exception> {
        let new_target = match new_target {
            Some(nt) if nt != Value::Undefined => nt,
            _ => {
                return Err(Exception::type_error(
                    MessageTemplate::ConstructorNotFunction,
                    &[kind.name()],
                ))
            }
        };

        let shell = self.allocate_shell(kind, new_target)?;
        let table = self.heap_mut().allocate_table(kind);
        self.heap_mut().replace_table(shell, table)?;
        let collection = Value::Heap(shell);

        let source = match source {
            Some(s) if !s.is_nullish() => s,
            _ => return Ok(collection),
        };

        let adder_name = kind.adder_name();
        let adder = self.get_property(collection, adder_name)?;
        if !self.is_callable(adder) {
            return Err(Exception::type_error(
                MessageTemplate::PropertyNotFunction,
                &[&self.describe(adder), adder_name, &self.describe(collection)],
            ));
        }

        let Some(mut iter) = get_iterator(self, source)? else {
            return Ok(collection);
        };

        let mut added = 0usize;
        loop {
            let step = iter
                .step(self)
                .and_then(|next| match next {
                    None => Ok(None),
                    Some(item) => self.add_entry(kind, collection, adder, item).map(Some),
                });
            match step {
                Ok(Some(())) => added += 1,
                Ok(None) => break,
                Err(e) => return Err(iter.close_on_exception(self, e)),
            }
        }
        trace!("constructed {} from {} source items", kind.name(), added);
        Ok(collection)
    }

    fn add_entry(
        &mut self,
        kind: CollectionKind,
        collection: Value,
        adder: Value,
        item: Value,
    ) -> Result<(), Exception> {
        match kind {
            CollectionKind::Map => {
                if !self.is_object(item) {
                    return Err(Exception::type_error(
                        MessageTemplate::IteratorValueNotAnObject,
                        &[&self.describe(item)],
                    ));
                }
                let key = self.get_property(item, 0u32)?;
                let value = self.get_property(item, 1u32)?;
                self.call(adder, collection, &[key, value])?;
            }
            CollectionKind::Set => {
                self.call(adder, collection, &[item])?;
            }
        }
        Ok(())
    }
}
