//! Collection shells: the user-visible Map and Set instances.
//!
//! A shell owns exactly one table reference. The reference is replaced
//! wholesale by growth, shrink and clear; the table itself never points
//! back at its shell. Anything that runs user code or allocates must
//! reload the table through the shell afterwards.

use crate::error::{Exception, MessageTemplate};
use crate::heap::{Heap, HeapError, HeapObject, HeapRef, TableRef};
use crate::layout::CollectionKind;
use crate::object::{JsObject, ObjectClass};
use crate::runtime::Runtime;
use crate::value::Value;
use log::trace;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CollectionShell {
    kind: CollectionKind,
    table: Option<TableRef>,
}

impl CollectionShell {
    pub fn new(kind: CollectionKind) -> Self {
        Self { kind, table: None }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn table(&self) -> Option<TableRef> {
        self.table
    }
}

impl Heap {
    pub fn shell(&self, shell: HeapRef) -> Result<&CollectionShell, HeapError> {
        self.object(shell)?
            .as_shell()
            .ok_or(HeapError::WrongKind {
                expected: "collection",
                found: "object",
            })
    }

    fn shell_mut(&mut self, shell: HeapRef) -> Result<&mut CollectionShell, HeapError> {
        self.object_mut(shell)?
            .as_shell_mut()
            .ok_or(HeapError::WrongKind {
                expected: "collection",
                found: "object",
            })
    }

    /// Current table of `shell`, validated against the heap.
    pub fn shell_table(&self, shell: HeapRef) -> Result<TableRef, HeapError> {
        let table = self.shell(shell)?.table.ok_or(HeapError::StaleHandle)?;
        self.as_table_ref(table.raw())
    }

    /// Installs `table` on `shell`, freeing the table it replaces.
    ///
    /// The old table is reachable only through its shell, so it is released
    /// here; outstanding handles to it become stale.
    pub fn replace_table(&mut self, shell: HeapRef, table: TableRef) -> Result<(), HeapError> {
        let new_kind = self.table(table)?.kind();
        let slot = self.shell_mut(shell)?;
        debug_assert_eq!(slot.kind, new_kind, "table kind must match its shell");
        let old = slot.table.replace(table);
        if let Some(old) = old {
            if old != table {
                self.free(old.raw());
            }
        }
        Ok(())
    }
}

impl Runtime {
    /// Allocates an empty shell for `kind` whose prototype comes from
    /// `new_target`. The caller installs a table immediately afterwards.
    pub fn allocate_shell(
        &mut self,
        kind: CollectionKind,
        new_target: Value,
    ) -> Result<HeapRef, Exception> {
        if !self.is_constructor(new_target) {
            return Err(Exception::type_error(
                MessageTemplate::NotConstructor,
                &[&self.describe(new_target)],
            ));
        }
        let intrinsic = self.intrinsics().constructor(kind);
        let prototype = if new_target == Value::Heap(intrinsic) {
            self.intrinsics().prototype(kind)
        } else {
            // Subclass or modified constructor: honor its `prototype`.
            let p = self.get_property(new_target, "prototype")?;
            match p {
                Value::Heap(r) if self.heap().is_object(p) => r,
                _ => self.intrinsics().prototype(kind),
            }
        };
        let object = JsObject::new(
            ObjectClass::Collection(CollectionShell::new(kind)),
            Some(prototype),
        );
        let shell = self.heap_mut().alloc(HeapObject::Object(object));
        trace!(
            "allocated {} shell (subclassed: {})",
            kind.name(),
            new_target != Value::Heap(intrinsic)
        );
        Ok(shell)
    }
}
