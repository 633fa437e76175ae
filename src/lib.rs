//! ordered-hash-collections: the ordered hash tables behind a managed
//! runtime's `Map` and `Set`, with construction from iterable sources and
//! an integer fast path for lookups.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: reproduce observable Map/Set semantics (insertion order,
//!   SameValueZero keys, re-entrant construction) on top of a flat table
//!   layout that is safe to reach only through validated handles.
//! - Layers:
//!   - `OrderedHashTable`: one flat slot array. Bucket heads come first,
//!     then a data region of fixed-size entries. Entries are appended and
//!     never move; deletion leaves a tombstone in place.
//!   - `CollectionShell`: the user-visible Map/Set object. It owns one
//!     table reference, which growth, shrink and clear replace wholesale.
//!   - Lookup: `find_smi_entry` walks a chain for small-integer keys;
//!     every other key shape goes through the `TableRoutines` seam, whose
//!     default compares with SameValueZero.
//!   - Construction: `Runtime::construct_collection` allocates the shell
//!     and its table, resolves `set`/`add` once, and feeds it each element
//!     of the source iterator.
//!
//! Constraints
//! - Single-threaded: the runtime and its heap are `!Send`/`!Sync`
//!   (native functions are `Rc` closures).
//! - Capacity is a power of two between the layout's minimum and maximum;
//!   bucket count is capacity / load factor.
//! - Live iteration order equals insertion order.
//!
//! Handles and re-entrancy
//! - Every managed value lives in a `slotmap` slot behind a generational
//!   `HeapRef`. Freeing a slot invalidates all handles to it.
//! - Replacing a shell's table frees the old table, so any `TableRef`
//!   held across a call into user code goes stale instead of aliasing.
//!   Callers reload the table through the shell after anything that can
//!   run user code or allocate.
//!
//! Failure model
//! - User-visible failures are `Exception`s built from fixed message
//!   templates.
//! - Stale or wrongly typed handles surface as `HeapError`, wrapped in
//!   `Exception::Heap` when they escape.
//! - A corrupted chain (an index past the used entries) panics. It means
//!   the table producer is broken, not that the caller misused the API.
//!
//! Notes and non-goals
//! - No concurrent access and no persistence.
//! - The object model, property lookup and iterator protocol are the
//!   minimum needed to drive construction and the prototype methods.
//! - The library never installs a logger; diagnostics go through `log`.

pub mod builtins;
mod construct;
pub mod error;
pub mod generic;
pub mod hash;
pub mod heap;
pub mod iterator;
pub mod layout;
pub mod lookup;
pub mod mutation;
pub mod object;
pub mod runtime;
pub mod shell;
pub mod table;
mod table_proptest;
pub mod value;

// Public surface
pub use builtins::{map_get, map_has, set_has};
pub use error::{Exception, MessageTemplate};
pub use generic::{SameValueZeroRoutines, TableRoutines};
pub use heap::{Heap, HeapError, HeapObject, HeapRef, TableRef};
pub use layout::{CollectionKind, TableLayout};
pub use runtime::{Intrinsics, Runtime};
pub use shell::CollectionShell;
pub use table::OrderedHashTable;
pub use value::Value;
