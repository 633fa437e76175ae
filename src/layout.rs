//! Per-kind table layout configuration.
//!
//! A table is one flat slot array: `bucket_count` bucket heads followed by
//! `capacity * entry_size` data slots. Each entry holds its payload (key, or
//! key and value) followed by one chain-link slot.

/// Which user-visible collection a table or shell belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CollectionKind {
    Map,
    Set,
}

impl CollectionKind {
    /// Constructor name, as used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Map => "Map",
            CollectionKind::Set => "Set",
        }
    }

    /// Name of the insertion method resolved during construction.
    pub fn adder_name(self) -> &'static str {
        match self {
            CollectionKind::Map => "set",
            CollectionKind::Set => "add",
        }
    }

    pub fn layout(self) -> &'static TableLayout {
        TableLayout::for_kind(self)
    }
}

/// Largest slot array a single table may occupy.
pub const MAX_TABLE_LENGTH: usize = 1 << 27;

/// Chain and bucket terminator.
pub const NOT_FOUND: i32 = -1;

/// Compile-time layout constants for one collection kind.
#[derive(Debug, Eq, PartialEq)]
pub struct TableLayout {
    pub kind: CollectionKind,
    /// Capacity of a freshly allocated table. Power of two.
    pub min_capacity: usize,
    /// Entries per bucket at full capacity.
    pub load_factor: usize,
    /// Payload slots per entry: 2 for Map (key, value), 1 for Set (key).
    pub payload_len: usize,
    /// Payload slots plus the chain-link slot.
    pub entry_size: usize,
    /// Offset of the value slot within a Map entry.
    pub value_offset: usize,
    /// Offset of the chain-link slot within an entry.
    pub chain_offset: usize,
    pub max_capacity: usize,
}

const fn max_capacity_for(entry_size: usize, load_factor: usize) -> usize {
    // Per entry: `entry_size` data slots plus `1 / load_factor` bucket slots.
    let per_entry_times_lf = entry_size * load_factor + 1;
    let raw = MAX_TABLE_LENGTH * load_factor / per_entry_times_lf;
    let mut cap = 1usize;
    while cap * 2 <= raw {
        cap *= 2;
    }
    cap
}

pub const MAP_LAYOUT: TableLayout = TableLayout {
    kind: CollectionKind::Map,
    min_capacity: 4,
    load_factor: 2,
    payload_len: 2,
    entry_size: 3,
    value_offset: 1,
    chain_offset: 2,
    max_capacity: max_capacity_for(3, 2),
};

pub const SET_LAYOUT: TableLayout = TableLayout {
    kind: CollectionKind::Set,
    min_capacity: 4,
    load_factor: 2,
    payload_len: 1,
    entry_size: 2,
    value_offset: 0,
    chain_offset: 1,
    max_capacity: max_capacity_for(2, 2),
};

const _: () = {
    assert!(MAP_LAYOUT.min_capacity.is_power_of_two());
    assert!(SET_LAYOUT.min_capacity.is_power_of_two());
    assert!(MAP_LAYOUT.min_capacity <= MAP_LAYOUT.max_capacity);
    assert!(SET_LAYOUT.min_capacity <= SET_LAYOUT.max_capacity);
    assert!(MAP_LAYOUT.entry_size == MAP_LAYOUT.payload_len + 1);
    assert!(SET_LAYOUT.entry_size == SET_LAYOUT.payload_len + 1);
    assert!(MAP_LAYOUT.min_capacity % MAP_LAYOUT.load_factor == 0);
    assert!(SET_LAYOUT.min_capacity % SET_LAYOUT.load_factor == 0);
};

impl TableLayout {
    pub fn for_kind(kind: CollectionKind) -> &'static TableLayout {
        match kind {
            CollectionKind::Map => &MAP_LAYOUT,
            CollectionKind::Set => &SET_LAYOUT,
        }
    }

    #[inline]
    pub fn bucket_count(&self, capacity: usize) -> usize {
        capacity / self.load_factor
    }

    /// Total slot count (buckets plus data region) for `capacity`.
    #[inline]
    pub fn table_length(&self, capacity: usize) -> usize {
        self.bucket_count(capacity) + capacity * self.entry_size
    }
}
