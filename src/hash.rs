//! Key hashing shared by the integer fast path and the generic routines.
//!
//! Both paths must place a key in the same bucket: a small integer and a
//! boxed number with the same integral value hash identically.

use crate::heap::{Heap, HeapObject, HeapRef};
use crate::value::{integral_i32, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seed mixed into integer hashes.
pub const INTEGER_HASH_SEED: u32 = 0;

const HASH_MASK: u32 = 0x3fff_ffff;

const UNDEFINED_HASH: u32 = 0x0bad_cafe & HASH_MASK;
const NULL_HASH: u32 = 0x0dea_dbee & HASH_MASK;
const FALSE_HASH: u32 = 0x0000_f00d;
const TRUE_HASH: u32 = 0x000b_eef0;

/// Thomas Wang style 32-bit integer hash.
#[inline]
pub fn compute_integer_hash(key: u32, seed: u32) -> u32 {
    let mut hash = key ^ seed;
    hash = (!hash).wrapping_add(hash << 15);
    hash ^= hash >> 12;
    hash = hash.wrapping_add(hash << 2);
    hash ^= hash >> 4;
    hash = hash.wrapping_mul(2057);
    hash ^= hash >> 16;
    hash & HASH_MASK
}

/// 64-bit variant, used for the bit pattern of non-integral numbers.
#[inline]
pub fn compute_long_hash(key: u64) -> u32 {
    let mut hash = key;
    hash = (!hash).wrapping_add(hash << 18);
    hash ^= hash >> 31;
    hash = hash.wrapping_mul(21);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 6);
    hash ^= hash >> 22;
    (hash as u32) & HASH_MASK
}

#[inline]
pub fn smi_hash(n: i32) -> u32 {
    compute_integer_hash(n as u32, INTEGER_HASH_SEED)
}

pub fn number_hash(n: f64) -> u32 {
    if let Some(i) = integral_i32(n) {
        return smi_hash(i);
    }
    if n.is_nan() {
        return compute_long_hash(f64::NAN.to_bits());
    }
    compute_long_hash(n.to_bits())
}

fn string_hash(s: &str) -> u32 {
    let mut h = DefaultHasher::new();
    s.hash(&mut h);
    (h.finish() as u32) & HASH_MASK
}

fn identity_hash(r: HeapRef) -> u32 {
    let mut h = DefaultHasher::new();
    r.hash(&mut h);
    (h.finish() as u32) & HASH_MASK
}

/// Hash of `key` under SameValueZero.
pub fn hash_key(heap: &Heap, key: Value) -> u32 {
    match key {
        Value::Smi(n) => smi_hash(n),
        Value::Undefined | Value::Hole => UNDEFINED_HASH,
        Value::Null => NULL_HASH,
        Value::Boolean(false) => FALSE_HASH,
        Value::Boolean(true) => TRUE_HASH,
        Value::Heap(r) => match heap.get(r) {
            Ok(HeapObject::Number(n)) => number_hash(*n),
            Ok(HeapObject::String(s)) => string_hash(s),
            _ => identity_hash(r),
        },
    }
}
