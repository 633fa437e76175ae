//! Tagged values and key classification.

use crate::heap::HeapRef;

/// A tagged runtime value.
///
/// Small integers are stored inline; everything else that needs storage
/// (boxed numbers, strings, objects) is a `Heap` handle. `Hole` marks the
/// key and value slots of a deleted table entry and is never produced by
/// user-level operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Smi(i32),
    Heap(HeapRef),
    Hole,
}

impl Value {
    #[inline]
    pub fn is_nullish(self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    #[inline]
    pub fn as_heap(self) -> Option<HeapRef> {
        match self {
            Value::Heap(r) => Some(r),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<HeapRef> for Value {
    fn from(r: HeapRef) -> Self {
        Value::Heap(r)
    }
}

/// Shape of a key as seen by the integer fast path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum KeyClass {
    SmallInteger(i32),
    BoxedNumber(f64),
    Other,
}

/// Returns the small integer exactly equal to `n`, if any.
///
/// `-0.0` has no small-integer form: it must stay boxed to keep its sign.
#[inline]
pub fn smi_from_f64(n: f64) -> Option<i32> {
    if n == 0.0 && n.is_sign_negative() {
        return None;
    }
    integral_i32(n)
}

/// Like [`smi_from_f64`] but folds `-0.0` into `0`.
#[inline]
pub(crate) fn integral_i32(n: f64) -> Option<i32> {
    if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
        Some(n as i32)
    } else {
        None
    }
}

/// Formats a number the way error messages print it.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if (1e-6..1e21).contains(&n.abs()) {
        format!("{}", n)
    } else {
        // `{:e}` prints the shortest digits; only the exponent sign differs.
        let exp = format!("{:e}", n);
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
            _ => exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smi_conversion_keeps_negative_zero_boxed() {
        assert_eq!(smi_from_f64(3.0), Some(3));
        assert_eq!(smi_from_f64(-7.0), Some(-7));
        assert_eq!(smi_from_f64(0.0), Some(0));
        assert_eq!(smi_from_f64(-0.0), None);
        assert_eq!(integral_i32(-0.0), Some(0));
        assert_eq!(smi_from_f64(1.5), None);
        assert_eq!(smi_from_f64(f64::NAN), None);
        assert_eq!(smi_from_f64(2147483648.0), None);
        assert_eq!(smi_from_f64(-2147483648.0), Some(i32::MIN));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    /// Invariant: magnitudes outside [1e-6, 1e21) print in exponent form.
    #[test]
    fn number_formatting_switches_to_exponent_form() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-1.5e300), "-1.5e+300");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.25e-9), "1.25e-9");
        assert_eq!(format_number(1e-6), "0.000001");
        assert_eq!(format_number(123456789012345680000.0), "123456789012345680000");
    }
}
