//! Origin resolution: getting the raw target behind a tracking wrapper.

use crate::value::Value;

/// Returns the unwrapped value behind `value`.
///
/// Wrappers never nest, so a single unwrap always reaches the original
/// target. Non-wrappers are returned unchanged.
#[must_use]
pub fn get_origin(value: &Value) -> Value {
    value.origin()
}

/// Returns true if `a` and `b` have the same origin.
#[must_use]
pub fn same_origin(a: &Value, b: &Value) -> bool {
    a.origin() == b.origin()
}
