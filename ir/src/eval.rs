//! Element-wise evaluation of arithmetic on constant values.

use graft_dtype::DType;

use crate::types::ConstValue;

/// Multiply two elements stored as `dtype`.
///
/// Returns `None` for operand pairs with no arithmetic meaning (booleans or
/// mixed storage forms). Integer products wrap at the width of `dtype`; float
/// products follow IEEE 754.
pub fn eval_mul(dtype: DType, a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    if !dtype.is_numeric() {
        return None;
    }
    let product = match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => ConstValue::Int(x.wrapping_mul(y)),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => ConstValue::UInt(x.wrapping_mul(y)),
        (ConstValue::Float(x), ConstValue::Float(y)) => ConstValue::Float(x * y),
        _ => return None,
    };
    Some(product.cast(dtype))
}
