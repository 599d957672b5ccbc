//! Compile-time multiplication of constant operands.
//!
//! Folding is best effort. [`ConstantFolder::fold_mul`] returns `None` whenever
//! the product cannot be expressed as one constant without more context
//! (broadcasting between differently shaped tensors, mixed dtypes, non-numeric
//! operands, oversized results). Callers must then keep the multiplication as
//! a runtime call.

use graft_ir::eval::eval_mul;
use graft_ir::{ConstValue, Tensor, Value};
use tracing::trace;

/// Folds products of scalar and tensor constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantFolder {
    max_elements: usize,
}

impl ConstantFolder {
    pub fn new(max_elements: usize) -> Self {
        Self { max_elements }
    }

    /// Largest tensor the folder will materialize.
    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    /// Multiply two constants.
    ///
    /// - scalar × scalar of equal dtype gives a scalar
    /// - scalar × tensor (either order) of equal dtype gives a tensor of the tensor's shape
    /// - tensor × tensor of identical shape and dtype multiplies element-wise
    pub fn fold_mul(&self, lhs: &Value, rhs: &Value) -> Option<Value> {
        match (lhs, rhs) {
            (Value::Scalar { dtype: a, value: x }, Value::Scalar { dtype: b, value: y }) if a == b => {
                eval_mul(*a, *x, *y).map(|v| Value::scalar(*a, v))
            }
            (Value::Scalar { dtype, value }, Value::Tensor(t)) | (Value::Tensor(t), Value::Scalar { dtype, value })
                if *dtype == t.dtype() =>
            {
                self.map_tensor(t, |e| eval_mul(*dtype, e, *value))
            }
            (Value::Tensor(a), Value::Tensor(b)) if a.dtype() == b.dtype() && a.shape() == b.shape() => {
                let mut rhs = b.data().iter();
                self.map_tensor(a, |e| rhs.next().and_then(|&r| eval_mul(a.dtype(), e, r)))
            }
            _ => {
                trace!(%lhs, %rhs, "operands cannot be folded");
                None
            }
        }
    }

    fn map_tensor(&self, t: &Tensor, mut f: impl FnMut(ConstValue) -> Option<ConstValue>) -> Option<Value> {
        if t.numel() > self.max_elements {
            trace!(numel = t.numel(), max_elements = self.max_elements, "tensor too large to fold");
            return None;
        }
        let data = t.data().iter().map(|&e| f(e)).collect::<Option<Vec<_>>>()?;
        Tensor::new(t.dtype(), t.shape(), data).ok().map(Value::Tensor)
    }
}

impl Default for ConstantFolder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FOLD_MAX_ELEMENTS)
    }
}
