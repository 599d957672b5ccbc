//! Constant payloads carried by value nodes.
//!
//! A value node holds either a numeric scalar, a dense tensor constant, or a
//! primitive operator identifier used in the operator position of a call.

use std::fmt;

use graft_dtype::{DType, HasDType};
use smallvec::SmallVec;
use snafu::ensure;

use crate::error::{Result, TensorDataLengthSnafu};
use crate::op::Primitive;

/// Tensor dimensions.
pub type Shape = SmallVec<[usize; 4]>;

/// Single element of a scalar or tensor constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

/// Helper macro to cast to target width and back to storage type (for proper truncation/extension).
macro_rules! cast_via {
    ($v:expr, $target:ty, $storage:ty) => {
        ($v as $target) as $storage
    };
}

#[inline]
fn cast_int(v: i64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v),
        UInt8 => ConstValue::UInt(cast_via!(v, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v, u32, u64)),
        UInt64 => ConstValue::UInt(v as u64),
        Float16 | BFloat16 | Float32 | Float64 => ConstValue::Float(v as f64),
    }
}

#[inline]
fn cast_uint(v: u64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v as i64),
        UInt8 => ConstValue::UInt(cast_via!(v, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v, u32, u64)),
        UInt64 => ConstValue::UInt(v),
        Float16 | BFloat16 | Float32 | Float64 => ConstValue::Float(v as f64),
    }
}

#[inline]
fn cast_float(v: f64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0.0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v as i64),
        // Float-to-unsigned goes through i64 first
        UInt8 => ConstValue::UInt(cast_via!(v as i64, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v as i64, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v as i64, u32, u64)),
        UInt64 => ConstValue::UInt((v as i64) as u64),
        Float16 | BFloat16 | Float32 | Float64 => ConstValue::Float(v),
    }
}

impl ConstValue {
    pub const fn zero(dtype: DType) -> Self {
        use DType::*;
        match dtype {
            Bool => Self::Bool(false),
            Int8 | Int16 | Int32 | Int64 => Self::Int(0),
            UInt8 | UInt16 | UInt32 | UInt64 => Self::UInt(0),
            Float16 | BFloat16 | Float32 | Float64 => Self::Float(0.0),
        }
    }

    pub const fn one(dtype: DType) -> Self {
        use DType::*;
        match dtype {
            Bool => Self::Bool(true),
            Int8 | Int16 | Int32 | Int64 => Self::Int(1),
            UInt8 | UInt16 | UInt32 | UInt64 => Self::UInt(1),
            Float16 | BFloat16 | Float32 | Float64 => Self::Float(1.0),
        }
    }

    /// Cast this value into the storage form of `dtype`.
    ///
    /// Follows C `as` semantics: narrowing truncates, unsigned overflow wraps
    /// and float-to-int truncates toward zero.
    pub fn cast(&self, dtype: DType) -> Self {
        match *self {
            ConstValue::Bool(v) => cast_int(v as i64, dtype),
            ConstValue::Int(v) => cast_int(v, dtype),
            ConstValue::UInt(v) => cast_uint(v, dtype),
            ConstValue::Float(v) => cast_float(v, dtype),
        }
    }

    /// Numeric equality across storage forms, so `Int(1)` equals `Float(1.0)`.
    ///
    /// Booleans only compare equal to booleans.
    pub fn numeric_eq(&self, other: &ConstValue) -> bool {
        use ConstValue::*;
        match (*self, *other) {
            (Bool(a), Bool(b)) => a == b,
            (Bool(_), _) | (_, Bool(_)) => false,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Int(a), UInt(b)) | (UInt(b), Int(a)) => a as i128 == b as i128,
            (Float(a), Float(b)) => a == b,
            (Float(f), Int(i)) | (Int(i), Float(f)) => f == i as f64,
            (Float(f), UInt(u)) | (UInt(u), Float(f)) => f == u as f64,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::UInt(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v:?}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_native {
    ($($variant:ident: $($ty:ty),*);* $(;)?) => {
        $($(
            impl From<$ty> for ConstValue {
                fn from(v: $ty) -> Self {
                    ConstValue::$variant(v.into())
                }
            }
        )*)*
    };
}

impl_from_native! {
    Int: i8, i16, i32, i64;
    UInt: u8, u16, u32, u64;
    Float: f32, f64;
    Bool: bool;
}

/// Dense tensor constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    dtype: DType,
    shape: Shape,
    data: Vec<ConstValue>,
}

impl Tensor {
    /// Create a tensor, casting every element into `dtype`.
    pub fn new(dtype: DType, shape: &[usize], data: Vec<ConstValue>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        ensure!(
            data.len() == expected,
            TensorDataLengthSnafu { shape: shape.to_vec(), expected, actual: data.len() }
        );
        let data = data.into_iter().map(|v| v.cast(dtype)).collect();
        Ok(Self { dtype, shape: Shape::from_slice(shape), data })
    }

    /// Tensor with every element equal to `value`.
    pub fn full(dtype: DType, shape: &[usize], value: ConstValue) -> Self {
        let numel = shape.iter().product();
        Self { dtype, shape: Shape::from_slice(shape), data: vec![value.cast(dtype); numel] }
    }

    pub fn zeros(dtype: DType, shape: &[usize]) -> Self {
        Self::full(dtype, shape, ConstValue::zero(dtype))
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[ConstValue] {
        &self.data
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// True if the tensor is non-empty and every element equals `value`.
    pub fn is_uniform(&self, value: &ConstValue) -> bool {
        !self.data.is_empty() && self.data.iter().all(|v| v.numeric_eq(value))
    }
}

/// Payload of a value node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Rank-0 constant.
    Scalar { dtype: DType, value: ConstValue },
    /// Shaped constant; broadcastable as a scalar when uniform.
    Tensor(Tensor),
    /// Operator identifier.
    Primitive(Primitive),
}

impl Value {
    pub fn scalar(dtype: DType, value: ConstValue) -> Self {
        Value::Scalar { dtype, value: value.cast(dtype) }
    }

    /// Scalar constant typed after the native Rust value.
    pub fn native<T: HasDType + Into<ConstValue>>(value: T) -> Self {
        Self::scalar(T::DTYPE, value.into())
    }

    /// Scalar or tensor, as opposed to an operator identifier.
    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Scalar { .. } | Value::Tensor(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar { .. })
    }

    pub fn dtype(&self) -> Option<DType> {
        match self {
            Value::Scalar { dtype, .. } => Some(*dtype),
            Value::Tensor(t) => Some(t.dtype()),
            Value::Primitive(_) => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// True if every element of the constant equals `value`.
    pub fn is_uniform(&self, value: &ConstValue) -> bool {
        match self {
            Value::Scalar { value: v, .. } => v.numeric_eq(value),
            Value::Tensor(t) => t.is_uniform(value),
            Value::Primitive(_) => false,
        }
    }

    /// Fresh zero constant of the same kind, dtype and shape.
    pub fn zero_like(&self) -> Option<Value> {
        match self {
            Value::Scalar { dtype, .. } => Some(Value::scalar(*dtype, ConstValue::zero(*dtype))),
            Value::Tensor(t) => Some(Value::Tensor(Tensor::zeros(t.dtype(), t.shape()))),
            Value::Primitive(_) => None,
        }
    }
}

impl From<Tensor> for Value {
    fn from(tensor: Tensor) -> Self {
        Value::Tensor(tensor)
    }
}

impl From<Primitive> for Value {
    fn from(primitive: Primitive) -> Self {
        Value::Primitive(primitive)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar { dtype, value } => write!(f, "{value}:{}", dtype.short_name()),
            Value::Tensor(t) => write!(f, "tensor<{}{:?}>", t.dtype().short_name(), t.shape()),
            Value::Primitive(p) => write!(f, "{p}"),
        }
    }
}
