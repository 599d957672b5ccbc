//! Primitive operator identifiers.

use std::fmt;
use std::sync::Arc;

/// Operator identifier stored in a value node and referenced from operand 0 of a call.
///
/// Only the operators the simplification passes inspect get a dedicated variant;
/// every other operator is carried by name in [`Primitive::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Element-wise tensor addition.
    Add,
    /// Element-wise tensor multiplication.
    Mul,
    /// Addition of two scalars.
    ScalarAdd,
    /// Multiplication of two scalars.
    ScalarMul,
    /// No-op wrapper returning its argument.
    Identity,
    /// Zero tensor with the shape and dtype of its argument.
    ZerosLike,
    /// Fused momentum optimizer update.
    Momentum,
    /// Tuple construction.
    MakeTuple,
    Pow,
    /// Sum of every element of a tuple.
    AddN,
    /// Collective reduction across parallel workers.
    AllReduce,
    /// Ordering edge between two values.
    Depend,
    Custom(Arc<str>),
}

impl Primitive {
    pub fn custom(name: impl Into<Arc<str>>) -> Self {
        Primitive::Custom(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Primitive::Add => "Add",
            Primitive::Mul => "Mul",
            Primitive::ScalarAdd => "ScalarAdd",
            Primitive::ScalarMul => "ScalarMul",
            Primitive::Identity => "Identity",
            Primitive::ZerosLike => "ZerosLike",
            Primitive::Momentum => "Momentum",
            Primitive::MakeTuple => "MakeTuple",
            Primitive::Pow => "Pow",
            Primitive::AddN => "AddN",
            Primitive::AllReduce => "AllReduce",
            Primitive::Depend => "Depend",
            Primitive::Custom(name) => name,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
