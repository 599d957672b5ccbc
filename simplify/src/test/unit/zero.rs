//! Multiplication-by-zero absorption in `arithmetic_simplify_zero`.

use graft_dtype::DType;
use graft_ir::{ConstValue, Primitive, RewriteResult, Tensor, Value};

use crate::test::helpers::*;
use crate::{SimplifyConfig, arithmetic_simplify, arithmetic_simplify_zero};

#[test]
fn test_mul_scalar_zero() {
    let (mut graph, main) = graph();
    let x = param(&mut graph, main, "x");
    let zero = scalar(&mut graph, DType::Float32, 0.0f32);
    let mul = call(&mut graph, main, Primitive::Mul, &[x, zero]);

    let new = replacement(rewrite(&arithmetic_simplify_zero(), &mut graph, mul));
    assert_ne!(new, zero);
    assert_eq!(value(&graph, new), &Value::native(0.0f32));
}

#[test]
fn test_mul_zero_tensor_keeps_shape() {
    let (mut graph, main) = graph();
    let x = param(&mut graph, main, "x");
    let zeros = tensor(&mut graph, DType::Int16, &[3, 1], 0);
    let mul = call(&mut graph, main, Primitive::Mul, &[x, zeros]);

    let new = replacement(rewrite(&arithmetic_simplify_zero(), &mut graph, mul));
    assert_eq!(value(&graph, new), &Value::from(Tensor::zeros(DType::Int16, &[3, 1])));
}

#[test]
fn test_mul_zeros_like() {
    let (mut graph, main) = graph();
    let x = param(&mut graph, main, "x");
    let y = param(&mut graph, main, "y");
    let zeros = call(&mut graph, main, Primitive::ZerosLike, &[y]);
    let mul = call(&mut graph, main, Primitive::Mul, &[x, zeros]);

    assert_eq!(rewrite(&arithmetic_simplify_zero(), &mut graph, mul), RewriteResult::Rewritten(zeros));
}

#[test]
fn test_zero_on_the_left_is_kept() {
    let (mut graph, main) = graph();
    let x = param(&mut graph, main, "x");
    let zero = scalar(&mut graph, DType::Int32, 0);
    let mul = call(&mut graph, main, Primitive::Mul, &[zero, x]);

    assert_no_match(&arithmetic_simplify_zero(), &mut graph, mul);
}

#[test]
fn test_nonzero_is_kept() {
    let (mut graph, main) = graph();
    let x = param(&mut graph, main, "x");
    let t = Tensor::new(DType::Int32, &[2], vec![ConstValue::Int(0), ConstValue::Int(5)]).unwrap();
    let t = graph.tensor(t, None).unwrap();
    let mul = call(&mut graph, main, Primitive::Mul, &[x, t]);

    assert_no_match(&arithmetic_simplify_zero(), &mut graph, mul);
}

#[test]
fn test_first_set_does_not_absorb_tensor_zero() {
    let (mut graph, main) = graph();
    let x = param(&mut graph, main, "x");
    let zero = scalar(&mut graph, DType::Int32, 0);
    let mul = call(&mut graph, main, Primitive::Mul, &[x, zero]);

    assert_no_match(&arithmetic_simplify(&SimplifyConfig::default()), &mut graph, mul);
    assert!(rewrite(&arithmetic_simplify_zero(), &mut graph, mul).is_match());
}
