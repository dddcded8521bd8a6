use super::*;

use crate::expression::parser;
use crate::foundation::value::InputDef;

fn inputs() -> Vec<InputDef> {
    vec![
        InputDef::new("x", ValueType::Int),
        InputDef::new("y", ValueType::Float),
        InputDef::new("b", ValueType::Bool),
        InputDef::new("v", ValueType::Vector),
        InputDef::new("w", ValueType::Vector),
    ]
}

fn compile(text: &str, output: ValueType) -> Result<TokenQueue, CompileError> {
    let mut infix = TokenQueue::new();
    parser::parse(text, &inputs(), &mut infix)?;
    to_postfix(&infix, output)
}

fn compile_ok(text: &str, output: ValueType) -> TokenQueue {
    compile(text, output).unwrap()
}

fn kinds(q: &TokenQueue) -> Vec<TokenKind> {
    q.iter().map(|t| t.kind).collect()
}

#[test]
fn precedence_orders_the_postfix_stream() {
    let q = compile_ok("2 + 3 * 4", ValueType::Int);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::ConstInt,
            TokenKind::ConstInt,
            TokenKind::ConstInt,
            TokenKind::MulInt,
            TokenKind::AddInt,
        ]
    );

    let q = compile_ok("(2 + 3) * 4", ValueType::Int);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::ConstInt,
            TokenKind::ConstInt,
            TokenKind::AddInt,
            TokenKind::ConstInt,
            TokenKind::MulInt,
        ]
    );
}

#[test]
fn equal_precedence_pops_left_to_right() {
    // Left-associative power: (2 ^ 3) ^ 2.
    let q = compile_ok("2 ^ 3 ^ 2", ValueType::Int);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::ConstInt,
            TokenKind::ConstInt,
            TokenKind::PowInt,
            TokenKind::ConstInt,
            TokenKind::PowInt,
        ]
    );
}

#[test]
fn operators_specialize_to_operand_types() {
    assert_eq!(
        kinds(&compile_ok("1.0 + 2.0", ValueType::Float)),
        [TokenKind::ConstFloat, TokenKind::ConstFloat, TokenKind::Add]
    );
    assert_eq!(
        kinds(&compile_ok("v + w", ValueType::Vector)),
        [TokenKind::VarVec, TokenKind::VarVec, TokenKind::AddVec]
    );
    assert_eq!(
        kinds(&compile_ok("v == w", ValueType::Bool)),
        [TokenKind::VarVec, TokenKind::VarVec, TokenKind::EqVec]
    );
    // Comparisons yield ints; bool output needs no conversion.
    assert_eq!(
        kinds(&compile_ok("x > 2", ValueType::Bool)),
        [TokenKind::VarInt, TokenKind::ConstInt, TokenKind::GtInt]
    );
}

#[test]
fn int_operands_widen_with_explicit_offsets() {
    // The int sits below the float, so the conversion reaches one slot down.
    let q = compile_ok("x + 1.5", ValueType::Float);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::VarInt,
            TokenKind::ConstFloat,
            TokenKind::IntToFloat,
            TokenKind::Add,
        ]
    );
    assert_eq!(q.at(2).as_i32(), 1);

    // Float below, int on top: the conversion targets the top of the stack.
    let q = compile_ok("1.5 + x", ValueType::Float);
    assert_eq!(q.at(2).kind, TokenKind::IntToFloat);
    assert_eq!(q.at(2).as_i32(), 0);

    // Both int, against a float-only operator: two conversions.
    let q = compile_ok("atan2(x, 2)", ValueType::Float);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::VarInt,
            TokenKind::ConstInt,
            TokenKind::IntToFloat,
            TokenKind::IntToFloat,
            TokenKind::Atan2,
        ]
    );
    assert_eq!(q.at(2).as_i32(), 1);
    assert_eq!(q.at(3).as_i32(), 0);
}

#[test]
fn int_widens_past_a_whole_vector() {
    // The scalar is below the 3-slot vector, hence offset 3.
    let q = compile_ok("2 * v", ValueType::Vector);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::ConstInt,
            TokenKind::VarVec,
            TokenKind::IntToFloat,
            TokenKind::MulFloatVec,
        ]
    );
    assert_eq!(q.at(2).as_i32(), 3);

    let q = compile_ok("v * 2", ValueType::Vector);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::VarVec,
            TokenKind::ConstInt,
            TokenKind::IntToFloat,
            TokenKind::MulVecFloat,
        ]
    );
    assert_eq!(q.at(2).as_i32(), 0);
}

#[test]
fn ternary_conversion_keeps_the_condition() {
    // if(int, float, int): the condition stays int, the int branch widens.
    let q = compile_ok("if(1, 2.0, 3)", ValueType::Float);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::ConstInt,
            TokenKind::ConstFloat,
            TokenKind::ConstInt,
            TokenKind::IntToFloat,
            TokenKind::If,
        ]
    );
    assert_eq!(q.at(3).as_i32(), 0);

    // All-int selects the int specialization directly.
    assert_eq!(
        kinds(&compile_ok("if(1, 2, 3)", ValueType::Int)),
        [
            TokenKind::ConstInt,
            TokenKind::ConstInt,
            TokenKind::ConstInt,
            TokenKind::IfInt,
        ]
    );

    assert_eq!(
        kinds(&compile_ok("if(1, v, w)", ValueType::Vector)),
        [
            TokenKind::ConstInt,
            TokenKind::VarVec,
            TokenKind::VarVec,
            TokenKind::IfVec,
        ]
    );
}

#[test]
fn member_offset_survives_specialization() {
    let q = compile_ok("v.y", ValueType::Float);
    assert_eq!(kinds(&q), [TokenKind::VarVec, TokenKind::Member]);
    assert_eq!(q.at(1).as_i32(), 1);
}

#[test]
fn output_coercion_widens_ints() {
    let q = compile_ok("x + 1", ValueType::Float);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::VarInt,
            TokenKind::ConstInt,
            TokenKind::AddInt,
            TokenKind::IntToFloat,
        ]
    );
    assert_eq!(q.at(3).as_i32(), 0);

    // Int output from an int expression needs nothing.
    assert_eq!(
        kinds(&compile_ok("x + 1", ValueType::Int)),
        [TokenKind::VarInt, TokenKind::ConstInt, TokenKind::AddInt]
    );
    // Bool output keeps the int bit pattern.
    assert_eq!(
        kinds(&compile_ok("1", ValueType::Bool)),
        [TokenKind::ConstInt]
    );
}

#[test]
fn output_coercion_truncates_floats_to_int() {
    let q = compile_ok("1.5", ValueType::Int);
    assert_eq!(kinds(&q), [TokenKind::ConstFloat, TokenKind::FloatToInt]);
    assert_eq!(q.at(1).as_i32(), 0);
}

#[test]
fn output_coercion_takes_x_from_vectors() {
    let q = compile_ok("v", ValueType::Float);
    assert_eq!(kinds(&q), [TokenKind::VarVec, TokenKind::Member]);
    assert_eq!(q.at(1).as_i32(), 2);

    // Scalar to vector output pads y and z with zeros.
    let q = compile_ok("2", ValueType::Vector);
    assert_eq!(
        kinds(&q),
        [
            TokenKind::ConstInt,
            TokenKind::IntToFloat,
            TokenKind::ConstFloat,
            TokenKind::ConstFloat,
        ]
    );
    assert_eq!(q.at(2).as_f32(), 0.0);
}

#[test]
fn mixed_vector_scalar_addition_is_rejected() {
    let err = compile("v + 1", ValueType::Vector).unwrap_err();
    assert_eq!(
        err.message(),
        "+: cannot mix vector and non-vector types in this operation"
    );
    assert_eq!(err.offset(), None);
}

#[test]
fn vector_only_type_errors() {
    let err = compile("v ^ w", ValueType::Float).unwrap_err();
    assert_eq!(err.message(), "^: cannot perform this operation on a vector");

    let err = compile("abs(v)", ValueType::Float).unwrap_err();
    assert_eq!(err.message(), "abs: cannot perform this function on a vector");

    let err = compile("dot(v, 1)", ValueType::Float).unwrap_err();
    assert_eq!(
        err.message(),
        "dot: cannot mix vector and non-vector types in this operation"
    );
}

#[test]
fn ternary_type_errors_name_the_function() {
    // No overload takes a float epsilon alongside vectors being compared
    // with an int epsilon, so this fails instead of widening.
    let err = compile("compare(v, w, 1)", ValueType::Bool).unwrap_err();
    assert_eq!(err.message(), "compare: incorrect argument type");
}

#[test]
fn non_numeric_operand_types_are_rejected() {
    let err = compile("1.5 and 1", ValueType::Bool).unwrap_err();
    assert_eq!(err.message(), "and: wrong data type");
}

#[test]
fn deep_nesting_exceeds_the_stack_bound() {
    // Each "+ (" holds one more operand live; 101 scalars exceed the bound.
    let mut text = String::from("1");
    for _ in 0..100 {
        text.push_str(" + (1");
    }
    text.push_str(&")".repeat(100));
    let err = compile(&text, ValueType::Float).unwrap_err();
    assert_eq!(err.message(), "expression uses too much stack space");
    assert_eq!(err.offset(), None);

    // One level less fits exactly.
    let mut text = String::from("1");
    for _ in 0..99 {
        text.push_str(" + (1");
    }
    text.push_str(&")".repeat(99));
    assert!(compile(&text, ValueType::Float).is_ok());
}

#[test]
fn empty_infix_has_no_value() {
    let err = to_postfix(&TokenQueue::new(), ValueType::Float).unwrap_err();
    assert_eq!(err.message(), "expression produced no value");
}
