//! Stack machine executing compiled postfix programs.
//!
//! The stack is a flat array of 32-bit slots holding floats and ints by bit
//! pattern; a vector is three consecutive slots (x, y, z with z on top).
//! Programs arrive fully type-specialized, so execution is a single match
//! per token with no type dispatch, and compilation has already bounded the
//! depth to [`MAX_STACK`].

use crate::expression::token::{TokenKind, TokenQueue};
use crate::foundation::value::{Value, ValueType, Vec3};

/// Evaluation stack capacity in scalar slots.
///
/// Compilation rejects any expression whose simulated depth would exceed
/// this bound, so evaluation never checks it.
pub const MAX_STACK: usize = 100;

/// Reusable evaluation stack.
///
/// Create one per worker and feed it to repeated evaluations to keep the
/// per-row cost at a cursor reset.
#[derive(Clone, Debug)]
pub struct EvalStack {
    slots: [u32; MAX_STACK],
    /// Number of occupied slots.
    top: usize,
}

impl EvalStack {
    /// A fresh, empty stack.
    pub fn new() -> Self {
        Self {
            slots: [0; MAX_STACK],
            top: 0,
        }
    }

    fn reset(&mut self) {
        self.top = 0;
    }

    fn push_f32(&mut self, v: f32) {
        self.slots[self.top] = v.to_bits();
        self.top += 1;
    }

    fn push_i32(&mut self, v: i32) {
        self.slots[self.top] = v as u32;
        self.top += 1;
    }

    fn push_vec(&mut self, v: Vec3) {
        self.push_f32(v.x);
        self.push_f32(v.y);
        self.push_f32(v.z);
    }

    fn pop_f32(&mut self) -> f32 {
        self.top -= 1;
        f32::from_bits(self.slots[self.top])
    }

    fn pop_i32(&mut self) -> i32 {
        self.top -= 1;
        self.slots[self.top] as i32
    }

    fn pop_vec(&mut self) -> Vec3 {
        self.top -= 3;
        Vec3::new(
            f32::from_bits(self.slots[self.top]),
            f32::from_bits(self.slots[self.top + 1]),
            f32::from_bits(self.slots[self.top + 2]),
        )
    }

    /// Pops a pair; the first element is the operand pushed first.
    fn pop_two_f32(&mut self) -> (f32, f32) {
        self.top -= 2;
        (
            f32::from_bits(self.slots[self.top]),
            f32::from_bits(self.slots[self.top + 1]),
        )
    }

    fn pop_two_i32(&mut self) -> (i32, i32) {
        self.top -= 2;
        (self.slots[self.top] as i32, self.slots[self.top + 1] as i32)
    }

    fn pop_two_vec(&mut self) -> (Vec3, Vec3) {
        let second = self.pop_vec();
        let first = self.pop_vec();
        (first, second)
    }

    fn peek_f32(&self, offset: usize) -> f32 {
        f32::from_bits(self.slots[self.top - 1 - offset])
    }

    fn peek_i32(&self, offset: usize) -> i32 {
        self.slots[self.top - 1 - offset] as i32
    }

    fn replace_f32(&mut self, offset: usize, v: f32) {
        self.slots[self.top - 1 - offset] = v.to_bits();
    }

    fn replace_i32(&mut self, offset: usize, v: i32) {
        self.slots[self.top - 1 - offset] = v as u32;
    }

    fn discard(&mut self, n: usize) {
        self.top -= n;
    }
}

impl Default for EvalStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-row input lookup used during evaluation.
///
/// `index` is the position of the input in the table the program was
/// compiled against. Programs only call the accessor matching an input's
/// declared type; implementations are expected to return the type's default
/// value (0, 0.0, false, zero vector) if asked for a type they do not hold,
/// rather than panic.
pub trait RowAccess {
    /// Value of float input `index` for this row.
    fn float(&self, index: usize) -> f32;
    /// Value of int input `index` for this row.
    fn int(&self, index: usize) -> i32;
    /// Value of bool input `index` for this row.
    fn boolean(&self, index: usize) -> bool;
    /// Value of vector input `index` for this row.
    fn vector(&self, index: usize) -> Vec3;
}

/// A plain value slice, one element per declared input.
impl RowAccess for [Value] {
    fn float(&self, index: usize) -> f32 {
        match self.get(index) {
            Some(Value::Float(v)) => *v,
            _ => 0.0,
        }
    }

    fn int(&self, index: usize) -> i32 {
        match self.get(index) {
            Some(Value::Int(v)) => *v,
            _ => 0,
        }
    }

    fn boolean(&self, index: usize) -> bool {
        match self.get(index) {
            Some(Value::Bool(v)) => *v,
            _ => false,
        }
    }

    fn vector(&self, index: usize) -> Vec3 {
        match self.get(index) {
            Some(Value::Vector(v)) => *v,
            _ => Vec3::ZERO,
        }
    }
}

fn compare_eps(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}

/// Run `code` for one row and pop the result as `output`.
///
/// Int arithmetic wraps on overflow; scalar division and modulo by zero
/// yield zero; float-to-int conversion saturates.
pub(crate) fn execute<R: RowAccess + ?Sized>(
    code: &TokenQueue,
    output: ValueType,
    inputs: &R,
    stack: &mut EvalStack,
) -> Value {
    stack.reset();

    for t in code.iter() {
        match t.kind {
            TokenKind::ConstFloat => stack.push_f32(t.as_f32()),
            TokenKind::ConstInt => stack.push_i32(t.as_i32()),
            TokenKind::VarFloat => stack.push_f32(inputs.float(t.index())),
            TokenKind::VarInt => stack.push_i32(inputs.int(t.index())),
            TokenKind::VarBool => stack.push_i32(inputs.boolean(t.index()) as i32),
            TokenKind::VarVec => stack.push_vec(inputs.vector(t.index())),

            TokenKind::Neg => {
                let v = stack.pop_f32();
                stack.push_f32(-v);
            }
            TokenKind::NegInt => {
                let v = stack.pop_i32();
                stack.push_i32(v.wrapping_neg());
            }
            TokenKind::NegVec => {
                let v = stack.pop_vec();
                stack.push_vec(-v);
            }
            TokenKind::Not => {
                let v = stack.pop_i32();
                stack.push_i32((v == 0) as i32);
            }

            TokenKind::Add => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(a + b);
            }
            TokenKind::AddInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32(a.wrapping_add(b));
            }
            TokenKind::AddVec => {
                let (a, b) = stack.pop_two_vec();
                stack.push_vec(a + b);
            }
            TokenKind::Sub => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(a - b);
            }
            TokenKind::SubInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32(a.wrapping_sub(b));
            }
            TokenKind::SubVec => {
                let (a, b) = stack.pop_two_vec();
                stack.push_vec(a - b);
            }
            TokenKind::Mul => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(a * b);
            }
            TokenKind::MulInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32(a.wrapping_mul(b));
            }
            TokenKind::MulFloatVec => {
                let v = stack.pop_vec();
                let s = stack.pop_f32();
                stack.push_vec(s * v);
            }
            TokenKind::MulVecFloat => {
                let s = stack.pop_f32();
                let v = stack.pop_vec();
                stack.push_vec(v * s);
            }
            TokenKind::Div => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(if b != 0.0 { a / b } else { 0.0 });
            }
            TokenKind::DivInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32(if b != 0 { a.wrapping_div(b) } else { 0 });
            }
            TokenKind::DivVecFloat => {
                let s = stack.pop_f32();
                let v = stack.pop_vec();
                stack.push_vec(v / s);
            }
            TokenKind::Pow | TokenKind::PowFn => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(a.powf(b));
            }
            TokenKind::PowInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a as f64).powf(b as f64) as i32);
            }
            TokenKind::Mod => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(if b != 0.0 { a % b } else { 0.0 });
            }
            TokenKind::ModInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32(if b != 0 { a.wrapping_rem(b) } else { 0 });
            }

            TokenKind::Eq => {
                let (a, b) = stack.pop_two_f32();
                stack.push_i32((a == b) as i32);
            }
            TokenKind::EqInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a == b) as i32);
            }
            TokenKind::EqVec => {
                let (a, b) = stack.pop_two_vec();
                stack.push_i32((a == b) as i32);
            }
            TokenKind::Ne => {
                let (a, b) = stack.pop_two_f32();
                stack.push_i32((a != b) as i32);
            }
            TokenKind::NeInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a != b) as i32);
            }
            TokenKind::NeVec => {
                let (a, b) = stack.pop_two_vec();
                stack.push_i32((a != b) as i32);
            }
            TokenKind::Gt => {
                let (a, b) = stack.pop_two_f32();
                stack.push_i32((a > b) as i32);
            }
            TokenKind::GtInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a > b) as i32);
            }
            TokenKind::Ge => {
                let (a, b) = stack.pop_two_f32();
                stack.push_i32((a >= b) as i32);
            }
            TokenKind::GeInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a >= b) as i32);
            }
            TokenKind::Lt => {
                let (a, b) = stack.pop_two_f32();
                stack.push_i32((a < b) as i32);
            }
            TokenKind::LtInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a < b) as i32);
            }
            TokenKind::Le => {
                let (a, b) = stack.pop_two_f32();
                stack.push_i32((a <= b) as i32);
            }
            TokenKind::LeInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a <= b) as i32);
            }
            TokenKind::And => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a != 0 && b != 0) as i32);
            }
            TokenKind::Or => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32((a != 0 || b != 0) as i32);
            }

            TokenKind::Member => {
                let v = stack.peek_f32(t.index());
                stack.discard(3);
                stack.push_f32(v);
            }

            TokenKind::Sqrt => {
                let v = stack.pop_f32();
                stack.push_f32(v.sqrt());
            }
            TokenKind::Sin => {
                let v = stack.pop_f32();
                stack.push_f32(v.sin());
            }
            TokenKind::Cos => {
                let v = stack.pop_f32();
                stack.push_f32(v.cos());
            }
            TokenKind::Tan => {
                let v = stack.pop_f32();
                stack.push_f32(v.tan());
            }
            TokenKind::Asin => {
                let v = stack.pop_f32();
                stack.push_f32(v.asin());
            }
            TokenKind::Acos => {
                let v = stack.pop_f32();
                stack.push_f32(v.acos());
            }
            TokenKind::Atan => {
                let v = stack.pop_f32();
                stack.push_f32(v.atan());
            }
            TokenKind::Atan2 => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(a.atan2(b));
            }
            TokenKind::Max => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(if a > b { a } else { b });
            }
            TokenKind::MaxInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32(a.max(b));
            }
            TokenKind::Min => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(if a < b { a } else { b });
            }
            TokenKind::MinInt => {
                let (a, b) = stack.pop_two_i32();
                stack.push_i32(a.min(b));
            }
            TokenKind::Abs => {
                let v = stack.peek_f32(0);
                stack.replace_f32(0, v.abs());
            }
            TokenKind::AbsInt => {
                let v = stack.peek_i32(0);
                stack.replace_i32(0, v.wrapping_abs());
            }
            TokenKind::Sign => {
                let v = stack.peek_f32(0);
                stack.replace_i32(0, (v > 0.0) as i32 - (v < 0.0) as i32);
            }
            TokenKind::SignInt => {
                let v = stack.peek_i32(0);
                stack.replace_i32(0, (v > 0) as i32 - (v < 0) as i32);
            }
            TokenKind::Radians => {
                let v = stack.peek_f32(0);
                stack.replace_f32(0, v.to_radians());
            }
            TokenKind::Degrees => {
                let v = stack.peek_f32(0);
                stack.replace_f32(0, v.to_degrees());
            }
            TokenKind::MakeVec => {
                // The three scalars already on the stack are the vector.
            }
            TokenKind::NotFn => {
                let v = stack.pop_i32();
                stack.push_i32((v == 0) as i32);
            }
            TokenKind::Log => {
                let (a, b) = stack.pop_two_f32();
                stack.push_f32(a.ln() / b.ln());
            }
            TokenKind::Ln => {
                let v = stack.pop_f32();
                stack.push_f32(v.ln());
            }
            TokenKind::Exp => {
                let v = stack.pop_f32();
                stack.push_f32(v.exp());
            }
            TokenKind::If => {
                let if_false = stack.pop_f32();
                let if_true = stack.pop_f32();
                let cond = stack.pop_i32();
                stack.push_f32(if cond != 0 { if_true } else { if_false });
            }
            TokenKind::IfInt => {
                let if_false = stack.pop_i32();
                let if_true = stack.pop_i32();
                let cond = stack.pop_i32();
                stack.push_i32(if cond != 0 { if_true } else { if_false });
            }
            TokenKind::IfVec => {
                let if_false = stack.pop_vec();
                let if_true = stack.pop_vec();
                let cond = stack.pop_i32();
                stack.push_vec(if cond != 0 { if_true } else { if_false });
            }
            TokenKind::Ceil => {
                let v = stack.pop_f32();
                stack.push_f32(v.ceil());
            }
            TokenKind::Floor => {
                let v = stack.pop_f32();
                stack.push_f32(v.floor());
            }
            TokenKind::Fract => {
                let v = stack.pop_f32();
                stack.push_f32(v - v.floor());
            }
            TokenKind::Round => {
                let v = stack.pop_f32();
                stack.push_f32(v.round());
            }
            TokenKind::Trunc => {
                let v = stack.pop_f32();
                stack.push_f32(v.trunc());
            }
            TokenKind::Compare => {
                let epsilon = stack.pop_f32();
                let (a, b) = stack.pop_two_f32();
                stack.push_i32(compare_eps(a, b, epsilon) as i32);
            }
            TokenKind::CompareVec => {
                let epsilon = stack.pop_f32();
                let (a, b) = stack.pop_two_vec();
                let eq = compare_eps(a.x, b.x, epsilon)
                    && compare_eps(a.y, b.y, epsilon)
                    && compare_eps(a.z, b.z, epsilon);
                stack.push_i32(eq as i32);
            }
            TokenKind::Dot => {
                let (a, b) = stack.pop_two_vec();
                stack.push_f32(a.dot(b));
            }
            TokenKind::Cross => {
                let (a, b) = stack.pop_two_vec();
                stack.push_vec(a.cross(b));
            }
            TokenKind::Normalize => {
                let v = stack.pop_vec();
                stack.push_vec(v.normalized());
            }
            TokenKind::Length => {
                let v = stack.pop_vec();
                stack.push_f32(v.length());
            }
            TokenKind::LengthSq => {
                let v = stack.pop_vec();
                stack.push_f32(v.length_squared());
            }

            TokenKind::IntToFloat => {
                let offset = t.index();
                let v = stack.peek_i32(offset);
                stack.replace_f32(offset, v as f32);
            }
            TokenKind::FloatToInt => {
                let offset = t.index();
                let v = stack.peek_f32(offset);
                stack.replace_i32(offset, v as i32);
            }

            // Structural tokens never survive compilation.
            TokenKind::LParen | TokenKind::RParen | TokenKind::Comma => {}
        }
    }

    match output {
        ValueType::Float => Value::Float(stack.pop_f32()),
        ValueType::Int => Value::Int(stack.pop_i32()),
        ValueType::Bool => Value::Bool(stack.pop_i32() != 0),
        ValueType::Vector => Value::Vector(stack.pop_vec()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/vm.rs"]
mod tests;
