//! Infix to postfix conversion with operator type resolution.
//!
//! A shunting pass over the parsed stream. While operators move to the
//! output it simulates the evaluation stack's types and depth: each popped
//! operator is replaced by the variant specialized to its actual operand
//! types, with int-to-float conversion tokens inserted where an operand
//! needs widening. The emitted program therefore runs without any type
//! dispatch, and a depth bound proven here lets the VM skip capacity checks.

use smallvec::SmallVec;

use crate::expression::token::{SlotType, Token, TokenKind, TokenQueue, resolve_overload};
use crate::expression::vm::MAX_STACK;
use crate::foundation::error::CompileError;
use crate::foundation::value::ValueType;

/// Convert the infix stream to a postfix program evaluating to
/// `output_type`. Type errors and stack-depth errors surface here; the
/// returned program is ready to execute.
pub(crate) fn to_postfix(
    infix: &TokenQueue,
    output_type: ValueType,
) -> Result<TokenQueue, CompileError> {
    let mut cg = Codegen {
        out: TokenQueue::new(),
        types: SmallVec::new(),
        depth: 0,
    };
    let mut ops = TokenQueue::new();

    for t in infix.iter() {
        if t.kind.is_operand() {
            cg.push_operand(t);
        } else if t.kind.is_operator_or_function() {
            // Pop anything of equal or higher precedence, then push. Equal
            // precedence popping makes every operator left-associative.
            let precedence = t.kind.precedence();
            while let Some(top) = ops.last() {
                if top.kind == TokenKind::LParen || top.kind.precedence() < precedence {
                    break;
                }
                cg.emit_op(top)?;
                ops.pop_last();
            }
            ops.push(t);
        } else if t.kind == TokenKind::LParen {
            ops.push(t);
        } else if matches!(t.kind, TokenKind::RParen | TokenKind::Comma) {
            while let Some(top) = ops.last() {
                if top.kind == TokenKind::LParen {
                    break;
                }
                cg.emit_op(top)?;
                ops.pop_last();
            }
            // A comma keeps the paren; later arguments still nest in it.
            if t.kind == TokenKind::RParen {
                ops.pop_last();
            }
        }

        if cg.depth > MAX_STACK {
            return Err(CompileError::new(
                "expression uses too much stack space",
                None,
            ));
        }
    }

    while let Some(top) = ops.last() {
        cg.emit_op(top)?;
        ops.pop_last();
    }

    cg.coerce_output(output_type)?;
    Ok(cg.out)
}

struct Codegen {
    out: TokenQueue,
    /// Types of the values the program-so-far would leave on the stack,
    /// bottom first.
    types: SmallVec<[SlotType; 16]>,
    /// Same stack measured in scalar slots.
    depth: usize,
}

impl Codegen {
    fn push_operand(&mut self, t: Token) {
        let ty = match t.kind {
            TokenKind::ConstFloat | TokenKind::VarFloat => SlotType::Float,
            TokenKind::ConstInt | TokenKind::VarInt | TokenKind::VarBool => SlotType::Int,
            _ => SlotType::Vec,
        };
        self.out.push(t);
        self.types.push(ty);
        self.depth += ty.slots();
    }

    fn peek_type(&self, from_top: usize) -> Option<SlotType> {
        self.types
            .len()
            .checked_sub(1 + from_top)
            .map(|i| self.types[i])
    }

    /// Specialize `t` to the operand types on the simulated stack, emit any
    /// conversions it needs, then emit it (payload preserved) and replace
    /// the operand types with the result type.
    fn emit_op(&mut self, t: Token) -> Result<(), CompileError> {
        match t.kind.arity() {
            1 => {
                let Some(mut arg) = self.peek_type(0) else {
                    return Err(self.type_error(t));
                };
                let Some(op) = self.resolve1(t.kind, &mut arg) else {
                    return Err(self.type_error(t));
                };
                let result = op.result_type().unwrap_or(SlotType::Float);
                self.out.push(t.retyped(op));
                self.depth -= arg.slots();
                self.depth += result.slots();
                self.types.pop();
                self.types.push(result);
            }
            3 => {
                let (Some(mut a1), Some(mut a2), Some(mut a3)) =
                    (self.peek_type(2), self.peek_type(1), self.peek_type(0))
                else {
                    return Err(self.type_error(t));
                };
                let Some(op) = self.resolve3(t.kind, &mut a1, &mut a2, &mut a3) else {
                    return Err(self.type_error(t));
                };
                let result = op.result_type().unwrap_or(SlotType::Float);
                self.out.push(t.retyped(op));
                self.depth -= a1.slots() + a2.slots() + a3.slots();
                self.depth += result.slots();
                self.types.truncate(self.types.len() - 3);
                self.types.push(result);
            }
            _ => {
                // Everything else on the operator stack takes two operands.
                let (Some(mut first), Some(mut second)) =
                    (self.peek_type(1), self.peek_type(0))
                else {
                    return Err(self.type_error(t));
                };
                let Some(op) = self.resolve2(t.kind, &mut first, &mut second) else {
                    return Err(self.type_error(t));
                };
                let result = op.result_type().unwrap_or(SlotType::Float);
                self.out.push(t.retyped(op));
                self.depth -= first.slots() + second.slots();
                self.depth += result.slots();
                self.types.truncate(self.types.len() - 2);
                self.types.push(result);
            }
        }
        Ok(())
    }

    /// Exact overload, or widen an int operand when only a float version
    /// exists. Int to float is the sole implicit conversion.
    fn resolve1(&mut self, kind: TokenKind, arg: &mut SlotType) -> Option<TokenKind> {
        if let Some(op) = resolve_overload(kind, &[*arg]) {
            return Some(op);
        }
        if *arg == SlotType::Int
            && let Some(op) = resolve_overload(kind, &[SlotType::Float])
        {
            self.convert_at(0);
            *arg = SlotType::Float;
            return Some(op);
        }
        None
    }

    fn resolve2(
        &mut self,
        kind: TokenKind,
        first: &mut SlotType,
        second: &mut SlotType,
    ) -> Option<TokenKind> {
        if let Some(op) = resolve_overload(kind, &[*first, *second]) {
            return Some(op);
        }

        // Widen the first operand to match the second. It sits below the
        // second on the stack, so the conversion reaches past it.
        if *first == SlotType::Int && *second == SlotType::Float {
            if let Some(op) = resolve_overload(kind, &[SlotType::Float, SlotType::Float]) {
                self.convert_at(second.slots());
                *first = SlotType::Float;
                return Some(op);
            }
        }
        // Or widen the second (stack top) to match the first.
        if *second == SlotType::Int && *first == SlotType::Float {
            if let Some(op) = resolve_overload(kind, &[SlotType::Float, SlotType::Float]) {
                self.convert_at(0);
                *second = SlotType::Float;
                return Some(op);
            }
        }
        // Both int, only a float version available: widen both.
        if *first == SlotType::Int && *second == SlotType::Int {
            if let Some(op) = resolve_overload(kind, &[SlotType::Float, SlotType::Float]) {
                self.convert_at(1);
                self.convert_at(0);
                *first = SlotType::Float;
                *second = SlotType::Float;
                return Some(op);
            }
        }
        // Int paired with a vector widens to the float/vector forms.
        if *first == SlotType::Int && *second == SlotType::Vec {
            if let Some(op) = resolve_overload(kind, &[SlotType::Float, SlotType::Vec]) {
                self.convert_at(second.slots());
                *first = SlotType::Float;
                return Some(op);
            }
        }
        if *first == SlotType::Vec && *second == SlotType::Int {
            if let Some(op) = resolve_overload(kind, &[SlotType::Vec, SlotType::Float]) {
                self.convert_at(0);
                *second = SlotType::Float;
                return Some(op);
            }
        }

        None
    }

    fn resolve3(
        &mut self,
        kind: TokenKind,
        a1: &mut SlotType,
        a2: &mut SlotType,
        a3: &mut SlotType,
    ) -> Option<TokenKind> {
        if let Some(op) = resolve_overload(kind, &[*a1, *a2, *a3]) {
            return Some(op);
        }

        // All-scalar call of an all-float function: widen each int.
        if a1.is_scalar()
            && a2.is_scalar()
            && a3.is_scalar()
            && let Some(op) = resolve_overload(kind, &[SlotType::Float; 3])
        {
            if *a1 == SlotType::Int {
                self.convert_at(2);
                *a1 = SlotType::Float;
            }
            if *a2 == SlotType::Int {
                self.convert_at(1);
                *a2 = SlotType::Float;
            }
            if *a3 == SlotType::Int {
                self.convert_at(0);
                *a3 = SlotType::Float;
            }
            return Some(op);
        }

        // Keep the first argument as-is and widen the trailing scalars.
        // This is what lets an int condition select between float branches.
        if a2.is_scalar()
            && a3.is_scalar()
            && let Some(op) = resolve_overload(kind, &[*a1, SlotType::Float, SlotType::Float])
        {
            if *a2 == SlotType::Int {
                self.convert_at(1);
                *a2 = SlotType::Float;
            }
            if *a3 == SlotType::Int {
                self.convert_at(0);
                *a3 = SlotType::Float;
            }
            return Some(op);
        }

        None
    }

    /// Emit an int-to-float conversion of the value `offset` slots below the
    /// stack top.
    fn convert_at(&mut self, offset: usize) {
        self.out
            .push(Token::with_int(TokenKind::IntToFloat, offset as i32));
    }

    fn type_error(&self, t: Token) -> CompileError {
        let name = t.kind.name();
        match t.kind.arity() {
            1 => {
                if self.peek_type(0) == Some(SlotType::Vec) {
                    return CompileError::new(
                        format!("{name}: cannot perform this function on a vector"),
                        None,
                    );
                }
            }
            2 => {
                if let (Some(a), Some(b)) = (self.peek_type(0), self.peek_type(1)) {
                    match (a == SlotType::Vec, b == SlotType::Vec) {
                        (true, false) | (false, true) => {
                            return CompileError::new(
                                format!(
                                    "{name}: cannot mix vector and non-vector types in this operation"
                                ),
                                None,
                            );
                        }
                        (true, true) => {
                            return CompileError::new(
                                format!("{name}: cannot perform this operation on a vector"),
                                None,
                            );
                        }
                        _ => {}
                    }
                }
            }
            3 => {
                return CompileError::new(format!("{name}: incorrect argument type"), None);
            }
            _ => {}
        }
        CompileError::new(format!("{name}: wrong data type"), None)
    }

    /// Append the conversions that make the final stack value match the
    /// declared output type. `top` is read once; each step below relies on
    /// the pre-coercion type.
    fn coerce_output(&mut self, output: ValueType) -> Result<(), CompileError> {
        let Some(&top) = self.types.last() else {
            return Err(CompileError::new("expression produced no value", None));
        };

        if top == SlotType::Int && output != ValueType::Bool && output != ValueType::Int {
            self.out.push(Token::with_int(TokenKind::IntToFloat, 0));
        }
        if top == SlotType::Vec && output != ValueType::Vector {
            // Scalar outputs take the vector's x component.
            self.out.push(Token::with_int(TokenKind::Member, 2));
            self.depth -= 2;
        }
        if output == ValueType::Vector && top != SlotType::Vec {
            // Pad the scalar to the vector (value, 0, 0).
            self.out.push(Token::with_float(TokenKind::ConstFloat, 0.0));
            self.out.push(Token::with_float(TokenKind::ConstFloat, 0.0));
            self.depth += 2;
        }
        if top != SlotType::Int && (output == ValueType::Bool || output == ValueType::Int) {
            self.out.push(Token::with_int(TokenKind::FloatToInt, 0));
        }

        if self.depth > MAX_STACK {
            return Err(CompileError::new(
                "expression uses too much stack space",
                None,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/codegen.rs"]
mod tests;
