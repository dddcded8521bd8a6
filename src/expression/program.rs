//! Compiled expression programs.

use std::fmt;

use crate::expression::codegen;
use crate::expression::parser;
use crate::expression::token::{TokenQueue, tables_are_consistent};
use crate::expression::vm::{self, EvalStack, RowAccess};
use crate::foundation::error::CompileError;
use crate::foundation::value::{InputDef, Value, ValueType};

/// An immutable compiled expression: the postfix token sequence plus the
/// declared output type.
///
/// Compilation fixes the input table; evaluation takes one row of values in
/// that table's order. A program never changes after compilation and can be
/// evaluated from any number of threads at once, producing the same output
/// for the same row every time.
#[derive(Clone, Debug)]
pub struct Program {
    code: TokenQueue,
    output: ValueType,
}

impl Program {
    /// Compile `text` against the declared `inputs` into a program
    /// evaluating to `output`.
    ///
    /// The error carries a message and, for parse errors, the byte offset
    /// of the offending character. Type errors and the stack-depth bound
    /// are reported without an offset.
    #[tracing::instrument(skip(text, inputs))]
    pub fn compile(
        text: &str,
        inputs: &[InputDef],
        output: ValueType,
    ) -> Result<Self, CompileError> {
        debug_assert!(tables_are_consistent());
        let mut infix = TokenQueue::new();
        parser::parse(text, inputs, &mut infix)?;
        let code = codegen::to_postfix(&infix, output)?;
        tracing::debug!(tokens = code.len(), "compiled expression");
        Ok(Self { code, output })
    }

    /// The declared output type.
    pub fn output_type(&self) -> ValueType {
        self.output
    }

    /// Evaluate for a single row of input values.
    pub fn eval<R: RowAccess + ?Sized>(&self, inputs: &R) -> Value {
        let mut stack = EvalStack::new();
        self.eval_with_stack(inputs, &mut stack)
    }

    /// Evaluate reusing a caller-held stack, the cheap path when iterating
    /// rows.
    pub fn eval_with_stack<R: RowAccess + ?Sized>(
        &self,
        inputs: &R,
        stack: &mut EvalStack,
    ) -> Value {
        vm::execute(&self.code, self.output, inputs, stack)
    }
}

impl fmt::Display for Program {
    // Token count, then each token's mnemonic with its payload.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.code, f)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/program.rs"]
mod tests;
