//! rowexpr compiles small typed expressions and evaluates them per row
//! over large batches.
//!
//! The API is program-oriented:
//!
//! - Declare inputs as an ordered table of [`InputDef`]s
//! - Compile expression text into an immutable [`Program`]
//! - Evaluate rows one at a time through [`RowAccess`], or run whole
//!   columnar [`Batch`]es in parallel with [`BatchEval`]
//!
//! Compilation resolves every operator to a type-specialized form, so
//! evaluation performs no type checks at all: a program is a flat postfix
//! token sequence interpreted over a fixed-size stack of 32-bit slots.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod batch;
mod expression;
mod foundation;

pub use crate::foundation::error::{CompileError, RowexprError, RowexprResult};
pub use crate::foundation::value::{InputDef, Value, ValueType, Vec3};

pub use crate::batch::column::{Batch, BatchRow, Column};
pub use crate::batch::run::{BatchEval, MIN_GRAIN_SIZE};
pub use crate::expression::program::Program;
pub use crate::expression::vm::{EvalStack, MAX_STACK, RowAccess};
