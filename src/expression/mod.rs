//! Expression compilation and evaluation: text to infix tokens, infix to a
//! type-specialized postfix program, and the stack VM that runs it.

pub(crate) mod codegen;
pub(crate) mod parser;
pub(crate) mod program;
pub(crate) mod token;
pub(crate) mod vm;
