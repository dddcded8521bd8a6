//! Whole-batch expression evaluation.

use rayon::prelude::*;

use crate::batch::column::{Batch, Column};
use crate::expression::program::Program;
use crate::expression::vm::EvalStack;
use crate::foundation::error::{CompileError, RowexprError, RowexprResult};
use crate::foundation::value::{InputDef, Value, ValueType, Vec3};

/// Rows handed to one worker at a time. Each task reuses a single
/// evaluation stack across its whole chunk.
pub const MIN_GRAIN_SIZE: usize = 512;

/// A compiled expression bound to its input declarations, evaluated over
/// whole batches into an output column.
///
/// Blank expression text compiles to no program at all; running one fills
/// the output column with the output type's default value.
#[derive(Clone, Debug)]
pub struct BatchEval {
    program: Option<Program>,
    inputs: Vec<InputDef>,
    output: ValueType,
}

impl BatchEval {
    /// Compile `text` for batch evaluation against the declared inputs.
    #[tracing::instrument(skip(text, inputs))]
    pub fn new(
        text: &str,
        inputs: Vec<InputDef>,
        output: ValueType,
    ) -> Result<Self, CompileError> {
        let program = if text.trim().is_empty() {
            None
        } else {
            Some(Program::compile(text, &inputs, output)?)
        };
        Ok(Self {
            program,
            inputs,
            output,
        })
    }

    /// The compiled program, or `None` for blank expression text.
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// The input declarations, in column order.
    pub fn inputs(&self) -> &[InputDef] {
        &self.inputs
    }

    /// Declared type of the output column.
    pub fn output_type(&self) -> ValueType {
        self.output
    }

    /// Evaluate every row of `batch`, producing a column of the declared
    /// output type with one value per row.
    #[tracing::instrument(skip(self, batch), fields(rows = batch.rows()))]
    pub fn run(&self, batch: &Batch) -> RowexprResult<Column> {
        self.check_columns(batch)?;
        let rows = batch.rows();

        let Some(program) = &self.program else {
            return Ok(default_column(self.output, rows));
        };
        tracing::debug!(chunks = rows.div_ceil(MIN_GRAIN_SIZE), "dispatching batch");

        let column = match self.output {
            ValueType::Float => {
                let mut out = vec![0.0f32; rows];
                fill(&mut out, batch, program, |v| match v {
                    Value::Float(x) => x,
                    _ => 0.0,
                });
                Column::Float(out)
            }
            ValueType::Int => {
                let mut out = vec![0i32; rows];
                fill(&mut out, batch, program, |v| match v {
                    Value::Int(x) => x,
                    _ => 0,
                });
                Column::Int(out)
            }
            ValueType::Bool => {
                let mut out = vec![false; rows];
                fill(&mut out, batch, program, |v| match v {
                    Value::Bool(x) => x,
                    _ => false,
                });
                Column::Bool(out)
            }
            ValueType::Vector => {
                let mut out = vec![Vec3::ZERO; rows];
                fill(&mut out, batch, program, |v| match v {
                    Value::Vector(x) => x,
                    _ => Vec3::ZERO,
                });
                Column::Vector(out)
            }
        };
        Ok(column)
    }

    fn check_columns(&self, batch: &Batch) -> RowexprResult<()> {
        let columns = batch.columns();
        if columns.len() != self.inputs.len() {
            return Err(RowexprError::batch(format!(
                "expected {} input columns, found {}",
                self.inputs.len(),
                columns.len()
            )));
        }
        for (input, column) in self.inputs.iter().zip(columns) {
            if column.value_type() != input.value_type {
                return Err(RowexprError::batch(format!(
                    "column for input '{}' holds {} values, declared {}",
                    input.name,
                    column.value_type(),
                    input.value_type
                )));
            }
        }
        Ok(())
    }
}

/// Run `program` over every row, writing unwrapped results into `out`.
/// Chunks run in parallel; each worker task keeps one stack for its chunk.
fn fill<T, F>(out: &mut [T], batch: &Batch, program: &Program, unwrap: F)
where
    T: Send,
    F: Fn(Value) -> T + Sync,
{
    out.par_chunks_mut(MIN_GRAIN_SIZE)
        .enumerate()
        .for_each_init(EvalStack::new, |stack, (chunk, slots)| {
            let base = chunk * MIN_GRAIN_SIZE;
            for (i, slot) in slots.iter_mut().enumerate() {
                *slot = unwrap(program.eval_with_stack(&batch.row(base + i), stack));
            }
        });
}

fn default_column(output: ValueType, rows: usize) -> Column {
    match output {
        ValueType::Float => Column::Float(vec![0.0; rows]),
        ValueType::Int => Column::Int(vec![0; rows]),
        ValueType::Bool => Column::Bool(vec![false; rows]),
        ValueType::Vector => Column::Vector(vec![Vec3::ZERO; rows]),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/run.rs"]
mod tests;
