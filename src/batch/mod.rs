//! Columnar batches and parallel whole-batch evaluation.

pub(crate) mod column;
pub(crate) mod run;
