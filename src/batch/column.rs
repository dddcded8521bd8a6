//! Columnar row storage for batch evaluation.

use crate::expression::vm::RowAccess;
use crate::foundation::error::{RowexprError, RowexprResult};
use crate::foundation::value::{ValueType, Vec3};

/// One input's values for every row, stored densely by type.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Float values.
    Float(Vec<f32>),
    /// Integer values.
    Int(Vec<i32>),
    /// Boolean values.
    Bool(Vec<bool>),
    /// Vector values.
    Vector(Vec<Vec3>),
}

impl Column {
    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Vector(v) => v.len(),
        }
    }

    /// True when the column holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type of the column.
    pub fn value_type(&self) -> ValueType {
        match self {
            Column::Float(_) => ValueType::Float,
            Column::Int(_) => ValueType::Int,
            Column::Bool(_) => ValueType::Bool,
            Column::Vector(_) => ValueType::Vector,
        }
    }
}

/// Equal-length columns of row inputs, positionally matching an input
/// declaration table.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    columns: Vec<Column>,
    rows: usize,
}

impl Batch {
    /// Build a batch from columns, which must all have the same length.
    pub fn new(columns: Vec<Column>) -> RowexprResult<Self> {
        let rows = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(RowexprError::batch(format!(
                "column length mismatch: expected {rows} rows, found {}",
                bad.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Number of rows shared by every column.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The columns, in input-table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Cursor over one row.
    pub fn row(&self, row: usize) -> BatchRow<'_> {
        BatchRow {
            columns: &self.columns,
            row,
        }
    }
}

/// One row of a [`Batch`], readable through [`RowAccess`].
#[derive(Clone, Copy, Debug)]
pub struct BatchRow<'a> {
    columns: &'a [Column],
    row: usize,
}

impl RowAccess for BatchRow<'_> {
    fn float(&self, index: usize) -> f32 {
        match self.columns.get(index) {
            Some(Column::Float(v)) => v.get(self.row).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn int(&self, index: usize) -> i32 {
        match self.columns.get(index) {
            Some(Column::Int(v)) => v.get(self.row).copied().unwrap_or(0),
            _ => 0,
        }
    }

    fn boolean(&self, index: usize) -> bool {
        match self.columns.get(index) {
            Some(Column::Bool(v)) => v.get(self.row).copied().unwrap_or(false),
            _ => false,
        }
    }

    fn vector(&self, index: usize) -> Vec3 {
        match self.columns.get(index) {
            Some(Column::Vector(v)) => v.get(self.row).copied().unwrap_or(Vec3::ZERO),
            _ => Vec3::ZERO,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/column.rs"]
mod tests;
