//! Crate error taxonomy.

/// Convenience result type used across rowexpr.
pub type RowexprResult<T> = Result<T, RowexprError>;

/// Top-level error taxonomy used by the public APIs.
#[derive(thiserror::Error, Debug)]
pub enum RowexprError {
    /// Expression failed to compile (syntax, type or stack-depth error).
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Batch data does not match the compiled input declarations.
    #[error("batch error: {0}")]
    Batch(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RowexprError {
    /// Build a [`RowexprError::Batch`] value.
    pub fn batch(msg: impl Into<String>) -> Self {
        Self::Batch(msg.into())
    }
}

/// A compilation failure: one message, optionally positioned in the source.
///
/// Parse errors carry the byte offset of the failure and their message ends
/// with the unparsed tail of the source text, so hosts can render a
/// caret-positioned diagnostic. Type and stack-depth errors from code
/// generation have no meaningful offset.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileError {
    message: String,
    offset: Option<usize>,
}

impl CompileError {
    pub(crate) fn new(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// The full diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset of the failure in the source text, when known.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
