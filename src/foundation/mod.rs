//! Shared foundation types: errors and the public value model.

pub(crate) mod error;
pub(crate) mod value;
