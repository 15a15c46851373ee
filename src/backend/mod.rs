//! The lowering/execution collaborator seam.
//!
//! Code generation is not this crate's business: the driver only needs
//! something that can turn a resolved unit into an executable handle and
//! run zero-argument handles. This module defines:
//!
//! - The `Backend` trait the driver is generic over
//! - `LoweringError`/`RuntimeError`, the collaborator's failure types
//! - `Interp`, a reference tree-walking evaluator that fulfils the
//!   contract and carries the mock native library for `extern`s

use thiserror::Error;

use crate::{ast::ast::FunctionUnit, resolver::resolver::ResolutionTable};

pub mod interp;


/// The language is single-scalar-typed.
pub type Value = f64;

#[derive(Error, Debug, Clone)]
#[error("{reason}")]
pub struct LoweringError {
    pub reason: String,
}

impl LoweringError {
    pub fn new(reason: impl Into<String>) -> Self {
        LoweringError {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("{reason}")]
pub struct RuntimeError {
    pub reason: String,
}

impl RuntimeError {
    pub fn new(reason: impl Into<String>) -> Self {
        RuntimeError {
            reason: reason.into(),
        }
    }
}

/// Contract with the external lowering and execution collaborator.
///
/// `lower` receives a well-formed unit plus its symbol-resolution table
/// and either produces a callable handle or fails with a human-readable
/// reason (unknown function, arity mismatch, invalid operator use).
/// `execute` runs a zero-argument handle. `release` frees a handle's
/// backing resources; named definitions stay callable by name.
pub trait Backend {
    type Handle;

    fn lower(
        &mut self,
        unit: &FunctionUnit,
        symbols: &ResolutionTable,
    ) -> Result<Self::Handle, LoweringError>;

    fn execute(&mut self, handle: &Self::Handle) -> Result<Value, RuntimeError>;

    fn release(&mut self, handle: Self::Handle);
}
