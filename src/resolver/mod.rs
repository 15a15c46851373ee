//! Scope-aware symbol resolution.
//!
//! This module maps every name in a parsed unit to a storage location
//! before the unit is handed to the lowering collaborator. It maintains:
//!
//! - A stack of lexical frames with shadow-and-restore semantics
//! - Per-unit slot allocation for parameters, loop variables, and
//!   `var` bindings
//! - Global resolution against the persistent program state
//!
//! Unresolved variables and callees abort the current unit only.

pub mod resolver;

#[cfg(test)]
mod tests;
