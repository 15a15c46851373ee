use std::collections::{HashMap, HashSet};

use crate::ast::ast::Prototype;

/// Persistent cross-unit program state: the prototypes of every function
/// registered so far (so calls resolve before the callee's body exists)
/// and the names of global variables created by executed units.
///
/// Initialized empty, grown as units integrate, never shrunk - entries
/// survive for the life of the process even when a unit's body later
/// fails to lower. Single-writer: only the driver mutates it, strictly
/// between units.
#[derive(Default)]
pub struct ProgramState {
    functions: HashMap<String, Prototype>,
    globals: HashSet<String>,
}

impl ProgramState {
    pub fn new() -> Self {
        ProgramState::default()
    }

    /// Registers a prototype, overwriting any previous one of the same
    /// name.
    pub fn register_function(&mut self, prototype: Prototype) {
        self.functions.insert(prototype.name.clone(), prototype);
    }

    pub fn function(&self, name: &str) -> Option<&Prototype> {
        self.functions.get(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn register_global(&mut self, name: String) {
        self.globals.insert(name);
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }
}
