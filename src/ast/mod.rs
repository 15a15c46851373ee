/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Prototypes, function units, and node identifiers
/// - expressions: The closed expression variant
/// - statements: The closed statement variant
pub mod ast;
pub mod expressions;
pub mod statements;
