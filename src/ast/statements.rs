use crate::Span;

use super::{ast::NodeId, expressions::Expr};

/// The closed statement variant.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `var id = expr ;` - at the top level of an anonymous unit this
    /// declares a persistent global, otherwise a frame-local binding.
    VarDecl {
        id: NodeId,
        name: String,
        init: Expr,
        span: Span,
    },
    /// `id = expr ;`
    Assign {
        id: NodeId,
        name: String,
        value: Expr,
        span: Span,
    },
    /// `return expr ;`
    Return {
        value: Expr,
        span: Span,
    },
    Expression {
        expr: Expr,
        span: Span,
    },
    /// `{ stmt* }` - declarations inside are scoped to the block.
    Block {
        id: NodeId,
        body: Vec<Stmt>,
        span: Span,
    },
    /// Brace-bodied conditional; `else` is optional, unlike the
    /// expression form.
    If {
        cond: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
        span: Span,
    },
    /// Brace-bodied bounded loop.
    For {
        var_id: NodeId,
        var_name: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Box<Stmt>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::VarDecl { span, .. } => span,
            Stmt::Assign { span, .. } => span,
            Stmt::Return { span, .. } => span,
            Stmt::Expression { span, .. } => span,
            Stmt::Block { span, .. } => span,
            Stmt::If { span, .. } => span,
            Stmt::For { span, .. } => span,
        }
    }
}
