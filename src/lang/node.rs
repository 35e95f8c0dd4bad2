use std::rc::Rc;

use crate::frontend::position::{Position, SourceFile};
use crate::frontend::token::Token;
use crate::lang::symbols::Id;

/// A `{ ... }` statement list belonging to an `if`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Node>,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Expressions
    Literal(Token),
    Identifier(Token),
    Unary {
        op: Token,
        operand: Box<Node>,
    },
    Binary {
        left: Box<Node>,
        op: Token,
        right: Box<Node>,
    },
    Ternary {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },

    // Statements
    ExprStmt(Box<Node>),
    LabelStmt(Token),
    VarStmt {
        name: Token,
        init: Option<Box<Node>>,
    },
    PrintStmt(Box<Node>),
    GotoStmt(Token),
    IfStmt {
        cond: Box<Node>,
        then: Block,
        otherwise: Option<Block>,
    },

    Program(Vec<Node>),
}

/// An AST node. Children are owned exclusively by their parent.
///
/// `type_id` starts out `None` and is filled in for expressions by the
/// analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub start: Position,
    pub end: Position,
    pub file: Rc<SourceFile>,
    pub type_id: Option<Id>,
    height: usize,
}

impl Node {
    pub fn new(kind: NodeKind, start: Position, end: Position, file: Rc<SourceFile>) -> Self {
        let height = 1 + Node::child_height(&kind);
        Node {
            kind,
            start,
            end,
            file,
            type_id: None,
            height,
        }
    }

    /// Tallest expression chain below `kind`. Blocks are not counted.
    fn child_height(kind: &NodeKind) -> usize {
        match kind {
            NodeKind::Literal(_)
            | NodeKind::Identifier(_)
            | NodeKind::LabelStmt(_)
            | NodeKind::GotoStmt(_)
            | NodeKind::Program(_) => 0,
            NodeKind::Unary { operand: child, .. }
            | NodeKind::ExprStmt(child)
            | NodeKind::PrintStmt(child)
            | NodeKind::IfStmt { cond: child, .. } => child.height,
            NodeKind::VarStmt { init, .. } => init.as_ref().map_or(0, |init| init.height),
            NodeKind::Binary { left, right, .. } => left.height.max(right.height),
            NodeKind::Ternary {
                cond,
                then,
                otherwise,
            } => cond.height.max(then.height).max(otherwise.height),
        }
    }

    /// Number of nodes on the longest path down through expression children.
    /// A literal has height 1.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn literal(token: Token) -> Self {
        let (start, end, file) = (token.start, token.end, token.file.clone());
        Node::new(NodeKind::Literal(token), start, end, file)
    }

    pub fn identifier(token: Token) -> Self {
        let (start, end, file) = (token.start, token.end, token.file.clone());
        Node::new(NodeKind::Identifier(token), start, end, file)
    }

    pub fn unary(op: Token, operand: Node) -> Self {
        let (start, end, file) = (op.start, operand.end, op.file.clone());
        Node::new(
            NodeKind::Unary {
                op,
                operand: Box::new(operand),
            },
            start,
            end,
            file,
        )
    }

    pub fn binary(left: Node, op: Token, right: Node) -> Self {
        let (start, end, file) = (left.start, right.end, left.file.clone());
        Node::new(
            NodeKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            start,
            end,
            file,
        )
    }

    pub fn ternary(cond: Node, then: Node, otherwise: Node) -> Self {
        let (start, end, file) = (cond.start, otherwise.end, cond.file.clone());
        Node::new(
            NodeKind::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            start,
            end,
            file,
        )
    }

    /// Builds a program node. Its span runs from the first to the last
    /// statement; an empty program takes the span of `eof`.
    pub fn program(stmts: Vec<Node>, eof: &Token) -> Self {
        let (start, end, file) = match (stmts.first(), stmts.last()) {
            (Some(first), Some(last)) => (first.start, last.end, first.file.clone()),
            _ => (eof.start, eof.end, eof.file.clone()),
        };
        Node::new(NodeKind::Program(stmts), start, end, file)
    }

    /// Assignable expressions. Only a bare identifier qualifies.
    pub fn is_lvalue(&self) -> bool {
        matches!(self.kind, NodeKind::Identifier(_))
    }

    /// Statements of a `Program` node, empty for anything else.
    pub fn statements(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Program(stmts) => stmts,
            _ => &[],
        }
    }

    /// The source text this node spans.
    pub fn text(&self) -> &str {
        self.file.slice(self.start, self.end)
    }
}
