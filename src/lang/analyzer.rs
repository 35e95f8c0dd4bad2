use std::rc::Rc;

use tracing::{debug, instrument};

use crate::frontend::diagnostic::{Diagnostic, DiagnosticKind};
use crate::frontend::position::{Position, SourceFile};
use crate::frontend::token::{Token, TokenKind};
use crate::lang::node::{Block, Node, NodeKind};
use crate::lang::symbols::{Id, NOT_FOUND, SymbolTable};

type AnalyzeResult = Result<(), Diagnostic>;

/// Checks `program`, annotates its expressions with type ids and returns
/// the symbol table it built.
pub fn analyze(program: &mut Node) -> Result<SymbolTable, Diagnostic> {
    let mut analyzer = Analyzer::new();
    analyzer.analyze(program)?;
    Ok(analyzer.into_symbols())
}

/// Semantic analysis pass.
///
/// Walks statements in source order and stops at the first violation.
pub struct Analyzer {
    symbols: SymbolTable,
    /// Gotos whose label had not been declared when they were visited.
    pending_gotos: Vec<Token>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            symbols: SymbolTable::new(),
            pending_gotos: Vec::new(),
        }
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    fn error(node: &Node, message: &str) -> Diagnostic {
        Site::of(node).error(message)
    }

    fn token_error(token: &Token, message: &str) -> Diagnostic {
        Diagnostic::at_token(DiagnosticKind::Semantic, token, message)
    }

    #[instrument(level = "trace", skip_all)]
    pub fn analyze(&mut self, program: &mut Node) -> AnalyzeResult {
        let site = Site::of(program);
        let NodeKind::Program(stmts) = &mut program.kind else {
            return Err(site.error("expected a program"));
        };

        for stmt in stmts.iter_mut() {
            self.analyze_statement(stmt)?;
        }

        self.resolve_gotos()?;

        debug!(
            variables = self.symbols.vars.len(),
            labels = self.symbols.labels.len(),
            "analyzed program"
        );
        Ok(())
    }

    /// Labels are visible program-wide, so gotos are checked once every
    /// label has been seen.
    fn resolve_gotos(&mut self) -> AnalyzeResult {
        for label in &self.pending_gotos {
            if self.symbols.labels.check(label.lexeme()) == NOT_FOUND {
                return Err(Self::token_error(label, "label undefined"));
            }
        }
        self.pending_gotos.clear();
        Ok(())
    }

    fn analyze_statement(&mut self, stmt: &mut Node) -> AnalyzeResult {
        let site = Site::of(stmt);
        match &mut stmt.kind {
            NodeKind::LabelStmt(name) => self.analyze_label(name),
            NodeKind::VarStmt { name, init } => self.analyze_var(&site, name, init),
            NodeKind::ExprStmt(expr) => self.analyze_expr(expr),
            NodeKind::PrintStmt(expr) => {
                self.analyze_expr(expr)?;
                if !self.is_numeric(expr.type_id) {
                    return Err(Self::error(expr, "expected numerical type in 'print' statement"));
                }
                Ok(())
            }
            NodeKind::GotoStmt(label) => {
                if self.symbols.labels.check(label.lexeme()) == NOT_FOUND {
                    self.pending_gotos.push(label.clone());
                }
                Ok(())
            }
            NodeKind::IfStmt {
                cond,
                then,
                otherwise,
            } => {
                self.analyze_expr(cond)?;
                if !self.is_numeric(cond.type_id) {
                    return Err(Self::error(cond, "expected numerical type in 'if' condition"));
                }
                self.analyze_block(then)?;
                if let Some(block) = otherwise {
                    self.analyze_block(block)?;
                }
                Ok(())
            }
            _ => Err(site.error("unexpected statement")),
        }
    }

    fn analyze_block(&mut self, block: &mut Block) -> AnalyzeResult {
        for stmt in block.stmts.iter_mut() {
            self.analyze_statement(stmt)?;
        }
        Ok(())
    }

    fn analyze_label(&mut self, name: &Token) -> AnalyzeResult {
        let lexeme = name.lexeme();
        if self.symbols.labels.check(lexeme) != NOT_FOUND {
            return Err(Self::token_error(name, "label already declared"));
        }
        self.symbols.labels.create(lexeme, NOT_FOUND);
        Ok(())
    }

    fn analyze_var(
        &mut self,
        stmt: &Site,
        name: &Token,
        init: &mut Option<Box<Node>>,
    ) -> AnalyzeResult {
        let lexeme = name.lexeme();
        if self.symbols.vars.check(lexeme) != NOT_FOUND {
            return Err(Self::token_error(name, "variable already declared"));
        }
        let type_id = self.symbols.int_type();

        if let Some(expr) = init {
            self.analyze_expr(expr)?;
            if expr.type_id != Some(type_id) {
                return Err(stmt.error("variable and expression are of different type"));
            }
        }

        self.symbols.vars.create(lexeme, type_id);
        Ok(())
    }

    pub fn analyze_expr(&mut self, expr: &mut Node) -> AnalyzeResult {
        let site = Site::of(expr);
        let type_id = match &mut expr.kind {
            NodeKind::Literal(token) => self.literal_type(token)?,
            NodeKind::Identifier(token) => {
                let Some(var) = self.symbols.vars.get(token.lexeme()) else {
                    return Err(site.error("variable undefined"));
                };
                var.type_id
            }
            NodeKind::Unary { op, operand } => match op.kind {
                TokenKind::Bang | TokenKind::Tilde | TokenKind::Minus | TokenKind::Plus => {
                    self.analyze_expr(operand)?;
                    if !self.is_numeric(operand.type_id) {
                        return Err(site.error("expected numerical type in unary expression"));
                    }
                    type_of(operand)
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    if !operand.is_lvalue() {
                        let message = format!("expected lvalue operand for '{}'", op.kind);
                        return Err(site.error(&message));
                    }
                    self.analyze_expr(operand)?;
                    type_of(operand)
                }
                _ => return Err(site.error("unexpected unary operation")),
            },
            NodeKind::Binary { left, op, right } => {
                if !is_binary_operator(op.kind) {
                    return Err(site.error("unsupported binary operation"));
                }
                if op.is(TokenKind::Equal) && !left.is_lvalue() {
                    return Err(site.error("expected lvalue on left side of '='"));
                }

                self.analyze_expr(left)?;
                self.analyze_expr(right)?;

                let (lty, rty) = (type_of(left), type_of(right));
                if !self.is_compatible(lty, rty) {
                    return Err(site.error("left side of operation is incompatible with right side"));
                }
                self.wider_type(lty, rty)
            }
            NodeKind::Ternary {
                cond,
                then,
                otherwise,
            } => {
                self.analyze_expr(cond)?;
                if !self.is_numeric(cond.type_id) {
                    return Err(site.error("expected numeric type in ternary condition"));
                }

                self.analyze_expr(then)?;
                self.analyze_expr(otherwise)?;

                let (tty, oty) = (type_of(then), type_of(otherwise));
                if !self.is_compatible(tty, oty) {
                    return Err(site.error("incompatible branches of ternary operator"));
                }
                self.wider_type(tty, oty)
            }
            _ => return Err(site.error("unexpected expression")),
        };

        expr.type_id = Some(type_id);
        Ok(())
    }

    fn literal_type(&self, token: &Token) -> Result<Id, Diagnostic> {
        if !token.is(TokenKind::IntLiteral) {
            return Err(Self::token_error(token, "unexpected literal token"));
        }
        if token.lexeme().parse::<i64>().is_err() {
            return Err(Self::token_error(token, "integer literal out of range"));
        }
        Ok(self.symbols.int_type())
    }

    // Type rules. With `int` as the only type these are trivial, but they are
    // the single place promotion rules would go.

    fn is_numeric(&self, type_id: Option<Id>) -> bool {
        type_id == Some(self.symbols.int_type())
    }

    fn is_compatible(&self, left: Id, right: Id) -> bool {
        left == right
    }

    fn wider_type(&self, left: Id, _right: Id) -> Id {
        left
    }
}

/// Type of an analyzed child. Analysis always assigns one before this runs.
fn type_of(node: &Node) -> Id {
    node.type_id.unwrap_or(NOT_FOUND)
}

/// Span of a node, captured before its children are borrowed mutably.
struct Site {
    file: Rc<SourceFile>,
    start: Position,
    end: Position,
}

impl Site {
    fn of(node: &Node) -> Site {
        Site {
            file: node.file.clone(),
            start: node.start,
            end: node.end,
        }
    }

    fn error(&self, message: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::Semantic,
            self.file.clone(),
            self.start,
            self.end,
            message,
        )
    }
}

fn is_binary_operator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::LShift
            | TokenKind::RShift
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::EqualEqual
            | TokenKind::BangEqual
            | TokenKind::Ampersand
            | TokenKind::Caret
            | TokenKind::Pipe
            | TokenKind::AmpersandAmpersand
            | TokenKind::PipePipe
            | TokenKind::Equal
    )
}
