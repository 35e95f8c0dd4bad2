use tracing::{debug, instrument};

use crate::frontend::diagnostic::{Diagnostic, DiagnosticKind};
use crate::frontend::position::{Position, SourceFile};
use crate::frontend::token::{Token, TokenKind};
use crate::lang::node::{Block, Node, NodeKind};

type ParseResult = Result<Node, Diagnostic>;

/// Deepest recursion the parser enters for parentheses, prefix operators,
/// right-associative operators and nested blocks.
pub const MAX_NESTING: usize = 32;

/// Tallest expression tree the parser builds. Left-associative chains are
/// parsed in a loop but still grow the tree one level per operator.
pub const MAX_EXPR_HEIGHT: usize = 256;

/// Parses a token stream into a `Program` node.
pub fn parse(tokens: Vec<Token>) -> ParseResult {
    Parser::new(tokens)?.parse()
}

/// Recursive-descent parser for smol.
///
/// Expressions are parsed by precedence climbing, one method per level:
///
/// ```text
/// assign   := ternary ['=' assign]
/// ternary  := or ['?' ternary ':' ternary]
/// or       := and ('||' and)*
/// and      := bitor ('&&' bitor)*
/// bitor    := bitxor ('|' bitxor)*
/// bitxor   := bitand ('^' bitand)*
/// bitand   := equality ('&' equality)*
/// equality := relation (('==' | '!=') relation)*
/// relation := shift (('<' | '<=' | '>' | '>=') shift)*
/// shift    := additive (('<<' | '>>') additive)*
/// additive := term (('+' | '-') term)*
/// term     := unary (('*' | '/' | '%') unary)*
/// unary    := ('!' | '~' | '-' | '+' | '--' | '++') unary | group
/// group    := '(' assign ')' | primary
/// primary  := int-literal | identifier
/// ```
///
/// The left side of `=` is whatever `ternary` produced; rejecting
/// non-assignable targets is the analyzer's job.
///
/// Nesting is bounded by [`MAX_NESTING`] and tree height by
/// [`MAX_EXPR_HEIGHT`], so later passes can walk the tree recursively.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Creates a parser over lexer output, which must end with `Eof`.
    pub fn new(tokens: Vec<Token>) -> Result<Self, Diagnostic> {
        match tokens.last() {
            Some(last) if last.is(TokenKind::Eof) => Ok(Parser {
                tokens,
                pos: 0,
                depth: 0,
            }),
            Some(last) => Err(Diagnostic::at_token(
                DiagnosticKind::Syntax,
                last,
                "token stream is not terminated by EOF",
            )),
            // Without any token there is no source to attribute an error to.
            None => Err(Diagnostic::new(
                DiagnosticKind::Syntax,
                SourceFile::new("<unknown>", ""),
                Position::START,
                Position::START,
                "empty token stream",
            )),
        }
    }

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof and `advance` never moves past it.
        &self.tokens[self.pos]
    }

    /// The token after the current one.
    ///
    /// Only meaningful when the current token is not `Eof`.
    fn peek_next(&self) -> Option<&Token> {
        debug_assert!(!self.current().is(TokenKind::Eof));
        self.tokens.get(self.pos + 1)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    /// Consumes the current token and returns it. Stays put on `Eof`.
    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is(TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn error(&self, start: Position, end: Position, message: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::Syntax,
            self.current().file.clone(),
            start,
            end,
            message,
        )
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        what: &str,
        parse: fn(&mut Self) -> Result<T, Diagnostic>,
    ) -> Result<T, Diagnostic> {
        if self.depth >= MAX_NESTING {
            let token = self.current();
            return Err(self.error(
                token.start,
                token.end,
                &format!("{} nested too deeply", what),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Rejects expressions taller than [`MAX_EXPR_HEIGHT`].
    fn bounded(&self, node: Node) -> ParseResult {
        if node.height() > MAX_EXPR_HEIGHT {
            return Err(self.error(node.start, node.end, "expression nested too deeply"));
        }
        Ok(node)
    }

    /// Parses a complete program. Anything left before `Eof` is an error.
    #[instrument(level = "trace", skip_all)]
    pub fn parse(&mut self) -> ParseResult {
        let program = self.parse_program()?;

        let token = self.current();
        if !token.is(TokenKind::Eof) {
            return Err(self.error(token.start, token.end, "expected EOF"));
        }

        debug!(statements = program.statements().len(), "parsed program");
        Ok(program)
    }

    fn parse_program(&mut self) -> ParseResult {
        let mut stmts = Vec::new();

        while !self.check(TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
        }

        Ok(Node::program(stmts, self.current()))
    }

    fn parse_statement(&mut self) -> ParseResult {
        match self.current().kind {
            TokenKind::Identifier
                if self.peek_next().is_some_and(|t| t.is(TokenKind::Colon)) =>
            {
                self.parse_label()
            }
            TokenKind::Var => self.parse_var(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Goto => self.parse_goto(),
            TokenKind::If => self.parse_if(),
            _ => self.parse_expr_statement(),
        }
    }

    /// `identifier ':'`
    fn parse_label(&mut self) -> ParseResult {
        let name = self.advance();
        let colon = self.advance();
        let file = name.file.clone();
        Ok(Node::new(NodeKind::LabelStmt(name.clone()), name.start, colon.end, file))
    }

    /// `'var' identifier ['=' expr] ';'`
    fn parse_var(&mut self) -> ParseResult {
        let keyword = self.advance();

        if !self.check(TokenKind::Identifier) {
            let token = self.current();
            return Err(self.error(
                keyword.start,
                token.end,
                "expected an identifier after 'var' keyword",
            ));
        }
        let name = self.advance();

        let init = if self.check(TokenKind::Equal) {
            self.advance();
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let semicolon = self.expect_semicolon(keyword.start, "expected ';' at the end of 'var' statement")?;

        Ok(Node::new(
            NodeKind::VarStmt { name, init },
            keyword.start,
            semicolon.end,
            keyword.file.clone(),
        ))
    }

    /// `'print' expr ';'`
    fn parse_print(&mut self) -> ParseResult {
        let keyword = self.advance();
        let expr = self.parse_expr()?;
        let semicolon = self.expect_semicolon(keyword.start, "expected ';' after 'print' statement")?;

        Ok(Node::new(
            NodeKind::PrintStmt(Box::new(expr)),
            keyword.start,
            semicolon.end,
            keyword.file.clone(),
        ))
    }

    /// `'goto' identifier ';'`
    fn parse_goto(&mut self) -> ParseResult {
        let keyword = self.advance();

        if !self.check(TokenKind::Identifier) {
            let token = self.current();
            return Err(self.error(
                keyword.start,
                token.end,
                "expected a label name after 'goto' keyword",
            ));
        }
        let label = self.advance();

        let semicolon = self.expect_semicolon(keyword.start, "expected ';' after 'goto' statement")?;

        Ok(Node::new(
            NodeKind::GotoStmt(label),
            keyword.start,
            semicolon.end,
            keyword.file.clone(),
        ))
    }

    /// `'if' expr block ['else' (block | if)]`
    fn parse_if(&mut self) -> ParseResult {
        let keyword = self.advance();
        let cond = self.parse_expr()?;
        let then = self.nested("statement", Self::parse_block)?;

        let otherwise = if self.check(TokenKind::Else) {
            self.advance();
            if self.check(TokenKind::If) {
                let nested = self.nested("statement", Self::parse_if)?;
                Some(Block {
                    start: nested.start,
                    end: nested.end,
                    stmts: vec![nested],
                })
            } else {
                Some(self.nested("statement", Self::parse_block)?)
            }
        } else {
            None
        };

        let end = otherwise.as_ref().map_or(then.end, |block| block.end);
        Ok(Node::new(
            NodeKind::IfStmt {
                cond: Box::new(cond),
                then,
                otherwise,
            },
            keyword.start,
            end,
            keyword.file.clone(),
        ))
    }

    /// `'{' stmt* '}'`
    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        if !self.check(TokenKind::LBrace) {
            let token = self.current();
            return Err(self.error(token.start, token.end, "expected '{' to open block"));
        }
        let open = self.advance();

        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                let token = self.current();
                return Err(self.error(open.start, token.end, "expected '}' to close block"));
            }
            stmts.push(self.parse_statement()?);
        }
        let close = self.advance();

        Ok(Block {
            stmts,
            start: open.start,
            end: close.end,
        })
    }

    /// `expr ';'`
    fn parse_expr_statement(&mut self) -> ParseResult {
        let expr = self.parse_expr()?;

        if !self.check(TokenKind::Semicolon) {
            let token = self.current();
            return Err(self.error(expr.start, token.end, "expected ';' after expression"));
        }
        let semicolon = self.advance();

        let (start, file) = (expr.start, expr.file.clone());
        Ok(Node::new(NodeKind::ExprStmt(Box::new(expr)), start, semicolon.end, file))
    }

    fn expect_semicolon(&mut self, start: Position, message: &str) -> Result<Token, Diagnostic> {
        if !self.check(TokenKind::Semicolon) {
            let token = self.current();
            return Err(self.error(start, token.end, message));
        }
        Ok(self.advance())
    }

    pub fn parse_expr(&mut self) -> ParseResult {
        self.parse_assign()
    }

    /// Right-associative: `a = b = c` is `a = (b = c)`.
    fn parse_assign(&mut self) -> ParseResult {
        let left = self.parse_ternary()?;

        if self.check(TokenKind::Equal) {
            let op = self.advance();
            let right = self.nested("expression", Self::parse_assign)?;
            return self.bounded(Node::binary(left, op, right));
        }

        Ok(left)
    }

    /// Right-associative: `a ? b : c ? d : e` is `a ? b : (c ? d : e)`.
    fn parse_ternary(&mut self) -> ParseResult {
        let cond = self.parse_logical_or()?;

        if !self.check(TokenKind::Question) {
            return Ok(cond);
        }
        self.advance();

        let then = self.nested("expression", Self::parse_ternary)?;

        if !self.check(TokenKind::Colon) {
            let token = self.current();
            return Err(self.error(cond.start, token.end, "expected ':' for ternary operator"));
        }
        self.advance();

        let otherwise = self.nested("expression", Self::parse_ternary)?;
        self.bounded(Node::ternary(cond, then, otherwise))
    }

    /// One left-associative binary level.
    fn parse_left_assoc(
        &mut self,
        ops: &[TokenKind],
        operand: fn(&mut Self) -> ParseResult,
    ) -> ParseResult {
        let mut left = operand(self)?;

        while self.check_any(ops) {
            let op = self.advance();
            let right = operand(self)?;
            left = self.bounded(Node::binary(left, op, right))?;
        }

        Ok(left)
    }

    fn parse_logical_or(&mut self) -> ParseResult {
        self.parse_left_assoc(&[TokenKind::PipePipe], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> ParseResult {
        self.parse_left_assoc(&[TokenKind::AmpersandAmpersand], Self::parse_bitwise_or)
    }

    fn parse_bitwise_or(&mut self) -> ParseResult {
        self.parse_left_assoc(&[TokenKind::Pipe], Self::parse_bitwise_xor)
    }

    fn parse_bitwise_xor(&mut self) -> ParseResult {
        self.parse_left_assoc(&[TokenKind::Caret], Self::parse_bitwise_and)
    }

    fn parse_bitwise_and(&mut self) -> ParseResult {
        self.parse_left_assoc(&[TokenKind::Ampersand], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> ParseResult {
        self.parse_left_assoc(
            &[TokenKind::EqualEqual, TokenKind::BangEqual],
            Self::parse_relation,
        )
    }

    fn parse_relation(&mut self) -> ParseResult {
        self.parse_left_assoc(
            &[
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
            ],
            Self::parse_shift,
        )
    }

    fn parse_shift(&mut self) -> ParseResult {
        self.parse_left_assoc(&[TokenKind::LShift, TokenKind::RShift], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> ParseResult {
        self.parse_left_assoc(&[TokenKind::Plus, TokenKind::Minus], Self::parse_term)
    }

    fn parse_term(&mut self) -> ParseResult {
        self.parse_left_assoc(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::parse_unary,
        )
    }

    /// Prefix operators nest by recursion: `- - x` is `-(-x)`.
    fn parse_unary(&mut self) -> ParseResult {
        const PREFIX: [TokenKind; 6] = [
            TokenKind::Bang,
            TokenKind::Tilde,
            TokenKind::Minus,
            TokenKind::Plus,
            TokenKind::MinusMinus,
            TokenKind::PlusPlus,
        ];

        if self.check_any(&PREFIX) {
            let op = self.advance();
            let operand = self.nested("expression", Self::parse_unary)?;
            return self.bounded(Node::unary(op, operand));
        }

        self.parse_group()
    }

    fn parse_group(&mut self) -> ParseResult {
        if !self.check(TokenKind::LParen) {
            return self.parse_primary();
        }
        let lparen = self.advance();

        let expr = self.nested("expression", Self::parse_expr)?;

        if !self.check(TokenKind::RParen) {
            let token = self.current();
            return Err(self.error(lparen.start, token.end, "expected ')' for grouping"));
        }
        self.advance();

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult {
        match self.current().kind {
            TokenKind::IntLiteral => Ok(Node::literal(self.advance())),
            TokenKind::Identifier => Ok(Node::identifier(self.advance())),
            kind => {
                let token = self.current();
                let message = if kind == TokenKind::Eof {
                    "expecting some tokens, reached EOF instead"
                } else {
                    "unexpected token"
                };
                Err(self.error(token.start, token.end, message))
            }
        }
    }
}
