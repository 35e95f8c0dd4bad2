use std::rc::Rc;

use tracing::{debug, instrument};

use crate::frontend::diagnostic::{Diagnostic, DiagnosticKind};
use crate::frontend::position::{Position, SourceFile};
use crate::frontend::token::{Token, TokenKind};

/// Tokenizes `source`, attributing tokens to `path`.
pub fn tokenize(path: &str, source: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(SourceFile::new(path, source)).tokenize()
}

/// Scanner over one source file.
///
/// All scanning state lives here, so separate runs never share anything.
pub struct Lexer {
    file: Rc<SourceFile>,
    /// Start of the token being scanned.
    start: Position,
    /// Current scan position.
    pos: Position,
}

impl Lexer {
    pub fn new(file: Rc<SourceFile>) -> Self {
        Lexer {
            file,
            start: Position::START,
            pos: Position::START,
        }
    }

    fn current(&self) -> Option<char> {
        self.file.text()[self.pos.index..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos = self.pos.advanced(ch);
        Some(ch)
    }

    /// Consumes the next character if it is `expected`.
    fn matches(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.start, self.pos, self.file.clone())
    }

    fn error(&self, message: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::Lexical,
            self.file.clone(),
            self.start,
            self.pos,
            message,
        )
    }

    fn skip_whitespace(&mut self) {
        // '\x0b' is vertical tab
        while let Some(ch) = self.current() {
            if ch.is_ascii_whitespace() || ch == '\x0b' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Picks the two-character kind when the next character is `second`.
    fn either(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.matches(second) { double } else { single }
    }

    fn read_word(&mut self) -> TokenKind {
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let lexeme = self.file.slice(self.start, self.pos);
        TokenKind::keyword(lexeme).unwrap_or(TokenKind::Identifier)
    }

    fn read_number(&mut self) -> TokenKind {
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::IntLiteral
    }

    /// Scans one token starting at the current position.
    ///
    /// Returns `Ok(None)` at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, Diagnostic> {
        self.skip_whitespace();
        self.start = self.pos;

        let Some(ch) = self.advance() else {
            return Ok(None);
        };

        let kind = match ch {
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '?' => TokenKind::Question,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '^' => TokenKind::Caret,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '~' => TokenKind::Tilde,
            '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal),
            '|' => self.either('|', TokenKind::PipePipe, TokenKind::Pipe),
            '&' => self.either('&', TokenKind::AmpersandAmpersand, TokenKind::Ampersand),
            '!' => self.either('=', TokenKind::BangEqual, TokenKind::Bang),
            '+' => self.either('+', TokenKind::PlusPlus, TokenKind::Plus),
            '-' => self.either('-', TokenKind::MinusMinus, TokenKind::Minus),
            '<' => {
                if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    self.either('<', TokenKind::LShift, TokenKind::Less)
                }
            }
            '>' => {
                if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    self.either('>', TokenKind::RShift, TokenKind::Greater)
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => self.read_word(),
            c if c.is_ascii_digit() => self.read_number(),
            c => return Err(self.error(&format!("unexpected character '{}'", c.escape_default()))),
        };

        Ok(Some(self.token(kind)))
    }

    /// Tokenizes the whole file.
    ///
    /// On success the last token is always an empty `Eof` positioned at the
    /// end of input. The first bad character aborts the scan.
    #[instrument(level = "trace", skip_all, fields(path = self.file.path()))]
    pub fn tokenize(&mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        self.start = self.pos;
        tokens.push(self.token(TokenKind::Eof));

        debug!(tokens = tokens.len(), "lexed source");
        Ok(tokens)
    }
}
