mod expressions;
mod statements;

use crate::ast::*;
use crate::error::{Span, SyntaxError};
use crate::lexer::{Lexer, SpannedToken, Token};

/// Deepest nesting of parentheses, unary minus and blocks accepted.
pub const MAX_NESTING: usize = 64;

/// Recursive-descent parser for thermolang.
///
/// Consumes a sequence of [`SpannedToken`]s and produces a [`Program`].
/// Parsing is a single forward pass: the first grammar violation is
/// returned as a [`SyntaxError`] and no partial tree is kept.
pub struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
    eof: Span,
    depth: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        let eof = tokens
            .last()
            .map(|st| {
                let width = st.span.end - st.span.start;
                Span::point(st.span.line, st.span.col + width, st.span.end)
            })
            .unwrap_or_else(|| Span::point(1, 1, 0));
        Self::with_eof(tokens, eof)
    }

    /// Creates a parser whose end-of-input errors point at `eof`.
    pub fn with_eof(tokens: Vec<SpannedToken>, eof: Span) -> Self {
        Self { tokens, pos: 0, eof, depth: 0 }
    }

    #[inline]
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|st| &st.token)
    }

    #[inline]
    pub(super) fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|st| &st.token)
    }

    #[inline]
    pub(super) fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map(|st| st.span).unwrap_or(self.eof)
    }

    /// Span of the most recently consumed token.
    #[inline]
    pub(super) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|st| st.span)
            .unwrap_or(self.eof)
    }

    #[inline]
    pub(super) fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    /// Builds the error for the current token when it is not `expected`.
    pub(super) fn unexpected(&self, expected: impl Into<String>, context: &str) -> SyntaxError {
        match self.tokens.get(self.pos) {
            Some(st) => SyntaxError::UnexpectedToken {
                expected: expected.into(),
                found: st.token.display_name(),
                span: st.span,
            },
            None => SyntaxError::UnexpectedEof {
                expected: expected.into(),
                context: Some(context.to_string()),
                span: self.eof,
            },
        }
    }

    pub(super) fn expect(&mut self, expected: Token, context: &str) -> Result<Span, SyntaxError> {
        if self.peek() == Some(&expected) {
            let span = self.peek_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(expected.display_name(), context))
        }
    }

    /// Runs `parse` one nesting level deeper, failing at `span` once the
    /// limit is reached.
    pub(super) fn nested<T>(
        &mut self,
        span: Span,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::InvalidSyntax {
                message: format!("nesting deeper than {} levels", MAX_NESTING),
                span,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    #[inline]
    pub(super) fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(Token::Semicolon)) {
            self.pos += 1;
        }
    }

    /// Parses the whole token stream into a [`Program`].
    pub fn parse_program(&mut self) -> Result<Program, SyntaxError> {
        let mut rules = Vec::with_capacity(8);

        self.skip_separators();
        while self.peek().is_some() {
            rules.push(self.parse_item()?);
            self.skip_separators();
        }

        Ok(Program { rules })
    }
}

/// Parses a token stream into a [`Program`].
pub fn parse(tokens: Vec<SpannedToken>) -> Result<Program, SyntaxError> {
    Parser::new(tokens).parse_program()
}

/// Lexes and parses a script in one go.
///
/// Lexical errors surface as [`SyntaxError::Lex`]; either way nothing of a
/// malformed script is returned.
pub fn parse_source(source: &str) -> Result<Program, SyntaxError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::with_capacity(source.len() / 4);
    for token in lexer.by_ref() {
        tokens.push(token?);
    }
    let eof = lexer.cursor_span();
    Parser::with_eof(tokens, eof).parse_program()
}
