use std::fmt;

/// A location in thermolang source: 1-based line and column plus the byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(line: usize, col: usize, start: usize, end: usize) -> Self {
        Self { line, col, start, end }
    }

    /// Zero-width span, used for end of input.
    pub fn point(line: usize, col: usize, offset: usize) -> Self {
        Self { line, col, start: offset, end: offset }
    }

    pub fn merge(&self, other: &Span) -> Self {
        let (first, _) = if self.start <= other.start { (self, other) } else { (other, self) };
        Self {
            line: first.line,
            col: first.col,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedChar { ch: char, span: Span, suggestion: Option<String> },
    UnterminatedString { span: Span },
    InvalidNumber { text: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedChar { ch, suggestion, .. } => {
                write!(f, "unexpected character '{}'", ch)?;
                if let Some(s) = suggestion {
                    write!(f, " (did you mean '{}'?)", s)?;
                }
                Ok(())
            }
            LexError::UnterminatedString { .. } => write!(f, "unterminated string literal"),
            LexError::InvalidNumber { text, .. } => {
                write!(f, "invalid integer literal '{}'", text)
            }
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
    UnexpectedToken { expected: String, found: String, span: Span },
    UnexpectedEof { expected: String, context: Option<String>, span: Span },
    InvalidSyntax { message: String, span: Span },
    Lex(LexError),
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::UnexpectedToken { span, .. } => *span,
            SyntaxError::UnexpectedEof { span, .. } => *span,
            SyntaxError::InvalidSyntax { span, .. } => *span,
            SyntaxError::Lex(e) => e.span(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::UnexpectedToken { expected, found, span } => {
                write!(f, "expected {}, found {} at {}", expected, found, span)
            }
            SyntaxError::UnexpectedEof { expected, context, .. } => {
                if let Some(ctx) = context {
                    write!(f, "unexpected end of input while parsing {}, expected {}", ctx, expected)
                } else {
                    write!(f, "unexpected end of input, expected {}", expected)
                }
            }
            SyntaxError::InvalidSyntax { message, span } => write!(f, "{} at {}", message, span),
            SyntaxError::Lex(e) => write!(f, "{} at {}", e, e.span()),
        }
    }
}

impl std::error::Error for SyntaxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyntaxError::Lex(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for SyntaxError {
    fn from(err: LexError) -> Self {
        SyntaxError::Lex(err)
    }
}

/// Renders an error message against the script it came from, pointing at
/// the offending span:
///
/// ```text
/// error: expected '{', found 'SET' at line 2, column 25
///   --> line 2:25
///    |
///  2 | RULE HUMIDITY GT 60 SET FAN = HIGH
///    |                     ^^^ syntax error
///    |
/// ```
pub struct Diagnostic<'a> {
    source: &'a str,
    message: String,
    label: &'static str,
    span: Option<Span>,
}

impl<'a> Diagnostic<'a> {
    pub fn new(source: &'a str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self { source, message: message.into(), label: "error", span }
    }

    pub fn from_lex(source: &'a str, error: &LexError) -> Self {
        Self::new(source, error.to_string(), Some(error.span())).with_label("lexical error")
    }

    pub fn from_syntax(source: &'a str, error: &SyntaxError) -> Self {
        let label = match error {
            SyntaxError::Lex(_) => "lexical error",
            _ => "syntax error",
        };
        Self::new(source, error.to_string(), Some(error.span())).with_label(label)
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn format_error(&self) -> String {
        let mut output = format!("error: {}\n", self.message);

        let Some(span) = self.span else {
            return output;
        };

        let lines: Vec<&str> = self.source.lines().collect();
        output.push_str(&format!("  --> line {}:{}\n", span.line, span.col));
        output.push_str("   |\n");

        if span.line > 0 && span.line <= lines.len() {
            let line_content = lines[span.line - 1];
            let width = span.line.to_string().len().max(2);
            output.push_str(&format!(" {: >width$} | {}\n", span.line, line_content, width = width));

            let visual_col: usize = line_content
                .chars()
                .take(span.col.saturating_sub(1))
                .map(|ch| if ch == '\t' { 4 } else { 1 })
                .sum();

            let caret_len = self
                .source
                .get(span.start..span.end)
                .map(|text| text.chars().count())
                .unwrap_or(0)
                .max(1);

            output.push_str(&format!(
                " {: >width$} | {}{} {}\n",
                "",
                " ".repeat(visual_col),
                "^".repeat(caret_len),
                self.label,
                width = width
            ));
        }

        output.push_str("   |\n");
        output
    }
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_error())
    }
}
