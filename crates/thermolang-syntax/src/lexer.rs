use crate::error::{LexError, Span};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

static KEYWORDS: Lazy<HashMap<&'static str, Token>> = Lazy::new(|| {
    let mut m = HashMap::with_capacity(32);
    m.insert("IF", Token::If);
    m.insert("ELSE", Token::Else);
    m.insert("WHILE", Token::While);
    m.insert("REPEAT", Token::Repeat);
    m.insert("RULE", Token::Rule);
    m.insert("SET", Token::Set);
    m.insert("TEMP", Token::Temp);
    m.insert("MODE", Token::Mode);
    m.insert("FAN", Token::Fan);
    m.insert("SWING", Token::Swing);
    m.insert("POWER", Token::Power);
    m.insert("WAIT", Token::Wait);
    m.insert("SECONDS", Token::Seconds);
    m.insert("COOL", Token::Cool);
    m.insert("HEAT", Token::Heat);
    m.insert("DRY", Token::Dry);
    m.insert("AUTO", Token::Auto);
    m.insert("LOW", Token::Low);
    m.insert("MID", Token::Mid);
    m.insert("HIGH", Token::High);
    m.insert("ON", Token::On);
    m.insert("OFF", Token::Off);
    m.insert("HUMIDITY", Token::Humidity);
    m.insert("OCCUPIED", Token::Occupied);
    m.insert("TIME", Token::Time);
    m.insert("EQ", Token::Eq);
    m.insert("NE", Token::Ne);
    m.insert("LT", Token::Lt);
    m.insert("LE", Token::Le);
    m.insert("GT", Token::Gt);
    m.insert("GE", Token::Ge);
    m
});

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    If,
    Else,
    While,
    Repeat,
    Rule,
    Set,
    Temp,
    Mode,
    Fan,
    Swing,
    Power,
    Wait,
    Seconds,
    Cool,
    Heat,
    Dry,
    Auto,
    Low,
    Mid,
    High,
    On,
    Off,
    Humidity,
    Occupied,
    Time,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Colon,
    Semicolon,
    Identifier(String),
    String(String),
    Integer(i64),
}

impl Token {
    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Assign
                | Token::LeftBrace
                | Token::RightBrace
                | Token::LeftParen
                | Token::RightParen
                | Token::Colon
                | Token::Semicolon
                | Token::Identifier(_)
                | Token::String(_)
                | Token::Integer(_)
        )
    }

    pub fn display_name(&self) -> String {
        match self {
            Token::Identifier(s) => format!("identifier '{}'", s),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Integer(n) => format!("integer {}", n),
            t if t.is_keyword() => format!("keyword '{}'", t),
            t => format!("'{}'", t),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::If => write!(f, "IF"),
            Token::Else => write!(f, "ELSE"),
            Token::While => write!(f, "WHILE"),
            Token::Repeat => write!(f, "REPEAT"),
            Token::Rule => write!(f, "RULE"),
            Token::Set => write!(f, "SET"),
            Token::Temp => write!(f, "TEMP"),
            Token::Mode => write!(f, "MODE"),
            Token::Fan => write!(f, "FAN"),
            Token::Swing => write!(f, "SWING"),
            Token::Power => write!(f, "POWER"),
            Token::Wait => write!(f, "WAIT"),
            Token::Seconds => write!(f, "SECONDS"),
            Token::Cool => write!(f, "COOL"),
            Token::Heat => write!(f, "HEAT"),
            Token::Dry => write!(f, "DRY"),
            Token::Auto => write!(f, "AUTO"),
            Token::Low => write!(f, "LOW"),
            Token::Mid => write!(f, "MID"),
            Token::High => write!(f, "HIGH"),
            Token::On => write!(f, "ON"),
            Token::Off => write!(f, "OFF"),
            Token::Humidity => write!(f, "HUMIDITY"),
            Token::Occupied => write!(f, "OCCUPIED"),
            Token::Time => write!(f, "TIME"),
            Token::Eq => write!(f, "EQ"),
            Token::Ne => write!(f, "NE"),
            Token::Lt => write!(f, "LT"),
            Token::Le => write!(f, "LE"),
            Token::Gt => write!(f, "GT"),
            Token::Ge => write!(f, "GE"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Assign => write!(f, "="),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Integer(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Streaming tokenizer over a thermolang script.
///
/// Yields one token at a time and stops for good after the first
/// [`LexError`]. To start over, build a new `Lexer` from the same source.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
    offset: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            col: 1,
            offset: 0,
            failed: false,
        }
    }

    /// Position just past the last consumed character.
    pub fn cursor_span(&self) -> Span {
        Span::point(self.line, self.col, self.offset)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.offset += ch.len_utf8();
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '#' => self.skip_line(),
                '/' => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() == Some(&'/') {
                        self.skip_line();
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn next_token(&mut self) -> Option<Result<SpannedToken, LexError>> {
        self.skip_trivia();

        let start = self.cursor_span();
        let ch = *self.chars.peek()?;

        let token = match ch {
            '"' => {
                self.bump();
                let mut string = String::new();
                loop {
                    match self.bump() {
                        Some('"') => break,
                        Some(c) => string.push(c),
                        None => {
                            return Some(Err(LexError::UnterminatedString {
                                span: self.span_from(start),
                            }));
                        }
                    }
                }
                Token::String(string)
            }

            '0'..='9' => {
                let mut digits = String::new();
                while let Some(&c) = self.chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    digits.push(c);
                    self.bump();
                }

                if let Some(&c) = self.chars.peek()
                    && (c.is_alphabetic() || c == '_')
                {
                    while let Some(&c) = self.chars.peek() {
                        if !(c.is_alphanumeric() || c == '_') {
                            break;
                        }
                        digits.push(c);
                        self.bump();
                    }
                    return Some(Err(LexError::InvalidNumber {
                        text: digits,
                        span: self.span_from(start),
                    }));
                }

                match digits.parse::<i64>() {
                    Ok(n) => Token::Integer(n),
                    Err(_) => {
                        return Some(Err(LexError::InvalidNumber {
                            text: digits,
                            span: self.span_from(start),
                        }));
                    }
                }
            }

            '=' => {
                self.bump();
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Token::Eq
                } else {
                    Token::Assign
                }
            }

            '!' => {
                self.bump();
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Token::Ne
                } else {
                    return Some(Err(LexError::UnexpectedChar {
                        ch: '!',
                        span: self.span_from(start),
                        suggestion: Some("!=".to_string()),
                    }));
                }
            }

            '<' => {
                self.bump();
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Token::Le
                } else {
                    Token::Lt
                }
            }

            '>' => {
                self.bump();
                if self.chars.peek() == Some(&'=') {
                    self.bump();
                    Token::Ge
                } else {
                    Token::Gt
                }
            }

            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '{' => self.single(Token::LeftBrace),
            '}' => self.single(Token::RightBrace),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ':' => self.single(Token::Colon),
            ';' => self.single(Token::Semicolon),

            _ if ch.is_alphabetic() || ch == '_' => {
                let mut ident = String::with_capacity(16);
                while let Some(&c) = self.chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    ident.push(c);
                    self.bump();
                }

                KEYWORDS
                    .get(ident.to_ascii_uppercase().as_str())
                    .cloned()
                    .unwrap_or(Token::Identifier(ident))
            }

            _ => {
                self.bump();
                let suggestion = match ch {
                    '&' | '|' => Some("nested IF".to_string()),
                    '\'' => Some("\"".to_string()),
                    _ => None,
                };
                return Some(Err(LexError::UnexpectedChar {
                    ch,
                    span: self.span_from(start),
                    suggestion,
                }));
            }
        };

        Some(Ok(SpannedToken {
            token,
            span: self.span_from(start),
        }))
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(start.line, start.col, start.start, self.offset)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

/// Tokenizes a whole script, failing on the first malformed token.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    Lexer::new(input).collect()
}
