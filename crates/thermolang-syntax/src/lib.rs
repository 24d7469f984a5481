//! # Thermolang Syntax
//!
//! Lexer, parser, printer and AST definitions for thermolang, a small
//! rule language for driving an air conditioner.
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     ↓
//! Lexer (tokenize)
//!     ↓
//! Vec<SpannedToken>
//!     ↓
//! Parser (parse)
//!     ↓
//! Program (AST)  →  printer (canonical source)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use thermolang_syntax::{parse, tokenize, Trigger};
//!
//! let source = r#"
//!     SET POWER = ON
//!     RULE humid: HUMIDITY GT 60 {
//!         SET MODE = DRY
//!         SET FAN = HIGH
//!     }
//! "#;
//!
//! let tokens = tokenize(source).expect("Tokenization failed");
//! let program = parse(tokens).expect("Parsing failed");
//!
//! assert_eq!(program.len(), 2);
//! assert!(matches!(program.rules[0].trigger, Trigger::Always));
//! assert_eq!(program.rules[1].name.as_deref(), Some("humid"));
//! ```
//!
//! ## Grammar Overview
//!
//! ```text
//! Item:
//!   - RULE [name:] expr { ... }
//!   - bare statement (runs as an always-true rule)
//!
//! Statement:
//!   - SET TEMP = expr | SET MODE/FAN/SWING/POWER = CONSTANT | SET name = expr
//!   - WAIT expr SECONDS
//!   - IF expr { ... } [ELSE { ... } | ELSE IF ...]
//!   - WHILE expr { ... }
//!   - REPEAT expr { ... }
//!   - { ... }
//!
//! Expression:
//!   - Integers, "strings", variables
//!   - Sensors: HUMIDITY, OCCUPIED, TIME, TEMP
//!   - Arithmetic (+, -, *, /) and unary minus
//!   - Comparisons (EQ NE LT LE GT GE, or == != < <= > >=)
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use thermolang_syntax::{parse_source, Diagnostic};
//!
//! let source = "RULE HUMIDITY GT { SET FAN = HIGH }";
//! let err = parse_source(source).unwrap_err();
//! let report = Diagnostic::from_syntax(source, &err).format_error();
//! assert!(report.contains("line 1"));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use ast::*;
pub use error::{Diagnostic, LexError, Span, SyntaxError};
pub use lexer::{Lexer, SpannedToken, Token, tokenize};
pub use parser::{MAX_NESTING, Parser, parse, parse_source};
pub use printer::print;
