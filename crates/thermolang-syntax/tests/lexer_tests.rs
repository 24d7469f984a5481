use thermolang_syntax::lexer::{Lexer, Token, tokenize};
use thermolang_syntax::LexError;

#[test]
fn test_keywords() {
    let source = "RULE SET WAIT SECONDS IF ELSE WHILE REPEAT TEMP MODE FAN SWING POWER";
    let tokens = tokenize(source).unwrap();

    let keywords: Vec<_> = tokens.iter().map(|t| &t.token).collect();

    assert!(matches!(keywords[0], Token::Rule));
    assert!(matches!(keywords[1], Token::Set));
    assert!(matches!(keywords[2], Token::Wait));
    assert!(matches!(keywords[3], Token::Seconds));
    assert!(matches!(keywords[4], Token::If));
    assert!(matches!(keywords[5], Token::Else));
    assert!(matches!(keywords[6], Token::While));
    assert!(matches!(keywords[7], Token::Repeat));
    assert!(matches!(keywords[8], Token::Temp));
    assert!(matches!(keywords[9], Token::Mode));
    assert!(matches!(keywords[10], Token::Fan));
    assert!(matches!(keywords[11], Token::Swing));
    assert!(matches!(keywords[12], Token::Power));
}

#[test]
fn test_constants_and_sensors() {
    let source = "cool Heat DRY auto low mid HIGH on off humidity Occupied time";
    let tokens: Vec<_> = tokenize(source).unwrap().into_iter().map(|t| t.token).collect();

    assert_eq!(
        tokens,
        vec![
            Token::Cool,
            Token::Heat,
            Token::Dry,
            Token::Auto,
            Token::Low,
            Token::Mid,
            Token::High,
            Token::On,
            Token::Off,
            Token::Humidity,
            Token::Occupied,
            Token::Time,
        ]
    );
}

#[test]
fn test_operators() {
    let source = "== != < <= > >= = EQ NE LT LE GT GE + - * /";
    let tokens = tokenize(source).unwrap();

    let ops: Vec<_> = tokens.iter().map(|t| &t.token).collect();

    assert!(matches!(ops[0], Token::Eq));
    assert!(matches!(ops[1], Token::Ne));
    assert!(matches!(ops[2], Token::Lt));
    assert!(matches!(ops[3], Token::Le));
    assert!(matches!(ops[4], Token::Gt));
    assert!(matches!(ops[5], Token::Ge));
    assert!(matches!(ops[6], Token::Assign));
    assert!(matches!(ops[7], Token::Eq));
    assert!(matches!(ops[8], Token::Ne));
    assert!(matches!(ops[9], Token::Lt));
    assert!(matches!(ops[10], Token::Le));
    assert!(matches!(ops[11], Token::Gt));
    assert!(matches!(ops[12], Token::Ge));
    assert!(matches!(ops[13], Token::Plus));
    assert!(matches!(ops[14], Token::Minus));
    assert!(matches!(ops[15], Token::Star));
    assert!(matches!(ops[16], Token::Slash));
}

#[test]
fn test_strings() {
    let source = r#""hello" "with spaces" "back\slash" """#;
    let tokens = tokenize(source).unwrap();

    match &tokens[0].token {
        Token::String(s) => assert_eq!(s, "hello"),
        _ => panic!("Expected string token"),
    }

    match &tokens[1].token {
        Token::String(s) => assert_eq!(s, "with spaces"),
        _ => panic!("Expected string token"),
    }

    match &tokens[2].token {
        Token::String(s) => assert_eq!(s, "back\\slash"),
        _ => panic!("Expected string token"),
    }

    match &tokens[3].token {
        Token::String(s) => assert!(s.is_empty()),
        _ => panic!("Expected string token"),
    }
}

#[test]
fn test_integers() {
    let source = "0 42 86400 9223372036854775807";
    let tokens = tokenize(source).unwrap();

    let values: Vec<i64> = tokens
        .iter()
        .map(|t| match t.token {
            Token::Integer(n) => n,
            ref other => panic!("Expected integer, got {:?}", other),
        })
        .collect();

    assert_eq!(values, vec![0, 42, 86400, i64::MAX]);
}

#[test]
fn test_identifiers_keep_their_spelling() {
    let tokens = tokenize("setpoint _tmp Target2").unwrap();

    assert_eq!(tokens[0].token, Token::Identifier("setpoint".to_string()));
    assert_eq!(tokens[1].token, Token::Identifier("_tmp".to_string()));
    assert_eq!(tokens[2].token, Token::Identifier("Target2".to_string()));
}

#[test]
fn test_keyword_prefix_is_an_identifier() {
    let tokens = tokenize("settings timer fans").unwrap();
    assert!(tokens.iter().all(|t| matches!(t.token, Token::Identifier(_))));
}

#[test]
fn test_comments() {
    let source = "# header\nSET FAN = LOW // trailing\n# done";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[3].token, Token::Low);
}

#[test]
fn test_punctuation() {
    let tokens: Vec<_> = tokenize("RULE n: (1) { ; }")
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect();

    assert_eq!(
        tokens,
        vec![
            Token::Rule,
            Token::Identifier("n".to_string()),
            Token::Colon,
            Token::LeftParen,
            Token::Integer(1),
            Token::RightParen,
            Token::LeftBrace,
            Token::Semicolon,
            Token::RightBrace,
        ]
    );
}

#[test]
fn test_spans_track_lines_and_columns() {
    let source = "RULE 1 {\n    SET TEMP = 22\n}";
    let tokens = tokenize(source).unwrap();

    let set = &tokens[3];
    assert_eq!(set.token, Token::Set);
    assert_eq!((set.span.line, set.span.col), (2, 5));
    assert_eq!(&source[set.span.start..set.span.end], "SET");

    let value = &tokens[6];
    assert_eq!(value.token, Token::Integer(22));
    assert_eq!((value.span.line, value.span.col), (2, 16));

    let close = tokens.last().unwrap();
    assert_eq!((close.span.line, close.span.col), (3, 1));
}

#[test]
fn test_error_unterminated_string() {
    let err = tokenize("SET label = \"open").unwrap_err();
    match err {
        LexError::UnterminatedString { span } => {
            assert_eq!(span.col, 13);
        }
        other => panic!("Expected unterminated string, got {:?}", other),
    }
}

#[test]
fn test_error_bang_suggests_not_equal() {
    let err = tokenize("IF x ! 3 {}").unwrap_err();
    match err {
        LexError::UnexpectedChar { ch, suggestion, span } => {
            assert_eq!(ch, '!');
            assert_eq!(suggestion.as_deref(), Some("!="));
            assert_eq!(span.col, 6);
        }
        other => panic!("Expected unexpected char, got {:?}", other),
    }
}

#[test]
fn test_error_invalid_number() {
    assert!(matches!(tokenize("12abc"), Err(LexError::InvalidNumber { .. })));
    assert!(matches!(
        tokenize("99999999999999999999"),
        Err(LexError::InvalidNumber { .. })
    ));
}

#[test]
fn test_lexer_yields_tokens_before_error() {
    let items: Vec<_> = Lexer::new("SET FAN = @ LOW").collect();

    assert_eq!(items.len(), 4);
    assert!(items[..3].iter().all(|r| r.is_ok()));
    assert!(items[3].is_err());
}

#[test]
fn test_display_names_for_errors() {
    assert_eq!(Token::Set.display_name(), "keyword 'SET'");
    assert_eq!(Token::LeftBrace.display_name(), "'{'");
    assert_eq!(Token::Integer(5).display_name(), "integer 5");
    assert_eq!(Token::Identifier("x".into()).display_name(), "identifier 'x'");
}

#[test]
fn test_cursor_span_tracks_consumed_input() -> anyhow::Result<()> {
    let mut lexer = Lexer::new("SET FAN = LOW\nWAIT 5 SECONDS");
    let mut count = 0;
    for token in lexer.by_ref() {
        token?;
        count += 1;
    }
    assert_eq!(count, 7);

    let end = lexer.cursor_span();
    assert_eq!((end.line, end.col, end.start), (2, 15, 28));
    Ok(())
}
