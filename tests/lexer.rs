use solfege::{
    diagnostics::DiagnosticKind,
    lexer::Lexer,
    token::{TokenKind, DOUBLE_SYMBOLS, KEYWORDS, SINGLE_SYMBOLS},
};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new("test", source)
        .tokenize()
        .expect("tokenize should succeed")
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

fn single(source: &str) -> (TokenKind, String) {
    let mut lexer = Lexer::new("test", source);
    let token = lexer.next_token().expect("token");
    (token.kind, token.text)
}

#[test]
fn every_fixed_spelling_round_trips() {
    for (spelling, kind) in KEYWORDS.iter().chain(DOUBLE_SYMBOLS).chain(SINGLE_SYMBOLS) {
        let (lexed, text) = single(spelling);
        assert_eq!(lexed, *kind, "spelling {spelling:?}");
        assert_eq!(text, *spelling);
        assert_eq!(kind.spelling(), Some(*spelling));
    }
}

#[test]
fn identifiers_are_not_keywords() {
    assert_eq!(
        single("ending_2"),
        (TokenKind::Identifier, "ending_2".to_string())
    );
    assert_eq!(single("_x"), (TokenKind::Identifier, "_x".to_string()));
    assert_eq!(single("None"), (TokenKind::Identifier, "None".to_string()));
}

#[test]
fn identifiers_may_use_any_letter() {
    assert_eq!(single("größe"), (TokenKind::Identifier, "größe".to_string()));
    assert_eq!(single("名前2"), (TokenKind::Identifier, "名前2".to_string()));
    assert_eq!(
        kinds("été = 1"),
        [
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::NumberLiteral,
            TokenKind::EndOfFile
        ]
    );
}

#[test]
fn numbers_take_at_most_one_dot() {
    let tokens = Lexer::new("test", "12.5.3").tokenize().expect("tokenize");
    assert_eq!(tokens[0].kind, TokenKind::NumberLiteral);
    assert_eq!(tokens[0].text, "12.5");
    assert_eq!(tokens[1].kind, TokenKind::Dot);
    assert_eq!(tokens[2].text, "3");
}

#[test]
fn strings_decode_escapes() {
    assert_eq!(
        single(r#""a\"b""#),
        (TokenKind::StringLiteral, "a\"b".to_string())
    );
    assert_eq!(
        single(r"'tab\there\nnew \\ \''"),
        (TokenKind::StringLiteral, "tab\there\nnew \\ '".to_string())
    );
    assert_eq!(single("''"), (TokenKind::StringLiteral, String::new()));
}

#[test]
fn unknown_escape_is_a_syntax_error() {
    let err = Lexer::new("test", r#""\q""#)
        .tokenize()
        .expect_err("invalid escape");
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    assert!(err.message.contains("invalid escape sequence"));
}

#[test]
fn unterminated_string_is_reported() {
    for source in ["\"abc", "'abc\nx'"] {
        let err = Lexer::new("test", source)
            .tokenize()
            .expect_err("unterminated");
        assert!(err.message.contains("unterminated string literal"));
    }
}

#[test]
fn invalid_character_carries_position() {
    let err = Lexer::new("main.sol", "x = 1\ny = @")
        .tokenize()
        .expect_err("invalid character");
    let position = err.position.expect("position");
    assert_eq!(&*position.source_name, "main.sol");
    assert_eq!((position.line, position.column), (2, 5));
    assert!(err.message.contains("invalid character"));
}

#[test]
fn newline_reports_its_own_position() {
    let tokens = Lexer::new("test", "ab\ncd").tokenize().expect("tokenize");
    let eol = &tokens[1];
    assert_eq!(eol.kind, TokenKind::EndOfLine);
    assert_eq!((eol.position.line, eol.position.column), (1, 3));
    assert_eq!((tokens[2].position.line, tokens[2].position.column), (2, 1));
}

#[test]
fn end_of_file_repeats() {
    let mut lexer = Lexer::new("test", "x");
    lexer.next_token().expect("identifier");
    for _ in 0..3 {
        assert_eq!(
            lexer.next_token().expect("eof").kind,
            TokenKind::EndOfFile
        );
    }
}

#[test]
fn double_symbols_win_over_single() {
    assert_eq!(
        kinds("a<=b = c+=1"),
        vec![
            TokenKind::Identifier,
            TokenKind::LessThanOrEquals,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Identifier,
            TokenKind::PlusAssign,
            TokenKind::NumberLiteral,
            TokenKind::EndOfFile,
        ]
    );
}

#[test]
fn lone_bang_is_invalid() {
    let err = Lexer::new("test", "!x").tokenize().expect_err("bang");
    assert!(err.message.contains("invalid character"));
}
