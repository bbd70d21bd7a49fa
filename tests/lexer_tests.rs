// tests/lexer_tests.rs

use ognl::ast::Token;
use ognl::lexer::{LexError, Lexer};
use pretty_assertions::assert_eq;

fn single(input: &str) -> Token {
    let mut lexer = Lexer::new(input);
    let token = lexer.next_token().unwrap();
    assert_eq!(lexer.next_token().unwrap(), Token::Eof, "trailing input in {}", input);
    token
}

// ============================================================================
// Punctuation and operators
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("$", Token::Dollar),
        ("@", Token::At),
        ("#", Token::Hash),
        ("&", Token::BitAnd),
        ("|", Token::BitOr),
        ("^", Token::Caret),
        ("?", Token::Question),
        ("~", Token::Tilde),
        ("!", Token::Bang),
        ("=", Token::Assign),
        ("+", Token::Plus),
        ("-", Token::Minus),
        ("*", Token::Star),
        ("/", Token::Slash),
        ("%", Token::Percent),
        ("(", Token::LParen),
        (")", Token::RParen),
        ("[", Token::LBracket),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        (".", Token::Dot),
        (",", Token::Comma),
        (":", Token::Colon),
        ("<", Token::Less),
        (">", Token::Greater),
    ];

    for (input, expected) in test_cases {
        assert_eq!(single(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_multi_char_tokens() {
    let test_cases = vec![
        ("==", Token::Eq),
        ("!=", Token::NotEq),
        ("<=", Token::LessEq),
        (">=", Token::GreaterEq),
        ("&&", Token::And),
        ("||", Token::Or),
        ("<<", Token::ShiftLeft),
        (">>", Token::ShiftRight),
        (">>>", Token::UnsignedShiftRight),
        ("#{", Token::HashBrace),
        (":[", Token::ColonBracket),
        ("?.", Token::NullSafeDot),
        (".?", Token::NullSafeDot),
    ];

    for (input, expected) in test_cases {
        assert_eq!(single(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_word_operators_share_symbolic_tokens() {
    let test_cases = vec![
        ("and", Token::And),
        ("or", Token::Or),
        ("band", Token::BitAnd),
        ("bor", Token::BitOr),
        ("xor", Token::Caret),
        ("eq", Token::Eq),
        ("neq", Token::NotEq),
        ("lt", Token::Less),
        ("gt", Token::Greater),
        ("lte", Token::LessEq),
        ("gte", Token::GreaterEq),
        ("shl", Token::ShiftLeft),
        ("shr", Token::ShiftRight),
        ("ushr", Token::UnsignedShiftRight),
    ];

    for (input, expected) in test_cases {
        assert_eq!(single(input), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Literals and names
// ============================================================================

#[test]
fn test_literal_keywords() {
    assert_eq!(single("true"), Token::Boolean(true));
    assert_eq!(single("false"), Token::Boolean(false));
    assert_eq!(single("null"), Token::Null);
}

#[test]
fn test_identifiers() {
    assert_eq!(single("customer"), Token::Identifier("customer".into()));
    assert_eq!(single("_total2"), Token::Identifier("_total2".into()));
    assert_eq!(single("andy"), Token::Identifier("andy".into()));
}

#[test]
fn test_integer_literals() {
    assert_eq!(single("42"), Token::Int(42));
    assert_eq!(single("42L"), Token::Long(42));
    assert_eq!(single("0x10"), Token::Int(16));
}

#[test]
fn test_dot_after_integer_is_navigation() {
    let tokens = Lexer::new("5.{").tokenize().unwrap();
    assert_eq!(tokens, vec![Token::Int(5), Token::Dot, Token::LBrace, Token::Eof]);
}

#[test]
fn test_full_expression() {
    let tokens = Lexer::new("items.{? #this gt 1 }[0]").tokenize().unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Identifier("items".into()),
            Token::Dot,
            Token::LBrace,
            Token::Question,
            Token::Hash,
            Token::Identifier("this".into()),
            Token::Greater,
            Token::Int(1),
            Token::RBrace,
            Token::LBracket,
            Token::Int(0),
            Token::RBracket,
            Token::Eof,
        ]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unexpected_character() {
    let err = Lexer::new("a ; b").tokenize().unwrap_err();
    assert_eq!(err, LexError::UnexpectedChar { ch: ';', position: 2 });
}

#[test]
fn test_unterminated_quote() {
    let err = Lexer::new("'abc").tokenize().unwrap_err();
    assert_eq!(err, LexError::Unterminated { position: 0 });
}
