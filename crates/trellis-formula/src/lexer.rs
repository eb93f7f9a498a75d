//! Tokenizer for size formulas.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1},
    combinator::{map, opt, recognize},
    sequence::pair,
    IResult,
};
use trellis_core::FormulaError;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f32),
    Identifier(String),
    When,
    Else,
    True,
    False,
    Not,
    And,
    Or,
    Arrow,
    Le,
    Ge,
    Eq,
    NotEq,
    Lt,
    Gt,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    OpenParen,
    CloseParen,
    Comma,
    Dot,
    End,
}

/// A token with its source position (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

/// Parse an identifier (starts with letter/underscore, followed by alphanumeric/underscore).
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// Parse an unsigned number (integer or float).
pub fn number(input: &str) -> IResult<&str, f32> {
    map(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |s: &str| s.parse().unwrap_or(0.0),
    )(input)
}

fn operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        map(tag("->"), |_| TokenKind::Arrow),
        map(tag("<="), |_| TokenKind::Le),
        map(tag(">="), |_| TokenKind::Ge),
        map(tag("=="), |_| TokenKind::Eq),
        map(tag("!="), |_| TokenKind::NotEq),
        map(char('<'), |_| TokenKind::Lt),
        map(char('>'), |_| TokenKind::Gt),
        map(char('+'), |_| TokenKind::Plus),
        map(char('-'), |_| TokenKind::Minus),
        map(char('*'), |_| TokenKind::Mul),
        map(char('/'), |_| TokenKind::Div),
        map(char('%'), |_| TokenKind::Mod),
        map(char('('), |_| TokenKind::OpenParen),
        map(char(')'), |_| TokenKind::CloseParen),
        map(char(','), |_| TokenKind::Comma),
        map(char('.'), |_| TokenKind::Dot),
    ))(input)
}

fn keyword_or_identifier(word: &str) -> TokenKind {
    match word {
        "when" => TokenKind::When,
        "else" => TokenKind::Else,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "not" => TokenKind::Not,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        _ => TokenKind::Identifier(word.to_string()),
    }
}

/// Split formula source into tokens, terminated by `TokenKind::End`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line = 1u32;
    let mut column = 1u32;

    loop {
        // Skip whitespace, tracking position
        let trimmed = rest.trim_start();
        for c in rest[..rest.len() - trimmed.len()].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        rest = trimmed;

        if rest.is_empty() {
            tokens.push(Token { kind: TokenKind::End, line, column });
            return Ok(tokens);
        }

        let (remaining, kind) = if let Ok((remaining, value)) = number(rest) {
            (remaining, TokenKind::Number(value))
        } else if let Ok((remaining, word)) = identifier(rest) {
            (remaining, keyword_or_identifier(word))
        } else if let Ok((remaining, kind)) = operator(rest) {
            (remaining, kind)
        } else {
            let found = rest.chars().next().unwrap_or(' ');
            return Err(FormulaError::syntax(
                format!("Unexpected character '{}'", found),
                line,
                column,
            ));
        };

        tokens.push(Token { kind, line, column });
        column += rest[..rest.len() - remaining.len()].chars().count() as u32;
        rest = remaining;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            kinds("parent * 0.5 + 10"),
            vec![
                TokenKind::Identifier("parent".into()),
                TokenKind::Mul,
                TokenKind::Number(0.5),
                TokenKind::Plus,
                TokenKind::Number(10.0),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords_and_arrows() {
        assert_eq!(
            kinds("when a >= 1 -> 2, else_value"),
            vec![
                TokenKind::When,
                TokenKind::Identifier("a".into()),
                TokenKind::Ge,
                TokenKind::Number(1.0),
                TokenKind::Arrow,
                TokenKind::Number(2.0),
                TokenKind::Comma,
                TokenKind::Identifier("else_value".into()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_token_positions() {
        let tokens = tokenize("a +\n  b").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 3));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("parent # 2").unwrap_err();
        assert_eq!(err, FormulaError::syntax("Unexpected character '#'", 1, 8));
    }
}
