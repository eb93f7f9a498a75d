//! Grammar rules for size formulas.
//!
//! Precedence from loosest to tightest: `when`, `or`, `and`, equality,
//! relation, additive, multiplicative, unary, member access.

use trellis_core::FormulaError;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::lexer::{tokenize, Token, TokenKind};

/// Deepest expression tree the parser builds. Evaluation and drop recurse
/// over the tree, so the bound also bounds their stack use.
const MAX_DEPTH: usize = 128;

/// Parse formula source into an expression tree.
pub fn parse(source: &str) -> Result<Expr, FormulaError> {
    let tokens = tokenize(source)?;
    if tokens.len() == 1 {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Stateful parser that tracks position in the token list.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Nesting of the expression being built
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Go one level deeper, failing once the tree would exceed `MAX_DEPTH`.
    fn enter(&mut self) -> Result<(), FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("Formula is nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Current token; the list always ends with `End`.
    fn peek(&self) -> &'a Token {
        let tokens = self.tokens;
        &tokens[self.pos.min(tokens.len() - 1)]
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: &str) -> FormulaError {
        let token = self.peek();
        FormulaError::syntax(message, token.line, token.column)
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), FormulaError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn expect_end(&self) -> Result<(), FormulaError> {
        if self.peek().kind == TokenKind::End {
            Ok(())
        } else {
            Err(self.error("Unexpected token after end of expression"))
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, FormulaError> {
        self.enter()?;
        let expr = self.parse_when()?;
        self.depth -= 1;
        Ok(expr)
    }

    fn parse_when(&mut self) -> Result<Expr, FormulaError> {
        if self.peek().kind != TokenKind::When {
            return self.parse_or();
        }

        let when_token = self.advance();
        let mut branches = Vec::new();
        loop {
            let condition = self.parse_expression()?;
            if self.peek().kind != TokenKind::Arrow {
                if branches.is_empty() {
                    return Err(FormulaError::syntax(
                        "When-operator must have at least one non-else branch",
                        when_token.line,
                        when_token.column,
                    ));
                }
                return Ok(Expr::When {
                    branches,
                    otherwise: Box::new(condition),
                });
            }
            self.advance();
            let value = self.parse_expression()?;
            self.expect(TokenKind::Comma, "Comma expected")?;
            branches.push((condition, value));
        }
    }

    /// Parse a left-associative chain of binary operators.
    fn parse_binary(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, FormulaError>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr, FormulaError> {
        let depth = self.depth;
        let mut left = operand(self)?;
        while let Some(op) = operator(&self.peek().kind) {
            self.advance();
            // every operator deepens the left spine
            self.enter()?;
            let right = operand(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, FormulaError> {
        self.parse_binary(Self::parse_and, |k| (*k == TokenKind::Or).then_some(BinaryOp::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, FormulaError> {
        self.parse_binary(Self::parse_equality, |k| {
            (*k == TokenKind::And).then_some(BinaryOp::And)
        })
    }

    fn parse_equality(&mut self) -> Result<Expr, FormulaError> {
        self.parse_binary(Self::parse_relation, |k| match k {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_relation(&mut self) -> Result<Expr, FormulaError> {
        self.parse_binary(Self::parse_additive, |k| match k {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Ge => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, FormulaError> {
        self.parse_binary(Self::parse_multiplicative, |k| match k {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, FormulaError> {
        self.parse_binary(Self::parse_unary, |k| match k {
            TokenKind::Mul => Some(BinaryOp::Mul),
            TokenKind::Div => Some(BinaryOp::Div),
            TokenKind::Mod => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_access(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_access(&mut self) -> Result<Expr, FormulaError> {
        let depth = self.depth;
        let mut expr = self.parse_primary()?;
        while self.peek().kind == TokenKind::Dot {
            self.advance();
            self.enter()?;
            match &self.peek().kind {
                TokenKind::Identifier(field) => {
                    let field = field.clone();
                    self.advance();
                    expr = Expr::Access {
                        target: Box::new(expr),
                        field,
                    };
                }
                _ => return Err(self.error("Identifier expected")),
            }
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let token = self.peek();
        match &token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::Number(*value))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.peek().kind == TokenKind::OpenParen {
                    self.advance();
                    let args = self.parse_arguments()?;
                    Ok(Expr::Call {
                        name: name.clone(),
                        args,
                    })
                } else {
                    Ok(Expr::Field(name.clone()))
                }
            }
            TokenKind::OpenParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::CloseParen, "')' expected")?;
                Ok(expr)
            }
            TokenKind::End => Err(self.error("Unexpected end of formula")),
            _ => Err(self.error("Expression expected")),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.peek().kind == TokenKind::CloseParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            match self.peek().kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::CloseParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.error("')' expected")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f32) -> Box<Expr> {
        Box::new(Expr::Number(v))
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: num(1.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: num(2.0),
                    right: num(3.0),
                }),
            }
        );
    }

    #[test]
    fn test_parse_left_associative() {
        let expr = parse("10 - 4 - 3").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Sub, left, right } => {
                assert_eq!(*right, Expr::Number(3.0));
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_call_and_access() {
        let expr = parse("max(parent - safeAreaInsets.left, 0)").unwrap();
        match expr {
            Expr::Call { name, args } => {
                assert_eq!(name, "max");
                assert_eq!(args.len(), 2);
                assert_eq!(
                    args[0].referenced_fields(),
                    vec!["parent", "safeAreaInsets"]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_when() {
        let expr = parse("when parent > 100 -> 50, parent < 10 -> 5, 20").unwrap();
        match expr {
            Expr::When { branches, otherwise } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(*otherwise, Expr::Number(20.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_when_requires_branch() {
        let err = parse("when 5").unwrap_err();
        assert_eq!(
            err,
            FormulaError::syntax("When-operator must have at least one non-else branch", 1, 1)
        );
    }

    #[test]
    fn test_parse_unclosed_paren() {
        let err = parse("(1 + 2").unwrap_err();
        assert_eq!(err, FormulaError::syntax("')' expected", 1, 7));
    }

    #[test]
    fn test_parse_trailing_tokens() {
        assert!(parse("1 2").is_err());
    }

    fn nesting_error(source: &str) -> bool {
        matches!(
            parse(source),
            Err(FormulaError::Syntax { message, .. }) if message == "Formula is nested too deeply"
        )
    }

    #[test]
    fn test_parse_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(nesting_error(&deep));

        let chain = vec!["1"; 100_000].join(" + ");
        assert!(nesting_error(&chain));
        assert!(nesting_error(&format!("{}1", "-".repeat(100_000))));
        assert!(nesting_error(&format!("a{}", ".b".repeat(100_000))));

        let shallow = format!("{}1{}", "(".repeat(64), ")".repeat(64));
        assert_eq!(parse(&shallow).unwrap(), Expr::Number(1.0));
        assert!(parse(&vec!["1"; 64].join(" * ")).is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse("   ").unwrap_err(), FormulaError::Empty);
    }
}
