//! Size formula language for Trellis.
//!
//! Formulas compute a node's size from named layout quantities:
//!
//! ```ignore
//! use trellis_formula::LayoutFormula;
//!
//! let formula = LayoutFormula::new("max(parent * 0.5, childrenSum) - safeAreaInsets.left");
//! let width = formula.calculate(&context);
//! ```
//!
//! The tokenizer is built on `nom`; the grammar is a small precedence-climbing
//! parser over the token list.

mod ast;
mod eval;
mod formula;
mod grammar;
mod lexer;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{evaluate, evaluate_number, expect_args, FormulaContext, FormulaValue};
pub use formula::LayoutFormula;
pub use grammar::parse;
pub use lexer::{tokenize, Token, TokenKind};
