//! Size formula owned by a size policy.

use std::cell::{Cell, RefCell};

use trellis_core::FormulaError;

use crate::ast::Expr;
use crate::eval::{evaluate_number, FormulaContext};
use crate::grammar::parse;

/// A formula attached to one axis of a size policy.
///
/// Errors are sticky: a parse error lasts until the source changes, an
/// evaluation error lasts until the next successful evaluation. Every change
/// of the error state marks the formula as changed so observers can refresh.
#[derive(Debug, Default)]
pub struct LayoutFormula {
    source: String,
    expression: Option<Expr>,
    parse_error: Option<FormulaError>,
    eval_error: RefCell<Option<FormulaError>>,
    changed: Cell<bool>,
}

impl Clone for LayoutFormula {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            expression: self.expression.clone(),
            parse_error: self.parse_error.clone(),
            eval_error: RefCell::new(self.eval_error.borrow().clone()),
            changed: Cell::new(self.changed.get()),
        }
    }
}

impl LayoutFormula {
    /// Create a formula and parse its source.
    pub fn new(source: impl Into<String>) -> Self {
        let mut formula = Self::default();
        formula.set_source(source);
        formula
    }

    /// The formula source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the source and re-parse it.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.eval_error.replace(None);
        if self.source.trim().is_empty() {
            self.expression = None;
            self.parse_error = None;
        } else {
            match parse(&self.source) {
                Ok(expr) => {
                    self.expression = Some(expr);
                    self.parse_error = None;
                }
                Err(err) => {
                    log::debug!("formula '{}' failed to parse: {}", self.source, err);
                    self.expression = None;
                    self.parse_error = Some(err);
                }
            }
        }
        self.mark_changes();
    }

    /// True when the formula has no source.
    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// The parsed expression, when parsing succeeded.
    pub fn expression(&self) -> Option<&Expr> {
        self.expression.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.parse_error.is_some() || self.eval_error.borrow().is_some()
    }

    /// The current error, if any.
    pub fn error(&self) -> Option<FormulaError> {
        self.parse_error
            .clone()
            .or_else(|| self.eval_error.borrow().clone())
    }

    /// Human readable error message for display in an editor.
    pub fn error_message(&self) -> Option<String> {
        self.error().map(|e| e.to_string())
    }

    pub fn has_changes(&self) -> bool {
        self.changed.get()
    }

    pub fn mark_changes(&self) {
        self.changed.set(true);
    }

    pub fn reset_changes(&self) {
        self.changed.set(false);
    }

    /// Evaluate the formula, returning 0 when it cannot produce a number.
    pub fn calculate(&self, ctx: &dyn FormulaContext) -> f32 {
        let Some(expr) = &self.expression else {
            return 0.0;
        };

        match evaluate_number(expr, ctx) {
            Ok(value) if value.is_finite() => {
                if self.eval_error.replace(None).is_some() {
                    self.mark_changes();
                }
                value
            }
            Ok(value) => self.fail(FormulaError::InvalidResult {
                found: value.to_string(),
            }),
            Err(err) => self.fail(err),
        }
    }

    fn fail(&self, err: FormulaError) -> f32 {
        let changed = self.eval_error.borrow().as_ref() != Some(&err);
        if changed {
            log::debug!("formula '{}' failed: {}", self.source, err);
            self.eval_error.replace(Some(err));
            self.mark_changes();
        }
        0.0
    }
}
