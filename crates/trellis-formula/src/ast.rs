//! Formula syntax tree.

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
    And,
    Or,
}

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f32),
    /// `true` / `false`
    Bool(bool),
    /// A named value from the context
    Field(String),
    /// Member of a record value: `safeAreaInsets.left`
    Access { target: Box<Expr>, field: String },
    /// Context function call: `max(a, b)`
    Call { name: String, args: Vec<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `when c1 -> v1, c2 -> v2, fallback`
    When {
        branches: Vec<(Expr, Expr)>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// Collect the names of every top-level context field the expression reads.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) | Expr::Bool(_) => {}
            Expr::Field(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Access { target, .. } => target.collect_fields(out),
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_fields(out)),
            Expr::Unary { operand, .. } => operand.collect_fields(out),
            Expr::Binary { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Expr::When { branches, otherwise } => {
                for (condition, value) in branches {
                    condition.collect_fields(out);
                    value.collect_fields(out);
                }
                otherwise.collect_fields(out);
            }
        }
    }
}
