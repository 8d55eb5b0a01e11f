use crate::ast::{Expr, ExprKind};

/// Evaluates an expression tree to its value.
///
/// Total over every tree the parser produces. Division follows IEEE-754,
/// so nothing here can fail.
#[must_use]
pub fn eval(expr: &Expr) -> f64 {
    match &expr.kind {
        ExprKind::Number(value) => *value,
        ExprKind::Sum { op, lhs, rhs } => op.apply(eval(lhs), eval(rhs)),
        ExprKind::Product { op, lhs, rhs } => op.apply(eval(lhs), eval(rhs)),
    }
}
