use sorospan::Spand;

use crate::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOp {
    Mul,
    Div,
}

impl SumOp {
    #[must_use]
    pub const fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(Self::Add),
            TokenKind::Minus => Some(Self::Sub),
            _ => None,
        }
    }

    #[must_use]
    pub const fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
        }
    }
}

impl ProductOp {
    #[must_use]
    pub const fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Star => Some(Self::Mul),
            TokenKind::Slash => Some(Self::Div),
            _ => None,
        }
    }

    /// IEEE-754 division: a zero divisor gives ±infinity or NaN, never an
    /// error.
    #[must_use]
    pub const fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Number(f64),

    Sum {
        op:  SumOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Product {
        op:  ProductOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

pub type Expr = Spand<ExprKind>;
