use std::fmt::Display;

use sorospan::Spand;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),

    Plus,
    Minus,
    Star,
    Slash,

    LParen,
    RParen,

    Eof,
}

pub type Token = Spand<TokenKind>;

/// Diagnostic names, indexed by `TokenKind::index`.
const NAMES: [&str; 8] = [
    "'+'",
    "'-'",
    "'*'",
    "'/'",
    "'('",
    "')'",
    "a number",
    "end of input",
];

impl TokenKind {
    const fn index(self) -> u8 {
        match self {
            Self::Plus => 0,
            Self::Minus => 1,
            Self::Star => 2,
            Self::Slash => 3,
            Self::LParen => 4,
            Self::RParen => 5,
            Self::Number(_) => 6,
            Self::Eof => 7,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        NAMES[self.index() as usize]
    }
}

/// Set of token kinds, one bit per `TokenKind::index` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSet(u8);

impl TokenSet {
    pub const EMPTY: Self = Self(0);
    pub const PLUS: Self = Self(1 << 0);
    pub const MINUS: Self = Self(1 << 1);
    pub const STAR: Self = Self(1 << 2);
    pub const SLASH: Self = Self(1 << 3);
    pub const LPAREN: Self = Self(1 << 4);
    pub const RPAREN: Self = Self(1 << 5);
    pub const NUMBER: Self = Self(1 << 6);
    pub const EOF: Self = Self(1 << 7);

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, kind: TokenKind) -> bool {
        (self.0 & (1 << kind.index())) != 0
    }
}

impl Display for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = NAMES
            .iter()
            .enumerate()
            .filter(|&(i, _)| (self.0 & (1 << i)) != 0)
            .map(|(_, &name)| name)
            .collect();

        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                f.write_str(if i + 1 == names.len() { " or " } else { ", " })?;
            }
            f.write_str(name)?;
        }

        Ok(())
    }
}
