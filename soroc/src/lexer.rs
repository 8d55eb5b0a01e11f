use std::str::Chars;

use sorospan::{Span, Spand};
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Error, Debug, Clone, Copy)]
pub enum LexErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("invalid float literal")]
    InvalidFloat,
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Chars<'a>,

    /// start byte position of current token
    byte_start: u32,

    /// byte position of cursor
    byte: u32,

    /// whether the trailing `Eof` token was emitted
    done: bool,
}

const EOF: char = '\0';

pub type LexError = Spand<LexErrorKind>;
pub type LexResult<T> = Result<T, LexError>;

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        assert!(u32::try_from(input.len()).is_ok());

        Self {
            input,
            chars: input.chars(),
            byte_start: 0,
            byte: 0,
            done: false,
        }
    }

    /// Lexes the whole input, stopping at the first error. A successful
    /// scan always ends with an `Eof` token at the input length.
    pub fn lex_all(self) -> LexResult<Vec<Token>> {
        self.collect()
    }

    fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF)
    }

    fn bump(&mut self) -> Option<char> {
        #[allow(clippy::cast_possible_truncation)]
        self.chars
            .next()
            .inspect(|c| self.byte += c.len_utf8() as u32)
    }

    const fn make_span(&self) -> Span {
        Span::new(self.byte_start, self.byte)
    }

    fn skip_spaces(&mut self) {
        while self.first() == ' ' {
            self.bump();
        }
    }

    fn view(&self) -> &'a str {
        &self.input[self.byte_start as usize..self.byte as usize]
    }

    fn number(&mut self, first: char) -> LexResult<Token> {
        // Literal automaton, seeded past its start state with the already
        // consumed character. State 1 is a leading dot, 2 bare digits, 3 has
        // a decimal point, 4/5/6 the exponent, 7 a type suffix. States 3, 6
        // and 7 accept.
        let mut state: u8 = if first == '.' { 1 } else { 2 };

        loop {
            state = match (state, self.first()) {
                (1, '0'..='9') => 3,
                (2, '0'..='9') => 2,
                (2, '.') => 3,
                (3, '0'..='9') => 3,
                (3, 'e' | 'E') => 4,
                (3 | 6, 'f' | 'F' | 'l' | 'L') => 7,
                (4, '+' | '-') => 5,
                (4 | 5 | 6, '0'..='9') => 6,
                _ => break,
            };
            self.bump();
        }

        if matches!(state, 3 | 6 | 7) {
            // accepted literal text is valid f64 syntax once the suffix is gone
            let literal = self.view().trim_end_matches(['f', 'F', 'l', 'L']);
            let value = literal.parse().unwrap();
            Ok(Token::new(TokenKind::Number(value), self.make_span()))
        } else {
            Err(LexError::new(
                LexErrorKind::InvalidFloat,
                Span::point(self.byte),
            ))
        }
    }

    pub fn next_token(&mut self) -> Option<LexResult<Token>> {
        macro_rules! token {
            ($name:ident) => {
                Some(Ok(Token::new(TokenKind::$name, self.make_span())))
            };
        }

        self.skip_spaces();

        self.byte_start = self.byte;
        let Some(c) = self.bump() else {
            if self.done {
                return None;
            }
            self.done = true;
            return token!(Eof);
        };

        match c {
            '(' => token!(LParen),
            ')' => token!(RParen),
            '+' => token!(Plus),
            '-' => token!(Minus),
            '*' => token!(Star),
            '/' => token!(Slash),

            '0'..='9' | '.' => Some(self.number(c)),

            _ => Some(Err(LexError::new(
                LexErrorKind::UnexpectedChar(c),
                self.make_span(),
            ))),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
