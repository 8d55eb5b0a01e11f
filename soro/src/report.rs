use std::error::Error;
use std::fmt::Display;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use sorospan::Spand;

pub trait Report {
    fn diagnose(&self) -> Diagnostic<()>;
}

pub struct SimpleReport {
    message: String,
}

impl SimpleReport {
    #[must_use]
    pub const fn new(message: String) -> Self {
        Self { message }
    }
}

impl Report for SimpleReport {
    fn diagnose(&self) -> Diagnostic<()> {
        Diagnostic::error().with_message(&self.message)
    }
}

impl<T: Error> Report for Spand<T> {
    fn diagnose(&self) -> Diagnostic<()> {
        Diagnostic::error()
            .with_message(self.kind())
            .with_label(Label::primary((), self.span))
    }
}

/// Bytes of surrounding input shown on each side of an error position.
const CONTEXT: usize = 10;

/// Renders an error as a fixed three-line block:
///
/// ```text
/// ERROR
/// invalid float literal at 4: 0.5.f
///                                 ^
/// ```
///
/// The excerpt is a window around the error position, widened to char
/// boundaries, and the caret sits under the position the error points
/// at, one column past the excerpt when the input ends there.
#[must_use]
pub fn plain_message<T: Display>(input: &str, error: &Spand<T>) -> String {
    let index = error.span.lo() as usize;

    let mut start = index.saturating_sub(CONTEXT);
    let mut end = usize::min(index + CONTEXT, input.len());
    while !input.is_char_boundary(start) {
        start -= 1;
    }
    while !input.is_char_boundary(end) {
        end += 1;
    }

    let message = format!("{} at {index}: ", error.kind());
    let column = message.chars().count() + input[start..index].chars().count();

    format!("ERROR\n{message}{}\n{}^", &input[start..end], " ".repeat(column))
}

#[cfg(test)]
mod test {
    use soroc::lexer::LexErrorKind;
    use soroc::parser::ParseErrorKind;
    use soroc::token::{TokenKind, TokenSet};
    use sorospan::Span;

    use super::*;

    #[test]
    fn short_input() {
        let error = Spand::new(LexErrorKind::InvalidFloat, Span::point(4));
        let expected = format!(
            "ERROR\ninvalid float literal at 4: 0.5.f\n{}^",
            " ".repeat(32)
        );
        assert_eq!(plain_message("0.5.f", &error), expected);
    }

    #[test]
    fn windowed_excerpt() {
        let error = Spand::new(
            ParseErrorKind::Expected(TokenKind::RParen),
            Span::point(16),
        );
        let expected = format!(
            "ERROR\nexpected ')' at 16:  3.0 * 4.0\n{}^",
            " ".repeat(30)
        );
        assert_eq!(plain_message("(2.0 + 3.0 * 4.0", &error), expected);
    }

    #[test]
    fn caret_past_the_end() {
        let error = Spand::new(
            ParseErrorKind::ExpectedOneOf(TokenSet::LPAREN.union(TokenSet::NUMBER)),
            Span::point(5),
        );
        let rendered = plain_message("2.0 +", &error);
        let caret = rendered.lines().last().unwrap();
        let message = rendered.lines().nth(1).unwrap();
        assert_eq!(caret.len(), message.len() + 1);
        assert!(caret.ends_with('^'));
    }

    #[test]
    fn window_inside_long_input() {
        let error = Spand::new(
            LexErrorKind::UnexpectedChar('$'),
            Span::new(12, 13),
        );
        let rendered = plain_message("1.0 + 2.0 + $ + 3.0", &error);
        let expected = format!(
            "ERROR\nunexpected character '$' at 12: 0 + 2.0 + $ + 3.0\n{}^",
            " ".repeat(42)
        );
        assert_eq!(rendered, expected);
    }
}
