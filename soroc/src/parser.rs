use sorospan::{Span, Spand};
use thiserror::Error;

use crate::ast::{Expr, ExprKind, ProductOp, SumOp};
use crate::token::{Token, TokenKind, TokenSet};

#[derive(Error, Debug, Clone, Copy)]
pub enum ParseErrorKind {
    #[error("expected {}", .0.name())]
    Expected(TokenKind),
    #[error("expected {0}")]
    ExpectedOneOf(TokenSet),
}

pub type ParseError = Spand<ParseErrorKind>;

const SUM_OPS: TokenSet = TokenSet::PLUS.union(TokenSet::MINUS);
const PRODUCT_OPS: TokenSet = TokenSet::STAR.union(TokenSet::SLASH);
const PRIMITIVE_START: TokenSet = TokenSet::LPAREN.union(TokenSet::NUMBER);

// Grammar:
//
//   Sum       = Product (('+' | '-') Product)*
//   Product   = Primitive (('*' | '/') Primitive)*
//   Primitive = '(' Sum ')' | NUMBER
//
// Every rule call carries its anchor set: the kinds that may legally follow
// at that position, unioned over all enclosing rules. Recovery skips forward
// to an anchor and never past the trailing `Eof`, which anchors every set.
pub struct Parser {
    tokens:  Vec<Token>,
    current: usize,
    errors:  Vec<ParseError>,

    /// set on a mismatch, cleared by the next matched token; while set,
    /// further mismatches are not recorded
    panicking: bool,
}

impl Parser {
    #[must_use]
    pub const fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            panicking: false,
        }
    }

    /// Parses one expression spanning the whole input. `Ok` only for a
    /// clean parse; otherwise every error found in the pass, in source
    /// order.
    pub fn parse(mut self) -> Result<Expr, Vec<ParseError>> {
        let root = self.parse_sum(TokenSet::EMPTY);
        self.expect(TokenKind::Eof, TokenSet::EOF);

        match root {
            Some(root) if self.errors.is_empty() => Ok(root),
            _ => {
                debug_assert!(!self.errors.is_empty());
                Err(self.errors)
            }
        }
    }

    fn peek(&self) -> Token {
        self.tokens.get(self.current).copied().unwrap_or_else(|| {
            let end = self.tokens.last().map_or(0, |tk| tk.span.hi());
            Token::new(TokenKind::Eof, Span::point(end))
        })
    }

    const fn bump(&mut self) {
        if self.current < self.tokens.len() {
            self.current += 1;
        }
    }

    const fn advance(&mut self) {
        self.bump();
        self.panicking = false;
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span) {
        if !self.panicking {
            self.errors.push(ParseError::new(kind, span));
            self.panicking = true;
        }
    }

    /// Discards tokens until one can continue a surrounding rule, leaving
    /// that token unconsumed.
    fn recover(&mut self, anchors: TokenSet) {
        loop {
            let kind = self.peek().kind;
            if matches!(kind, TokenKind::Eof) || anchors.contains(kind) {
                break;
            }
            self.bump();
        }
    }

    fn expect(&mut self, expected: TokenKind, anchors: TokenSet) -> Option<Span> {
        let token = self.peek();

        if token.kind == expected {
            self.advance();
            Some(token.span)
        } else {
            self.error(ParseErrorKind::Expected(expected), token.span);
            self.recover(anchors);
            None
        }
    }

    fn infix(
        lhs: Option<Expr>,
        rhs: Option<Expr>,
        node: impl FnOnce(Box<Expr>, Box<Expr>) -> ExprKind,
    ) -> Option<Expr> {
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => {
                let span = lhs.span.join(rhs.span);
                Some(Expr::new(node(Box::new(lhs), Box::new(rhs)), span))
            }
            _ => None,
        }
    }

    fn parse_sum(&mut self, anchors: TokenSet) -> Option<Expr> {
        let anchors = anchors.union(SUM_OPS);
        let mut lhs = self.parse_product(anchors);

        while let Some(op) = SumOp::from_token(self.peek().kind) {
            self.advance();
            let rhs = self.parse_product(anchors);
            lhs = Self::infix(lhs, rhs, |lhs, rhs| ExprKind::Sum { op, lhs, rhs });
        }

        lhs
    }

    fn parse_product(&mut self, anchors: TokenSet) -> Option<Expr> {
        let anchors = anchors.union(PRODUCT_OPS);
        let mut lhs = self.parse_primitive(anchors);

        while let Some(op) = ProductOp::from_token(self.peek().kind) {
            self.advance();
            let rhs = self.parse_primitive(anchors);
            lhs = Self::infix(lhs, rhs, |lhs, rhs| ExprKind::Product { op, lhs, rhs });
        }

        lhs
    }

    fn parse_primitive(&mut self, anchors: TokenSet) -> Option<Expr> {
        let token = self.peek();

        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Some(Expr::new(ExprKind::Number(value), token.span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_sum(anchors.union(TokenSet::RPAREN));
                let close = self.expect(TokenKind::RParen, anchors);

                match (inner, close) {
                    // a parenthesized expression is its inner node with the
                    // span widened over the parentheses
                    (Some(inner), Some(close)) => {
                        Some(Expr::new(inner.kind, token.span.join(close)))
                    }
                    _ => None,
                }
            }
            _ => {
                self.error(ParseErrorKind::ExpectedOneOf(PRIMITIVE_START), token.span);
                self.recover(anchors);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(input: &str) -> Result<Expr, Vec<ParseError>> {
        Parser::new(Lexer::new(input).lex_all().unwrap()).parse()
    }

    fn errors(input: &str) -> Vec<ParseError> {
        parse(input).unwrap_err()
    }

    fn shape(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Number(value) => format!("{value:?}"),
            ExprKind::Sum { op, lhs, rhs } => {
                let op = match op {
                    SumOp::Add => '+',
                    SumOp::Sub => '-',
                };
                format!("({op} {} {})", shape(lhs), shape(rhs))
            }
            ExprKind::Product { op, lhs, rhs } => {
                let op = match op {
                    ProductOp::Mul => '*',
                    ProductOp::Div => '/',
                };
                format!("({op} {} {})", shape(lhs), shape(rhs))
            }
        }
    }

    #[test]
    fn precedence() {
        let expr = parse("5.0 + 3.0 * 9.0").unwrap();
        assert_eq!(shape(&expr), "(+ 5.0 (* 3.0 9.0))");
    }

    #[test]
    fn parenthesized() {
        let expr = parse("(5.5 - 3.3) / .9").unwrap();
        assert_eq!(shape(&expr), "(/ (- 5.5 3.3) 0.9)");
    }

    #[test]
    fn left_associativity() {
        let expr = parse("1.0 - 2.0 - 3.0").unwrap();
        assert_eq!(shape(&expr), "(- (- 1.0 2.0) 3.0)");

        let expr = parse("30.0 / 2.0 / 3.0").unwrap();
        assert_eq!(shape(&expr), "(/ (/ 30.0 2.0) 3.0)");
    }

    #[test]
    fn node_spans() {
        let root = parse("(5.0 + 3.0) * 2.0").unwrap();
        assert_eq!(root.span, Span::new(0, 17));

        let ExprKind::Product { lhs, .. } = &root.kind else {
            panic!("expected a product at the root");
        };
        assert_eq!(lhs.span, Span::new(0, 11));

        let ExprKind::Sum { lhs: five, .. } = &lhs.kind else {
            panic!("expected a sum inside the parentheses");
        };
        assert_eq!(five.span, Span::new(1, 4));
    }

    #[test]
    fn missing_close_paren() {
        let errs = errors("5.5 * ( .3");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0].kind,
            ParseErrorKind::Expected(TokenKind::RParen)
        ));
        assert_eq!(errs[0].span.lo(), 10);

        let errs = errors("(2.0 + 3.0 * 4.0");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0].kind,
            ParseErrorKind::Expected(TokenKind::RParen)
        ));
        assert_eq!(errs[0].span.lo(), 16);
    }

    #[test]
    fn trailing_input() {
        let errs = errors("1.1 2.0");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0].kind,
            ParseErrorKind::Expected(TokenKind::Eof)
        ));
        assert_eq!(errs[0].span.lo(), 4);
    }

    #[test]
    fn trailing_garbage_reports_once() {
        let errs = errors("1.1 2.0 * ) 3.0");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0].kind,
            ParseErrorKind::Expected(TokenKind::Eof)
        ));
        assert_eq!(errs[0].span.lo(), 4);
    }

    #[test]
    fn missing_operand() {
        let errs = errors("2.0 + * 3.0");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0].kind,
            ParseErrorKind::ExpectedOneOf(set) if set == PRIMITIVE_START
        ));
        assert_eq!(errs[0].span.lo(), 6);
    }

    #[test]
    fn dangling_operator() {
        let errs = errors("2.0 +");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].span.lo(), 5);
    }

    #[test]
    fn independent_errors() {
        let errs = errors("2.0 + * 3.0 + * 4.0");
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].span.lo(), 6);
        assert_eq!(errs[1].span.lo(), 14);
    }

    #[test]
    fn one_error_per_panic_episode() {
        let errs = errors("2.0 + ) 3.0");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].span.lo(), 6);
    }

    #[test]
    fn sync_on_enclosing_paren() {
        let errs = errors("(2.0 + ) * 3.0");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0].kind, ParseErrorKind::ExpectedOneOf(_)));
        assert_eq!(errs[0].span.lo(), 7);
    }

    #[test]
    fn unclosed_paren_run() {
        let errs = errors("((((");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].span.lo(), 4);
    }

    #[test]
    fn empty_input() {
        let errs = errors("");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0].kind, ParseErrorKind::ExpectedOneOf(_)));
        assert_eq!(errs[0].span.lo(), 0);
    }

    #[test]
    fn minus_is_not_a_prefix() {
        let errs = errors("-5.0");
        assert!(!errs.is_empty());
        assert_eq!(errs[0].span.lo(), 0);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ParseErrorKind::Expected(TokenKind::RParen).to_string(),
            "expected ')'"
        );
        assert_eq!(
            ParseErrorKind::Expected(TokenKind::Eof).to_string(),
            "expected end of input"
        );
        assert_eq!(
            ParseErrorKind::ExpectedOneOf(PRIMITIVE_START).to_string(),
            "expected '(' or a number"
        );
    }
}
