// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Operator precedence and the Pratt parse-rule table.

use quill_syntax::TokenKind;

/// Binding strength, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    /// The next-higher level. Binary operators parse their right operand here.
    pub fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// A parse handler, dispatched by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
    Literal,
}

/// One row of the parse table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseRule {
    pub prefix: Option<ParseFn>,
    pub infix: Option<ParseFn>,
    pub precedence: Precedence,
}

impl ParseRule {
    const fn new(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }
}

/// Look up the parse rule for a token kind.
pub const fn rule(kind: TokenKind) -> ParseRule {
    use ParseFn::*;
    use Precedence as P;

    match kind {
        TokenKind::LeftParen => ParseRule::new(Some(Grouping), None, P::None),
        TokenKind::Minus => ParseRule::new(Some(Unary), Some(Binary), P::Term),
        TokenKind::Plus => ParseRule::new(None, Some(Binary), P::Term),
        TokenKind::Slash | TokenKind::Star => ParseRule::new(None, Some(Binary), P::Factor),
        TokenKind::Bang => ParseRule::new(Some(Unary), None, P::None),
        TokenKind::BangEqual | TokenKind::EqualEqual => {
            ParseRule::new(None, Some(Binary), P::Equality)
        }
        TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::Less
        | TokenKind::LessEqual => ParseRule::new(None, Some(Binary), P::Comparison),
        TokenKind::Number => ParseRule::new(Some(Number), None, P::None),
        TokenKind::False | TokenKind::Nil | TokenKind::True => {
            ParseRule::new(Some(Literal), None, P::None)
        }
        TokenKind::RightParen
        | TokenKind::LeftBrace
        | TokenKind::RightBrace
        | TokenKind::Comma
        | TokenKind::Dot
        | TokenKind::Semicolon
        | TokenKind::Equal
        | TokenKind::Identifier
        | TokenKind::String
        | TokenKind::And
        | TokenKind::Class
        | TokenKind::Else
        | TokenKind::For
        | TokenKind::Fun
        | TokenKind::If
        | TokenKind::Or
        | TokenKind::Print
        | TokenKind::Return
        | TokenKind::Super
        | TokenKind::This
        | TokenKind::Var
        | TokenKind::While
        | TokenKind::Error
        | TokenKind::Eof => ParseRule::new(None, None, P::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(Precedence::Assignment < Precedence::Or);
        assert!(Precedence::Equality < Precedence::Comparison);
        assert!(Precedence::Term < Precedence::Factor);
        assert!(Precedence::Factor < Precedence::Unary);
        assert_eq!(Precedence::Term.next(), Precedence::Factor);
        assert_eq!(Precedence::Primary.next(), Precedence::Primary);
    }

    #[test]
    fn test_binary_operators_have_infix_rules() {
        for kind in [
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::EqualEqual,
            TokenKind::BangEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ] {
            let rule = rule(kind);
            assert_eq!(rule.infix, Some(ParseFn::Binary), "{:?}", kind);
            assert!(rule.precedence > Precedence::Assignment, "{:?}", kind);
        }
    }

    #[test]
    fn test_non_expression_tokens_have_no_prefix() {
        for kind in [TokenKind::String, TokenKind::Identifier, TokenKind::Eof, TokenKind::Plus] {
            assert_eq!(rule(kind).prefix, None, "{:?}", kind);
        }
    }
}
