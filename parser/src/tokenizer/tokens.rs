use crate::Span;

/// Each of the tokens that can appear in a row pattern.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// A variable name (`[A-Za-z][A-Za-z0-9_]*`).
    VAR(Span),
    L_PAREN(Span),
    R_PAREN(Span),
    /// Alternation operator `|`.
    PIPE(Span),
    /// The `?` quantifier. Also marks the preceding quantifier as
    /// reluctant when it directly follows one.
    QUESTION(Span),
    /// The `*` quantifier.
    STAR(Span),
    /// The `+` quantifier.
    PLUS(Span),
    /// A brace quantifier. The bounds are already validated: `min <= max`
    /// and `max >= 1`. A `None` upper bound means unbounded.
    RANGE(Span, u32, Option<u32>),
}

impl Token {
    /// Returns the span of the token.
    pub fn span(&self) -> &Span {
        match self {
            Token::VAR(span)
            | Token::L_PAREN(span)
            | Token::R_PAREN(span)
            | Token::PIPE(span)
            | Token::QUESTION(span)
            | Token::STAR(span)
            | Token::PLUS(span)
            | Token::RANGE(span, _, _) => span,
        }
    }

    /// True for the quantifier tokens `?`, `*`, `+` and `{..}`.
    pub fn is_quantifier(&self) -> bool {
        matches!(
            self,
            Token::QUESTION(_)
                | Token::STAR(_)
                | Token::PLUS(_)
                | Token::RANGE(_, _, _)
        )
    }
}
