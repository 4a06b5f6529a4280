/*! Implements the row pattern tokenizer.

Tokenization is the first step of compilation. The tokenizer takes pattern
text and produces a sequence of tokens that is later consumed by the parser.
Each token is represented by a variant of the [`Token`] type.

Brace quantifiers are validated here: by the time a [`Token::RANGE`] is
produced its bounds are known to be sane (`min <= max`, `max >= 1`).
Constructs that can be ruled out lexically are also rejected here with the
offset at which they occur: the reserved word `PERMUTE`, the `&`, `^` and
`$` operators, pattern exclusions (`{- ... -}`), and malformed brace
quantifiers.
*/

use logos::Logos;

use crate::parser::Error;
use crate::Span;

mod tokens;

pub(crate) use tokens::Token;


/// Takes pattern text and produces a sequence of tokens.
pub(crate) struct Tokenizer<'src> {
    source: &'src str,
    lexer: logos::Lexer<'src, RawToken>,
}

impl<'src> Tokenizer<'src> {
    /// Creates a new [`Tokenizer`].
    pub fn new(source: &'src str) -> Self {
        // Can't handle patterns larger than the maximum span size.
        assert!(source.len() < Span::MAX);
        Self { source, lexer: RawToken::lexer(source) }
    }

    /// Returns the next token, or `None` when the pattern is exhausted.
    pub fn next_token(&mut self) -> Option<Result<Token, Error>> {
        let raw = self.lexer.next()?;
        let span = Span::from(self.lexer.span());
        let offset = span.start();
        Some(match raw {
            Ok(RawToken::Ident) => {
                let name = self.lexer.slice();
                if name.eq_ignore_ascii_case("PERMUTE") {
                    Err(Error::PermuteUnsupported { offset })
                } else {
                    Ok(Token::VAR(span))
                }
            }
            Ok(RawToken::LParen) => Ok(Token::L_PAREN(span)),
            Ok(RawToken::RParen) => Ok(Token::R_PAREN(span)),
            Ok(RawToken::Pipe) => Ok(Token::PIPE(span)),
            Ok(RawToken::Question) => Ok(Token::QUESTION(span)),
            Ok(RawToken::Star) => Ok(Token::STAR(span)),
            Ok(RawToken::Plus) => Ok(Token::PLUS(span)),
            Ok(RawToken::Range((min, max))) => Ok(Token::RANGE(span, min, max)),
            Ok(RawToken::Ampersand) => Err(Error::AndUnsupported { offset }),
            Ok(RawToken::Caret) => {
                Err(Error::AnchorUnsupported { anchor: '^', offset })
            }
            Ok(RawToken::Dollar) => {
                Err(Error::AnchorUnsupported { anchor: '$', offset })
            }
            Ok(RawToken::ExclusionStart) => {
                Err(Error::ExclusionUnsupported { offset })
            }
            Err(err) => Err(self.convert_error(err, offset)),
        })
    }

    /// Maps a lexer-level error to a positioned [`Error`].
    fn convert_error(&self, err: LexError, offset: usize) -> Error {
        match err {
            LexError::Empty => Error::EmptyQuantifier { offset },
            LexError::Zero => Error::ZeroQuantifier { offset },
            LexError::Bounds { min, max } => {
                Error::InvalidQuantifierBounds { min, max, offset }
            }
            LexError::Malformed => Error::MalformedQuantifier { offset },
            LexError::Unexpected => {
                match self.source[offset..].chars().next() {
                    // A `{` that didn't lex as a brace quantifier is either
                    // unclosed or has junk inside.
                    Some('{') => Error::MalformedQuantifier { offset },
                    Some(ch) => Error::InvalidCharacter { ch, offset },
                    None => Error::MalformedQuantifier { offset },
                }
            }
        }
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Result<Token, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Error produced while lexing a single token. Carries just enough detail
/// for [`Tokenizer::convert_error`] to build the public [`Error`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum LexError {
    /// No token matched at this position.
    #[default]
    Unexpected,
    /// `{}` or `{,}`.
    Empty,
    /// `{0}`.
    Zero,
    /// `{n,m}` with `n > m` or `m == 0`.
    Bounds { min: u32, max: u32 },
    /// Anything else wrong inside `{...}`, including numbers that don't
    /// fit in 32 bits.
    Malformed,
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
#[logos(error = LexError)]
enum RawToken {
    #[regex(r"[A-Za-z][A-Za-z0-9_]*")]
    Ident,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("|")]
    Pipe,

    #[token("?")]
    Question,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[regex(r"\{[0-9]*(,[0-9]*)?\}", parse_braces)]
    Range((u32, Option<u32>)),

    // Constructs that exist in the wider row pattern grammar but are not
    // supported by this engine. Lexing them as their own tokens lets the
    // tokenizer report them with a precise offset and message.
    #[token("&")]
    Ampersand,

    #[token("^")]
    Caret,

    #[token("$")]
    Dollar,

    #[token("{-")]
    ExclusionStart,
}

/// Parses and validates the contents of a brace quantifier.
fn parse_braces(
    lexer: &mut logos::Lexer<RawToken>,
) -> Result<(u32, Option<u32>), LexError> {
    let inner = &lexer.slice()[1..lexer.slice().len() - 1];
    match inner.split_once(',') {
        None => {
            if inner.is_empty() {
                return Err(LexError::Empty);
            }
            let n: u32 = inner.parse().map_err(|_| LexError::Malformed)?;
            if n == 0 {
                return Err(LexError::Zero);
            }
            Ok((n, Some(n)))
        }
        Some((lo, hi)) => {
            if lo.is_empty() && hi.is_empty() {
                return Err(LexError::Empty);
            }
            let min: u32 = if lo.is_empty() {
                0
            } else {
                lo.parse().map_err(|_| LexError::Malformed)?
            };
            if hi.is_empty() {
                return Ok((min, None));
            }
            let max: u32 = hi.parse().map_err(|_| LexError::Malformed)?;
            if max == 0 || min > max {
                return Err(LexError::Bounds { min, max });
            }
            Ok((min, Some(max)))
        }
    }
}
