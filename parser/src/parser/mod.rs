/*! Implements the row pattern parser.

The parser is a recursive descent over the token stream produced by the
tokenizer. Alternation has the lowest precedence, then concatenation, then
quantification, which binds to the single variable or group it follows.

All structural rejections live here: misplaced `|`, empty groups and
alternatives, quantifiers with nothing to repeat, and parenthesis balance.
Purely lexical rejections (reserved words, unsupported operators, malformed
brace quantifiers) are produced by the tokenizer and surface through
[`Parser::parse`] unchanged.
*/

use crate::ast::{Node, Quantifier};
use crate::tokenizer::{Token, Tokenizer};

mod errors;

pub use errors::Error;

#[cfg(test)]
mod tests;

/// Parses row patterns.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given pattern.
    pub fn new(source: &'src str) -> Self {
        Self { source, tokens: Vec::new(), pos: 0 }
    }

    /// Parses the pattern and returns its AST.
    pub fn parse(mut self) -> Result<Node, Error> {
        self.tokens =
            Tokenizer::new(self.source).collect::<Result<Vec<_>, _>>()?;
        let node = self.parse_alternation(false)?;
        // The descent stops only at end of input or at a closing
        // parenthesis it didn't open.
        if let Some(token) = self.peek() {
            return Err(Error::UnmatchedParenthesis {
                offset: token.span().start(),
            });
        }
        Ok(node)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    /// alternation := sequence ( `|` sequence )*
    fn parse_alternation(&mut self, in_group: bool) -> Result<Node, Error> {
        if let Some(Token::PIPE(span)) = self.peek() {
            return Err(Error::AlternationAtStart { offset: span.start() });
        }
        let mut alternatives = Vec::new();
        loop {
            let mut items = self.parse_sequence()?;
            if items.is_empty() {
                return Err(self.empty_branch_error(in_group, &alternatives));
            }
            let node = if items.len() == 1 {
                items.pop().unwrap()
            } else {
                Node::Seq { items }
            };
            alternatives.push(node);
            match self.peek() {
                Some(Token::PIPE(_)) => {
                    self.advance();
                }
                _ => break,
            }
        }
        if alternatives.len() == 1 {
            Ok(alternatives.pop().unwrap())
        } else {
            Ok(Node::Alt { alternatives })
        }
    }

    /// Picks the right error for an alternation branch that turned out to
    /// contain nothing, based on what ended it.
    fn empty_branch_error(
        &self,
        in_group: bool,
        alternatives: &[Node],
    ) -> Error {
        match self.peek() {
            Some(Token::PIPE(span)) => {
                Error::EmptyAlternative { offset: span.start() }
            }
            Some(Token::R_PAREN(span)) => {
                if in_group || !alternatives.is_empty() {
                    Error::AlternationAtEnd { offset: span.start() }
                } else {
                    Error::UnmatchedParenthesis { offset: span.start() }
                }
            }
            None => {
                if alternatives.is_empty() {
                    Error::EmptyPattern
                } else {
                    Error::AlternationAtEnd { offset: self.source.len() }
                }
            }
            // `parse_sequence` stops only at `|`, `)` or end of input.
            Some(_) => unreachable!(),
        }
    }

    /// sequence := ( variable | group )+ with optional quantifiers
    fn parse_sequence(&mut self) -> Result<Vec<Node>, Error> {
        let mut items = Vec::new();
        loop {
            match self.peek().cloned() {
                Some(Token::VAR(span)) => {
                    self.advance();
                    let name = &self.source[span.start()..span.end()];
                    let quant = self.parse_quantifier();
                    items.push(Node::Var { name: name.to_string(), quant });
                }
                Some(Token::L_PAREN(span)) => {
                    self.advance();
                    if let Some(Token::R_PAREN(rparen)) = self.peek() {
                        return Err(Error::EmptyGroup {
                            offset: rparen.start(),
                        });
                    }
                    let content = self.parse_alternation(true)?;
                    match self.peek() {
                        Some(Token::R_PAREN(_)) => {
                            self.advance();
                        }
                        _ => {
                            return Err(Error::UnclosedParenthesis {
                                offset: span.start(),
                            })
                        }
                    }
                    let quant = self.parse_quantifier();
                    items.push(Node::Group {
                        content: Box::new(content),
                        quant,
                    });
                }
                Some(token) if token.is_quantifier() => {
                    return Err(Error::MisplacedQuantifier {
                        offset: token.span().start(),
                    });
                }
                // `|`, `)` or end of input ends the sequence.
                _ => break,
            }
        }
        Ok(items)
    }

    /// Consumes an optional quantifier, plus the `?` that makes it
    /// reluctant. Returns the implicit `{1}` when no quantifier follows.
    fn parse_quantifier(&mut self) -> Quantifier {
        let (min, max) = match self.peek() {
            Some(Token::QUESTION(_)) => (0, Some(1)),
            Some(Token::STAR(_)) => (0, None),
            Some(Token::PLUS(_)) => (1, None),
            Some(Token::RANGE(_, min, max)) => (*min, *max),
            _ => return Quantifier::ONE,
        };
        self.advance();
        let reluctant = if matches!(self.peek(), Some(Token::QUESTION(_))) {
            self.advance();
            true
        } else {
            false
        };
        Quantifier { min, max, reluctant }
    }
}
