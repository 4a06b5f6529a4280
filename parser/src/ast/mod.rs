/*! Abstract Syntax Tree (AST) for row patterns.

Each variant of [`Node`] corresponds to some construct in the pattern
language: a quantified variable, a quantified group, a concatenation, or an
alternation. The order of items in a [`Node::Seq`] and of alternatives in a
[`Node::Alt`] is significant: it is what later determines the lexical order
of competing matches.

The [`Display`] implementation renders a node back to pattern text; parsing
that text again yields a structurally equal AST.
*/

use std::fmt;
use std::fmt::{Display, Formatter};

/// Repetition bounds attached to a variable or group.
///
/// `max` is `None` for unbounded quantifiers (`*`, `+`, `{n,}`). A
/// quantifier written with a trailing `?` is *reluctant*: it prefers fewer
/// repetitions over more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub min: u32,
    pub max: Option<u32>,
    pub reluctant: bool,
}

impl Quantifier {
    /// The implicit quantifier of an unquantified item: exactly one.
    pub const ONE: Quantifier =
        Quantifier { min: 1, max: Some(1), reluctant: false };

    /// True if this is the implicit `{1}` quantifier (greedy, since a
    /// single mandatory repetition leaves nothing to prefer).
    #[inline]
    pub fn is_one(&self) -> bool {
        *self == Self::ONE
    }
}

impl Display for Quantifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (1, Some(1)) => {
                // The implicit quantifier renders as nothing; the reluctant
                // `{1}?` spelling must be preserved to round-trip.
                if self.reluctant {
                    write!(f, "{{1}}?")?;
                }
                return Ok(());
            }
            (0, Some(1)) => write!(f, "?")?,
            (0, None) => write!(f, "*")?,
            (1, None) => write!(f, "+")?,
            (n, Some(m)) if n == m => write!(f, "{{{n}}}")?,
            (n, None) => write!(f, "{{{n},}}")?,
            (n, Some(m)) => write!(f, "{{{n},{m}}}")?,
        }
        if self.reluctant {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// A node in the AST of a row pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A variable with its quantifier (e.g. `A`, `B+`, `C{2,3}?`).
    Var { name: String, quant: Quantifier },
    /// A parenthesized group with its quantifier (e.g. `(A B)*`).
    Group { content: Box<Node>, quant: Quantifier },
    /// An ordered concatenation of items.
    Seq { items: Vec<Node> },
    /// An ordered disjunction of alternatives.
    Alt { alternatives: Vec<Node> },
}

impl Node {
    /// Creates a variable node with the implicit quantifier.
    pub fn var<N: Into<String>>(name: N) -> Node {
        Node::Var { name: name.into(), quant: Quantifier::ONE }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Node::Var { name, quant } => write!(f, "{name}{quant}"),
            Node::Group { content, quant } => {
                write!(f, "({content}){quant}")
            }
            Node::Seq { items } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    // A bare alternation inside a concatenation needs
                    // parentheses to keep its precedence when re-parsed.
                    if let Node::Alt { .. } = item {
                        write!(f, "({item})")?;
                    } else {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Node::Alt { alternatives } => {
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                Ok(())
            }
        }
    }
}
