/*!
Defines the compiled representation of a row pattern: a flat array of
[`PatternElement`]s linked by `next` and `jump` indices, terminated by a
single `Fin` sentinel.

The element array is the program a [`Matcher`][crate::Matcher] executes.
Each element is one position the simulation can be at:

- `Var(v)` consumes rows for which variable `v` is true, bounded by the
  element's `min`/`max`.
- `AltStart` introduces an alternation; the alternatives start right after
  it and are chained through the `jump` of each alternative's first element.
- `GroupEnd` closes a quantified group; its `jump` points back at the first
  element of the group and its `min`/`max` bound the group's iterations.
- `Fin` terminates the program. There is exactly one, at the last position.

`Var` and `AltStart` are the *wait positions*: a live simulation state
pauses at one of them between rows. `GroupEnd` and `Fin` are epsilon
elements, passed through without consuming a row.
*/

use std::fmt;
use std::fmt::{Display, Formatter};

/// Identifies a variable of the pattern's alphabet. Ids are assigned in
/// order of first appearance in the pattern text.
pub(crate) type VarId = u16;

/// What a [`PatternElement`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementKind {
    /// Matches rows where the given variable is true.
    Var(VarId),
    /// Entry point of an alternation.
    AltStart,
    /// Closes a quantified group.
    GroupEnd,
    /// End of the program.
    Fin,
}

/// One slot of a compiled pattern program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PatternElement {
    pub kind: ElementKind,
    /// Nesting depth. Indexes the per-state repetition counter vector.
    pub depth: usize,
    /// Minimum number of repetitions (consecutive rows for `Var`,
    /// iterations for `GroupEnd`).
    pub min: u32,
    /// Maximum number of repetitions; `None` means unbounded.
    pub max: Option<u32>,
    /// Element to advance to on success or epsilon exit. `None` only on
    /// the `Fin` sentinel.
    pub next: Option<usize>,
    /// Kind-dependent side link, see [`PatternElement::loop_start`] and
    /// [`PatternElement::next_alternative`].
    pub jump: Option<usize>,
    /// True if the element's quantifier was written reluctant.
    pub reluctant: bool,
}

impl PatternElement {
    /// Index of the element to advance to. Must not be called on `Fin`,
    /// which has no successor.
    #[inline]
    pub fn next(&self) -> usize {
        self.next.expect("the final element has no successor")
    }

    /// For `GroupEnd`: index of the first element of the group, where the
    /// next iteration starts.
    #[inline]
    pub fn loop_start(&self) -> usize {
        debug_assert!(matches!(self.kind, ElementKind::GroupEnd));
        self.jump.expect("group end without a loop start")
    }

    /// For the first element of an alternative: index of the next
    /// alternative's first element, `None` on the last alternative.
    #[inline]
    pub fn next_alternative(&self) -> Option<usize> {
        self.jump
    }

    /// True when `count` repetitions have reached this element's upper
    /// bound.
    #[inline]
    pub fn maxed(&self, count: u32) -> bool {
        self.max.map_or(false, |max| count >= max)
    }

    fn quantifier_suffix(&self) -> String {
        let max = match self.max {
            Some(max) => max.to_string(),
            None => "*".to_string(),
        };
        let mark = if self.reluctant { "?" } else { "" };
        format!("{{{},{}}}{}", self.min, max, mark)
    }
}

/// A compiled row pattern.
///
/// Produced by [`compile`][crate::compile], consumed by
/// [`Matcher`][crate::Matcher]. The [`Display`] implementation renders the
/// program as a numbered listing, one element per line.
#[derive(Debug)]
pub struct Pattern {
    pub(crate) elements: Vec<PatternElement>,
    pub(crate) variables: Vec<String>,
    pub(crate) max_depth: usize,
    pub(crate) reluctant: bool,
}

impl Pattern {
    /// Returns the pattern's alphabet: the variable names in order of
    /// first appearance. A variable's position in this slice is its id.
    #[inline]
    pub fn variables(&self) -> &[String] {
        self.variables.as_slice()
    }

    /// True if any quantifier in the pattern is reluctant.
    #[inline]
    pub fn is_reluctant(&self) -> bool {
        self.reluctant
    }

    /// Resolves a variable name to its id. Names not in the alphabet
    /// return `None`.
    #[inline]
    pub(crate) fn var_id(&self, name: &str) -> Option<VarId> {
        self.variables.iter().position(|v| v == name).map(|i| i as VarId)
    }

    #[inline]
    pub(crate) fn element(&self, index: usize) -> &PatternElement {
        &self.elements[index]
    }

    /// Length of the repetition counter vector carried by each state.
    #[inline]
    pub(crate) fn counter_len(&self) -> usize {
        self.max_depth + 1
    }

    /// Name of the variable with the given id.
    #[inline]
    pub(crate) fn var_name(&self, id: VarId) -> &str {
        &self.variables[id as usize]
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for (i, elem) in self.elements.iter().enumerate() {
            match elem.kind {
                ElementKind::Var(v) => {
                    write!(
                        f,
                        "{:02}: VAR {} {} d{} next={:02}",
                        i,
                        self.var_name(v),
                        elem.quantifier_suffix(),
                        elem.depth,
                        elem.next(),
                    )?;
                    if let Some(alt) = elem.jump {
                        write!(f, " alt={alt:02}")?;
                    }
                }
                ElementKind::AltStart => {
                    write!(
                        f,
                        "{:02}: ALT d{} next={:02}",
                        i,
                        elem.depth,
                        elem.next(),
                    )?;
                    if let Some(alt) = elem.jump {
                        write!(f, " alt={alt:02}")?;
                    }
                }
                ElementKind::GroupEnd => {
                    write!(
                        f,
                        "{:02}: END {} d{} next={:02} loop={:02}",
                        i,
                        elem.quantifier_suffix(),
                        elem.depth,
                        elem.next(),
                        elem.loop_start(),
                    )?;
                }
                ElementKind::Fin => {
                    write!(f, "{i:02}: FIN")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
