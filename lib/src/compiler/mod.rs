/*!
Compiles row patterns into the flat element programs executed by the
matcher.

The pipeline is `text -> AST -> optimized AST -> element array`. Parsing is
done by the `rowpat-parser` crate; this module owns the optimizer (see
[`optimizer`]) and the flattener.

Flattening walks the AST emitting one element per construct. Forward links
(`next`) that are not known yet while walking, the exits of a subtree that
must flow into whatever comes after it, are carried upward as a list of
dangling element indices and patched as soon as the following element is
emitted, the last of them against the `Fin` sentinel. Backward links are
known immediately: a `GroupEnd` points at the first element of its group,
and each alternative's first element points at the next alternative.
*/

use rowpat_parser::ast::Node;

pub(crate) mod pattern;

mod errors;
mod optimizer;

pub use errors::CompileError;
pub use errors::ParseError;
pub use pattern::Pattern;

use pattern::{ElementKind, PatternElement, VarId};


/// Compiles a row pattern with the default configuration.
///
/// This is a shorthand for `Compiler::new().compile(pattern)`.
pub fn compile(pattern: &str) -> Result<Pattern, CompileError> {
    Compiler::new().compile(pattern)
}

/// Compiles row patterns into [`Pattern`] programs.
#[derive(Default)]
pub struct Compiler {
    skip_optimizations: bool,
}

impl Compiler {
    /// Creates a new compiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the AST optimizer. It is enabled by default;
    /// disabling it never changes what a pattern matches, only the size of
    /// the compiled program.
    pub fn optimize(mut self, yes: bool) -> Self {
        self.skip_optimizations = !yes;
        self
    }

    /// Compiles the given pattern.
    pub fn compile(&self, pattern: &str) -> Result<Pattern, CompileError> {
        let ast = rowpat_parser::parse(pattern)?;
        let ast = if self.skip_optimizations {
            ast
        } else {
            optimizer::optimize(ast)
        };
        let compiled = Flattener::default().flatten(&ast);
        verify(&compiled)?;
        Ok(compiled)
    }
}

#[derive(Default)]
struct Flattener {
    elements: Vec<PatternElement>,
    variables: Vec<String>,
    max_depth: usize,
}

impl Flattener {
    fn flatten(mut self, ast: &Node) -> Pattern {
        let exits = self.flatten_node(ast, 0);
        let fin = self.elements.len();
        self.elements.push(PatternElement {
            kind: ElementKind::Fin,
            depth: 0,
            min: 1,
            max: Some(1),
            next: None,
            jump: None,
            reluctant: false,
        });
        self.patch(&exits, fin);
        let reluctant = self.elements.iter().any(|e| e.reluctant);
        Pattern {
            elements: self.elements,
            variables: self.variables,
            max_depth: self.max_depth,
            reluctant,
        }
    }

    /// Emits the elements for `node` at the given depth. Returns the
    /// indices of the emitted elements whose `next` link must be patched
    /// to point at whatever follows `node`.
    fn flatten_node(&mut self, node: &Node, depth: usize) -> Vec<usize> {
        self.max_depth = self.max_depth.max(depth);
        match node {
            Node::Var { name, quant } => {
                let id = self.intern(name);
                let index = self.elements.len();
                self.elements.push(PatternElement {
                    kind: ElementKind::Var(id),
                    depth,
                    min: quant.min,
                    max: quant.max,
                    next: None,
                    jump: None,
                    reluctant: quant.reluctant,
                });
                vec![index]
            }
            Node::Group { content, quant } => {
                if quant.min == 1 && quant.max == Some(1) {
                    // A group iterated exactly once needs no closing
                    // element and no iteration counter; its content flows
                    // straight through at the surrounding depth.
                    return self.flatten_node(content, depth);
                }
                let start = self.elements.len();
                let inner_exits = self.flatten_node(content, depth + 1);
                let end = self.elements.len();
                self.elements.push(PatternElement {
                    kind: ElementKind::GroupEnd,
                    depth,
                    min: quant.min,
                    max: quant.max,
                    next: None,
                    jump: Some(start),
                    reluctant: quant.reluctant,
                });
                self.patch(&inner_exits, end);
                vec![end]
            }
            Node::Seq { items } => {
                let mut dangling: Vec<usize> = Vec::new();
                for item in items {
                    let first = self.elements.len();
                    let exits = self.flatten_node(item, depth);
                    self.patch(&dangling, first);
                    dangling = exits;
                }
                dangling
            }
            Node::Alt { alternatives } => {
                let alt_start = self.elements.len();
                self.elements.push(PatternElement {
                    kind: ElementKind::AltStart,
                    depth,
                    min: 1,
                    max: Some(1),
                    next: None,
                    jump: None,
                    reluctant: false,
                });
                let mut exits = vec![alt_start];
                let mut previous_first: Option<usize> = None;
                for alternative in alternatives {
                    let first = self.elements.len();
                    exits.extend(self.flatten_node(alternative, depth + 1));
                    if let Some(prev) = previous_first {
                        self.elements[prev].jump = Some(first);
                    }
                    previous_first = Some(first);
                }
                exits
            }
        }
    }

    fn patch(&mut self, dangling: &[usize], target: usize) {
        for &index in dangling {
            debug_assert!(self.elements[index].next.is_none());
            self.elements[index].next = Some(target);
        }
    }

    fn intern(&mut self, name: &str) -> VarId {
        match self.variables.iter().position(|v| v == name) {
            Some(id) => id as VarId,
            None => {
                self.variables.push(name.to_string());
                (self.variables.len() - 1) as VarId
            }
        }
    }
}

/// Checks the structural invariants of a flattened program.
fn verify(pattern: &Pattern) -> Result<(), CompileError> {
    let n = pattern.elements.len();
    let internal = |msg: String| Err(CompileError::Internal(msg));

    let fins = pattern
        .elements
        .iter()
        .filter(|e| matches!(e.kind, ElementKind::Fin))
        .count();
    if fins != 1 || !matches!(pattern.elements[n - 1].kind, ElementKind::Fin)
    {
        return internal("program must end with its only FIN".to_string());
    }

    for (i, elem) in pattern.elements.iter().enumerate() {
        match elem.kind {
            ElementKind::Fin => {
                if elem.next.is_some() {
                    return internal(format!("FIN at {i} has a successor"));
                }
            }
            kind => {
                match elem.next {
                    Some(next) if next < n => {}
                    _ => {
                        return internal(format!(
                            "element {i} has a dangling next link"
                        ))
                    }
                }
                if let ElementKind::GroupEnd = kind {
                    match elem.jump {
                        Some(start) if start < i => {}
                        _ => {
                            return internal(format!(
                                "group end at {i} does not jump back"
                            ))
                        }
                    }
                    if elem.max.map_or(false, |max| max < 1 || max < elem.min)
                    {
                        return internal(format!(
                            "group end at {i} has impossible bounds"
                        ));
                    }
                }
            }
        }
    }

    // Every element must reach FIN by chasing `next`.
    for start in 0..n {
        let mut index = start;
        let mut steps = 0;
        while let Some(next) = pattern.elements[index].next {
            index = next;
            steps += 1;
            if steps > n {
                return internal(format!(
                    "element {start} never reaches FIN"
                ));
            }
        }
        if !matches!(pattern.elements[index].kind, ElementKind::Fin) {
            return internal(format!("element {start} never reaches FIN"));
        }
    }

    // Depths are contiguous from zero up to the maximum.
    for d in 0..=pattern.max_depth {
        if !pattern.elements.iter().any(|e| e.depth == d) {
            return internal(format!("no element at depth {d}"));
        }
    }

    Ok(())
}
