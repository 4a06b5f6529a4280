/*!
AST rewrites applied before flattening.

Three semantics-preserving transformations, run to a fixpoint so the result
is stable under re-application:

1. *Unwrap*: single-item sequences and `{1}` groups collapse, nested
   sequences and alternations flatten one level.
2. *Dedup*: alternatives that are structurally equal to an earlier one in
   the same alternation are dropped. The first occurrence wins, so lexical
   order is unaffected.
3. *Fusion*: runs of the same unquantified variable collapse into a counted
   one (`A A A` -> `A{3}`), and a group around a single quantified item
   collapses into the item with multiplied bounds when the repetition
   counts stay contiguous.
*/

use itertools::Itertools;

use rowpat_parser::ast::{Node, Quantifier};

/// Rewrites the AST until no pass changes it anymore.
pub(crate) fn optimize(mut node: Node) -> Node {
    loop {
        let rewritten = fuse(dedup(unwrap(node.clone())));
        if rewritten == node {
            return node;
        }
        node = rewritten;
    }
}

/// Collapses trivial structure: `Seq` of one item, `{1}` groups, nested
/// `Seq`/`Alt` one level deep.
fn unwrap(node: Node) -> Node {
    match node {
        Node::Var { .. } => node,
        Node::Group { content, quant } => {
            let content = unwrap(*content);
            // A group repeated exactly once adds nothing; reluctance on
            // `{1}` offers no choice either.
            if quant.min == 1 && quant.max == Some(1) {
                content
            } else {
                Node::Group { content: Box::new(content), quant }
            }
        }
        Node::Seq { items } => {
            let mut flattened = Vec::with_capacity(items.len());
            for item in items.into_iter().map(unwrap) {
                match item {
                    Node::Seq { items } => flattened.extend(items),
                    other => flattened.push(other),
                }
            }
            if flattened.len() == 1 {
                flattened.pop().unwrap()
            } else {
                Node::Seq { items: flattened }
            }
        }
        Node::Alt { alternatives } => {
            let mut flattened = Vec::with_capacity(alternatives.len());
            for alt in alternatives.into_iter().map(unwrap) {
                match alt {
                    Node::Alt { alternatives } => {
                        flattened.extend(alternatives)
                    }
                    other => flattened.push(other),
                }
            }
            if flattened.len() == 1 {
                flattened.pop().unwrap()
            } else {
                Node::Alt { alternatives: flattened }
            }
        }
    }
}

/// Drops alternatives that are structurally equal to an earlier one.
fn dedup(node: Node) -> Node {
    match node {
        Node::Var { .. } => node,
        Node::Group { content, quant } => {
            Node::Group { content: Box::new(dedup(*content)), quant }
        }
        Node::Seq { items } => {
            Node::Seq { items: items.into_iter().map(dedup).collect() }
        }
        Node::Alt { alternatives } => {
            let mut kept: Vec<Node> = Vec::with_capacity(alternatives.len());
            for alt in alternatives.into_iter().map(dedup) {
                if !kept.contains(&alt) {
                    kept.push(alt);
                }
            }
            Node::Alt { alternatives: kept }
        }
    }
}

/// Fuses adjacent and nested quantifiers.
fn fuse(node: Node) -> Node {
    match node {
        Node::Var { .. } => node,
        Node::Seq { items } => {
            let items = items
                .into_iter()
                .map(fuse)
                .coalesce(|a, b| match (&a, &b) {
                    (
                        Node::Var { name: n1, quant: q1 },
                        Node::Var { name: n2, quant: q2 },
                    ) if n1 == n2
                        && q1.max == Some(q1.min)
                        && q2.max == Some(q2.min)
                        && q1.reluctant == q2.reluctant =>
                    {
                        Ok(Node::Var {
                            name: n1.clone(),
                            quant: Quantifier {
                                min: q1.min + q2.min,
                                max: Some(q1.min + q2.min),
                                reluctant: q1.reluctant,
                            },
                        })
                    }
                    _ => Err((a, b)),
                })
                .collect();
            Node::Seq { items }
        }
        Node::Alt { alternatives } => Node::Alt {
            alternatives: alternatives.into_iter().map(fuse).collect(),
        },
        Node::Group { content, quant } => {
            let content = fuse(*content);
            let inner = match &content {
                Node::Var { quant, .. } => Some(*quant),
                Node::Group { quant, .. } => Some(*quant),
                _ => None,
            };
            match inner {
                Some(inner) if fusable(&inner, &quant) => {
                    let fused = Quantifier {
                        min: inner.min * quant.min,
                        max: match (inner.max, quant.max) {
                            (Some(a), Some(b)) => Some(a * b),
                            _ => None,
                        },
                        reluctant: quant.reluctant,
                    };
                    match content {
                        Node::Var { name, .. } => {
                            Node::Var { name, quant: fused }
                        }
                        Node::Group { content, .. } => {
                            Node::Group { content, quant: fused }
                        }
                        _ => unreachable!(),
                    }
                }
                _ => Node::Group { content: Box::new(content), quant },
            }
        }
    }
}

/// Whether a group quantifier can be multiplied into its single inner
/// quantifier without changing the set of admissible repetition counts.
///
/// `(X{a,b}){n}` always fuses to `X{a*n,b*n}`: the total is a sum of `n`
/// values from `[a,b]`, which covers that range contiguously. An inner
/// fixed count above one does not fuse against a variable outer bound:
/// `(X{2}){0,2}` admits 0, 2 or 4 repetitions but `X{0,4}` also admits the
/// gaps.
fn fusable(inner: &Quantifier, outer: &Quantifier) -> bool {
    if inner.reluctant != outer.reluctant {
        return false;
    }
    outer.max == Some(outer.min) || (inner.min == 1 && inner.max == Some(1))
}
