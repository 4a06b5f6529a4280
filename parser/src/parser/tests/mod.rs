use pretty_assertions::assert_eq;

use crate::ast::{Node, Quantifier};
use crate::parser::Error;
use crate::parse;

fn var(name: &str) -> Node {
    Node::var(name)
}

fn var_q(name: &str, min: u32, max: Option<u32>, reluctant: bool) -> Node {
    Node::Var {
        name: name.to_string(),
        quant: Quantifier { min, max, reluctant },
    }
}

#[test]
fn single_variable() {
    assert_eq!(parse("A"), Ok(var("A")));
}

#[test]
fn concatenation() {
    assert_eq!(
        parse("A B C"),
        Ok(Node::Seq { items: vec![var("A"), var("B"), var("C")] })
    );
}

#[test]
fn quantifiers() {
    assert_eq!(
        parse("A? B* C+ D{2} E{1,3} F{2,} G{,3}"),
        Ok(Node::Seq {
            items: vec![
                var_q("A", 0, Some(1), false),
                var_q("B", 0, None, false),
                var_q("C", 1, None, false),
                var_q("D", 2, Some(2), false),
                var_q("E", 1, Some(3), false),
                var_q("F", 2, None, false),
                var_q("G", 0, Some(3), false),
            ]
        })
    );
}

#[test]
fn reluctant_quantifiers() {
    assert_eq!(
        parse("A?? B*? C+? D{1,3}?"),
        Ok(Node::Seq {
            items: vec![
                var_q("A", 0, Some(1), true),
                var_q("B", 0, None, true),
                var_q("C", 1, None, true),
                var_q("D", 1, Some(3), true),
            ]
        })
    );
}

#[test]
fn groups() {
    assert_eq!(
        parse("(A B){2,3} C"),
        Ok(Node::Seq {
            items: vec![
                Node::Group {
                    content: Box::new(Node::Seq {
                        items: vec![var("A"), var("B")]
                    }),
                    quant: Quantifier {
                        min: 2,
                        max: Some(3),
                        reluctant: false
                    },
                },
                var("C"),
            ]
        })
    );
}

#[test]
fn alternation() {
    assert_eq!(
        parse("A | B C"),
        Ok(Node::Alt {
            alternatives: vec![
                var("A"),
                Node::Seq { items: vec![var("B"), var("C")] },
            ]
        })
    );
}

#[test]
fn nested_alternation() {
    assert_eq!(
        parse("(A | (B | C))+"),
        Ok(Node::Group {
            content: Box::new(Node::Alt {
                alternatives: vec![
                    var("A"),
                    Node::Group {
                        content: Box::new(Node::Alt {
                            alternatives: vec![var("B"), var("C")]
                        }),
                        quant: Quantifier::ONE,
                    },
                ]
            }),
            quant: Quantifier { min: 1, max: None, reluctant: false },
        })
    );
}

#[test]
fn alternation_errors() {
    assert_eq!(parse("| A"), Err(Error::AlternationAtStart { offset: 0 }));
    assert_eq!(parse("(| A)"), Err(Error::AlternationAtStart { offset: 1 }));
    assert_eq!(parse("A |"), Err(Error::AlternationAtEnd { offset: 3 }));
    assert_eq!(parse("(A |)"), Err(Error::AlternationAtEnd { offset: 4 }));
    assert_eq!(parse("A || B"), Err(Error::EmptyAlternative { offset: 3 }));
}

#[test]
fn group_errors() {
    assert_eq!(parse("()"), Err(Error::EmptyGroup { offset: 1 }));
    assert_eq!(parse("( )"), Err(Error::EmptyGroup { offset: 2 }));
    assert_eq!(parse("(A B"), Err(Error::UnclosedParenthesis { offset: 0 }));
    assert_eq!(
        parse("A (B (C)"),
        Err(Error::UnclosedParenthesis { offset: 2 })
    );
    assert_eq!(parse("A)"), Err(Error::UnmatchedParenthesis { offset: 1 }));
    assert_eq!(parse(")"), Err(Error::UnmatchedParenthesis { offset: 0 }));
}

#[test]
fn quantifier_position_errors() {
    assert_eq!(parse("* A"), Err(Error::MisplacedQuantifier { offset: 0 }));
    assert_eq!(parse("(+A)"), Err(Error::MisplacedQuantifier { offset: 1 }));
    assert_eq!(
        parse("A | ? B"),
        Err(Error::MisplacedQuantifier { offset: 4 })
    );
    assert_eq!(parse("A*??"), Err(Error::MisplacedQuantifier { offset: 3 }));
}

#[test]
fn empty_pattern() {
    assert_eq!(parse(""), Err(Error::EmptyPattern));
    assert_eq!(parse("   "), Err(Error::EmptyPattern));
}

#[test]
fn and_operator_reports_its_offset() {
    let err = parse("A & B").unwrap_err();
    assert_eq!(err.offset(), 2);
    assert!(err.to_string().contains("AND operator not supported"));
}

#[test]
fn ast_round_trips_through_display() {
    for pattern in [
        "A",
        "A B+ C",
        "A B* C",
        "(A B){2,3} C",
        "(A | B C)+",
        "A+ (B | A)+",
        "A?? B*? C{2,}?",
        "(A | (B | C)){1,4} D",
        "A{1}? B",
        "(A (B C)+ | D)* E?",
    ] {
        let ast = parse(pattern).unwrap();
        let rendered = ast.to_string();
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(ast, reparsed, "round-trip failed for `{pattern}`");
    }
}
