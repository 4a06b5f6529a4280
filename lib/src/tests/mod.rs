/*! End-to-end matching scenarios. */

use pretty_assertions::assert_eq;

use crate::{compile, Match, Matcher, OutputMode, RowReport, SkipMode};

/// Feeds the rows to a fresh matcher with the given modes, flushes the
/// stream, and returns every emitted match.
fn run_with(
    pattern: &str,
    skip_mode: SkipMode,
    output_mode: OutputMode,
    rows: &[&[&str]],
) -> Vec<Match> {
    let compiled = compile(pattern).unwrap();
    let mut matcher =
        Matcher::new(&compiled).skip_mode(skip_mode).output_mode(output_mode);
    let mut emitted = Vec::new();
    for (row, vars) in rows.iter().enumerate() {
        emitted.extend(matcher.process_row(row, vars).unwrap().emissions);
    }
    emitted.extend(matcher.finish().unwrap().emissions);
    emitted
}

fn run(pattern: &str, rows: &[&[&str]]) -> Vec<Match> {
    run_with(pattern, SkipMode::PastLast, OutputMode::OneRow, rows)
}

fn paths(m: &Match) -> Vec<Vec<&str>> {
    m.paths
        .iter()
        .map(|p| p.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn plus_quantifier_spans_rows() {
    let matches = run("A B+ C", &[&["A"], &["B"], &["B"], &["C"]]);
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].match_start, matches[0].match_end), (0, 3));
    assert_eq!(paths(&matches[0]), vec![vec!["A", "B", "B", "C"]]);
}

#[test]
fn star_quantifier_may_match_nothing() {
    let matches = run("A B* C", &[&["A"], &["C"]]);
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].match_start, matches[0].match_end), (0, 1));
    assert_eq!(paths(&matches[0]), vec![vec!["A", "C"]]);
}

#[test]
fn counted_group_iterates() {
    let matches =
        run("(A B){2,3} C", &[&["A"], &["B"], &["A"], &["B"], &["C"]]);
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].match_start, matches[0].match_end), (0, 4));
    assert_eq!(paths(&matches[0]), vec![vec!["A", "B", "A", "B", "C"]]);
}

#[test]
fn failed_extension_falls_back_to_shorter_match() {
    // The `B C` alternative dies at the third row; the single-`A` match
    // held back at row 0 is restored.
    let matches = run("(A | B C)+", &[&["A"], &["B"], &["D"]]);
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].match_start, matches[0].match_end), (0, 0));
    assert_eq!(paths(&matches[0]), vec![vec!["A"]]);
}

#[test]
fn lexical_order_prefers_earlier_alternatives() {
    // All completed paths have length three; the reported one took the
    // `B` alternative of the second group as early as possible.
    let matches = run(
        "A+ (B | A)+",
        &[&["A", "B"], &["A", "B"], &["A", "B"], &[]],
    );
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].match_start, matches[0].match_end), (0, 2));
    assert_eq!(paths(&matches[0]), vec![vec!["A", "B", "B"]]);
}

#[test]
fn all_rows_reports_every_completed_path() {
    let matches = run_with(
        "A+ (B | A)+",
        SkipMode::PastLast,
        OutputMode::AllRows,
        &[&["A", "B"], &["A", "B"], &["A", "B"], &[]],
    );
    assert_eq!(matches.len(), 1);
    assert_eq!(
        paths(&matches[0]),
        vec![
            vec!["A", "B", "B"],
            vec!["A", "A", "A"],
            vec!["A", "B", "A"],
            vec!["A", "A", "B"],
        ]
    );
}

#[test]
fn later_attempts_are_absorbed_by_earlier_ones() {
    let compiled = compile("A+ B").unwrap();
    let mut matcher = Matcher::new(&compiled);

    let mut reports: Vec<RowReport> = Vec::new();
    for (row, vars) in
        [vec!["A"], vec!["A"], vec!["A"], vec!["B"]].iter().enumerate()
    {
        reports.push(matcher.process_row(row, vars).unwrap());
    }

    // The attempts started at rows 1 and 2 are dominated by the attempt
    // from row 0 and disappear the same row they start.
    assert_eq!(reports[1].snapshot.absorptions.len(), 1);
    assert_eq!(reports[1].snapshot.absorptions[0].by, 0);
    assert_eq!(reports[1].snapshot.absorptions[0].removed, 1);
    assert_eq!(reports[2].snapshot.absorptions.len(), 1);
    assert_eq!(reports[2].snapshot.absorptions[0].by, 0);
    assert_eq!(reports[2].snapshot.absorptions[0].removed, 2);

    let emitted = &reports[3].emissions;
    assert_eq!(emitted.len(), 1);
    assert_eq!((emitted[0].match_start, emitted[0].match_end), (0, 3));
    assert_eq!(
        emitted[0].paths,
        vec![vec!["A", "A", "A", "B"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()]
    );
}

#[test]
fn missing_mandatory_variable_matches_nothing() {
    assert_eq!(run("A B+ C", &[&["A"], &["C"]]), vec![]);
}

#[test]
fn unmet_group_minimum_matches_nothing() {
    assert_eq!(run("(A B){2,3} C", &[&["A"], &["B"], &["C"]]), vec![]);
}

#[test]
fn non_overlapping_consecutive_matches() {
    let matches =
        run("A B", &[&["A"], &["B"], &["A"], &["B"], &["A"], &["B"]]);
    assert_eq!(
        matches
            .iter()
            .map(|m| (m.match_start, m.match_end))
            .collect::<Vec<_>>(),
        vec![(0, 1), (2, 3), (4, 5)]
    );
}

#[test]
fn greedy_match_is_longest() {
    // Five As: the greedy run takes all of them, not just the first.
    let matches =
        run("A+", &[&["A"], &["A"], &["A"], &["A"], &["A"]]);
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].match_start, matches[0].match_end), (0, 4));
    assert_eq!(paths(&matches[0]), vec![vec!["A"; 5]]);
}

#[test]
fn rows_between_matches_split_them() {
    let matches = run("A+", &[&["A"], &["A"], &[], &["A"]]);
    assert_eq!(
        matches
            .iter()
            .map(|m| (m.match_start, m.match_end))
            .collect::<Vec<_>>(),
        vec![(0, 1), (3, 3)]
    );
}

#[test]
fn emissions_are_deterministic() {
    let compiled = compile("A+ (B | A)+").unwrap();
    let rows: Vec<Vec<&str>> =
        vec![vec!["A", "B"], vec!["A", "B"], vec!["A", "B"], vec![]];

    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut matcher =
            Matcher::new(&compiled).output_mode(OutputMode::AllRows);
        let mut reports = Vec::new();
        for (row, vars) in rows.iter().enumerate() {
            reports.push(matcher.process_row(row, vars).unwrap());
        }
        runs.push(reports);
    }

    let (first, second) = (&runs[0], &runs[1]);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.emissions, b.emissions);
        assert_eq!(a.snapshot, b.snapshot);
    }
}

#[test]
fn nested_alternations_are_searched_for_starts() {
    // Compiled without the optimizer the inner alternation survives as
    // its own element, so finding the starting `C` requires searching
    // through the nested alternation.
    let compiled = crate::Compiler::new()
        .optimize(false)
        .compile("(A | (B | C)) D")
        .unwrap();
    let mut matcher = Matcher::new(&compiled);
    let mut emitted = Vec::new();
    emitted.extend(matcher.process_row(0, &["C"]).unwrap().emissions);
    emitted.extend(matcher.process_row(1, &["D"]).unwrap().emissions);
    emitted.extend(matcher.finish().unwrap().emissions);
    assert_eq!(emitted.len(), 1);
    assert_eq!(paths(&emitted[0]), vec![vec!["C", "D"]]);
}

#[test]
fn optional_prefix_inside_group() {
    // The group can be entered through its optional head.
    let matches = run("(A? B)+", &[&["B"], &["A"], &["B"]]);
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].match_start, matches[0].match_end), (0, 2));
    assert_eq!(paths(&matches[0]), vec![vec!["B", "A", "B"]]);
}

#[test]
fn flush_drains_potential_matches() {
    let compiled = compile("A B?").unwrap();
    let mut matcher = Matcher::new(&compiled);
    // `A` completes immediately but a longer `A B` is still possible, so
    // nothing is emitted until the stream is flushed.
    assert!(matcher.process_row(0, &["A"]).unwrap().emissions.is_empty());
    let report = matcher.finish().unwrap();
    assert_eq!(report.emissions.len(), 1);
    assert_eq!(paths(&report.emissions[0]), vec![vec!["A"]]);
}
