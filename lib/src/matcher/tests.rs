use pretty_assertions::assert_eq;

use crate::compiler::compile;
use crate::matcher::state::{MatchState, SeqCounter, StateSet};
use crate::matcher::{Matcher, OutputMode, SkipMode};

#[test]
fn forked_states_get_fresh_ascending_seqs() {
    let mut seqs = SeqCounter::default();
    let mut state = MatchState::initial(1, &mut seqs);
    state.record_match(0);

    let first_fork = state.fork(&mut seqs);
    let second_fork = state.fork(&mut seqs);

    let original: Vec<u64> = state.paths().map(|p| p.seq).collect();
    let first: Vec<u64> = first_fork.paths().map(|p| p.seq).collect();
    let second: Vec<u64> = second_fork.paths().map(|p| p.seq).collect();

    assert_eq!(original, vec![0]);
    assert_eq!(first, vec![1]);
    assert_eq!(second, vec![2]);
    // Forking does not touch the paths themselves.
    assert_eq!(
        first_fork.paths().map(|p| p.vars.clone()).collect::<Vec<_>>(),
        state.paths().map(|p| p.vars.clone()).collect::<Vec<_>>(),
    );
}

#[test]
fn equivalent_states_merge_keeping_first_position() {
    let mut seqs = SeqCounter::default();
    let mut a = MatchState::initial(1, &mut seqs);
    a.record_match(0);

    // An equivalent state that arrived through a different variable.
    let mut b = MatchState::initial(1, &mut seqs);
    b.record_match(1);

    // And one that is an exact path duplicate of `a`.
    let mut c = MatchState::initial(1, &mut seqs);
    c.record_match(0);

    let mut set = StateSet::new();
    assert!(set.insert(a));
    assert!(!set.insert(b));
    assert!(!set.insert(c));

    let states: Vec<&MatchState> = set.iter().collect();
    assert_eq!(states.len(), 1);
    let paths: Vec<(u64, Vec<u16>)> =
        states[0].paths().map(|p| (p.seq, p.vars.clone())).collect();
    // The duplicate path kept the first arrival's seq; the distinct path
    // was appended with its own.
    assert_eq!(paths, vec![(0, vec![0]), (1, vec![1])]);
}

#[test]
fn states_are_deduplicated_after_every_row() {
    let pattern = compile("A+ (B | A)+").unwrap();
    let mut matcher = Matcher::new(&pattern);
    for (row, vars) in
        [vec!["A", "B"], vec!["A", "B"], vec!["A", "B"]].iter().enumerate()
    {
        let report = matcher.process_row(row, vars).unwrap();
        for context in &report.snapshot.contexts {
            let mut keys: Vec<(Option<usize>, Vec<u32>)> = context
                .states
                .iter()
                .map(|s| (s.element, s.counts.clone()))
                .collect();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(total, keys.len(), "duplicate state after row {row}");
        }
    }
}

#[test]
fn paths_are_deduplicated_in_completed_contexts() {
    // Both `A` alternatives complete with the same path; only one copy
    // may survive.
    let pattern = compile("A | A B | A").unwrap();
    let mut matcher = Matcher::new(&pattern);
    matcher.process_row(0, &["A"]).unwrap();
    let report = matcher.finish().unwrap();
    assert_eq!(report.emissions.len(), 1);
    assert_eq!(report.emissions[0].paths, vec![vec!["A".to_string()]]);
}

#[test]
fn skip_past_last_drops_overlapping_matches() {
    let pattern = compile("A{2}").unwrap();
    let mut matcher = Matcher::new(&pattern);

    let mut emitted = Vec::new();
    for row in 0..3 {
        emitted
            .extend(matcher.process_row(row, &["A"]).unwrap().emissions);
    }
    emitted.extend(matcher.finish().unwrap().emissions);

    // Rows 1-2 overlap the match emitted for rows 0-1.
    assert_eq!(emitted.len(), 1);
    assert_eq!((emitted[0].match_start, emitted[0].match_end), (0, 1));
}

#[test]
fn skip_to_next_keeps_overlapping_matches() {
    let pattern = compile("A{2}").unwrap();
    let mut matcher = Matcher::new(&pattern).skip_mode(SkipMode::ToNext);

    let mut emitted = Vec::new();
    for row in 0..3 {
        emitted
            .extend(matcher.process_row(row, &["A"]).unwrap().emissions);
    }
    emitted.extend(matcher.finish().unwrap().emissions);

    assert_eq!(
        emitted
            .iter()
            .map(|m| (m.match_start, m.match_end))
            .collect::<Vec<_>>(),
        vec![(0, 1), (1, 2)]
    );
    // Starts stay strictly increasing even though the matches overlap.
    assert!(emitted.windows(2).all(|w| w[0].match_start < w[1].match_start));
}

#[test]
fn output_all_rows_reports_every_path_in_seq_order() {
    let pattern = compile("A | B").unwrap();
    let mut matcher =
        Matcher::new(&pattern).output_mode(OutputMode::AllRows);
    let report = matcher.process_row(0, &["A", "B"]).unwrap();
    assert_eq!(report.emissions.len(), 1);
    assert_eq!(
        report.emissions[0].paths,
        vec![vec!["A".to_string()], vec!["B".to_string()]]
    );
}

#[test]
fn output_one_row_reports_first_alternative() {
    let pattern = compile("A | B").unwrap();
    let mut matcher = Matcher::new(&pattern);
    let report = matcher.process_row(0, &["A", "B"]).unwrap();
    assert_eq!(report.emissions.len(), 1);
    assert_eq!(report.emissions[0].paths, vec![vec!["A".to_string()]]);
}

#[test]
fn reluctant_pattern_reports_shortest_completion() {
    let pattern = compile("A{1,2}?").unwrap();
    let mut matcher = Matcher::new(&pattern);
    let mut emitted = Vec::new();
    emitted.extend(matcher.process_row(0, &["A"]).unwrap().emissions);
    emitted.extend(matcher.finish().unwrap().emissions);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].paths, vec![vec!["A".to_string()]]);
    assert_eq!((emitted[0].match_start, emitted[0].match_end), (0, 0));
}

#[test]
fn rows_must_arrive_in_order() {
    let pattern = compile("A").unwrap();
    let mut matcher = Matcher::new(&pattern);
    matcher.process_row(0, &[]).unwrap();
    assert_eq!(
        matcher.process_row(2, &[]),
        Err(crate::MatchError::OutOfOrderRow { expected: 1, got: 2 })
    );
}

#[test]
fn unknown_variable_names_are_ignored() {
    let pattern = compile("A B").unwrap();
    let mut matcher = Matcher::new(&pattern);
    let mut emitted = Vec::new();
    emitted.extend(
        matcher.process_row(0, &["A", "volume_high"]).unwrap().emissions,
    );
    emitted
        .extend(matcher.process_row(1, &["B", "price_up"]).unwrap().emissions);
    emitted.extend(matcher.finish().unwrap().emissions);
    assert_eq!(emitted.len(), 1);
    assert_eq!((emitted[0].match_start, emitted[0].match_end), (0, 1));
}

#[test]
fn reset_restarts_ids_and_seqs() {
    let pattern = compile("A").unwrap();
    let mut matcher = Matcher::new(&pattern);
    let first = matcher.process_row(0, &["A"]).unwrap();
    matcher.reset();
    let second = matcher.process_row(0, &["A"]).unwrap();
    assert_eq!(first.emissions, second.emissions);
    assert_eq!(first.snapshot, second.snapshot);
}

#[test]
fn snapshot_serializes_with_the_published_shape() {
    let pattern = compile("A+ B").unwrap();
    let mut matcher = Matcher::new(&pattern);
    let report = matcher.process_row(0, &["A"]).unwrap();
    let value = serde_json::to_value(&report.snapshot).unwrap();
    for key in [
        "row",
        "input",
        "contexts",
        "absorptions",
        "state_merges",
        "discarded_states",
        "dead_states",
        "emitted",
        "queued",
        "discarded",
        "logs",
    ] {
        assert!(value.get(key).is_some(), "snapshot misses `{key}`");
    }
    assert_eq!(value["row"], 0);
    assert_eq!(value["contexts"][0]["match_start"], 0);
}
