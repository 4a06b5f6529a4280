/*!
Match contexts: the lifecycle of one match attempt.

A context groups every simulation state descending from the same starting
row. Per row it consumes the input with its wait states, expands the
successors to the next wait frontier, and folds any completions into its
bookkeeping. A context ends when no live states remain: successfully if it
has committed completed paths, silently otherwise. Later-started contexts
that an earlier one dominates are removed by absorption (see
[`absorbs`]).

For greedy patterns a completion reached while longer matches are still
possible is not committed immediately: the best one is held back as the
*fallback* and only committed once extension fails or the input stops
cooperating. This is how regex-style longest-match is realized over a
stream without replaying rows.
*/

use std::cmp::Reverse;
use std::mem;

use log::debug;
use rustc_hash::FxHashSet;

use crate::compiler::pattern::{ElementKind, Pattern, VarId};
use crate::matcher::snapshot::{
    ContextSnapshot, PathSnapshot, RowSnapshot, StateMerge, StateRef,
    StateSnapshot,
};
use crate::matcher::state::{
    MatchState, SeqCounter, StateSet, TrackedPath, DONE,
};
use crate::matcher::transition::{
    can_consume_at, closing_group, consume, expand, StepEnv, Trail,
};

/// One match attempt: all live states that started from the same row.
#[derive(Debug)]
pub(crate) struct MatchContext {
    pub id: u64,
    /// Row at which this attempt started.
    pub match_start: usize,
    /// Last row of the longest committed path, if any.
    pub match_end: Option<usize>,
    /// True once no live states remain but completed paths do.
    pub is_completed: bool,
    /// States waiting for the next row.
    pub states: Vec<MatchState>,
    /// Committed completed paths, deduplicated, in commit order.
    pub completed_paths: Vec<TrackedPath>,
    /// Best completion held back while longer matches are still possible.
    pub greedy_fallback: Option<TrackedPath>,
}

impl MatchContext {
    pub fn new(id: u64, match_start: usize, states: Vec<MatchState>) -> Self {
        Self {
            id,
            match_start,
            match_end: None,
            is_completed: false,
            states,
            completed_paths: Vec::new(),
            greedy_fallback: None,
        }
    }

    /// Runs one consumption + expansion against the current row.
    pub fn step(
        &mut self,
        pattern: &Pattern,
        true_vars: &FxHashSet<VarId>,
        row_has_var: bool,
        seqs: &mut SeqCounter,
        snap: &mut RowSnapshot,
    ) {
        let wait = mem::take(&mut self.states);
        let mut env = StepEnv { pattern, true_vars, seqs };

        // Consume the row with every wait state, keeping successor order.
        let mut successors = Vec::new();
        for state in wait {
            let key = state.key();
            let produced_before = successors.len();
            let mut trail = Trail::new();
            consume(&mut env, state, &mut trail, &mut successors);
            if successors.len() == produced_before {
                snap.dead_states.push(StateRef {
                    context: self.id,
                    element: element_opt(key.element),
                    counts: key.counts.to_vec(),
                });
            }
        }

        // Deduplicate within each partition, merging summaries.
        let mut active = StateSet::new();
        let mut completed = StateSet::new();
        for successor in successors {
            let key = successor.key();
            let partition =
                if successor.is_done() { &mut completed } else { &mut active };
            if !partition.insert(successor) {
                snap.state_merges.push(StateMerge {
                    context: self.id,
                    element: element_opt(key.element),
                    counts: key.counts.to_vec(),
                });
            }
        }

        // Expand the active successors to the next wait frontier.
        let expanded = expand(&mut env, active.into_states());
        for key in expanded.merges {
            snap.state_merges.push(StateMerge {
                context: self.id,
                element: element_opt(key.element),
                counts: key.counts.to_vec(),
            });
        }
        for done in expanded.completed {
            let key = done.key();
            if !completed.insert(done) {
                snap.state_merges.push(StateMerge {
                    context: self.id,
                    element: element_opt(key.element),
                    counts: key.counts.to_vec(),
                });
            }
        }
        let mut wait_states = expanded.wait;

        // On a row that matched no pattern variable, drop waiters that can
        // neither match nor be skipped; epsilon-only progress must not
        // keep attempts alive across such rows.
        if !row_has_var {
            wait_states.retain(|state| {
                let viable = is_viable(pattern, state, true_vars);
                if !viable {
                    snap.discarded_states.push(StateRef {
                        context: self.id,
                        element: element_opt(state.element),
                        counts: state.counts.to_vec(),
                    });
                }
                viable
            });
        }

        let completions: Vec<TrackedPath> =
            completed.iter().flat_map(|s| s.paths().cloned()).collect();

        // A greedy pattern defers completions while the live states still
        // look extendable; a reluctant one commits them immediately.
        let can_progress = wait_states
            .iter()
            .any(|s| can_consume_at(pattern, s.element, true_vars));
        let defer = !pattern.is_reluctant()
            && !completions.is_empty()
            && !wait_states.is_empty()
            && can_progress
            && row_has_var;
        if defer {
            let best = completions
                .iter()
                .min_by_key(|p| (Reverse(p.vars.len()), p.seq))
                .cloned()
                .unwrap();
            let replace = self
                .greedy_fallback
                .as_ref()
                .map_or(true, |fb| best.vars.len() > fb.vars.len());
            if replace {
                self.greedy_fallback = Some(best);
            }
            debug!(
                "context {}: holding back {} completion(s)",
                self.id,
                completions.len()
            );
            snap.logs.push(format!(
                "context {}: held back {} completed path(s)",
                self.id,
                completions.len()
            ));
        } else {
            if let Some(fallback) = self.greedy_fallback.take() {
                self.commit(fallback);
            }
            for path in completions {
                self.commit(path);
            }
        }

        if let Some(longest) =
            self.completed_paths.iter().map(|p| p.vars.len()).max()
        {
            self.match_end = Some(self.match_start + longest - 1);
        }

        self.states = wait_states;
        if self.states.is_empty() && !self.completed_paths.is_empty() {
            self.is_completed = true;
        }
    }

    /// Commits a completed path unless an equal one is already committed.
    fn commit(&mut self, path: TrackedPath) {
        if !self.completed_paths.iter().any(|p| p.vars == path.vars) {
            self.completed_paths.push(path);
        }
    }

    /// A context with nothing live and nothing completed.
    pub fn is_dead(&self) -> bool {
        self.states.is_empty() && self.completed_paths.is_empty()
    }

    pub fn snapshot(&self, pattern: &Pattern) -> ContextSnapshot {
        ContextSnapshot {
            id: self.id,
            match_start: self.match_start,
            match_end: self.match_end,
            is_completed: self.is_completed,
            states: self
                .states
                .iter()
                .map(|s| StateSnapshot {
                    element: element_opt(s.element),
                    counts: s.counts.to_vec(),
                    paths: s
                        .paths()
                        .map(|p| path_snapshot(pattern, p))
                        .collect(),
                })
                .collect(),
            completed_paths: self
                .completed_paths
                .iter()
                .map(|p| path_snapshot(pattern, p))
                .collect(),
            greedy_fallback: self
                .greedy_fallback
                .as_ref()
                .map(|p| path_snapshot(pattern, p)),
        }
    }
}

/// Whether a waiter survives a row on which no pattern variable is true:
/// it must be skippable in place, or (for an alternation) the group it
/// closes must be exitable.
fn is_viable(
    pattern: &Pattern,
    state: &MatchState,
    true_vars: &FxHashSet<VarId>,
) -> bool {
    let elem = pattern.element(state.element);
    match elem.kind {
        ElementKind::Var(var) => {
            true_vars.contains(&var) || state.counts[elem.depth] >= elem.min
        }
        ElementKind::AltStart => {
            can_consume_at(pattern, state.element, true_vars)
                || closing_group(pattern, elem).map_or(false, |end| {
                    let end = pattern.element(end);
                    state.counts[end.depth] >= end.min
                })
        }
        _ => false,
    }
}

/// Whether `earlier` dominates `later`: every live state of `later` has a
/// counterpart in `earlier` at the same element, with counters that are
/// componentwise no smaller for unbounded quantifiers and exactly equal
/// for bounded ones. Every future the later context could reach, the
/// earlier one then reaches too, with an earlier start.
pub(crate) fn absorbs(
    pattern: &Pattern,
    earlier: &MatchContext,
    later: &MatchContext,
) -> bool {
    if later.states.is_empty() {
        return false;
    }
    later.states.iter().all(|ls| {
        earlier.states.iter().any(|es| {
            if es.element != ls.element {
                return false;
            }
            match pattern.element(ls.element).max {
                None => es
                    .counts
                    .iter()
                    .zip(ls.counts.iter())
                    .all(|(e, l)| e >= l),
                Some(_) => es.counts == ls.counts,
            }
        })
    })
}

fn element_opt(element: usize) -> Option<usize> {
    if element == DONE {
        None
    } else {
        Some(element)
    }
}

fn path_snapshot(pattern: &Pattern, path: &TrackedPath) -> PathSnapshot {
    PathSnapshot {
        seq: path.seq,
        vars: path
            .vars
            .iter()
            .map(|&v| pattern.var_name(v).to_string())
            .collect(),
    }
}
