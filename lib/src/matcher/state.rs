/*!
Live simulation state: paths, summaries, states, and the insertion-ordered
state sets the matcher deduplicates them in.

A [`MatchState`] is one live point of the NFA simulation: the element it
waits at, a repetition counter per nesting depth, and the summaries of how
it got there. Two states are *equivalent* when element and counters are
equal; summaries are deliberately ignored, because equivalent states are
never kept apart: one absorbs the other's summaries instead (see
[`StateSet`]).

States are duplicated in two distinct ways. A *clone* is the branch that
keeps the state's identity: its paths keep their sequence numbers. A *fork*
is the branch that starts a new line of history: every path receives a
fresh, strictly larger sequence number. Sequence numbers are what later
orders competing completed paths, so which branch clones and which forks is
part of the matching semantics, not an implementation detail.
*/

use std::collections::BTreeMap;

use indexmap::map::Entry;
use indexmap::IndexMap;
use smallvec::{smallvec, SmallVec};

use crate::compiler::pattern::VarId;

/// Pseudo element index of a state that has run the whole program.
pub(crate) const DONE: usize = usize::MAX;

/// Per-depth repetition counters of a state.
pub(crate) type Counts = SmallVec<[u32; 4]>;

/// Hands out globally ordered sequence numbers for paths. One counter per
/// matcher instance, zeroed on reset.
#[derive(Debug, Default)]
pub(crate) struct SeqCounter(u64);

impl SeqCounter {
    #[inline]
    pub fn next(&mut self) -> u64 {
        let seq = self.0;
        self.0 += 1;
        seq
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Aggregated values computed along a path.
///
/// Reserved for measure evaluation (SUM/COUNT/FIRST/LAST/MIN/MAX); the
/// present engine never puts anything in here, but summaries only merge
/// when their aggregates compare equal, so the slot participates in the
/// merging rules already.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Aggregates(BTreeMap<String, i64>);

/// One recorded way of reaching a state: which variable matched in each
/// consumed row, and the sequence number ordering it against competing
/// paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackedPath {
    pub seq: u64,
    pub vars: Vec<VarId>,
}

/// A bundle of aggregates and the paths they were computed over. The two
/// are kept together because they must merge together.
#[derive(Debug, Clone)]
pub(crate) struct Summary {
    pub aggregates: Aggregates,
    pub paths: Vec<TrackedPath>,
}

impl Summary {
    /// Merges another summary with equal aggregates into this one. Paths
    /// already present (same variable sequence) are dropped; new paths
    /// keep their original sequence numbers and insertion order.
    fn merge(&mut self, other: Summary) {
        debug_assert_eq!(self.aggregates, other.aggregates);
        for path in other.paths {
            if !self.paths.iter().any(|p| p.vars == path.vars) {
                self.paths.push(path);
            }
        }
    }
}

/// Key under which equivalent states collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct StateKey {
    pub element: usize,
    pub counts: Counts,
}

/// A single live point in the simulation.
#[derive(Debug, Clone)]
pub(crate) struct MatchState {
    /// Element index this state is at; [`DONE`] when completed.
    pub element: usize,
    /// One repetition counter per nesting depth.
    pub counts: Counts,
    /// Non-empty list of summaries recording how this state was reached.
    pub summaries: Vec<Summary>,
}

impl MatchState {
    /// The state every match attempt starts from: first element, zeroed
    /// counters, one summary holding one empty path.
    pub fn initial(counter_len: usize, seqs: &mut SeqCounter) -> Self {
        Self {
            element: 0,
            counts: smallvec![0; counter_len],
            summaries: vec![Summary {
                aggregates: Aggregates::default(),
                paths: vec![TrackedPath { seq: seqs.next(), vars: vec![] }],
            }],
        }
    }

    #[inline]
    pub fn key(&self) -> StateKey {
        StateKey { element: self.element, counts: self.counts.clone() }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.element == DONE
    }

    /// Records that this state consumed a row on which `var` was true:
    /// every active path extends by the matched variable.
    pub fn record_match(&mut self, var: VarId) {
        for summary in self.summaries.iter_mut() {
            for path in summary.paths.iter_mut() {
                path.vars.push(var);
            }
        }
    }

    /// Duplicates this state as a new branch of history: every path of the
    /// copy receives a fresh sequence number, in path order.
    pub fn fork(&self, seqs: &mut SeqCounter) -> Self {
        let mut forked = self.clone();
        for summary in forked.summaries.iter_mut() {
            for path in summary.paths.iter_mut() {
                path.seq = seqs.next();
            }
        }
        forked
    }

    /// Folds the summaries of an equivalent state into this one. Summaries
    /// with equal aggregates merge; others are appended.
    pub fn merge_summaries(&mut self, summaries: Vec<Summary>) {
        for summary in summaries {
            match self
                .summaries
                .iter_mut()
                .find(|s| s.aggregates == summary.aggregates)
            {
                Some(existing) => existing.merge(summary),
                None => self.summaries.push(summary),
            }
        }
    }

    /// All paths of this state, in summary and insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &TrackedPath> {
        self.summaries.iter().flat_map(|s| s.paths.iter())
    }
}

/// An insertion-ordered set of states, deduplicated by state equivalence.
///
/// Inserting a state equivalent to one already present does not grow the
/// set: the newcomer's summaries merge into the earlier state, keeping the
/// first insertion position. Iteration order is insertion order, which is
/// what keeps downstream processing deterministic.
#[derive(Debug, Default)]
pub(crate) struct StateSet {
    states: IndexMap<StateKey, MatchState>,
}

impl StateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state to the set. Returns `false` if an equivalent state was
    /// already present and the new one was merged into it.
    pub fn insert(&mut self, state: MatchState) -> bool {
        match self.states.entry(state.key()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().merge_summaries(state.summaries);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(state);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchState> {
        self.states.values()
    }

    pub fn into_states(self) -> Vec<MatchState> {
        self.states.into_values().collect()
    }
}
