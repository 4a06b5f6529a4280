/*! Implements the row pattern matcher.

The matcher takes a compiled [`Pattern`] and consumes a stream of rows,
one [`Matcher::process_row`] call per row, in strict row order. Each row is
described by the set of variable names that are true for it; names outside
the pattern's alphabet are ignored, so a driver may pass conditions drawn
from a superset of the alphabet.

Per row the matcher starts a new match attempt if the row admits one,
advances every attempt in flight, removes attempts an earlier one
dominates, and hands completed attempts to the emitter, which applies the
configured [`SkipMode`] and [`OutputMode`]. The matcher is fully
synchronous and single-threaded; one instance matches one partition of a
row stream.

```
let pattern = rowpat::compile("A B+ C").unwrap();
let mut matcher = rowpat::Matcher::new(&pattern);

let mut matches = Vec::new();
for (row, vars) in [vec!["A"], vec!["B"], vec!["B"], vec!["C"]].iter().enumerate() {
    matches.extend(matcher.process_row(row, vars).unwrap().emissions);
}

assert_eq!(matches.len(), 1);
assert_eq!(matches[0].match_start, 0);
assert_eq!(matches[0].match_end, 3);
assert_eq!(matches[0].paths, vec![vec!["A", "B", "B", "C"]]);
```
*/

use log::debug;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::compiler::pattern::VarId;
use crate::compiler::Pattern;
use crate::matcher::context::{absorbs, MatchContext};
use crate::matcher::emitter::Emitter;
use crate::matcher::snapshot::{Absorption, RowSnapshot};
use crate::matcher::state::{MatchState, SeqCounter};
use crate::matcher::transition::{can_consume_at, expand, StepEnv};

pub(crate) mod context;
pub(crate) mod emitter;
pub(crate) mod snapshot;
pub(crate) mod state;
pub(crate) mod transition;

#[cfg(test)]
mod tests;

pub use emitter::Match;
pub use emitter::OutputMode;
pub use emitter::SkipMode;

/// Error returned when feeding rows to a [`Matcher`] fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Rows must be processed consecutively, starting at row 0.
    #[error("out-of-order row: expected {expected}, got {got}")]
    OutOfOrderRow {
        /// The row index the matcher expected.
        expected: usize,
        /// The row index the driver passed.
        got: usize,
    },
}

/// Everything a single [`Matcher::process_row`] call produced.
#[derive(Debug, PartialEq)]
pub struct RowReport {
    /// The matches emitted for this row, in emission order.
    pub emissions: Vec<Match>,
    /// Diagnostic snapshot of everything that happened during the row.
    pub snapshot: RowSnapshot,
}

/// Matches a compiled row pattern incrementally over a stream of rows.
///
/// The same pattern can be shared by any number of matchers, but a single
/// matcher processes a single row stream at a time; [`Matcher::reset`]
/// prepares it for the next stream.
pub struct Matcher<'p> {
    pattern: &'p Pattern,
    skip_mode: SkipMode,
    output_mode: OutputMode,
    /// Match attempts in flight, ordered by starting row.
    contexts: Vec<MatchContext>,
    emitter: Emitter,
    seqs: SeqCounter,
    next_context_id: u64,
    next_row: usize,
}

impl<'p> Matcher<'p> {
    /// Creates a matcher for the given pattern with the default policies
    /// ([`SkipMode::PastLast`], [`OutputMode::OneRow`]).
    pub fn new(pattern: &'p Pattern) -> Self {
        Self {
            pattern,
            skip_mode: SkipMode::default(),
            output_mode: OutputMode::default(),
            contexts: Vec::new(),
            emitter: Emitter::default(),
            seqs: SeqCounter::default(),
            next_context_id: 0,
            next_row: 0,
        }
    }

    /// Sets the skip policy.
    pub fn skip_mode(mut self, mode: SkipMode) -> Self {
        self.skip_mode = mode;
        self
    }

    /// Sets the output policy.
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Forgets all in-flight state so the matcher can process a new row
    /// stream. Context ids and sequence numbers restart from zero.
    pub fn reset(&mut self) {
        self.contexts.clear();
        self.emitter.reset();
        self.seqs.reset();
        self.next_context_id = 0;
        self.next_row = 0;
    }

    /// Processes one row. `true_vars` are the variable names that are true
    /// for this row; names not in the pattern's alphabet are ignored.
    ///
    /// Rows must be fed consecutively starting at 0; anything else returns
    /// [`MatchError::OutOfOrderRow`].
    pub fn process_row(
        &mut self,
        row: usize,
        true_vars: &[&str],
    ) -> Result<RowReport, MatchError> {
        if row != self.next_row {
            return Err(MatchError::OutOfOrderRow {
                expected: self.next_row,
                got: row,
            });
        }
        self.next_row += 1;

        let resolved: FxHashSet<VarId> = true_vars
            .iter()
            .filter_map(|name| self.pattern.var_id(name))
            .collect();
        let row_has_var = !resolved.is_empty();

        let mut snap = RowSnapshot {
            row,
            input: true_vars.iter().map(|s| s.to_string()).collect(),
            ..RowSnapshot::default()
        };

        // A row that admits a first match is a new attempt; it advances
        // before the attempts already in flight.
        if let Some(mut context) = self.try_start(row, &resolved) {
            debug!("row {row}: started context {}", context.id);
            context.step(
                self.pattern,
                &resolved,
                row_has_var,
                &mut self.seqs,
                &mut snap,
            );
            self.contexts.push(context);
        }

        for context in self.contexts.iter_mut() {
            if context.match_start < row && !context.is_completed {
                context.step(
                    self.pattern,
                    &resolved,
                    row_has_var,
                    &mut self.seqs,
                    &mut snap,
                );
            }
        }

        self.absorb_dominated(&mut snap);

        // Attempts with nothing live and nothing completed just drop.
        self.contexts.retain(|context| {
            if context.is_dead() {
                debug!("context {}: died without a match", context.id);
                false
            } else {
                true
            }
        });

        let (just_completed, live): (Vec<_>, Vec<_>) = self
            .contexts
            .drain(..)
            .partition(|context| context.is_completed);
        self.contexts = live;

        let emissions = self.emitter.process(
            self.pattern,
            self.skip_mode,
            self.output_mode,
            just_completed,
            &self.contexts,
            &mut snap,
        );

        snap.contexts =
            self.contexts.iter().map(|c| c.snapshot(self.pattern)).collect();

        Ok(RowReport { emissions, snapshot: snap })
    }

    /// Signals the end of the row stream: runs one synthetic row with no
    /// true variables so in-flight attempts finalize and anything still
    /// parked in the emission queue drains.
    pub fn finish(&mut self) -> Result<RowReport, MatchError> {
        let row = self.next_row;
        self.process_row(row, &[])
    }

    /// Builds the starting context for this row, if the row can begin a
    /// match: the initial state is expanded to its wait positions and the
    /// ones able to consume this row become the context's states.
    fn try_start(
        &mut self,
        row: usize,
        true_vars: &FxHashSet<VarId>,
    ) -> Option<MatchContext> {
        if true_vars.is_empty() {
            return None;
        }
        let initial =
            MatchState::initial(self.pattern.counter_len(), &mut self.seqs);
        let mut env = StepEnv {
            pattern: self.pattern,
            true_vars,
            seqs: &mut self.seqs,
        };
        let expanded = expand(&mut env, vec![initial]);
        let consumable: Vec<MatchState> = expanded
            .wait
            .into_iter()
            .filter(|s| can_consume_at(self.pattern, s.element, true_vars))
            .collect();
        if consumable.is_empty() {
            return None;
        }
        let id = self.next_context_id;
        self.next_context_id += 1;
        Some(MatchContext::new(id, row, consumable))
    }

    /// Removes contexts that an earlier-started one dominates. Completed
    /// contexts take no part in this on either side.
    fn absorb_dominated(&mut self, snap: &mut RowSnapshot) {
        let mut removed: Vec<usize> = Vec::new();
        for later in 1..self.contexts.len() {
            if self.contexts[later].is_completed {
                continue;
            }
            for earlier in 0..later {
                if removed.contains(&earlier)
                    || self.contexts[earlier].is_completed
                {
                    continue;
                }
                if absorbs(
                    self.pattern,
                    &self.contexts[earlier],
                    &self.contexts[later],
                ) {
                    let by = self.contexts[earlier].id;
                    let id = self.contexts[later].id;
                    debug!("context {id}: absorbed by context {by}");
                    snap.absorptions.push(Absorption { by, removed: id });
                    snap.logs.push(format!(
                        "context {by} absorbed context {id}"
                    ));
                    removed.push(later);
                    break;
                }
            }
        }
        let mut index = 0;
        self.contexts.retain(|_| {
            let keep = !removed.contains(&index);
            index += 1;
            keep
        });
    }
}
