/*!
Turns completed contexts into emitted matches under the SKIP and OUTPUT
policies.

Completed contexts may not emit immediately: an earlier-started context
that is still alive could produce a match that takes precedence, and under
[`SkipMode::PastLast`] a completed context overlapping an already emitted
match must be dropped altogether. The emitter parks completed contexts in
a queue ordered by starting row and releases them as the contexts ahead of
them resolve.
*/

use std::cmp::Reverse;

use log::debug;
use serde::Serialize;

use crate::compiler::pattern::Pattern;
use crate::matcher::context::MatchContext;
use crate::matcher::snapshot::RowSnapshot;
use crate::matcher::state::TrackedPath;

/// Controls which completed matches may be reported when matches overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SkipMode {
    /// Matches never overlap: a completed match starting at or before the
    /// last emitted match's end is dropped. The default.
    #[default]
    PastLast,
    /// Match starts are strictly increasing; overlapping is allowed.
    ToNext,
}

/// Controls how many completed paths a match reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Only the lexically first completed path. The default.
    #[default]
    OneRow,
    /// Every completed path, in ascending sequence order.
    AllRows,
}

/// A reported pattern match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Identifier of the context that produced the match, monotonically
    /// increasing across a matcher's lifetime.
    pub context_id: u64,
    /// First row of the match (0-based, inclusive).
    pub match_start: usize,
    /// Last row of the match (0-based, inclusive).
    pub match_end: usize,
    /// The matched paths, as variable names, one per consumed row. A
    /// single path under [`OutputMode::OneRow`], all completed paths in
    /// ascending sequence order under [`OutputMode::AllRows`].
    pub paths: Vec<Vec<String>>,
}

/// Queues completed contexts and decides what gets emitted when.
#[derive(Debug, Default)]
pub(crate) struct Emitter {
    /// Completed contexts awaiting emission, ordered by `match_start`.
    queue: Vec<MatchContext>,
    /// End of the last emitted match.
    last_emitted_end: Option<usize>,
}

impl Emitter {
    /// Processes the contexts completed during this row against the
    /// contexts still alive. Returns the matches emitted, in order.
    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &mut self,
        pattern: &Pattern,
        skip_mode: SkipMode,
        output_mode: OutputMode,
        just_completed: Vec<MatchContext>,
        live: &[MatchContext],
        snap: &mut RowSnapshot,
    ) -> Vec<Match> {
        let mut emitted = Vec::new();
        let active_start = live.iter().map(|c| c.match_start).min();

        let mut pending = just_completed;
        while !pending.is_empty() {
            let context = pending.remove(0);
            let earliest = live
                .iter()
                .map(|c| c.match_start)
                .chain(self.queue.iter().map(|c| c.match_start))
                .chain(pending.iter().map(|c| c.match_start))
                .chain(std::iter::once(context.match_start))
                .min()
                .unwrap();
            let active_at_earliest =
                live.iter().any(|c| c.match_start == earliest);
            if context.match_start == earliest && !active_at_earliest {
                // Nothing earlier can produce a match anymore; emit right
                // away unless a policy says otherwise.
                if self.overlaps_last(skip_mode, &context) {
                    debug!(
                        "context {}: discarded, overlaps last emission",
                        context.id
                    );
                    snap.discarded.push(context.id);
                } else if self.must_wait(skip_mode, &context, active_start) {
                    self.enqueue(context, snap);
                } else {
                    emitted.push(self.emit(pattern, output_mode, context));
                }
            } else {
                self.enqueue(context, snap);
            }
        }

        // Release queued contexts that nothing alive precedes anymore.
        while !self.queue.is_empty() {
            let blocked = active_start
                .map_or(false, |active| self.queue[0].match_start >= active);
            if blocked {
                break;
            }
            if self.overlaps_last(skip_mode, &self.queue[0]) {
                let entry = self.queue.remove(0);
                debug!(
                    "context {}: discarded, overlaps last emission",
                    entry.id
                );
                snap.discarded.push(entry.id);
                continue;
            }
            if self.must_wait(skip_mode, &self.queue[0], active_start) {
                break;
            }
            let entry = self.queue.remove(0);
            emitted.push(self.emit(pattern, output_mode, entry));
        }

        snap.emitted.extend(emitted.iter().cloned());
        emitted
    }

    /// Under `PastLast`, a match starting at or before the last emitted
    /// end overlaps and must be dropped.
    fn overlaps_last(&self, skip_mode: SkipMode, ctx: &MatchContext) -> bool {
        skip_mode == SkipMode::PastLast
            && self
                .last_emitted_end
                .map_or(false, |end| ctx.match_start <= end)
    }

    /// Under `ToNext`, a match reaching into a still-alive earlier-or-
    /// equal-started context must wait until that context resolves.
    fn must_wait(
        &self,
        skip_mode: SkipMode,
        ctx: &MatchContext,
        active_start: Option<usize>,
    ) -> bool {
        skip_mode == SkipMode::ToNext
            && match (ctx.match_end, active_start) {
                (Some(end), Some(active)) => end >= active,
                _ => false,
            }
    }

    fn enqueue(&mut self, context: MatchContext, snap: &mut RowSnapshot) {
        snap.queued.push(context.id);
        let at = self
            .queue
            .partition_point(|c| c.match_start < context.match_start);
        self.queue.insert(at, context);
    }

    fn emit(
        &mut self,
        pattern: &Pattern,
        output_mode: OutputMode,
        context: MatchContext,
    ) -> Match {
        let match_end = context
            .match_end
            .expect("a completed context always has an end row");
        self.last_emitted_end = Some(match_end);
        debug!(
            "context {}: emitting rows {}..={}",
            context.id, context.match_start, match_end
        );
        Match {
            context_id: context.id,
            match_start: context.match_start,
            match_end,
            paths: selected_paths(pattern, output_mode, context),
        }
    }

    pub fn reset(&mut self) {
        self.queue.clear();
        self.last_emitted_end = None;
    }
}

/// Picks and orders the reported paths of a completed context.
///
/// `OneRow` reports the lexically first path: the longest, earliest-forked
/// one for greedy patterns, and the first completion reached for globally
/// reluctant patterns, for which the earliest sequence number is exactly
/// the reluctant answer.
fn selected_paths(
    pattern: &Pattern,
    output_mode: OutputMode,
    context: MatchContext,
) -> Vec<Vec<String>> {
    let mut paths = context.completed_paths;
    match output_mode {
        OutputMode::OneRow => {
            let best = if pattern.is_reluctant() {
                paths.into_iter().min_by_key(|p| p.seq)
            } else {
                paths
                    .into_iter()
                    .min_by_key(|p| (Reverse(p.vars.len()), p.seq))
            };
            best.into_iter().map(|p| named(pattern, &p)).collect()
        }
        OutputMode::AllRows => {
            paths.sort_by_key(|p| p.seq);
            paths.iter().map(|p| named(pattern, p)).collect()
        }
    }
}

fn named(pattern: &Pattern, path: &TrackedPath) -> Vec<String> {
    path.vars.iter().map(|&v| pattern.var_name(v).to_string()).collect()
}
