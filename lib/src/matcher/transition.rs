/*!
Element-level transition rules of the NFA simulation.

Two phases run per row, per context:

- [`consume`] takes a state waiting at a `Var` or `AltStart` and produces
  its successors under the row's set of true variables. Consumption is
  recursive: a satisfied position that cannot match the row skips ahead and
  retries the same row at the next element, which is what lets several
  optional positions be crossed within a single row.
- [`expand`] takes the successors, which may sit at epsilon elements
  (`GroupEnd`, `Fin`), and drives them to the next *wait positions*,
  breadth-first, deduplicating equivalent states along the way.

At every branch point the preferred branch is a clone (keeps its sequence
numbers) and is explored or enqueued first; the other branch is a fork
(fresh sequence numbers) and comes second. Greediness decides which branch
is preferred: a greedy quantifier prefers repeating, a reluctant one
prefers moving on.

Both phases carry a trail of the `GroupEnd` elements crossed since the row
was last consumed. Re-entering a `GroupEnd` on the trail suppresses its
repeat branch: iterating a group again without having consumed anything can
only add zero-width iterations forever.
*/

use std::collections::VecDeque;

use indexmap::map::Entry;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::compiler::pattern::{ElementKind, Pattern, PatternElement, VarId};
use crate::matcher::state::{MatchState, SeqCounter, StateKey, DONE};

/// Everything a transition needs to see: the program, the row, and the
/// sequence counter for forked branches.
pub(crate) struct StepEnv<'a> {
    pub pattern: &'a Pattern,
    pub true_vars: &'a FxHashSet<VarId>,
    pub seqs: &'a mut SeqCounter,
}

/// Trail of `GroupEnd` elements crossed since the last consumed row.
pub(crate) type Trail = SmallVec<[usize; 4]>;

/// Computes the successors of `state` under the current row, appending
/// them to `out` in preference order. A state that appends nothing is
/// dead.
pub(crate) fn consume(
    env: &mut StepEnv,
    mut state: MatchState,
    trail: &mut Trail,
    out: &mut Vec<MatchState>,
) {
    let elem = env.pattern.element(state.element);
    match elem.kind {
        ElementKind::Var(var) => {
            let depth = elem.depth;
            if env.true_vars.contains(&var) {
                state.record_match(var);
                let hits = state.counts[depth] + 1;
                if elem.maxed(hits) {
                    state.counts[depth] = 0;
                    state.element = elem.next();
                    out.push(state);
                } else if hits >= elem.min {
                    if elem.reluctant {
                        let mut advance = state.clone();
                        advance.counts[depth] = 0;
                        advance.element = elem.next();
                        out.push(advance);
                        let mut stay = state.fork(env.seqs);
                        stay.counts[depth] = hits;
                        out.push(stay);
                    } else {
                        let mut advance = state.fork(env.seqs);
                        advance.counts[depth] = 0;
                        advance.element = elem.next();
                        state.counts[depth] = hits;
                        out.push(state);
                        out.push(advance);
                    }
                } else {
                    state.counts[depth] = hits;
                    out.push(state);
                }
            } else if state.counts[depth] >= elem.min {
                // The position is already satisfied: skip it and retry the
                // same row at the next element. If that chain produces
                // nothing the state dies; it must not survive as a waiter.
                state.counts[depth] = 0;
                state.element = elem.next();
                consume(env, state, trail, out);
            }
        }
        ElementKind::AltStart => {
            let produced_before = out.len();
            for (i, first) in
                alternative_firsts(env.pattern, state.element)
                    .into_iter()
                    .enumerate()
            {
                let mut branch = if i == 0 {
                    state.clone()
                } else {
                    state.fork(env.seqs)
                };
                branch.element = first;
                consume(env, branch, trail, out);
            }
            if out.len() == produced_before {
                // No alternative consumed the row. When the alternation
                // closes a quantified group whose minimum is met, the
                // group can be left behind and the row retried after it.
                if let Some(group_end) = closing_group(env.pattern, elem) {
                    let end = env.pattern.element(group_end);
                    if state.counts[end.depth] >= end.min {
                        state.counts[end.depth] = 0;
                        state.element = end.next();
                        consume(env, state, trail, out);
                    }
                }
            }
        }
        ElementKind::GroupEnd => {
            let depth = elem.depth;
            let here = state.element;
            let hits = state.counts[depth] + 1;
            let revisited = trail.contains(&here);
            if hits < elem.min {
                if revisited {
                    // Nothing was consumed since the last visit; another
                    // zero-width iteration cannot reach the minimum.
                    return;
                }
                enter_iteration(&mut state, elem, hits);
                trail.push(here);
                consume(env, state, trail, out);
                trail.pop();
            } else if elem.maxed(hits) || revisited {
                state.counts[depth] = 0;
                state.element = elem.next();
                consume(env, state, trail, out);
            } else if elem.reluctant {
                let mut exit = state.clone();
                exit.counts[depth] = 0;
                exit.element = elem.next();
                consume(env, exit, trail, out);
                let mut repeat = state.fork(env.seqs);
                enter_iteration(&mut repeat, elem, hits);
                trail.push(here);
                consume(env, repeat, trail, out);
                trail.pop();
            } else {
                let mut repeat = state.clone();
                enter_iteration(&mut repeat, elem, hits);
                trail.push(here);
                consume(env, repeat, trail, out);
                trail.pop();
                let mut exit = state.fork(env.seqs);
                exit.counts[depth] = 0;
                exit.element = elem.next();
                consume(env, exit, trail, out);
            }
        }
        ElementKind::Fin => {
            state.element = DONE;
            out.push(state);
        }
    }
}

/// Result of expanding consumption successors to the next wait frontier.
pub(crate) struct Expanded {
    /// States parked at `Var` or `AltStart`, in discovery order.
    pub wait: Vec<MatchState>,
    /// States that reached the end of the program during expansion.
    pub completed: Vec<MatchState>,
    /// Keys of states that were merged into an earlier equivalent one.
    pub merges: Vec<StateKey>,
}

/// Drives the given states through epsilon elements until every branch
/// rests at a wait position or has completed.
///
/// Processing is breadth-first; at each branch point the preferred branch
/// is enqueued before the forked one. States meeting at the same position
/// with the same counters merge into the earlier arrival.
pub(crate) fn expand(
    env: &mut StepEnv,
    actives: Vec<MatchState>,
) -> Expanded {
    let mut seen: IndexMap<StateKey, MatchState> = IndexMap::new();
    let mut queue: VecDeque<(StateKey, Trail)> = VecDeque::new();
    let mut merges: Vec<StateKey> = Vec::new();

    for active in actives {
        schedule(&mut seen, &mut queue, &mut merges, active, Trail::new());
    }

    while let Some((key, trail)) = queue.pop_front() {
        if key.element == DONE {
            continue;
        }
        let state = match seen.get(&key) {
            Some(state) => state.clone(),
            None => continue,
        };
        let elem = env.pattern.element(key.element);
        match elem.kind {
            ElementKind::Var(_) => {
                // A wait position. If it is already satisfied, a branch
                // may also skip it without consuming anything.
                if state.counts[elem.depth] >= elem.min {
                    let mut skip = state.fork(env.seqs);
                    skip.counts[elem.depth] = 0;
                    skip.element = elem.next();
                    schedule(&mut seen, &mut queue, &mut merges, skip, trail);
                }
            }
            ElementKind::AltStart => {
                // A wait position. If the alternation closes a group whose
                // minimum is met, a branch may skip the whole group.
                if let Some(group_end) = closing_group(env.pattern, elem) {
                    let end = env.pattern.element(group_end);
                    if state.counts[end.depth] >= end.min {
                        let mut skip = state.fork(env.seqs);
                        skip.counts[end.depth] = 0;
                        skip.element = end.next();
                        schedule(
                            &mut seen,
                            &mut queue,
                            &mut merges,
                            skip,
                            trail,
                        );
                    }
                }
            }
            ElementKind::GroupEnd => {
                let depth = elem.depth;
                let hits = state.counts[depth] + 1;
                let revisited = trail.contains(&key.element);
                if hits < elem.min {
                    if !revisited {
                        let mut repeat = state;
                        enter_iteration(&mut repeat, elem, hits);
                        let mut inner = trail.clone();
                        inner.push(key.element);
                        schedule(
                            &mut seen,
                            &mut queue,
                            &mut merges,
                            repeat,
                            inner,
                        );
                    }
                } else if elem.maxed(hits) || revisited {
                    let mut exit = state;
                    exit.counts[depth] = 0;
                    exit.element = elem.next();
                    schedule(&mut seen, &mut queue, &mut merges, exit, trail);
                } else if elem.reluctant {
                    let mut exit = state.clone();
                    exit.counts[depth] = 0;
                    exit.element = elem.next();
                    schedule(
                        &mut seen,
                        &mut queue,
                        &mut merges,
                        exit,
                        trail.clone(),
                    );
                    let mut repeat = state.fork(env.seqs);
                    enter_iteration(&mut repeat, elem, hits);
                    let mut inner = trail;
                    inner.push(key.element);
                    schedule(
                        &mut seen,
                        &mut queue,
                        &mut merges,
                        repeat,
                        inner,
                    );
                } else {
                    let mut repeat = state.clone();
                    enter_iteration(&mut repeat, elem, hits);
                    let mut inner = trail.clone();
                    inner.push(key.element);
                    schedule(
                        &mut seen,
                        &mut queue,
                        &mut merges,
                        repeat,
                        inner,
                    );
                    let mut exit = state.fork(env.seqs);
                    exit.counts[depth] = 0;
                    exit.element = elem.next();
                    schedule(&mut seen, &mut queue, &mut merges, exit, trail);
                }
            }
            ElementKind::Fin => {
                let mut done = state;
                done.element = DONE;
                schedule(&mut seen, &mut queue, &mut merges, done, trail);
            }
        }
    }

    let mut wait = Vec::new();
    let mut completed = Vec::new();
    for (key, state) in seen {
        if key.element == DONE {
            completed.push(state);
        } else {
            match env.pattern.element(key.element).kind {
                ElementKind::Var(_) | ElementKind::AltStart => {
                    wait.push(state)
                }
                // Epsilon elements were transient stops, not results.
                _ => {}
            }
        }
    }
    Expanded { wait, completed, merges }
}

/// Adds a state to the expansion working set: merged into an equivalent
/// earlier arrival if one exists, enqueued for processing otherwise.
fn schedule(
    seen: &mut IndexMap<StateKey, MatchState>,
    queue: &mut VecDeque<(StateKey, Trail)>,
    merges: &mut Vec<StateKey>,
    state: MatchState,
    trail: Trail,
) {
    let key = state.key();
    match seen.entry(key.clone()) {
        Entry::Occupied(mut entry) => {
            entry.get_mut().merge_summaries(state.summaries);
            merges.push(key);
        }
        Entry::Vacant(entry) => {
            entry.insert(state);
            queue.push_back((key, trail));
        }
    }
}

/// True if a state waiting at `element` could consume a row with the given
/// true variables: a matching variable, or an alternation one of whose
/// alternatives (searched through nested alternations) starts with one.
pub(crate) fn can_consume_at(
    pattern: &Pattern,
    element: usize,
    true_vars: &FxHashSet<VarId>,
) -> bool {
    match pattern.element(element).kind {
        ElementKind::Var(var) => true_vars.contains(&var),
        ElementKind::AltStart => alternative_firsts(pattern, element)
            .into_iter()
            .any(|first| can_consume_at(pattern, first, true_vars)),
        _ => false,
    }
}

/// First elements of every alternative of the alternation starting at
/// `alt_start`, in definition order. The first alternative begins right
/// after the `AltStart`; the rest are chained through the `jump` of each
/// alternative's first element.
fn alternative_firsts(
    pattern: &Pattern,
    alt_start: usize,
) -> SmallVec<[usize; 4]> {
    let mut firsts = SmallVec::new();
    let mut first = alt_start + 1;
    loop {
        firsts.push(first);
        match pattern.element(first).next_alternative() {
            Some(next) => first = next,
            None => break,
        }
    }
    firsts
}

/// The `GroupEnd` closing the group an alternation is the last element
/// of, if any. This is the only shape in which an alternation can be
/// skipped or exited: anywhere else it is mandatory.
pub(crate) fn closing_group(
    pattern: &Pattern,
    alt_start: &PatternElement,
) -> Option<usize> {
    let next = alt_start.next();
    match pattern.element(next).kind {
        ElementKind::GroupEnd => Some(next),
        _ => None,
    }
}

/// Positions a state at the start of the group's next iteration.
fn enter_iteration(
    state: &mut MatchState,
    group_end: &PatternElement,
    hits: u32,
) {
    state.counts[group_end.depth] = hits;
    for count in state.counts[group_end.depth + 1..].iter_mut() {
        *count = 0;
    }
    state.element = group_end.loop_start();
}
