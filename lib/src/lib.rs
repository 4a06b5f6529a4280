/*! A row pattern recognition engine written in Rust.

`rowpat` compiles a pattern over a finite alphabet of *variables* (named
per-row conditions) into a compact program, and then executes that program
incrementally, row by row, reporting every place the pattern matches in the
row stream. This is the engine behind `MATCH_RECOGNIZE`-style clauses and
complex-event-processing operators: what is matched against each row is not
a character but the set of variables that are true for that row.

There are two main types in this crate: [`Compiler`] and [`Matcher`]. A
compiler takes pattern text and produces a compiled [`Pattern`] that is
passed to the matcher. The [`Pattern`] produced by the compiler can be
shared by multiple matchers, but each matcher processes a single row stream
at a time.

Evaluating which variables are true for a row is the caller's business:
every [`Matcher::process_row`] call takes the row's set of true variable
names. The matcher finds all matches, resolves overlaps between competing
match attempts, and reports matches under the configured [`SkipMode`] and
[`OutputMode`].

# Example

```rust
// Compile a pattern: an A, one or more Bs, then a C.
let pattern = rowpat::compile("A B+ C").unwrap();

// Create a matcher that uses the compiled pattern.
let mut matcher = rowpat::Matcher::new(&pattern);

// Feed rows; each row carries the names of its true variables.
let rows: Vec<Vec<&str>> =
    vec![vec!["A"], vec!["B"], vec!["B"], vec!["C"]];

let mut matches = Vec::new();
for (row, vars) in rows.iter().enumerate() {
    matches.extend(matcher.process_row(row, vars).unwrap().emissions);
}

assert_eq!(matches.len(), 1);
assert_eq!(matches[0].match_start, 0);
assert_eq!(matches[0].match_end, 3);
```
*/

#![deny(missing_docs)]

pub use compiler::compile;
pub use compiler::CompileError;
pub use compiler::Compiler;
pub use compiler::ParseError;
pub use compiler::Pattern;

pub use matcher::Match;
pub use matcher::MatchError;
pub use matcher::Matcher;
pub use matcher::OutputMode;
pub use matcher::RowReport;
pub use matcher::SkipMode;

pub use matcher::snapshot::Absorption;
pub use matcher::snapshot::ContextSnapshot;
pub use matcher::snapshot::PathSnapshot;
pub use matcher::snapshot::RowSnapshot;
pub use matcher::snapshot::StateMerge;
pub use matcher::snapshot::StateRef;
pub use matcher::snapshot::StateSnapshot;

mod compiler;
mod matcher;

#[cfg(test)]
mod tests;
