use std::{
    mem::take,
    ops::{Index, IndexMut},
};

use typed_index_collections::TiVec;

use crate::formula::Literal;

use super::trail::Trail;

/// Stable handle to a clause in the clause arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseIdx(usize);

impl From<usize> for ClauseIdx {
    fn from(index: usize) -> Self {
        ClauseIdx(index)
    }
}

impl From<ClauseIdx> for usize {
    fn from(index: ClauseIdx) -> Self {
        index.0
    }
}

pub struct TrackedClause {
    literals: Vec<Literal>,
    learnt: bool,
    /// Positions of the two watched literals.
    /// Both point at position 0 for a unit clause.
    watch: [usize; 2],
}

impl TrackedClause {
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn is_learnt(&self) -> bool {
        self.learnt
    }

    pub fn watched(&self) -> [Literal; 2] {
        [self.literals[self.watch[0]], self.literals[self.watch[1]]]
    }
}

type WatchRow = Vec<ClauseIdx>;

/// Clauses watching each literal, indexed by the literal's dense code.
struct Watch {
    rows: Vec<WatchRow>,
}

impl Watch {
    fn new(num_variables: usize) -> Self {
        Watch {
            rows: vec![Vec::new(); num_variables * 2],
        }
    }
}

impl Index<Literal> for Watch {
    type Output = WatchRow;

    fn index(&self, literal: Literal) -> &Self::Output {
        &self.rows[literal.code()]
    }
}

impl IndexMut<Literal> for Watch {
    fn index_mut(&mut self, literal: Literal) -> &mut Self::Output {
        &mut self.rows[literal.code()]
    }
}

/// Clause database with two-literal watches.
pub struct Tracker {
    clauses: TiVec<ClauseIdx, TrackedClause>,
    watch: Watch,
}

impl Tracker {
    pub fn new(num_variables: usize) -> Self {
        Tracker {
            clauses: TiVec::new(),
            watch: Watch::new(num_variables),
        }
    }

    /// Stores a clause and watches its first two literals.
    /// A unit clause is stored but never watched.
    ///
    /// Learned clauses must be ordered so that position 0 holds the asserting literal
    /// and position 1 the literal assigned last among the rest.
    pub fn add_clause(&mut self, literals: Vec<Literal>, learnt: bool) -> ClauseIdx {
        assert!(!literals.is_empty(), "empty clauses cannot be watched");

        let watch = if literals.len() >= 2 { [0, 1] } else { [0, 0] };
        let idx = self.clauses.push_and_get_key(TrackedClause {
            literals,
            learnt,
            watch,
        });

        let clause = &self.clauses[idx];
        if clause.literals.len() >= 2 {
            let [first, second] = clause.watched();
            self.watch[first].push(idx);
            self.watch[second].push(idx);
        }

        idx
    }

    pub fn clause(&self, idx: ClauseIdx) -> &TrackedClause {
        &self.clauses[idx]
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> impl Iterator<Item = &TrackedClause> + '_ {
        self.clauses.iter()
    }

    /// Clauses currently watching `literal`, in no particular order.
    #[cfg(test)]
    pub fn watchers(&self, literal: Literal) -> &[ClauseIdx] {
        &self.watch[literal]
    }

    /// Unit propagation over the unprocessed part of the trail.
    ///
    /// Returns the first clause found with every literal false, or `None` once
    /// every trail entry has been processed.
    pub fn propagate(&mut self, trail: &mut Trail) -> Option<ClauseIdx> {
        while let Some(assigned) = trail.next_unpropagated() {
            let falsified = !assigned;
            let mut watchers = take(&mut self.watch[falsified]);

            let mut conflict = None;
            let mut i = 0;
            while i < watchers.len() {
                let idx = watchers[i];
                let clause = &mut self.clauses[idx];

                // Keep the falsified literal in watch[1].
                if clause.literals[clause.watch[0]] == falsified {
                    clause.watch.swap(0, 1);
                }
                debug_assert_eq!(clause.literals[clause.watch[1]], falsified);

                let other = clause.literals[clause.watch[0]];
                let other_value = trail.literal_value(other);
                if other_value == Some(true) {
                    // satisfied
                    i += 1;
                    continue;
                }

                let watch = clause.watch;
                let replacement = clause
                    .literals
                    .iter()
                    .enumerate()
                    .position(|(pos, &literal)| {
                        pos != watch[0]
                            && pos != watch[1]
                            && trail.literal_value(literal) != Some(false)
                    });

                if let Some(pos) = replacement {
                    clause.watch[1] = pos;
                    self.watch[clause.literals[pos]].push(idx);
                    watchers.swap_remove(i);
                    continue;
                }

                i += 1;
                match other_value {
                    Some(false) => {
                        conflict = Some(idx);
                        break;
                    }
                    _ => {
                        if !trail.enqueue(other, Some(idx)) {
                            conflict = Some(idx);
                            break;
                        }
                    }
                }
            }

            self.watch[falsified] = watchers;
            if conflict.is_some() {
                return conflict;
            }
        }

        None
    }
}
