use std::{cmp::Ordering, collections::BTreeSet};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::formula::{Literal, Variable};

#[derive(Clone, Copy)]
struct VecEntry {
    score: f64,
    nonce: f64,
}

impl VecEntry {
    pub fn new(score: f64, rng: &mut StdRng) -> Self {
        VecEntry {
            score,
            nonce: rng.gen(),
        }
    }

    /// Update the score by delta, change the nonce, and return the updated score.
    pub fn update(&mut self, delta: f64, rng: &mut StdRng) -> f64 {
        self.score += delta;
        self.nonce = rng.gen();
        self.score
    }
}

#[derive(PartialEq, Clone, Copy)]
struct SetEntry {
    variable: Variable,
    score: f64,
    nonce: f64,
}

impl SetEntry {
    pub fn from_vec_entry(variable: Variable, vec_entry: VecEntry) -> Self {
        SetEntry {
            variable,
            score: vec_entry.score,
            nonce: vec_entry.nonce,
        }
    }
}

impl Eq for SetEntry {}

impl PartialOrd for SetEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SetEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .expect("NaN in heap entry")
            .then_with(|| {
                self.nonce
                    .partial_cmp(&other.nonce)
                    .expect("NaN in heap entry")
            })
            .then_with(|| self.variable.cmp(&other.variable))
    }
}

/// Variable State Independent Decaying Sum (VSIDS) heuristic.
/// Based on MiniSAT implementation.
///
/// The set holds every unassigned variable, and possibly some assigned ones
/// that are discarded lazily when they reach the top.
pub struct VsidsScoring {
    decay_rate: f64,
    current_rate: f64,
    scores: Vec<VecEntry>,
    btree: BTreeSet<SetEntry>,
    rng: StdRng,
}

impl VsidsScoring {
    const REBALANCE_THRESHOLD: f64 = 1e100;

    /// `occurrences[i]` is the initial score of the variable with index `i`.
    pub fn new(occurrences: &[usize], decay_rate: f64, seed: u64) -> Self {
        assert!(decay_rate > 0.0 && decay_rate <= 1.0);

        let mut rng = StdRng::seed_from_u64(seed);
        let mut scores = Vec::with_capacity(occurrences.len());
        let mut btree = BTreeSet::new();

        for (variable, &count) in (0..).filter_map(Variable::from_index).zip(occurrences) {
            let vec_entry = VecEntry::new(count as f64, &mut rng);
            scores.push(vec_entry);
            btree.insert(SetEntry::from_vec_entry(variable, vec_entry));
        }

        VsidsScoring {
            decay_rate,
            current_rate: 1.0,
            scores,
            btree,
            rng,
        }
    }

    fn bump_score(&mut self, variable: Variable) {
        let present = self.btree.remove(&self.set_entry(variable));

        let new_score = self.scores[variable.index()].update(self.current_rate, &mut self.rng);

        if present {
            self.btree.insert(self.set_entry(variable));
        }

        if new_score >= Self::REBALANCE_THRESHOLD {
            self.rebalance();
        }
    }

    fn rebalance(&mut self) {
        trace!("VSIDS rebalance");
        self.current_rate /= Self::REBALANCE_THRESHOLD;
        for index in 0..self.scores.len() {
            let variable = Variable::from_index(index).expect("index of a known variable");
            let present = self.btree.remove(&self.set_entry(variable));
            self.scores[index].score /= Self::REBALANCE_THRESHOLD;
            if present {
                self.btree.insert(self.set_entry(variable));
            }
        }
    }

    fn set_entry(&self, variable: Variable) -> SetEntry {
        SetEntry::from_vec_entry(variable, self.scores[variable.index()])
    }

    pub fn activity(&self, variable: Variable) -> f64 {
        self.scores[variable.index()].score
    }

    /// Makes the variable available for decisions again.
    pub fn insert(&mut self, variable: Variable) {
        self.btree.insert(self.set_entry(variable));
    }

    /// Removes and returns the highest scored variable that is not assigned.
    pub fn pop_unassigned(&mut self, is_assigned: impl Fn(Variable) -> bool) -> Option<Variable> {
        while let Some(entry) = self.btree.iter().next_back().copied() {
            self.btree.remove(&entry);
            if !is_assigned(entry.variable) {
                return Some(entry.variable);
            }
        }
        None
    }

    pub fn decay(&mut self) {
        self.current_rate /= self.decay_rate;
        if self.current_rate >= Self::REBALANCE_THRESHOLD {
            self.rebalance();
        }
    }

    pub fn learn_clause(&mut self, literals: &[Literal]) {
        for literal in literals {
            self.bump_score(literal.variable());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: usize) -> Variable {
        Variable::new(id).unwrap()
    }

    #[test]
    fn pops_by_descending_activity() {
        let mut vsids = VsidsScoring::new(&[1, 5, 3], 0.95, 0);
        assert_eq!(vsids.pop_unassigned(|_| false), Some(var(2)));
        assert_eq!(vsids.pop_unassigned(|_| false), Some(var(3)));
        assert_eq!(vsids.pop_unassigned(|_| false), Some(var(1)));
        assert_eq!(vsids.pop_unassigned(|_| false), None);
    }

    #[test]
    fn skips_assigned_variables() {
        let mut vsids = VsidsScoring::new(&[1, 5, 3], 0.95, 0);
        assert_eq!(vsids.pop_unassigned(|v| v != var(1)), Some(var(1)));
        assert_eq!(vsids.pop_unassigned(|_| false), None);

        vsids.insert(var(3));
        assert_eq!(vsids.pop_unassigned(|_| false), Some(var(3)));
    }

    #[test]
    fn learned_clauses_raise_activity() {
        let mut vsids = VsidsScoring::new(&[0, 0, 2], 0.5, 0);
        let clause = [Literal::new(var(1), false), Literal::new(var(2), true)];

        vsids.learn_clause(&clause);
        vsids.decay();
        vsids.learn_clause(&clause[..1]);

        assert_eq!(vsids.activity(var(1)), 3.0);
        assert_eq!(vsids.activity(var(2)), 1.0);
        assert_eq!(vsids.pop_unassigned(|_| false), Some(var(1)));
        assert_eq!(vsids.pop_unassigned(|_| false), Some(var(3)));
    }

    #[test]
    fn rebalance_keeps_order() {
        let mut vsids = VsidsScoring::new(&[0, 0], 1e-50, 0);
        vsids.learn_clause(&[Literal::new(var(1), true)]);
        vsids.decay();
        vsids.decay();
        vsids.learn_clause(&[Literal::new(var(2), true)]);

        assert!(vsids.activity(var(2)) < VsidsScoring::REBALANCE_THRESHOLD);
        assert!(vsids.activity(var(2)) > vsids.activity(var(1)));
        assert_eq!(vsids.pop_unassigned(|_| false), Some(var(2)));
    }
}
