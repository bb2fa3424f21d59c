use std::mem::take;

use crate::formula::{Literal, Variable};

pub trait ConflictDataProvider {
    /// Returns the current value assigned to a variable.
    fn value(&self, variable: Variable) -> bool;

    /// Returns the decision level of a variable.
    fn level(&self, variable: Variable) -> usize;

    /// Returns antecedents of a variable.
    /// `None` if the variable is a decision variable.
    fn antecedents(&self, variable: Variable) -> Option<&[Literal]>;
}

/// Clause derived from a conflict.
#[derive(Debug, PartialEq, Eq)]
pub struct Learnt {
    /// The asserting literal comes first, followed by the literal with the
    /// highest decision level among the rest.
    pub literals: Vec<Literal>,
    /// Level at which the clause becomes unit.
    pub backjump_level: usize,
}

/// First-UIP conflict analysis.
/// Scratch buffers are sized once and reused across conflicts.
pub struct ConflictAnalyzer {
    /// Bitmap to check if each variable is previously seen.
    seen: Vec<bool>,
    /// A queue that records seen variables.
    seen_queue: Vec<Variable>,
    /// A clause to learn
    recorded: Vec<Literal>,
    /// Unresolved variables on the current level
    unresolved_on_current_level: usize,
}

impl ConflictAnalyzer {
    pub fn new(num_variables: usize) -> Self {
        ConflictAnalyzer {
            seen: vec![false; num_variables],
            seen_queue: Vec::with_capacity(num_variables),
            recorded: Vec::with_capacity(num_variables),
            unresolved_on_current_level: 0,
        }
    }

    fn finalize<P>(&mut self, data_provider: &P) -> Learnt
    where
        P: ConflictDataProvider,
    {
        for &var in &self.seen_queue {
            self.seen[var.index()] = false;
        }
        self.seen_queue.clear();
        self.unresolved_on_current_level = 0;

        let mut literals = take(&mut self.recorded);
        // The UIP was pushed last.
        let last = literals.len() - 1;
        literals.swap(0, last);

        let highest = literals
            .iter()
            .enumerate()
            .skip(1)
            .map(|(pos, literal)| (pos, data_provider.level(literal.variable())))
            .max_by_key(|&(_, level)| level);
        let backjump_level = match highest {
            Some((pos, level)) => {
                literals.swap(1, pos);
                level
            }
            None => 0,
        };

        Learnt {
            literals,
            backjump_level,
        }
    }

    /// Mark the variable, return true if the variable is previously unseen.
    fn mark_if_unseen(&mut self, variable: Variable) -> bool {
        if self.seen[variable.index()] {
            false
        } else {
            self.seen[variable.index()] = true;
            self.seen_queue.push(variable);
            true
        }
    }

    fn add_clause<P>(&mut self, current_level: usize, data_provider: &P, clause: &[Literal])
    where
        P: ConflictDataProvider,
    {
        for &literal in clause {
            if self.mark_if_unseen(literal.variable()) {
                let literal_level = data_provider.level(literal.variable());
                if literal_level == current_level {
                    self.unresolved_on_current_level += 1;
                } else if literal_level != 0 {
                    // Root-level literals are false forever and can be dropped.
                    self.recorded.push(literal);
                }
            }
        }
    }

    /// Resolves the conflicting clause against the reasons of current-level
    /// assignments, walking `trail` backward until one current-level literal remains.
    ///
    /// `current_level` must be above 0 and the conflicting clause must contain
    /// at least one literal of that level.
    pub fn analyze<P>(
        &mut self,
        data_provider: &P,
        current_level: usize,
        conflicting_clause: &[Literal],
        trail: &[Literal],
    ) -> Learnt
    where
        P: ConflictDataProvider,
    {
        debug_assert!(current_level > 0);
        self.add_clause(current_level, data_provider, conflicting_clause);

        // Current-level assignments sit at the end of the trail,
        // so earlier-level marks are never reached before the UIP.
        for literal in trail.iter().rev().copied() {
            let variable = literal.variable();
            if self.seen[variable.index()] {
                self.unresolved_on_current_level -= 1;
                if self.unresolved_on_current_level == 0 {
                    // First UIP reached
                    self.recorded
                        .push(Literal::new(variable, !data_provider.value(variable)));

                    return self.finalize(data_provider);
                }

                // If this was not UIP, mark its antecedents
                let antecedents = data_provider
                    .antecedents(variable)
                    .expect("only the decision of a level lacks antecedents, and it is always a UIP");
                self.add_clause(current_level, data_provider, antecedents);
            }
        }

        // Decision variable is guaranteed to be UIP
        unreachable!()
    }
}
