use crate::formula::{Literal, Variable};

use super::tracker::ClauseIdx;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarState {
    pub value: Option<bool>,
    /// Decision level of the assignment.
    pub level: usize,
    /// Clause that forced the assignment, `None` for decisions.
    pub reason: Option<ClauseIdx>,
}

impl VarState {
    const UNASSIGNED: VarState = VarState {
        value: None,
        level: 0,
        reason: None,
    };
}

/// Assignment trail.
/// Records assignments in the order they were made, split into decision levels.
pub struct Trail {
    vars: Vec<VarState>,
    /// Assigned literals in assignment order.
    trail: Vec<Literal>,
    /// `trail_lim[level]` is the trail length when `level` started.
    /// Invariant: `trail_lim[0] == 0` and the entries are non-decreasing.
    trail_lim: Vec<usize>,
    /// Entries before `head` were already handed to propagation.
    head: usize,
}

impl Trail {
    pub fn new(num_variables: usize) -> Self {
        Trail {
            vars: vec![VarState::UNASSIGNED; num_variables],
            trail: Vec::with_capacity(num_variables),
            trail_lim: vec![0],
            head: 0,
        }
    }

    pub fn decision_level(&self) -> usize {
        self.trail_lim.len() - 1
    }

    pub fn state(&self, variable: Variable) -> VarState {
        self.vars[variable.index()]
    }

    pub fn value(&self, variable: Variable) -> Option<bool> {
        self.vars[variable.index()].value
    }

    pub fn literal_value(&self, literal: Literal) -> Option<bool> {
        self.value(literal.variable()).map(|value| literal.eval(value))
    }

    pub fn level(&self, variable: Variable) -> usize {
        self.vars[variable.index()].level
    }

    pub fn reason(&self, variable: Variable) -> Option<ClauseIdx> {
        self.vars[variable.index()].reason
    }

    pub fn literals(&self) -> &[Literal] {
        &self.trail
    }

    /// True when every variable is assigned.
    pub fn is_complete(&self) -> bool {
        self.trail.len() == self.vars.len()
    }

    /// Makes `literal` true at the current decision level.
    ///
    /// Returns false if the variable is already assigned the opposite way.
    /// Re-asserting a literal that is already true succeeds without touching the trail.
    #[must_use]
    pub fn enqueue(&mut self, literal: Literal, reason: Option<ClauseIdx>) -> bool {
        let level = self.decision_level();
        let state = &mut self.vars[literal.variable().index()];
        match state.value {
            Some(value) => literal.eval(value),
            None => {
                *state = VarState {
                    value: Some(literal.positive()),
                    level,
                    reason,
                };
                self.trail.push(literal);
                true
            }
        }
    }

    /// Opens a new decision level starting at the current trail tail.
    pub fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    /// Unassigns every variable assigned above `level` and makes `level` current.
    /// `on_unassign` sees each removed literal, most recent first.
    pub fn cancel_until(&mut self, level: usize, mut on_unassign: impl FnMut(Literal)) {
        if level >= self.decision_level() {
            return;
        }

        let keep = self.trail_lim[level + 1];
        for &literal in self.trail[keep..].iter().rev() {
            self.vars[literal.variable().index()] = VarState::UNASSIGNED;
            on_unassign(literal);
        }
        self.trail.truncate(keep);
        self.trail_lim.truncate(level + 1);
        self.head = self.head.min(keep);
    }

    /// Returns the oldest assigned literal propagation has not seen yet.
    pub fn next_unpropagated(&mut self) -> Option<Literal> {
        let literal = self.trail.get(self.head).copied()?;
        self.head += 1;
        Some(literal)
    }

    /// Number of trail entries handed to propagation so far.
    pub fn propagated(&self) -> usize {
        self.head
    }

    /// Values of all variables, unassigned ones reported as false.
    pub fn assignment(&self) -> Vec<bool> {
        self.vars
            .iter()
            .map(|state| state.value.unwrap_or(false))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(dimacs: i64) -> Literal {
        Literal::new(
            Variable::new(dimacs.unsigned_abs() as usize).unwrap(),
            dimacs > 0,
        )
    }

    #[test]
    fn enqueue_reports_agreement() {
        let mut trail = Trail::new(2);
        assert!(trail.enqueue(lit(1), None));
        assert!(trail.enqueue(lit(1), None));
        assert!(!trail.enqueue(lit(-1), None));
        assert_eq!(trail.literals().len(), 1);
        assert_eq!(trail.literal_value(lit(-1)), Some(false));
        assert_eq!(trail.literal_value(lit(2)), None);
    }

    #[test]
    fn cancel_until_restores_lower_levels() {
        let mut trail = Trail::new(6);

        assert!(trail.enqueue(lit(1), Some(ClauseIdx::from(0))));
        trail.new_decision_level();
        assert!(trail.enqueue(lit(-2), None));
        assert!(trail.enqueue(lit(3), Some(ClauseIdx::from(4))));
        trail.new_decision_level();
        assert!(trail.enqueue(lit(4), None));
        trail.new_decision_level();
        assert!(trail.enqueue(lit(-5), None));
        assert!(trail.enqueue(lit(6), Some(ClauseIdx::from(2))));

        let before = (1..=6)
            .map(|id| trail.state(Variable::new(id).unwrap()))
            .collect::<Vec<_>>();
        while trail.next_unpropagated().is_some() {}

        let mut removed = Vec::new();
        trail.cancel_until(1, |literal| removed.push(literal.to_dimacs()));

        assert_eq!(removed, vec![6, -5, 4]);
        assert_eq!(trail.decision_level(), 1);
        assert_eq!(trail.literals().len(), 3);
        assert_eq!(trail.propagated(), 3);

        for id in 1..=6 {
            let state = trail.state(Variable::new(id).unwrap());
            if before[id - 1].level <= 1 {
                assert_eq!(state, before[id - 1]);
            } else {
                assert_eq!(state, VarState::UNASSIGNED);
            }
        }

        trail.cancel_until(0, |_| ());
        assert_eq!(trail.literals(), &[lit(1)]);
        assert_eq!(trail.reason(lit(1).variable()), Some(ClauseIdx::from(0)));
    }

    #[test]
    fn cancel_until_current_level_is_noop() {
        let mut trail = Trail::new(2);
        trail.new_decision_level();
        assert!(trail.enqueue(lit(2), None));
        trail.cancel_until(1, |_| panic!("nothing to unassign"));
        assert_eq!(trail.literals().len(), 1);
    }
}
