use std::{fmt::Display, time::Instant};

use crate::formula::{Cnf, Literal, Model, Variable};

use self::{
    conflict::{ConflictAnalyzer, ConflictDataProvider},
    phase::PhaseSelector,
    restart::RestartSchedule,
    tracker::{ClauseIdx, Tracker},
    trail::Trail,
    vsids::VsidsScoring,
};

use super::{Outcome, Solver, SolverConfig};

mod conflict;
mod phase;
mod restart;
mod tracker;
mod trail;
mod vsids;

/// Counters collected during a search.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub learnt_clauses: u64,
    pub restarts: u64,
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} decisions, {} propagations, {} conflicts, {} learnt clauses, {} restarts",
            self.decisions, self.propagations, self.conflicts, self.learnt_clauses, self.restarts
        )
    }
}

enum State {
    Propagate,
    Conflict(ClauseIdx),
    Decide,
    Sat,
    Unsat,
    /// The time limit expired.
    Interrupted,
}

/// Implication graph as seen by conflict analysis.
struct ImplicationGraph<'a> {
    trail: &'a Trail,
    tracker: &'a Tracker,
}

impl ConflictDataProvider for ImplicationGraph<'_> {
    fn value(&self, variable: Variable) -> bool {
        self.trail
            .state(variable)
            .value
            .expect("conflict analysis only visits assigned variables")
    }

    fn level(&self, variable: Variable) -> usize {
        self.trail.level(variable)
    }

    fn antecedents(&self, variable: Variable) -> Option<&[Literal]> {
        self.trail
            .reason(variable)
            .map(|idx| self.tracker.clause(idx).literals())
    }
}

/// Conflict-driven clause learning solver.
pub struct CdclSolver {
    formula: Cnf,
    config: SolverConfig,
    tracker: Tracker,
    trail: Trail,
    analyzer: ConflictAnalyzer,
    vsids: VsidsScoring,
    phase: PhaseSelector,
    restarts: RestartSchedule,
    stats: Statistics,
    /// The formula contains an empty clause or contradicting unit clauses.
    refuted_at_load: bool,
}

impl CdclSolver {
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Unassigns everything above `level`, returning the variables to the heuristic.
    fn backtrack(&mut self, level: usize) {
        let vsids = &mut self.vsids;
        let phase = &mut self.phase;
        self.trail.cancel_until(level, |literal| {
            vsids.insert(literal.variable());
            phase.save(literal);
        });
    }

    fn propagate(&mut self) -> State {
        let before = self.trail.propagated();
        let conflict = self.tracker.propagate(&mut self.trail);
        self.stats.propagations += (self.trail.propagated() - before) as u64;

        match conflict {
            Some(idx) => State::Conflict(idx),
            None if self.trail.is_complete() => State::Sat,
            None => State::Decide,
        }
    }

    fn resolve_conflict(&mut self, conflict: ClauseIdx) -> State {
        self.stats.conflicts += 1;

        let current_level = self.trail.decision_level();
        if current_level == 0 {
            return State::Unsat;
        }

        let graph = ImplicationGraph {
            trail: &self.trail,
            tracker: &self.tracker,
        };
        let learnt = self.analyzer.analyze(
            &graph,
            current_level,
            self.tracker.clause(conflict).literals(),
            self.trail.literals(),
        );
        trace!(
            "Learnt clause of {} literals, backjump {} -> {}",
            learnt.literals.len(),
            current_level,
            learnt.backjump_level
        );

        self.vsids.learn_clause(&learnt.literals);
        self.vsids.decay();

        self.backtrack(learnt.backjump_level);
        let asserting = learnt.literals[0];
        let idx = self.tracker.add_clause(learnt.literals, true);
        self.stats.learnt_clauses += 1;
        if !self.trail.enqueue(asserting, Some(idx)) {
            // The asserting literal is unassigned after the backjump.
            unreachable!("asserting literal {} already false", asserting);
        }

        if self.restarts.on_conflict() {
            self.stats.restarts += 1;
            debug!(
                "Restart #{} after {} conflicts, next in {:?}",
                self.restarts.restarts(),
                self.stats.conflicts,
                self.restarts.interval()
            );
            self.backtrack(0);
        }

        State::Propagate
    }

    fn decide(&mut self) -> State {
        let trail = &self.trail;
        let variable = match self.vsids.pop_unassigned(|v| trail.value(v).is_some()) {
            Some(variable) => variable,
            None => return State::Sat,
        };
        let literal = Literal::new(variable, self.phase.choose(variable));

        self.trail.new_decision_level();
        self.stats.decisions += 1;
        trace!(
            "Decide {} at level {} (activity {})",
            literal,
            self.trail.decision_level(),
            self.vsids.activity(variable)
        );

        if self.trail.enqueue(literal, None) {
            State::Propagate
        } else {
            unreachable!("decided on assigned variable {}", variable)
        }
    }

    /// Runs the search state machine until it reaches a final state.
    fn search(&mut self) -> State {
        if self.refuted_at_load {
            return State::Unsat;
        }

        let deadline = self.config.time_limit.map(|limit| Instant::now() + limit);
        let mut state = State::Propagate;
        loop {
            state = match state {
                State::Propagate => self.propagate(),
                State::Conflict(idx) => self.resolve_conflict(idx),
                State::Decide => match deadline {
                    Some(deadline) if Instant::now() >= deadline => State::Interrupted,
                    _ => self.decide(),
                },
                State::Sat | State::Unsat | State::Interrupted => return state,
            }
        }
    }
}

impl Solver for CdclSolver {
    fn new(formula: Cnf, config: SolverConfig) -> Self {
        let num_variables = formula.num_variables();
        let mut tracker = Tracker::new(num_variables);
        let mut trail = Trail::new(num_variables);
        let mut occurrences = vec![0; num_variables];
        let mut refuted_at_load = false;

        for clause in formula.clauses() {
            for literal in clause.iter() {
                occurrences[literal.variable().index()] += 1;
            }

            match clause.literals() {
                [] => refuted_at_load = true,
                &[unit] => {
                    // Standing obligation at level 0, propagated before the first decision.
                    let idx = tracker.add_clause(vec![unit], false);
                    if !trail.enqueue(unit, Some(idx)) {
                        refuted_at_load = true;
                    }
                }
                literals => {
                    tracker.add_clause(literals.to_vec(), false);
                }
            }
        }

        debug!(
            "Loaded {} variables, {} clauses, restart policy {}, polarity {:?}, seed {}",
            num_variables,
            tracker.num_clauses(),
            config.restart,
            config.polarity,
            config.seed
        );

        CdclSolver {
            analyzer: ConflictAnalyzer::new(num_variables),
            vsids: VsidsScoring::new(&occurrences, config.var_decay, config.seed),
            phase: PhaseSelector::new(num_variables, config.polarity, config.seed.wrapping_add(1)),
            restarts: RestartSchedule::new(config.restart),
            stats: Statistics::default(),
            formula,
            config,
            tracker,
            trail,
            refuted_at_load,
        }
    }

    fn solve(mut self) -> Outcome {
        let state = self.search();
        info!("Search finished: {}", self.stats);
        debug!(
            "Clause database holds {} clauses, {} learnt",
            self.tracker.num_clauses(),
            self.tracker.clauses().filter(|clause| clause.is_learnt()).count()
        );

        match state {
            State::Sat => {
                let assignment = self.trail.assignment();
                Outcome::Sat(Model::new(self.formula, assignment))
            }
            State::Unsat => Outcome::Unsat,
            _ => Outcome::Unknown,
        }
    }
}
