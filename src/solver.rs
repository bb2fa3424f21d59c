use crate::formula::{Cnf, Model};

mod cdcl;
mod config;

pub use cdcl::{CdclSolver, Statistics};
pub use config::{ConfigError, PolarityMode, RestartPolicy, SolverConfig};

/// Final answer of a search.
#[derive(Debug)]
pub enum Outcome {
    /// The formula is satisfiable, with a model assigning every variable.
    Sat(Model),
    /// The formula has no model.
    Unsat,
    /// The time limit expired before the search finished.
    Unknown,
}

impl Outcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, Outcome::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Outcome::Unsat)
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            Outcome::Sat(model) => Some(model),
            _ => None,
        }
    }
}

pub trait Solver {
    /// Creates a new solver instance.
    fn new(formula: Cnf, config: SolverConfig) -> Self;

    /// Solves a CNF SAT problem with the solver.
    fn solve(self) -> Outcome;
}
