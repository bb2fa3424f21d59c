use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::formula::{Literal, Variable};
use crate::solver::PolarityMode;

/// Picks the value a decision assigns to its variable.
pub struct PhaseSelector {
    mode: PolarityMode,
    /// Last value of each variable before it was unassigned.
    saved: Vec<bool>,
    rng: StdRng,
}

impl PhaseSelector {
    pub fn new(num_variables: usize, mode: PolarityMode, seed: u64) -> Self {
        PhaseSelector {
            mode,
            saved: vec![false; num_variables],
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn choose(&mut self, variable: Variable) -> bool {
        match self.mode {
            PolarityMode::Random => self.rng.gen_bool(0.5),
            PolarityMode::Saved => self.saved[variable.index()],
            PolarityMode::Positive => true,
            PolarityMode::Negative => false,
        }
    }

    /// Remembers the value of a literal that is being unassigned.
    pub fn save(&mut self, literal: Literal) {
        self.saved[literal.variable().index()] = literal.positive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_phase_follows_last_value() {
        let variable = Variable::new(1).unwrap();
        let mut phase = PhaseSelector::new(1, PolarityMode::Saved, 0);
        assert!(!phase.choose(variable));

        phase.save(Literal::new(variable, true));
        assert!(phase.choose(variable));
    }

    #[test]
    fn random_phase_is_reproducible() {
        let variable = Variable::new(1).unwrap();
        let mut a = PhaseSelector::new(1, PolarityMode::Random, 42);
        let mut b = PhaseSelector::new(1, PolarityMode::Random, 42);
        let first = (0..64).map(|_| a.choose(variable)).collect::<Vec<_>>();
        let second = (0..64).map(|_| b.choose(variable)).collect::<Vec<_>>();
        assert_eq!(first, second);
        assert!(first.contains(&true) && first.contains(&false));
    }
}
