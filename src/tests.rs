use paste::paste;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    formula::{Clause, Cnf, Literal, Variable},
    parser::parse_file,
    solver::{CdclSolver, Outcome, PolarityMode, RestartPolicy, Solver, SolverConfig},
};

fn solve(formula: Cnf, config: SolverConfig) -> Outcome {
    let outcome = CdclSolver::new(formula, config).solve();
    if let Outcome::Sat(model) = &outcome {
        assert_eq!(model.falsified_clause(), None, "invalid model {}", model);
    }
    outcome
}

macro_rules! sat_testcase {
    ($dir:ident, $name:ident) => {
        paste! {
            #[test]
            fn [< $dir _ $name >]() {
                let formula = parse_file(
                    concat!("testcases/", stringify!($dir), "/", stringify!($name), ".cnf")
                ).unwrap();
                assert!(solve(formula, SolverConfig::default()).is_sat());
            }
        }
    };
}

macro_rules! unsat_testcase {
    ($dir:ident, $name:ident) => {
        paste! {
            #[test]
            fn [< $dir _ $name >]() {
                let formula = parse_file(
                    concat!("testcases/", stringify!($dir), "/", stringify!($name), ".cnf")
                ).unwrap();
                assert!(solve(formula, SolverConfig::default()).is_unsat());
            }
        }
    };
}

sat_testcase!(basic, unit);
unsat_testcase!(basic, unit_conflict);
sat_testcase!(basic, one_hot);
unsat_testcase!(basic, full2);
sat_testcase!(basic, empty);
unsat_testcase!(basic, empty_clause);
sat_testcase!(basic, chain);
unsat_testcase!(basic, chain_conflict);
sat_testcase!(basic, satlib);

unsat_testcase!(pigeonhole, ph2);
unsat_testcase!(pigeonhole, ph3);
unsat_testcase!(pigeonhole, ph4);
unsat_testcase!(pigeonhole, ph5);
unsat_testcase!(pigeonhole, ph6);
sat_testcase!(pigeonhole, fit3);
sat_testcase!(pigeonhole, fit5);
sat_testcase!(pigeonhole, fit8);

unsat_testcase!(queens, queens2);
unsat_testcase!(queens, queens3);
sat_testcase!(queens, queens4);
sat_testcase!(queens, queens8);
sat_testcase!(queens, queens10);

#[test]
fn single_unit_model() {
    let outcome = solve(Cnf::from_dimacs(1, &[&[1]]), SolverConfig::default());
    let model = outcome.model().unwrap();
    assert_eq!(model.assignment(), &[true]);
    assert_eq!(model.dimacs().to_string(), "1");
}

#[test]
fn exactly_one_true() {
    let formula = Cnf::from_dimacs(3, &[&[1, 2, 3], &[-1, -2], &[-2, -3], &[-1, -3]]);
    for seed in 0..16 {
        let config = SolverConfig {
            seed,
            ..SolverConfig::default()
        };
        let outcome = solve(formula.clone(), config);
        let model = outcome.model().unwrap();
        assert_eq!(model.assignment().iter().filter(|&&value| value).count(), 1);
    }
}

#[test]
fn no_variables_gives_empty_model() {
    let outcome = solve(Cnf::new(0), SolverConfig::default());
    assert_eq!(outcome.model().unwrap().dimacs().to_string(), "");
}

#[test]
fn dimacs_assignment_format() {
    let formula = Cnf::from_dimacs(3, &[&[1], &[-2], &[3]]);
    let outcome = solve(formula, SolverConfig::default());
    assert_eq!(outcome.model().unwrap().dimacs().to_string(), "1 -2 3");
}

/// Random 3-SAT-like formula over at most 8 variables.
fn random_formula(rng: &mut StdRng) -> Cnf {
    let num_variables = rng.gen_range(1..=8);
    let num_clauses = rng.gen_range(0..=num_variables * 5);
    let mut cnf = Cnf::new(num_variables);
    for _ in 0..num_clauses {
        let width = rng.gen_range(1..=3);
        let literals = (0..width)
            .map(|_| {
                let variable = Variable::from_index(rng.gen_range(0..num_variables)).unwrap();
                Literal::new(variable, rng.gen())
            })
            .collect();
        cnf.add_clause(Clause::new(literals));
    }
    cnf
}

fn brute_force_sat(formula: &Cnf) -> bool {
    let n = formula.num_variables();
    (0..1u32 << n).any(|bits| {
        let assignment = (0..n).map(|i| bits & (1 << i) != 0).collect::<Vec<_>>();
        formula
            .clauses()
            .iter()
            .all(|clause| clause.satisfied_by(&assignment))
    })
}

fn configs(seed: u64) -> Vec<SolverConfig> {
    let restarts = [
        RestartPolicy::Never,
        RestartPolicy::Fixed(1),
        RestartPolicy::Geometric { first: 2 },
        RestartPolicy::Luby { unit: 1 },
    ];
    let polarities = [
        PolarityMode::Random,
        PolarityMode::Saved,
        PolarityMode::Positive,
        PolarityMode::Negative,
    ];

    restarts
        .iter()
        .zip(polarities.iter())
        .map(|(&restart, &polarity)| SolverConfig {
            restart,
            polarity,
            seed,
            ..SolverConfig::default()
        })
        .collect()
}

#[test]
fn verdicts_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x5a7);
    for round in 0..300 {
        let formula = random_formula(&mut rng);
        let expected = brute_force_sat(&formula);

        for config in configs(round) {
            let outcome = solve(formula.clone(), config.clone());
            assert_eq!(
                outcome.is_sat(),
                expected,
                "round {} with {:?} on {}",
                round,
                config,
                formula
            );
        }
    }
}

#[test]
fn restarts_do_not_change_verdicts() {
    let mut rng = StdRng::seed_from_u64(17);
    for round in 0..100 {
        let formula = random_formula(&mut rng);
        let verdicts = [RestartPolicy::Never, RestartPolicy::Fixed(1)]
            .iter()
            .map(|&restart| {
                let config = SolverConfig {
                    restart,
                    seed: round,
                    ..SolverConfig::default()
                };
                solve(formula.clone(), config).is_sat()
            })
            .collect::<Vec<_>>();
        assert_eq!(verdicts[0], verdicts[1], "round {} on {}", round, formula);
    }
}
